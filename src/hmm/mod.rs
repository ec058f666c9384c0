//! Initial, emission, and transition probability calculators for the HMM
//! map matcher, all carried in negative-log-probability space.

pub mod emission;
pub mod error;
pub mod initial;
pub mod transition;

pub use emission::{EmissionContext, EmissionModel};
pub use error::HmmError;
pub use initial::InitialModel;
pub use transition::{connecting_path_via_astar, ConnectingPath, TransitionModel};
