//! Log-space Viterbi map matcher: candidate selection, off-road
//! augmentation, and the decode loop tying the graph, spatial index, A*
//! search, and HMM probability model together.

pub mod error;
pub mod matcher;
pub mod offroad;
pub mod trellis;

pub use error::MatchError;
pub use matcher::{find_path, MatchResult};
pub use offroad::OffRoadContext;
pub use trellis::Trellis;
