//! A* shortest-path search over a [`graph::Graph`](crate::graph::Graph).

pub mod astar;
pub mod error;

pub use astar::{run, PathSummary};
pub use error::SearchError;
