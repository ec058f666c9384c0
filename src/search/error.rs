use crate::graph::GraphError;

/// Errors raised by the path finder. Unreachability is not an error -- see
/// [`PathSummary`](super::astar::PathSummary)`::found`.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error(transparent)]
    Graph(#[from] GraphError),
}
