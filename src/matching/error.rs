use crate::geo::GeometryError;
use crate::graph::GraphError;
use crate::hmm::HmmError;

/// Errors raised while decoding a trajectory against a road graph. Neither
/// `EmptyGraph` nor `NoObservations` is fatal to the caller -- `find_path`
/// returns an empty result for both instead of propagating, but they are
/// exposed so callers can distinguish "nothing to match" from "matched,
/// zero-length result".
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("cannot match against a graph with no edges")]
    EmptyGraph,
    #[error("no non-null observations were provided")]
    NoObservations,
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Hmm(#[from] HmmError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
