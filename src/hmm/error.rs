use crate::geo::GeometryError;
use crate::graph::GraphError;
use crate::search::SearchError;

/// Errors raised while scoring the probability model.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HmmError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("Bayesian emission requires precompute() to run over the full candidate set first")]
    MissingPrecomputation,
}
