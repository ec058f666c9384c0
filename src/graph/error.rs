use crate::geo::GeometryError;
use crate::graph::{EdgeId, NodeId};

/// Errors raised while building or querying the road graph.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("no node with id {0}")]
    NodeNotFound(NodeId),
    #[error("no edge with id {0}")]
    EdgeNotFound(EdgeId),
    #[error("cannot build an edge from an empty polyline")]
    EmptyEdgePath,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
