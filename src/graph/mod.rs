//! Near-line-merge directed graph: nodes fuse endpoints within a
//! configurable tolerance, edges preserve their original geometry.

pub mod edge;
pub mod error;
pub mod merge_graph;
pub mod node;

pub use edge::{Edge, EdgeId};
pub use error::GraphError;
pub use merge_graph::Graph;
pub use node::{Node, NodeId};
