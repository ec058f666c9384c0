use std::cmp::Ordering;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::geo::Point;

#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub usize);

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.0.cmp(&other.0))
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NodeId {
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

use super::edge::EdgeId;

/// A fused endpoint: an identifier plus its representative point. Owns the
/// directed edge lists incident to it; equality is by id alone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub point: Point,
    pub out_edges: Vec<EdgeId>,
    pub in_edges: Vec<EdgeId>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Node {
    pub fn new(id: NodeId, point: Point) -> Self {
        Self {
            id,
            point,
            out_edges: Vec::new(),
            in_edges: Vec::new(),
        }
    }
}
