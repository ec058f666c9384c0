use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::geo::Polyline;

use super::node::NodeId;

#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub struct EdgeId(pub usize);

impl PartialOrd for EdgeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.0.cmp(&other.0))
    }
}

impl Ord for EdgeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl EdgeId {
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

/// A directed road segment. `weight` is mutable scratch space retained for
/// legacy callers that annotate edges with a scalar cost outside the HMM
/// transition/emission model; core search and matching never read it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub path: Polyline,
    pub reverse: Option<EdgeId>,
    pub weight: Cell<f64>,
    /// present only on synthetic off-road edges projecting an observation
    /// onto a real edge's geometry (see `matching::offroad`).
    pub from_projected: Option<EdgeId>,
    pub to_projected: Option<EdgeId>,
}

impl Edge {
    pub fn new(id: EdgeId, from: NodeId, to: NodeId, path: Polyline) -> Self {
        Self {
            id,
            from,
            to,
            path,
            reverse: None,
            weight: Cell::new(0.0),
            from_projected: None,
            to_projected: None,
        }
    }

    /// an edge is off-road iff it carries a projection tag in either
    /// direction.
    pub fn is_off_road(&self) -> bool {
        self.from_projected.is_some() || self.to_projected.is_some()
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
