use std::collections::HashMap;

use crate::geo::{GeometryKind, Point, Polyline, Region};
use crate::index::HilbertRTree;

use super::edge::{Edge, EdgeId};
use super::error::GraphError;
use super::node::{Node, NodeId};

/// grid-hash bucket side multiple; buckets are `merge_epsilon` wide so a
/// near-point search only has to look at the 3x3 neighborhood of buckets
/// around the query point.
fn bucket_of(p: &Point, merge_epsilon: f64) -> (i64, i64) {
    (
        (p.x / merge_epsilon).floor() as i64,
        (p.y / merge_epsilon).floor() as i64,
    )
}

/// Directed multigraph over fused near-coincident endpoints. Edge geometry
/// is preserved; nodes are created lazily as edges are added, reusing any
/// existing node within `merge_epsilon` of a new endpoint.
pub struct Graph {
    kind: GeometryKind,
    merge_epsilon: f64,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_buckets: HashMap<(i64, i64), Vec<NodeId>>,
    edge_rtree: HilbertRTree<EdgeId>,
    edge_rtree_built: bool,
}

impl Graph {
    pub fn new(kind: GeometryKind) -> Self {
        Self::with_merge_epsilon(kind, kind.default_merge_epsilon())
    }

    pub fn with_merge_epsilon(kind: GeometryKind, merge_epsilon: f64) -> Self {
        Self {
            kind,
            merge_epsilon,
            nodes: Vec::new(),
            edges: Vec::new(),
            node_buckets: HashMap::new(),
            edge_rtree: HilbertRTree::new(),
            edge_rtree_built: false,
        }
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(id.as_usize()).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge, GraphError> {
        self.edges.get(id.as_usize()).ok_or(GraphError::EdgeNotFound(id))
    }

    /// nodes within `merge_epsilon` of `point`.
    pub fn get_nodes_near(&self, point: &Point) -> Vec<NodeId> {
        let (bx, by) = bucket_of(point, self.merge_epsilon);
        let mut found = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(ids) = self.node_buckets.get(&(bx + dx, by + dy)) {
                    for &id in ids {
                        let node = &self.nodes[id.as_usize()];
                        if let Ok(d) = crate::geo::geodesy::distance(&node.point, point) {
                            if d <= self.merge_epsilon {
                                found.push(id);
                            }
                        }
                    }
                }
            }
        }
        found
    }

    fn find_or_create_node(&mut self, point: Point) -> NodeId {
        if let Some(&existing) = self.get_nodes_near(&point).first() {
            return existing;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id, point));
        let bucket = bucket_of(&point, self.merge_epsilon);
        self.node_buckets.entry(bucket).or_default().push(id);
        id
    }

    /// fuses `path`'s endpoints into existing or fresh nodes and appends a
    /// new edge connecting them. Fails if `path` is empty.
    pub fn add_approximate_direct_edge(&mut self, path: Polyline) -> Result<EdgeId, GraphError> {
        let start = path.start().ok_or(GraphError::EmptyEdgePath)?;
        let end = path.end().ok_or(GraphError::EmptyEdgePath)?;

        let from = self.find_or_create_node(start);
        let to = self.find_or_create_node(end);

        let id = EdgeId(self.edges.len());
        let edge = Edge::new(id, from, to, path);
        self.edges.push(edge);
        self.nodes[from.as_usize()].out_edges.push(id);
        self.nodes[to.as_usize()].in_edges.push(id);

        log::trace!("added edge {id} from node {from} to node {to}");
        Ok(id)
    }

    /// creates two edges sharing `path`'s geometry (one with it reversed)
    /// and links them via `reverse`, when `bidirectional` is set. Otherwise
    /// behaves like a single `add_approximate_direct_edge`.
    pub fn add_approximate_direct_edges(
        &mut self,
        path: Polyline,
        bidirectional: bool,
    ) -> Result<(EdgeId, Option<EdgeId>), GraphError> {
        let forward = self.add_approximate_direct_edge(path.clone())?;
        if !bidirectional {
            return Ok((forward, None));
        }
        let backward = self.add_approximate_direct_edge(path.reverse())?;
        self.edges[forward.as_usize()].reverse = Some(backward);
        self.edges[backward.as_usize()].reverse = Some(forward);
        Ok((forward, Some(backward)))
    }

    /// (re)builds the edge R-tree over every edge's bounding box. Safe to
    /// call repeatedly; only the first call does work, matching the index's
    /// own lazy-seal semantics.
    pub fn freeze(&mut self) {
        if self.edge_rtree_built {
            return;
        }
        for edge in &self.edges {
            let region = edge.path.bounding_box();
            // region may be empty for an unreachable single-point path; skip
            // rather than fail the whole freeze.
            if !region.is_empty() {
                let _ = self.edge_rtree.insert(region, edge.id);
            }
        }
        self.edge_rtree_built = true;
    }

    pub fn can_have_edges_near(&self) -> bool {
        self.edge_rtree_built
    }

    /// edges whose bounding box intersects a circle of `radius` around
    /// `point`, refined by a precise distance check against each
    /// candidate's geometry. Triggers `freeze()` if not already built.
    pub fn get_edges_near(&mut self, point: &Point, radius: f64) -> Result<Vec<EdgeId>, GraphError> {
        self.freeze();
        let query_region = Region::of_point(point).buffered(radius);
        let candidates: Vec<EdgeId> = self.edge_rtree.query(&query_region).into_iter().copied().collect();

        let mut out = Vec::with_capacity(candidates.len());
        for id in candidates {
            let edge = self.edge(id)?;
            let d = edge.path.distance_to_point(point)?;
            if d <= radius {
                out.push(id);
            }
        }
        // deterministic order downstream of the Hilbert-packed query, so
        // repeated matches over the same graph tie-break identically.
        out.sort();
        Ok(out)
    }
}
