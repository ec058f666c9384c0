use std::collections::HashMap;

use crate::geo::{GeometryKind, Polyline};
use crate::graph::{Edge, EdgeId, Graph, Node, NodeId};
use crate::hmm::ConnectingPath;
use crate::observation::Observation;

use super::error::MatchError;

/// Ephemeral, per-`find_path`-call extension of the road graph: synthetic
/// observation nodes and projection edges, scoped to one match and never
/// written back into the (frozen) [`Graph`]. Node/edge ids are allocated
/// past the real graph's id range so the two spaces never collide.
#[derive(Default)]
pub struct OffRoadContext {
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeId, Edge>,
    next_node_id: usize,
    next_edge_id: usize,
}

impl OffRoadContext {
    pub fn new(graph: &Graph) -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            next_node_id: graph.nodes().len(),
            next_edge_id: graph.edges().len(),
        }
    }

    fn fresh_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    fn fresh_edge_id(&mut self) -> EdgeId {
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        id
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// builds the synthetic observation node for `observation`, a
    /// projection edge pair for every id in `real_candidate_ids`, and (when
    /// `previous_node` is given) a direct off-road jump edge from the prior
    /// step's observation node. Returns the new node and every synthetic
    /// edge id created, ready to be folded into that step's candidate set.
    pub fn augment(
        &mut self,
        graph: &Graph,
        observation: &Observation,
        kind: GeometryKind,
        real_candidate_ids: &[EdgeId],
        previous_node: Option<NodeId>,
    ) -> Result<(NodeId, Vec<EdgeId>), MatchError> {
        let obs_point = observation.point(kind);
        let obs_node_id = self.fresh_node_id();
        self.nodes.insert(obs_node_id, Node::new(obs_node_id, obs_point));

        let mut synthetic_ids = Vec::with_capacity(real_candidate_ids.len() * 2 + 1);

        for &real_id in real_candidate_ids {
            let real_edge = graph.edge(real_id)?;
            let p = real_edge.path.on_track_closest_point(&obs_point)?;
            let p_node_id = self.fresh_node_id();
            self.nodes.insert(p_node_id, Node::new(p_node_id, p));

            let to_id = self.fresh_edge_id();
            let mut to_edge = Edge::new(to_id, obs_node_id, p_node_id, Polyline::new(vec![obs_point, p]));
            to_edge.to_projected = Some(real_id);
            self.edges.insert(to_id, to_edge);

            let from_id = self.fresh_edge_id();
            let mut from_edge = Edge::new(from_id, p_node_id, obs_node_id, Polyline::new(vec![p, obs_point]));
            from_edge.from_projected = Some(real_id);
            self.edges.insert(from_id, from_edge);

            synthetic_ids.push(to_id);
            synthetic_ids.push(from_id);
        }

        if let Some(prev_node_id) = previous_node {
            let prev_point = match self.nodes.get(&prev_node_id) {
                Some(n) => Some(n.point),
                None => graph.node(prev_node_id).ok().map(|n| n.point),
            };
            if let Some(prev_point) = prev_point {
                let jump_id = self.fresh_edge_id();
                let jump_edge = Edge::new(jump_id, prev_node_id, obs_node_id, Polyline::new(vec![prev_point, obs_point]));
                self.edges.insert(jump_id, jump_edge);
                synthetic_ids.push(jump_id);
            }
        }

        log::trace!(
            "off-road augmentation at node {obs_node_id}: {} synthetic edges",
            synthetic_ids.len()
        );
        Ok((obs_node_id, synthetic_ids))
    }
}

/// resolves an edge id against the real graph first, then the per-call
/// off-road context -- the two id spaces never overlap, so this is
/// unambiguous.
pub fn resolve_edge<'a>(graph: &'a Graph, offroad: &'a OffRoadContext, id: EdgeId) -> Option<&'a Edge> {
    graph.edge(id).ok().or_else(|| offroad.edge(id))
}

/// synthesizes the connecting path between two candidates when at least one
/// is off-road, per the three structural cases: projecting onto a real
/// edge, projecting off of one, or two off-road edges sharing a node.
/// Returns `ConnectingPath::none()` when neither case applies.
pub fn synthesize_connecting_path(from_edge: &Edge, to_edge: &Edge) -> Result<ConnectingPath, MatchError> {
    let polyline = if from_edge.to_projected == Some(to_edge.id) {
        let cut_point = from_edge.path.end().ok_or(MatchError::EmptyGraph)?;
        let (_, after) = to_edge.path.cut(&cut_point, crate::geo::CutMode::Hard)?;
        Some(from_edge.path.append(&after))
    } else if to_edge.from_projected == Some(from_edge.id) {
        let cut_point = to_edge.path.start().ok_or(MatchError::EmptyGraph)?;
        let (before, _) = from_edge.path.cut(&cut_point, crate::geo::CutMode::Hard)?;
        Some(before.append(&to_edge.path))
    } else if from_edge.is_off_road() && to_edge.is_off_road() && from_edge.to == to_edge.from {
        Some(from_edge.path.append(&to_edge.path))
    } else {
        None
    };

    match polyline {
        Some(pl) => Ok(ConnectingPath {
            found: true,
            edges: Vec::new(),
            length_m: pl.length().map_err(crate::hmm::HmmError::from)?,
        }),
        None => Ok(ConnectingPath::none()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;

    fn sample_real_edge(graph: &mut Graph) -> EdgeId {
        graph
            .add_approximate_direct_edge(Polyline::new(vec![Point::planar(0.0, 0.0), Point::planar(10.0, 0.0)]))
            .unwrap()
    }

    #[test]
    fn test_augment_creates_projection_pair_per_candidate() {
        let mut graph = Graph::with_merge_epsilon(GeometryKind::Euclidean, 0.01);
        let real_id = sample_real_edge(&mut graph);
        let mut ctx = OffRoadContext::new(&graph);
        let obs = Observation::new(5.0, 2.0, 0);

        let (_, synthetic) = ctx
            .augment(&graph, &obs, GeometryKind::Euclidean, &[real_id], None)
            .unwrap();

        assert_eq!(synthetic.len(), 2);
        let to_edge = ctx.edge(synthetic[0]).unwrap();
        let from_edge = ctx.edge(synthetic[1]).unwrap();
        assert_eq!(to_edge.to_projected, Some(real_id));
        assert_eq!(from_edge.from_projected, Some(real_id));
    }

    #[test]
    fn test_augment_appends_jump_edge_when_previous_given() {
        let mut graph = Graph::with_merge_epsilon(GeometryKind::Euclidean, 0.01);
        let real_id = sample_real_edge(&mut graph);
        let mut ctx = OffRoadContext::new(&graph);
        let obs0 = Observation::new(5.0, 2.0, 0);
        let (node0, _) = ctx
            .augment(&graph, &obs0, GeometryKind::Euclidean, &[real_id], None)
            .unwrap();

        let obs1 = Observation::new(6.0, 2.0, 1);
        let (_, synthetic1) = ctx
            .augment(&graph, &obs1, GeometryKind::Euclidean, &[real_id], Some(node0))
            .unwrap();

        assert_eq!(synthetic1.len(), 3);
    }

    #[test]
    fn test_synthesize_path_to_projected_case() {
        let mut graph = Graph::with_merge_epsilon(GeometryKind::Euclidean, 0.01);
        let real_id = sample_real_edge(&mut graph);
        let mut ctx = OffRoadContext::new(&graph);
        let obs = Observation::new(5.0, 2.0, 0);
        let (_, synthetic) = ctx
            .augment(&graph, &obs, GeometryKind::Euclidean, &[real_id], None)
            .unwrap();

        let off_road_to_real = ctx.edge(synthetic[0]).unwrap();
        let real_edge = graph.edge(real_id).unwrap();
        let path = synthesize_connecting_path(off_road_to_real, real_edge).unwrap();
        assert!(path.found);
        assert!(path.length_m > 0.0);
    }
}
