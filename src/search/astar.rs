use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use ordered_float::OrderedFloat;

use crate::graph::{Edge, EdgeId, Graph, Node, NodeId};
use crate::util::priority_queue::InternalPriorityQueue;

use super::error::SearchError;

/// Result of an A* search: whether `end` was reached, and if so the edges
/// and nodes of the shortest path found, in traversal order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathSummary {
    pub found: bool,
    pub edges: Vec<EdgeId>,
    pub nodes: Vec<NodeId>,
}

impl PathSummary {
    fn not_found() -> Self {
        Self::default()
    }

    fn trivial(start: NodeId) -> Self {
        Self {
            found: true,
            edges: Vec::new(),
            nodes: vec![start],
        }
    }
}

/// Single-source/single-target shortest path over `graph`'s nodes, using a
/// decrease-key priority queue keyed by `f = g + h`. `edge_weight_fn` must
/// be non-negative; `heuristic_fn` must be admissible with respect to it.
pub fn run<W, H>(
    graph: &Graph,
    start: NodeId,
    end: NodeId,
    edge_weight_fn: W,
    heuristic_fn: H,
) -> Result<PathSummary, SearchError>
where
    W: Fn(&Edge) -> f64,
    H: Fn(&Node, &Node) -> f64,
{
    if start == end {
        return Ok(PathSummary::trivial(start));
    }

    let end_node = graph.node(end)?;

    let mut open: InternalPriorityQueue<NodeId, Reverse<OrderedFloat<f64>>> =
        InternalPriorityQueue::default();
    let mut g_score: HashMap<NodeId, f64> = HashMap::new();
    let mut came_from: HashMap<NodeId, EdgeId> = HashMap::new();
    let mut closed: HashSet<NodeId> = HashSet::new();

    g_score.insert(start, 0.0);
    let start_node = graph.node(start)?;
    let h0 = heuristic_fn(start_node, end_node);
    open.push(start, Reverse(OrderedFloat(h0)));

    let mut iterations = 0usize;

    while let Some((current, _)) = open.pop() {
        if current == end {
            return Ok(reconstruct(graph, start, end, &came_from)?);
        }
        if !closed.insert(current) {
            continue;
        }
        iterations += 1;

        let current_g = *g_score.get(&current).unwrap_or(&f64::INFINITY);
        let current_node = graph.node(current)?;

        for &edge_id in &current_node.out_edges {
            let edge = graph.edge(edge_id)?;
            if closed.contains(&edge.to) {
                continue;
            }
            let tentative_g = current_g + edge_weight_fn(edge);
            let existing_g = *g_score.get(&edge.to).unwrap_or(&f64::INFINITY);
            if tentative_g < existing_g {
                g_score.insert(edge.to, tentative_g);
                came_from.insert(edge.to, edge_id);
                let neighbor_node = graph.node(edge.to)?;
                let f = tentative_g + heuristic_fn(neighbor_node, end_node);
                open.push_increase(edge.to, Reverse(OrderedFloat(f)));
            }
        }
    }

    log::debug!(
        "a* exhausted open set after {iterations} iterations without reaching {end} from {start}"
    );
    Ok(PathSummary::not_found())
}

fn reconstruct(
    graph: &Graph,
    start: NodeId,
    end: NodeId,
    came_from: &HashMap<NodeId, EdgeId>,
) -> Result<PathSummary, SearchError> {
    let mut edges = Vec::new();
    let mut nodes = vec![end];
    let mut current = end;

    while current != start {
        let edge_id = match came_from.get(&current) {
            Some(id) => *id,
            None => return Ok(PathSummary::not_found()),
        };
        let edge = graph.edge(edge_id)?;
        edges.push(edge_id);
        current = edge.from;
        nodes.push(current);
    }

    edges.reverse();
    nodes.reverse();
    Ok(PathSummary {
        found: true,
        edges,
        nodes,
    })
}
