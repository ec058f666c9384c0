use serde::{Deserialize, Serialize};

use crate::geo::{geodesy, GeometryKind, Point};
use crate::graph::{Edge, EdgeId, Graph};
use crate::search;

use super::error::HmmError;

/// The connecting path between a `from_edge` and a `to_edge`, as surfaced to
/// the transition model. For two real edges this comes from an A* search
/// over the road graph; for off-road edges the caller synthesizes one
/// directly (see `matching::offroad`) without touching the graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectingPath {
    pub found: bool,
    pub edges: Vec<EdgeId>,
    pub length_m: f64,
}

impl ConnectingPath {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn trivial() -> Self {
        Self {
            found: true,
            edges: Vec::new(),
            length_m: 0.0,
        }
    }
}

/// runs A* from `from_edge.to` to `to_edge.from`, using each candidate
/// edge's geodesic/planar length as its weight. Both the weight function
/// and an admissible straight-line heuristic share this same distance
/// metric, so the search is simultaneously the transition model's
/// "uniform cost" search and its path-length source.
pub fn connecting_path_via_astar(
    graph: &Graph,
    from_edge: &Edge,
    to_edge: &Edge,
) -> Result<ConnectingPath, HmmError> {
    if from_edge.to == to_edge.from {
        return Ok(ConnectingPath::trivial());
    }

    let summary = search::run(
        graph,
        from_edge.to,
        to_edge.from,
        |e| e.path.length().unwrap_or(f64::INFINITY),
        |_, _| 0.0,
    )
    .map_err(HmmError::from)?;

    if !summary.found {
        return Ok(ConnectingPath::none());
    }

    let mut length_m = 0.0;
    for &edge_id in &summary.edges {
        length_m += graph.edge(edge_id)?.path.length()?;
    }

    Ok(ConnectingPath {
        found: true,
        edges: summary.edges,
        length_m,
    })
}

/// Transition probability variants, all carried in negative-log space.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TransitionModel {
    Topological,
    TopologicalNoUTurn,
    ExponentialLengthDifference { beta: f64 },
}

impl TransitionModel {
    pub fn log_probability(
        &self,
        from_edge: &Edge,
        to_edge: &Edge,
        connecting: &ConnectingPath,
        graph: &Graph,
        observation_prev: &Point,
        observation_curr: &Point,
        kind: GeometryKind,
    ) -> Result<f64, HmmError> {
        match self {
            TransitionModel::Topological => Ok(topological_log_prob(from_edge, to_edge, connecting)),
            TransitionModel::TopologicalNoUTurn => {
                if is_u_turn(from_edge, to_edge) || is_mixed_direction(graph, connecting)? {
                    return Ok(f64::INFINITY);
                }
                Ok(topological_log_prob(from_edge, to_edge, connecting))
            }
            TransitionModel::ExponentialLengthDifference { beta } => {
                if !connecting.found {
                    return Ok(f64::INFINITY);
                }
                let _ = kind;
                let great_circle = geodesy::distance(observation_prev, observation_curr)?;
                let delta = (great_circle - connecting.length_m).abs();
                Ok(-beta.ln() + beta * delta)
            }
        }
    }
}

fn topological_log_prob(from_edge: &Edge, to_edge: &Edge, connecting: &ConnectingPath) -> f64 {
    let a = if from_edge.id == to_edge.id {
        (-0.5_f64).exp()
    } else if connecting.found {
        (-1.0_f64).exp()
    } else {
        0.0
    };
    if a <= 0.0 {
        f64::INFINITY
    } else {
        -a.ln()
    }
}

/// an immediate reversal: `to_edge` is `from_edge`'s own `reverse` partner.
fn is_u_turn(from_edge: &Edge, to_edge: &Edge) -> bool {
    from_edge.reverse == Some(to_edge.id)
}

/// a path is mixed-direction if it traverses some edge and that edge's
/// `reverse` partner, but not uniformly (some edges appear only forward).
fn is_mixed_direction(graph: &Graph, connecting: &ConnectingPath) -> Result<bool, HmmError> {
    if !connecting.found || connecting.edges.is_empty() {
        return Ok(false);
    }
    let in_path: std::collections::HashSet<EdgeId> = connecting.edges.iter().copied().collect();
    let mut reversed_count = 0;
    for &edge_id in &connecting.edges {
        if let Some(reverse_id) = graph.edge(edge_id)?.reverse {
            if in_path.contains(&reverse_id) {
                reversed_count += 1;
            }
        }
    }
    Ok(reversed_count > 0 && reversed_count < connecting.edges.len())
}
