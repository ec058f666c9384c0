use serde::{Deserialize, Serialize};

use crate::config::MatcherConfig;
use crate::geo::{GeometryKind, Point};
use crate::graph::{Edge, EdgeId, Graph, GraphError, NodeId};
use crate::hmm::connecting_path_via_astar;
use crate::observation::Observation;

use super::error::MatchError;
use super::offroad::{resolve_edge, synthesize_connecting_path, OffRoadContext};
use super::trellis::{next_observation, Trellis};

/// One decoded terminal: the edge sequence from the first to the last
/// non-null observation, and its total log-score (initial + every
/// transition + emission term along the way). Lower score is better.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: f64,
    pub edges: Vec<EdgeId>,
}

/// real (non-synthetic) candidate edges for `point`, in deterministic
/// ascending-id order. Uses the spatial index when the graph has been
/// frozen and a positive threshold was given; otherwise every edge in the
/// graph is a candidate. Note this means the threshold has no effect
/// unless the caller explicitly called `graph.freeze()` beforehand --
/// `freeze()` is optional in the construction API, so a caller asking for
/// threshold-pruned matching must opt into it.
fn real_candidate_edges(
    graph: &mut Graph,
    point: &Point,
    config: &MatcherConfig,
) -> Result<Vec<EdgeId>, MatchError> {
    if graph.can_have_edges_near() && config.edges_near_threshold_m > 0.0 {
        Ok(graph.get_edges_near(point, config.edges_near_threshold_m)?)
    } else {
        let mut all: Vec<EdgeId> = graph.edges().iter().map(|e| e.id).collect();
        all.sort();
        Ok(all)
    }
}

/// the candidate set for one step: the real edges near `observation`, plus
/// (when off-road is enabled) the synthetic projection/jump edges built by
/// [`OffRoadContext::augment`]. Returns the merged, sorted candidate id
/// list and the synthetic observation node, if any, for chaining the next
/// step's jump edge.
fn step_candidates(
    graph: &mut Graph,
    offroad: &mut OffRoadContext,
    observation: &Observation,
    kind: GeometryKind,
    config: &MatcherConfig,
    previous_obs_node: Option<NodeId>,
) -> Result<(Vec<EdgeId>, Option<NodeId>), MatchError> {
    let point = observation.point(kind);
    let real = real_candidate_edges(graph, &point, config)?;

    if !config.off_road {
        return Ok((real, None));
    }

    let (obs_node, synthetic) = offroad.augment(graph, observation, kind, &real, previous_obs_node)?;
    let mut merged = real;
    merged.extend(synthetic);
    merged.sort();
    Ok((merged, Some(obs_node)))
}

/// per-candidate perpendicular distance from `point` to the candidate's
/// geometry, resolved against either the real graph or the off-road
/// context.
fn distances_to<'a>(
    graph: &'a Graph,
    offroad: &'a OffRoadContext,
    point: &Point,
    candidates: &[EdgeId],
) -> Result<Vec<(&'a Edge, f64)>, MatchError> {
    let mut out = Vec::with_capacity(candidates.len());
    for &id in candidates {
        let edge = resolve_edge(graph, offroad, id).ok_or(GraphError::EdgeNotFound(id))?;
        let d = edge.path.distance_to_point(point)?;
        out.push((edge, d));
    }
    Ok(out)
}

/// Decodes the most plausible sequence of road edges explaining
/// `observations` against `graph`, via log-space Viterbi. `graph` is taken
/// mutably only because a threshold-pruned candidate search may need to
/// trigger the edge R-tree's lazy build; no edges or nodes are added
/// during decoding, so the graph is otherwise frozen for the duration of
/// the match.
///
/// Returns every trellis terminal at the last observation, sorted
/// ascending by score (ties broken by edge id), each carrying the edge
/// sequence from the first to the last non-null observation. An empty
/// graph, an all-null observation sequence, or a first step with no
/// candidates all yield an empty result rather than an error.
pub fn find_path(
    graph: &mut Graph,
    observations: &[Option<Observation>],
    config: &MatcherConfig,
) -> Result<Vec<MatchResult>, MatchError> {
    if graph.edges().is_empty() {
        log::warn!("find_path: empty graph, returning empty result");
        return Ok(Vec::new());
    }

    let i0 = match next_observation(observations, 0) {
        Some(i) => i,
        None => {
            log::warn!("find_path: no non-null observations, returning empty result");
            return Ok(Vec::new());
        }
    };

    let kind = graph.kind();
    log::debug!(
        "find_path: decoding {} observations starting at index {i0} over a graph with {} edges",
        observations.len(),
        graph.edges().len()
    );

    let mut trellis = Trellis::new(observations.len());
    let mut offroad = OffRoadContext::new(graph);

    let obs0 = observations[i0].expect("next_observation only returns populated indices");
    let (candidates0, mut prev_obs_node) =
        step_candidates(graph, &mut offroad, &obs0, kind, config, None)?;

    if candidates0.is_empty() {
        log::warn!("find_path: no candidates for the first observation at index {i0}");
        return Ok(Vec::new());
    }

    let point0 = obs0.point(kind);
    let distances0 = distances_to(graph, &offroad, &point0, &candidates0)?;
    let ctx0 = config.emission.precompute(&point0, &distances0)?;
    for (edge, d) in &distances0 {
        let init = config.initial.log_probability(*d, candidates0.len());
        let emission = config.emission.log_probability(&ctx0, edge, *d, &obs0, None, kind)?;
        let score = init + emission;
        if score.is_finite() {
            trellis.initialize(edge.id, i0, score);
        }
    }

    let mut prev_index = i0;
    let mut prev_candidates = candidates0;
    let mut prev_observation = obs0;
    let mut next_index = next_observation(observations, i0 + 1);

    while let Some(curr_index) = next_index {
        let curr_obs = observations[curr_index].expect("next_observation only returns populated indices");
        let (curr_candidates, curr_obs_node) =
            step_candidates(graph, &mut offroad, &curr_obs, kind, config, prev_obs_node)?;

        if curr_candidates.is_empty() {
            log::warn!("find_path: candidate set emptied at observation index {curr_index}; stopping early");
            break;
        }

        let curr_point = curr_obs.point(kind);
        let distances_curr = distances_to(graph, &offroad, &curr_point, &curr_candidates)?;
        let ctx = config.emission.precompute(&curr_point, &distances_curr)?;
        let prev_point = prev_observation.point(kind);

        for (to_edge, d) in &distances_curr {
            let mut best: Option<(EdgeId, f64)> = None;
            for &from_id in &prev_candidates {
                let from_score = match trellis.score(from_id, prev_index) {
                    Some(s) if s.is_finite() => s,
                    _ => continue,
                };
                let from_edge =
                    resolve_edge(graph, &offroad, from_id).ok_or(GraphError::EdgeNotFound(from_id))?;

                let connecting = if from_edge.is_off_road() || to_edge.is_off_road() {
                    synthesize_connecting_path(from_edge, to_edge)?
                } else {
                    connecting_path_via_astar(graph, from_edge, to_edge)?
                };

                let transition = config
                    .transition
                    .log_probability(from_edge, to_edge, &connecting, graph, &prev_point, &curr_point, kind)?;
                if !transition.is_finite() {
                    continue;
                }

                let candidate_score = from_score + transition;
                if best.map(|(_, s)| candidate_score < s).unwrap_or(true) {
                    best = Some((from_id, candidate_score));
                }
            }

            if let Some((min_from, min_score)) = best {
                let emission = config.emission.log_probability(&ctx, to_edge, *d, &curr_obs, Some(&prev_observation), kind)?;
                let total = min_score + emission;
                if total.is_finite() {
                    trellis.induct(to_edge.id, min_from, curr_index, total);
                }
            }
        }

        prev_index = curr_index;
        prev_candidates = curr_candidates;
        prev_observation = curr_obs;
        prev_obs_node = curr_obs_node;
        next_index = next_observation(observations, curr_index + 1);
    }

    let results = trellis
        .all_terminals(prev_index)
        .into_iter()
        .map(|(edge, score)| MatchResult {
            score,
            edges: trellis.backtrace(edge, i0, prev_index),
        })
        .collect();
    Ok(results)
}
