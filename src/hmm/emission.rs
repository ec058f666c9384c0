use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::geo::{geodesy, GeometryKind, Point};
use crate::graph::Edge;
use crate::observation::Observation;

use super::error::HmmError;

const PARETO_TAU_BASELINE: f64 = 0.6;

/// Per-step precomputed state, built once per candidate set via
/// [`EmissionModel::precompute`] and reused for every candidate's
/// [`EmissionModel::log_probability`] call in that step.
#[derive(Default)]
pub struct EmissionContext {
    bayesian_sum_inv_distance: Option<f64>,
}

/// Emission probability variants, all carried in negative-log space.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EmissionModel {
    Gaussian { sigma: f64 },
    /// heavy-tailed, urban variant. `k` is the Pareto shape parameter.
    Pareto { sigma: f64, k: f64 },
    /// deprecated upstream but retained: normalizes inverse-distance across
    /// the full candidate set rather than assuming a distance distribution.
    Bayesian,
}

impl EmissionModel {
    /// stateful precomputation ahead of scoring a full candidate set at one
    /// observation. Only `Bayesian` needs this; other variants return an
    /// empty context.
    pub fn precompute(
        &self,
        observation_point: &Point,
        candidates: &[(&Edge, f64)],
    ) -> Result<EmissionContext, HmmError> {
        match self {
            EmissionModel::Bayesian => {
                let mut sum_inv = 0.0;
                for (edge, d) in candidates {
                    let adjusted = Self::substitute_zero_distance(edge, observation_point, *d)?;
                    sum_inv += 1.0 / adjusted;
                }
                Ok(EmissionContext {
                    bayesian_sum_inv_distance: Some(sum_inv),
                })
            }
            _ => Ok(EmissionContext::default()),
        }
    }

    /// zero distances (observation exactly on the edge) are replaced by the
    /// distance to the polyline's closest vertex, per the Bayesian
    /// calculator's contract.
    fn substitute_zero_distance(edge: &Edge, observation_point: &Point, d: f64) -> Result<f64, HmmError> {
        if d > 0.0 {
            return Ok(d);
        }
        let closest_vertex = edge.path.on_track_closest_node(observation_point)?;
        let substituted = geodesy::distance(&closest_vertex, observation_point)?;
        Ok(if substituted > 0.0 { substituted } else { f64::EPSILON })
    }

    /// `d` is the observation's perpendicular distance to `edge`'s geometry.
    pub fn log_probability(
        &self,
        ctx: &EmissionContext,
        edge: &Edge,
        d: f64,
        observation: &Observation,
        previous_observation: Option<&Observation>,
        kind: GeometryKind,
    ) -> Result<f64, HmmError> {
        match self {
            EmissionModel::Gaussian { sigma } => {
                Ok(0.5 * (d / sigma) - (sigma * (2.0 * PI).sqrt()).ln())
            }
            EmissionModel::Pareto { sigma, k } => {
                let tau = Self::heading_agreement_weight(edge, observation, previous_observation, kind)?;
                Ok((1.0 / k + 1.0) * (1.0 + k * tau * d / sigma).ln() + sigma.ln())
            }
            EmissionModel::Bayesian => {
                let sum_inv = ctx
                    .bayesian_sum_inv_distance
                    .ok_or(HmmError::MissingPrecomputation)?;
                let adjusted = Self::substitute_zero_distance(edge, &observation.point(kind), d)?;
                let p_j = (1.0 / adjusted) / sum_inv;
                // the candidate set's p_j values already sum to 1 by
                // construction; divide explicitly to mirror the source formula.
                let sum_p = 1.0;
                Ok(-(p_j / sum_p).ln())
            }
        }
    }

    /// heading-agreement weight for the Pareto variant: compares the
    /// bearing between `edge`'s two observation projections against the
    /// raw inter-observation bearing. Falls back to `1.0` when there is no
    /// prior observation or either bearing is undefined (coincident points).
    fn heading_agreement_weight(
        edge: &Edge,
        observation: &Observation,
        previous_observation: Option<&Observation>,
        kind: GeometryKind,
    ) -> Result<f64, HmmError> {
        let previous = match previous_observation {
            Some(p) => p,
            None => return Ok(1.0),
        };

        let prev_point = previous.point(kind);
        let curr_point = observation.point(kind);

        let prev_projection = edge.path.on_track_closest_point(&prev_point)?;
        let curr_projection = edge.path.on_track_closest_point(&curr_point)?;

        let projection_bearing = match geodesy::initial_bearing(&prev_projection, &curr_projection) {
            Ok(b) => b,
            Err(_) => return Ok(1.0),
        };
        let observation_bearing = match geodesy::initial_bearing(&prev_point, &curr_point) {
            Ok(b) => b,
            Err(_) => return Ok(1.0),
        };

        let delta_deg = normalize_angle_delta(projection_bearing - observation_bearing);
        let delta_rad = delta_deg.to_radians();
        Ok(PARETO_TAU_BASELINE + (delta_rad.abs() - 2.0 / PI).exp())
    }
}

/// reduces a bearing difference in degrees into `(-180, 180]`.
fn normalize_angle_delta(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Polyline;
    use crate::graph::{EdgeId, NodeId};

    fn flat_edge() -> Edge {
        Edge::new(
            EdgeId(0),
            NodeId(0),
            NodeId(1),
            Polyline::new(vec![Point::planar(0.0, 0.0), Point::planar(10.0, 0.0)]),
        )
    }

    #[test]
    fn test_gaussian_matches_closed_form() {
        let m = EmissionModel::Gaussian { sigma: 5.0 };
        let edge = flat_edge();
        let ctx = EmissionContext::default();
        let obs = Observation::new(5.0, 2.0, 0);
        let score = m
            .log_probability(&ctx, &edge, 2.0, &obs, None, GeometryKind::Euclidean)
            .unwrap();
        let expected = 0.5 * (2.0 / 5.0) - (5.0 * (2.0 * PI).sqrt()).ln();
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_pareto_falls_back_to_baseline_without_prior_observation() {
        let m = EmissionModel::Pareto { sigma: 5.0, k: 1.0 };
        let edge = flat_edge();
        let ctx = EmissionContext::default();
        let obs = Observation::new(5.0, 2.0, 0);
        // tau == 1.0 when there is no previous observation.
        let score = m
            .log_probability(&ctx, &edge, 2.0, &obs, None, GeometryKind::Euclidean)
            .unwrap();
        let expected = (1.0 / 1.0 + 1.0) * (1.0 + 1.0 * 1.0 * 2.0 / 5.0_f64).ln() + 5.0_f64.ln();
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_bayesian_requires_precompute() {
        let m = EmissionModel::Bayesian;
        let edge = flat_edge();
        let ctx = EmissionContext::default();
        let obs = Observation::new(5.0, 2.0, 0);
        let err = m
            .log_probability(&ctx, &edge, 2.0, &obs, None, GeometryKind::Euclidean)
            .unwrap_err();
        assert_eq!(err, HmmError::MissingPrecomputation);
    }

    #[test]
    fn test_bayesian_closer_candidate_scores_better() {
        let m = EmissionModel::Bayesian;
        let near = flat_edge();
        let mut far = flat_edge();
        far.id = EdgeId(1);
        let obs_point = Point::planar(5.0, 2.0);

        let ctx = m
            .precompute(&obs_point, &[(&near, 2.0), (&far, 20.0)])
            .unwrap();

        let obs = Observation::new(5.0, 2.0, 0);
        let near_score = m
            .log_probability(&ctx, &near, 2.0, &obs, None, GeometryKind::Euclidean)
            .unwrap();
        let far_score = m
            .log_probability(&ctx, &far, 20.0, &obs, None, GeometryKind::Euclidean)
            .unwrap();
        assert!(near_score < far_score);
    }
}
