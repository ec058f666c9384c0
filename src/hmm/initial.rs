use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Initial (prior) probability, evaluated against the first non-null
/// observation's candidate set. Carried in negative-log space throughout:
/// lower score is better, `p = 0` maps to `+inf`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InitialModel {
    /// every candidate equally likely.
    Uniform,
    /// `d` is the perpendicular distance from the observation to the
    /// candidate's geometry; `sigma` is the assumed observation noise.
    Gaussian { sigma: f64 },
    /// open-sky variant; same inputs as `Gaussian`.
    Rayleigh { sigma: f64 },
}

impl InitialModel {
    /// `d` is the observation's perpendicular distance to the candidate
    /// edge's geometry; `candidate_count` is `|C_i0|`, used only by
    /// `Uniform`.
    pub fn log_probability(&self, d: f64, candidate_count: usize) -> f64 {
        match self {
            InitialModel::Uniform => {
                debug_assert!(candidate_count > 0, "initial step requires a non-empty candidate set");
                (candidate_count as f64).ln()
            }
            InitialModel::Gaussian { sigma } => 0.5 * (d / sigma) - (sigma * (2.0 * PI).sqrt()).ln(),
            InitialModel::Rayleigh { sigma } => {
                sigma.ln() - (d / sigma).ln() + 0.5 * (d / sigma).powi(2)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_is_log_of_candidate_count() {
        let m = InitialModel::Uniform;
        assert!((m.log_probability(0.0, 4) - 4.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_gaussian_improves_with_smaller_distance() {
        let m = InitialModel::Gaussian { sigma: 10.0 };
        assert!(m.log_probability(1.0, 1) < m.log_probability(20.0, 1));
    }

    #[test]
    fn test_rayleigh_zero_distance_is_infinite_cost() {
        let m = InitialModel::Rayleigh { sigma: 10.0 };
        assert!(m.log_probability(0.0, 1).is_infinite());
    }
}
