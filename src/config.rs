//! Caller-assembled tuning for one [`matching::find_path`](crate::matching::find_path)
//! call. This crate resolves no config files and has no CLI of its own;
//! a caller builds a [`MatcherConfig`] however it likes -- from JSON,
//! TOML, or plain code -- and passes it in.

use serde::{Deserialize, Serialize};

use crate::hmm::{EmissionModel, InitialModel, TransitionModel};

/// Tuning for one `find_path` call: the candidate-set threshold, the
/// off-road augmentation flag, and the three plug-in probability
/// calculators.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// meters; `0.0` disables the spatial-index candidate restriction and
    /// always falls back to scanning every edge in the graph.
    pub edges_near_threshold_m: f64,
    pub off_road: bool,
    pub initial: InitialModel,
    pub emission: EmissionModel,
    pub transition: TransitionModel,
}

impl MatcherConfig {
    pub fn new(
        edges_near_threshold_m: f64,
        off_road: bool,
        initial: InitialModel,
        emission: EmissionModel,
        transition: TransitionModel,
    ) -> Self {
        Self {
            edges_near_threshold_m,
            off_road,
            initial,
            emission,
            transition,
        }
    }
}
