//! A thin `rayon` convenience wrapper over [`matching::find_path`]:
//! independent matches against independent graph instances are trivially
//! parallelizable. Not part of the four core subsystems.

use rayon::prelude::*;

use crate::config::MatcherConfig;
use crate::graph::Graph;
use crate::matching::{find_path, MatchError, MatchResult};
use crate::observation::Observation;

/// runs `find_path` over every `(graph, observations)` pair in parallel.
/// Each pair owns its graph exclusively -- matches never share state, so
/// there is nothing to synchronize beyond the final result collection.
pub fn find_paths_batch(
    jobs: &mut [(Graph, Vec<Option<Observation>>)],
    config: &MatcherConfig,
) -> Vec<Result<Vec<MatchResult>, MatchError>> {
    jobs.par_iter_mut()
        .map(|(graph, observations)| find_path(graph, observations, config))
        .collect()
}
