use std::collections::HashMap;

use crate::graph::EdgeId;
use crate::observation::Observation;

/// smallest `j >= i` with `observations[j].is_some()`, or `None` if every
/// remaining entry is a gap.
pub fn next_observation(observations: &[Option<Observation>], i: usize) -> Option<usize> {
    (i..observations.len()).find(|&j| observations[j].is_some())
}

/// Sparse Viterbi table: `(edge, observation index) -> log-score`, plus a
/// parallel backpointer table recording the best predecessor edge at each
/// index for every edge ever seen as a candidate. Scoped to one `find_path`
/// call.
#[derive(Default)]
pub struct Trellis {
    scores: HashMap<EdgeId, HashMap<usize, f64>>,
    backpointers: HashMap<EdgeId, Vec<Option<EdgeId>>>,
    len: usize,
}

impl Trellis {
    pub fn new(len: usize) -> Self {
        Self {
            scores: HashMap::new(),
            backpointers: HashMap::new(),
            len,
        }
    }

    pub fn score(&self, edge: EdgeId, index: usize) -> Option<f64> {
        self.scores.get(&edge).and_then(|row| row.get(&index)).copied()
    }

    fn backpointer_row_mut(&mut self, edge: EdgeId) -> &mut Vec<Option<EdgeId>> {
        self.backpointers.entry(edge).or_insert_with(|| vec![None; self.len])
    }

    /// records the initial-step score for `edge` at `index`, seeding its
    /// backpointer history with itself.
    pub fn initialize(&mut self, edge: EdgeId, index: usize, score: f64) {
        self.scores.entry(edge).or_default().insert(index, score);
        self.backpointer_row_mut(edge)[index] = Some(edge);
    }

    /// records an induction step: `to_edge` at `index` was reached from
    /// `from_edge`'s best path, with a combined score of `score`. Copies
    /// `from_edge`'s backpointer history up to (not including) `index`,
    /// then sets `to_edge`'s entry at `index` to itself.
    pub fn induct(&mut self, to_edge: EdgeId, from_edge: EdgeId, index: usize, score: f64) {
        self.scores.entry(to_edge).or_default().insert(index, score);
        let history = self
            .backpointers
            .get(&from_edge)
            .cloned()
            .unwrap_or_else(|| vec![None; self.len]);
        let row = self.backpointer_row_mut(to_edge);
        row[..index].clone_from_slice(&history[..index]);
        row[index] = Some(to_edge);
    }

    /// every edge that has a score at `index`.
    pub fn candidates_at(&self, index: usize) -> Vec<EdgeId> {
        let mut found: Vec<EdgeId> = self
            .scores
            .iter()
            .filter(|(_, row)| row.contains_key(&index))
            .map(|(&edge, _)| edge)
            .collect();
        found.sort();
        found
    }

    /// the terminal edge with the lowest score at `index`, and its score.
    /// Ties broken by ascending edge id for determinism.
    pub fn best_terminal(&self, index: usize) -> Option<(EdgeId, f64)> {
        self.candidates_at(index)
            .into_iter()
            .filter_map(|edge| self.score(edge, index).map(|s| (edge, s)))
            .min_by(|(a_id, a_score), (b_id, b_score)| {
                a_score
                    .partial_cmp(b_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a_id.cmp(b_id))
            })
    }

    /// every terminal, sorted ascending by score then edge id.
    pub fn all_terminals(&self, index: usize) -> Vec<(EdgeId, f64)> {
        let mut terminals: Vec<(EdgeId, f64)> = self
            .candidates_at(index)
            .into_iter()
            .filter_map(|edge| self.score(edge, index).map(|s| (edge, s)))
            .collect();
        terminals.sort_by(|(a_id, a_score), (b_id, b_score)| {
            a_score
                .partial_cmp(b_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a_id.cmp(b_id))
        });
        terminals
    }

    /// the decoded path for `edge`, truncated to `[first_index ..= last_index]`.
    pub fn backtrace(&self, edge: EdgeId, first_index: usize, last_index: usize) -> Vec<EdgeId> {
        match self.backpointers.get(&edge) {
            Some(row) => row[first_index..=last_index].iter().filter_map(|e| *e).collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_observation_skips_gaps() {
        let obs = vec![
            None,
            Some(Observation::new(0.0, 0.0, 0)),
            None,
            Some(Observation::new(1.0, 1.0, 1)),
        ];
        assert_eq!(next_observation(&obs, 0), Some(1));
        assert_eq!(next_observation(&obs, 2), Some(3));
        assert_eq!(next_observation(&obs, 4), None);
    }

    #[test]
    fn test_induction_copies_predecessor_history() {
        let mut t = Trellis::new(3);
        t.initialize(EdgeId(0), 0, 1.0);
        t.induct(EdgeId(1), EdgeId(0), 1, 2.0);
        assert_eq!(t.backtrace(EdgeId(1), 0, 1), vec![EdgeId(0), EdgeId(1)]);
    }

    #[test]
    fn test_best_terminal_breaks_ties_by_edge_id() {
        let mut t = Trellis::new(1);
        t.initialize(EdgeId(5), 0, 1.0);
        t.initialize(EdgeId(2), 0, 1.0);
        assert_eq!(t.best_terminal(0), Some((EdgeId(2), 1.0)));
    }
}
