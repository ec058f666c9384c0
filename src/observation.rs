use serde::{Deserialize, Serialize};

use crate::geo::{GeometryKind, Point};

/// A single noisy positional fix: `(x, y)` under some geometry factory, plus
/// an ordering timestamp. A sequence passed to `find_path` is
/// `&[Option<Observation>]`; a `None` at some index marks a dropped fix
/// without shifting the indices around it (see
/// `matching::trellis::next_observation`).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
    pub timestamp: i64,
}

impl Observation {
    pub fn new(x: f64, y: f64, timestamp: i64) -> Self {
        Self { x, y, timestamp }
    }

    pub fn point(&self, kind: GeometryKind) -> Point {
        Point::new(self.x, self.y, kind)
    }
}
