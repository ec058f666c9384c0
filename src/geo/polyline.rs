use super::error::GeometryError;
use super::geodesy;
use super::point::Point;
use super::region::Region;
use serde::{Deserialize, Serialize};

/// how [`Polyline::cut`] should place the split point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutMode {
    /// snap the cut to the nearest existing vertex.
    Soft,
    /// insert a new vertex at the exact projection.
    Hard,
}

/// An immutable ordered sequence of points with no two *consecutive*
/// duplicates -- duplicates are collapsed at construction. A polyline is
/// empty iff it has zero points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    /// builds a polyline from a point list, collapsing any consecutive
    /// duplicates (within each point's factory's default tolerance).
    pub fn new(points: Vec<Point>) -> Self {
        let mut collapsed: Vec<Point> = Vec::with_capacity(points.len());
        for p in points {
            match collapsed.last() {
                Some(last) if last.approx_eq_default(&p) => continue,
                _ => collapsed.push(p),
            }
        }
        Self { points: collapsed }
    }

    pub fn single(p: Point) -> Self {
        Self { points: vec![p] }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn is_closed(&self) -> bool {
        match (self.start(), self.end()) {
            (Some(s), Some(e)) => s.approx_eq_default(&e),
            _ => false,
        }
    }

    /// axis-aligned bounding box of every vertex, in O(n).
    pub fn bounding_box(&self) -> Region {
        self.points
            .iter()
            .fold(Region::empty(), |acc, p| acc.expand_to_include_point(p))
    }

    pub fn reverse(&self) -> Polyline {
        let mut points = self.points.clone();
        points.reverse();
        Polyline { points }
    }

    /// concatenates `self` followed by `other`, dropping the shared
    /// endpoint when `self.end() == other.start()` within tolerance.
    pub fn append(&self, other: &Polyline) -> Polyline {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let mut points = self.points.clone();
        let skip_first = matches!(
            (self.end(), other.start()),
            (Some(tail), Some(head)) if tail.approx_eq_default(&head)
        );
        let tail_iter = if skip_first {
            &other.points[1..]
        } else {
            &other.points[..]
        };
        points.extend_from_slice(tail_iter);
        Polyline::new(points)
    }

    /// concatenates `other` followed by `self`, dropping the shared endpoint
    /// when `other.end() == self.start()` within tolerance.
    pub fn prepend(&self, other: &Polyline) -> Polyline {
        other.append(self)
    }

    /// minimum over segments of [`geodesy::on_track_closest_point`].
    pub fn on_track_closest_point(&self, p: &Point) -> Result<Point, GeometryError> {
        if self.points.is_empty() {
            return Err(GeometryError::EmptyPolyline);
        }
        if self.points.len() == 1 {
            return Ok(self.points[0]);
        }
        let mut best: Option<(f64, Point)> = None;
        for window in self.points.windows(2) {
            let candidate = geodesy::on_track_closest_point(&window[0], &window[1], p)?;
            let d = geodesy::distance(&candidate, p)?;
            if best.as_ref().map(|(bd, _)| d < *bd).unwrap_or(true) {
                best = Some((d, candidate));
            }
        }
        Ok(best.expect("non-empty polyline has at least one segment").1)
    }

    /// the existing vertex nearest to `p`, by a full scan of every vertex.
    /// Ties break to the smaller index.
    pub fn on_track_closest_node_index(&self, p: &Point) -> Result<usize, GeometryError> {
        if self.points.is_empty() {
            return Err(GeometryError::EmptyPolyline);
        }
        let mut best_idx = 0usize;
        let mut best_dist = f64::INFINITY;
        for (idx, vertex) in self.points.iter().enumerate() {
            let d = geodesy::distance(vertex, p)?;
            if d < best_dist {
                best_dist = d;
                best_idx = idx;
            }
        }
        Ok(best_idx)
    }

    pub fn on_track_closest_node(&self, p: &Point) -> Result<Point, GeometryError> {
        let idx = self.on_track_closest_node_index(p)?;
        Ok(self.points[idx])
    }

    /// total geodesic/planar length, summing segment-by-segment. Zero for a
    /// single-point polyline.
    pub fn length(&self) -> Result<f64, GeometryError> {
        let mut total = 0.0;
        for window in self.points.windows(2) {
            total += geodesy::distance(&window[0], &window[1])?;
        }
        Ok(total)
    }

    /// shortest distance from any segment of this polyline to `p`.
    pub fn distance_to_point(&self, p: &Point) -> Result<f64, GeometryError> {
        let closest = self.on_track_closest_point(p)?;
        geodesy::distance(&closest, p)
    }

    /// distance from `self.start()` to the globally-closest segment
    /// projection, summing whole-segment lengths plus the final
    /// along-segment offset. Returns `NaN` for an empty polyline.
    pub fn along_track_distance(&self, p: &Point) -> f64 {
        if self.points.len() < 2 {
            return f64::NAN;
        }
        let mut cumulative = 0.0_f64;
        let mut best: Option<(f64, f64)> = None; // (distance_to_point, along_track_total)

        for window in self.points.windows(2) {
            let seg_len = match geodesy::distance(&window[0], &window[1]) {
                Ok(d) => d,
                Err(_) => return f64::NAN,
            };
            let closest = match geodesy::on_track_closest_point(&window[0], &window[1], p) {
                Ok(c) => c,
                Err(_) => return f64::NAN,
            };
            let d_to_p = match geodesy::distance(&closest, p) {
                Ok(d) => d,
                Err(_) => return f64::NAN,
            };
            let offset = match geodesy::distance(&window[0], &closest) {
                Ok(d) => d,
                Err(_) => return f64::NAN,
            };
            let total = cumulative + offset;
            if best.as_ref().map(|(bd, _)| d_to_p < *bd).unwrap_or(true) {
                best = Some((d_to_p, total));
            }
            cumulative += seg_len;
        }

        best.map(|(_, total)| total).unwrap_or(f64::NAN)
    }

    /// splits the polyline at `p`'s projection. `Soft` snaps to the nearest
    /// vertex; `Hard` inserts a new vertex at the exact projection. Returns
    /// `(before, after)`, both non-empty; degenerate endpoint cuts return
    /// one side as a single-point polyline.
    pub fn cut(&self, p: &Point, mode: CutMode) -> Result<(Polyline, Polyline), GeometryError> {
        if self.points.len() < 2 {
            return Err(GeometryError::EmptyPolyline);
        }

        match mode {
            CutMode::Soft => {
                let idx = self.on_track_closest_node_index(p)?;
                let before = Polyline::new(self.points[..=idx].to_vec());
                let after = Polyline::new(self.points[idx..].to_vec());
                Ok((before, after))
            }
            CutMode::Hard => {
                // find the segment whose projection is globally closest, and
                // the exact projected point on it.
                let mut best_seg = 0usize;
                let mut best_dist = f64::INFINITY;
                let mut best_point = self.points[0];
                for (idx, window) in self.points.windows(2).enumerate() {
                    let candidate = geodesy::on_track_closest_point(&window[0], &window[1], p)?;
                    let d = geodesy::distance(&candidate, p)?;
                    if d < best_dist {
                        best_dist = d;
                        best_seg = idx;
                        best_point = candidate;
                    }
                }
                let mut before_points = self.points[..=best_seg].to_vec();
                let mut after_points = self.points[best_seg + 1..].to_vec();
                before_points.push(best_point);
                after_points.insert(0, best_point);
                Ok((Polyline::new(before_points), Polyline::new(after_points)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_involution() {
        let pl = Polyline::new(vec![
            Point::planar(0.0, 0.0),
            Point::planar(1.0, 1.0),
            Point::planar(2.0, 0.0),
        ]);
        assert_eq!(pl.reverse().reverse(), pl);
    }

    #[test]
    fn test_append_is_closed() {
        let pl = Polyline::new(vec![Point::planar(0.0, 0.0), Point::planar(1.0, 0.0)]);
        let closed = pl.append(&pl.reverse());
        assert!(closed.is_closed());
    }

    #[test]
    fn test_collapses_consecutive_duplicates() {
        let pl = Polyline::new(vec![
            Point::planar(0.0, 0.0),
            Point::planar(0.0, 0.0),
            Point::planar(1.0, 0.0),
        ]);
        assert_eq!(pl.len(), 2);
    }

    #[test]
    fn test_soft_cut_endpoints_match() {
        let pl = Polyline::new(vec![
            Point::planar(0.0, 0.0),
            Point::planar(5.0, 0.0),
            Point::planar(10.0, 0.0),
        ]);
        let p = Point::planar(5.0, 7.0);
        let (before, after) = pl.cut(&p, CutMode::Soft).unwrap();
        assert_eq!(before.end().unwrap(), after.start().unwrap());
    }

    #[test]
    fn test_hard_cut_matches_projection() {
        let pl = Polyline::new(vec![Point::planar(0.0, 0.0), Point::planar(10.0, 0.0)]);
        let p = Point::planar(5.0, 7.0);
        let projected = pl.on_track_closest_point(&p).unwrap();
        let (before, after) = pl.cut(&p, CutMode::Hard).unwrap();
        assert!(before.end().unwrap().approx_eq(&projected, 1e-9));
        assert!(after.start().unwrap().approx_eq(&projected, 1e-9));
        assert_eq!(before.end(), after.start());
    }

    #[test]
    fn test_along_track_distance_empty_is_nan() {
        let pl = Polyline::new(vec![Point::planar(0.0, 0.0)]);
        assert!(pl.along_track_distance(&Point::planar(1.0, 1.0)).is_nan());
    }
}
