//! Geodetic/planar geometry kernel: points, bounding regions, the WGS84
//! Vincenty distance/bearing/projection primitives, and polyline algebra
//! built on top of them.

pub mod error;
pub mod geodesy;
pub mod point;
pub mod polyline;
pub mod region;

pub use error::GeometryError;
pub use point::{GeometryKind, Point};
pub use polyline::{CutMode, Polyline};
pub use region::Region;
