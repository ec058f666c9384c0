/// Errors raised by the geodetic/planar geometry kernel.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("cannot compute a direction between two coincident points")]
    Degenerate,
    #[error("latitude {0} is out of range [-90, 90]")]
    OutOfRange(f64),
    #[error("polyline must have at least one point")]
    EmptyPolyline,
    #[error("points belong to different geometry factories (geodetic vs planar)")]
    MismatchedFactory,
}
