//! Static, bulk-built spatial index: a Hilbert-packed R-tree over
//! axis-aligned regions.

pub mod error;
pub mod hilbert;
pub mod hprtree;

pub use error::IndexError;
pub use hprtree::HilbertRTree;
