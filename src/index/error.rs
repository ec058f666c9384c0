/// Errors raised by the spatial index.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("insert attempted after the tree was sealed by build()/query()")]
    Sealed,
    #[error("delete is not supported on a static bulk-built index")]
    Unsupported,
}
