use thiserror::Error;

/// Outcomes surfaced by the catalog service. Store detail never reaches the caller;
/// it is logged where the store error is adapted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid item id: {0}")]
    InvalidId(String),
    #[error("store unavailable")]
    StoreUnavailable,
    #[error("query failed")]
    QueryFailed,
}

/// Errors raised by a store implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("execution failed: {0}")]
    Execution(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
