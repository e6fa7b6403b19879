use thiserror::Error;

/// Errors produced by the orbital state engine.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    #[error("malformed catalog: {0}")]
    MalformedCatalog(String),
    #[error("index {index} out of range for catalog of {len} objects")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("catalog has {metadata} metadata records but {states} propagator states")]
    CatalogLengthMismatch { metadata: usize, states: usize },
    #[error("invalid element set: {0}")]
    InvalidElementSet(String),
    #[error("propagation diverged: {0}")]
    PropagationDivergence(String),
    #[error("geodetic latitude did not converge after {iterations} iterations")]
    ConvergenceError { iterations: usize },
    #[error("satellite {0} not found in catalog")]
    PermalinkMiss(String),
    #[error("computation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
