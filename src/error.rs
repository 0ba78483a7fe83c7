//! Error types in linfa-cart
//!
use thiserror::Error;

/// Simplified `Result` using [`CartError`](crate::CartError) as error type
pub type Result<T> = std::result::Result<T, CartError>;

/// Error variants from hyper-parameter construction, split search or model estimation
#[derive(Error, Debug, Clone)]
pub enum CartError {
    /// A feature type tag other than `real` or `categorical`
    #[error("unknown feature type `{0}`, expected `real` or `categorical`")]
    UnknownFeatureType(String),
    /// A stopping parameter was set to zero
    #[error("{name} should be a positive integer, but was {value}")]
    NonPositiveParam { name: &'static str, value: usize },
    #[error("{expected} feature types were configured, but the records have {found} columns")]
    FeatureTypesMismatch { expected: usize, found: usize },
    #[error("expected `x` and `y` to have the same number of rows, got {0} != {1}")]
    MismatchedShapes(usize, usize),
    #[error("labels have to be 0 or 1, but found {0}")]
    InvalidLabel(usize),
    #[error("feature values have to be finite, found {value} in row {row}, column {col}")]
    NonFiniteValue { row: usize, col: usize, value: f64 },
    #[error("at least one sample is needed")]
    NotEnoughSamples,
    /// The split search was asked to split a feature with a single distinct value
    #[error("a constant feature vector has no split threshold")]
    ConstantFeature,
    #[error(transparent)]
    BaseCrate(#[from] linfa::Error),
}
