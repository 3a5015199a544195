use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("invalid aggregation parameters: {0}")]
    InvalidParameters(String),
}
