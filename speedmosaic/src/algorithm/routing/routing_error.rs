use crate::model::DatasetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("route point {index} at ({x}, {y}) cannot be routed: {reason}")]
    PointUnroutable {
        index: usize,
        x: f64,
        y: f64,
        reason: String,
    },
    #[error("no path found between route points {from_index} and {to_index}")]
    NoPathFound { from_index: usize, to_index: usize },
    #[error("invalid route parameters: {0}")]
    InvalidParameters(String),
    #[error("failure building road graph: {0}")]
    GraphBuild(String),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
