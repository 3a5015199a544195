use super::JobError;
use crate::{algorithm::routing::RoutingError, config::MosaicConfigError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("job {0}")]
    JobFailed(String),
    #[error("failure reading run configuration: {source}")]
    ConfigurationError {
        #[from]
        source: MosaicConfigError,
    },
    #[error("routing failed: {source}")]
    RoutingError {
        #[from]
        source: RoutingError,
    },
    #[error("mosaic job failed: {source}")]
    JobError {
        #[from]
        source: JobError,
    },
    #[error("failure writing output: {source}")]
    StdIoError {
        #[from]
        source: std::io::Error,
    },
    #[error("failure encoding JSON: {source}")]
    SerdeJsonError {
        #[from]
        source: serde_json::Error,
    },
    #[error("failure encoding TOML: {source}")]
    TomlError {
        #[from]
        source: toml::ser::Error,
    },
}
