use crate::{
    algorithm::{aggregation::AggregationError, render::RenderError},
    model::{
        job::{FailureKind, JobFailure, JobId},
        DatasetError,
    },
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("input dataset missing: '{0}'")]
    InputMissing(String),
    #[error("invalid job parameters: {0}")]
    InvalidParameters(String),
    #[error("job not found: {0}")]
    JobNotFound(JobId),
    #[error("result of job {job_id} is not ready, job is {state}")]
    ResultNotReady { job_id: JobId, state: String },
    #[error("job {0} was cancelled")]
    Cancelled(JobId),
    #[error("job {job_id} cannot move from {from} to {to}")]
    IllegalTransition {
        job_id: JobId,
        from: String,
        to: String,
    },
    #[error("none of the {0} requested link ids exist in link dataset '{1}'")]
    NoRouteLinks(usize, String),
    #[error("invalid artifact id '{0}'")]
    InvalidArtifactId(String),
    #[error("artifact not found: '{0}'")]
    ArtifactNotFound(String),
    #[error("failure writing '{path}': {source}")]
    ArtifactWriteError {
        path: String,
        source: std::io::Error,
    },
    #[error("failure reading '{path}': {source}")]
    ArtifactReadError {
        path: String,
        source: std::io::Error,
    },
    #[error("failure writing mosaic cells to '{path}': {source}")]
    CsvWriteError { path: String, source: csv::Error },
    #[error("job manager has been shut down")]
    ShutDown,
    #[error("internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl JobError {
    /// summary recorded on a job that failed with this error
    pub fn failure(&self) -> JobFailure {
        let kind = match self {
            JobError::InputMissing(_) => FailureKind::InputMissing,
            JobError::Dataset(DatasetError::DatasetNotFound(_)) => FailureKind::InputMissing,
            JobError::Dataset(_) => FailureKind::DatasetMalformed,
            JobError::NoRouteLinks(..) => FailureKind::NoRouteLinks,
            JobError::InvalidParameters(_) => FailureKind::InvalidParameters,
            JobError::Aggregation(AggregationError::InvalidParameters(_)) => {
                FailureKind::InvalidParameters
            }
            JobError::Render(_) => FailureKind::Render,
            JobError::ArtifactWriteError { .. }
            | JobError::ArtifactReadError { .. }
            | JobError::CsvWriteError { .. } => FailureKind::Io,
            JobError::Cancelled(_) => FailureKind::Cancelled,
            _ => FailureKind::Internal,
        };
        JobFailure::new(kind, self.to_string())
    }
}
