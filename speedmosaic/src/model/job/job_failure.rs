use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// classification of a failed job, stable enough for clients to branch on.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InputMissing,
    DatasetMalformed,
    /// none of the requested link ids exist in the link dataset
    NoRouteLinks,
    InvalidParameters,
    Render,
    Io,
    Cancelled,
    Internal,
}

/// human-readable summary of a failed job
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> JobFailure {
        JobFailure {
            kind,
            message: message.into(),
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::InputMissing => "input missing",
            FailureKind::DatasetMalformed => "dataset malformed",
            FailureKind::NoRouteLinks => "no route links",
            FailureKind::InvalidParameters => "invalid parameters",
            FailureKind::Render => "render",
            FailureKind::Io => "io",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

impl Display for JobFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
