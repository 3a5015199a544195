use super::{JobFailure, MosaicArtifact};
use serde::{Deserialize, Serialize};

/// lifecycle state of a job. the outcome of a terminal state travels with it, so
/// state and result are always replaced together.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum JobState {
    Pending,
    Running,
    Completed { artifact: MosaicArtifact },
    Failed { failure: JobFailure },
}

impl JobState {
    pub fn name(&self) -> &'static str {
        match self {
            JobState::Pending => "PENDING",
            JobState::Running => "RUNNING",
            JobState::Completed { .. } => "COMPLETED",
            JobState::Failed { .. } => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed { .. } | JobState::Failed { .. })
    }

    /// permitted moves: PENDING → RUNNING → COMPLETED | FAILED, and PENDING → FAILED
    /// for jobs cancelled before they start.
    pub fn can_transition_to(&self, next: &JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Pending, JobState::Running)
                | (JobState::Pending, JobState::Failed { .. })
                | (JobState::Running, JobState::Completed { .. })
                | (JobState::Running, JobState::Failed { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::job::FailureKind;

    #[test]
    fn test_transitions_are_monotonic() {
        let failed = JobState::Failed {
            failure: JobFailure::new(FailureKind::Cancelled, "cancelled"),
        };
        assert!(JobState::Pending.can_transition_to(&JobState::Running));
        assert!(JobState::Pending.can_transition_to(&failed));
        assert!(JobState::Running.can_transition_to(&failed));
        assert!(!JobState::Running.can_transition_to(&JobState::Pending));
        assert!(!JobState::Running.can_transition_to(&JobState::Running));
        assert!(!failed.can_transition_to(&JobState::Running));
        assert!(!failed.can_transition_to(&failed));
        assert!(failed.is_terminal());
        assert!(!JobState::Pending.is_terminal());
    }
}
