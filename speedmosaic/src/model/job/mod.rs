mod job_failure;
mod job_id;
mod job_record;
mod job_snapshot;
mod job_state;
mod mosaic_artifact;
mod mosaic_job_params;

pub use job_failure::{FailureKind, JobFailure};
pub use job_id::JobId;
pub use job_record::JobRecord;
pub use job_snapshot::JobSnapshot;
pub use job_state::JobState;
pub use mosaic_artifact::{MosaicArtifact, PNG_CONTENT_TYPE};
pub use mosaic_job_params::MosaicJobParams;
