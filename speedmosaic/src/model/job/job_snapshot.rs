use super::{JobId, JobState};
use crate::model::mosaic::DateRange;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// point-in-time copy of a job record returned by status queries
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct JobSnapshot {
    pub job_id: JobId,
    #[serde(flatten)]
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancel_requested: bool,
    pub n_link_ids: usize,
    pub date_range: DateRange,
    pub time_pitch_minutes: i64,
}
