use super::{JobId, JobSnapshot, JobState, MosaicJobParams};
use chrono::{DateTime, Utc};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// registry entry of a job. the state is written only by the job's worker; the
/// cancel flag may be raised by anyone holding it.
#[derive(Debug)]
pub struct JobRecord {
    pub id: JobId,
    pub params: Arc<MosaicJobParams>,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancel: Arc<AtomicBool>,
}

impl JobRecord {
    pub fn new(id: JobId, params: Arc<MosaicJobParams>) -> JobRecord {
        let now = Utc::now();
        JobRecord {
            id,
            params,
            state: JobState::Pending,
            submitted_at: now,
            updated_at: now,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.id,
            state: self.state.clone(),
            submitted_at: self.submitted_at,
            updated_at: self.updated_at,
            cancel_requested: self.cancel_requested(),
            n_link_ids: self.params.link_ids.len(),
            date_range: self.params.date_range,
            time_pitch_minutes: self.params.time_pitch_minutes,
        }
    }
}
