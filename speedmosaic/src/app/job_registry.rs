use super::JobError;
use crate::model::job::{JobId, JobRecord, JobSnapshot, JobState};
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{atomic::AtomicBool, Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// synchronized store of job records owned by a job manager. state and outcome
/// change together under the write lock, so readers never see one without the other.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> JobRegistry {
        JobRegistry::default()
    }

    pub fn insert(&self, record: JobRecord) -> Result<(), JobError> {
        let mut jobs = self.write()?;
        if jobs.contains_key(&record.id) {
            return Err(JobError::Internal(format!(
                "job id {} is already registered",
                record.id
            )));
        }
        jobs.insert(record.id, record);
        Ok(())
    }

    pub fn snapshot(&self, job_id: JobId) -> Result<JobSnapshot, JobError> {
        self.read()?
            .get(&job_id)
            .map(|r| r.snapshot())
            .ok_or(JobError::JobNotFound(job_id))
    }

    /// snapshots of every job, oldest submission first
    pub fn list(&self) -> Result<Vec<JobSnapshot>, JobError> {
        let mut snapshots = self
            .read()?
            .values()
            .map(|r| r.snapshot())
            .collect::<Vec<_>>();
        snapshots.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.job_id.cmp(&b.job_id))
        });
        Ok(snapshots)
    }

    pub fn cancel_flag(&self, job_id: JobId) -> Result<Arc<AtomicBool>, JobError> {
        self.read()?
            .get(&job_id)
            .map(|r| r.cancel.clone())
            .ok_or(JobError::JobNotFound(job_id))
    }

    /// moves a job to its next state, rejecting moves that are not monotonic.
    pub fn transition(&self, job_id: JobId, next: JobState) -> Result<(), JobError> {
        let mut jobs = self.write()?;
        let record = jobs
            .get_mut(&job_id)
            .ok_or(JobError::JobNotFound(job_id))?;
        if !record.state.can_transition_to(&next) {
            return Err(JobError::IllegalTransition {
                job_id,
                from: record.state.name().to_string(),
                to: next.name().to_string(),
            });
        }
        log::debug!(
            "job {job_id} {} -> {}",
            record.state.name(),
            next.name()
        );
        record.state = next;
        record.updated_at = Utc::now();
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<JobId, JobRecord>>, JobError> {
        self.jobs
            .read()
            .map_err(|e| JobError::Internal(format!("job registry lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<JobId, JobRecord>>, JobError> {
        self.jobs
            .write()
            .map_err(|e| JobError::Internal(format!("job registry lock poisoned: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        job::{FailureKind, JobFailure, MosaicJobParams},
        link::LinkId,
        mosaic::DateRange,
    };
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn record() -> JobRecord {
        let date = NaiveDate::from_ymd_opt(2025, 11, 7).expect("test invariant failed: bad date");
        let params = MosaicJobParams {
            link_ids: vec![LinkId::from("A")],
            route_geometry: None,
            date_range: DateRange::from_date(date),
            time_pitch_minutes: 60,
            data_credit: String::new(),
            title: None,
            link_dataset: PathBuf::from("links.csv"),
            probe_dataset: PathBuf::from("probe.csv"),
        };
        JobRecord::new(JobId::new(), Arc::new(params))
    }

    fn state(registry: &JobRegistry, id: JobId) -> JobState {
        registry
            .snapshot(id)
            .expect("test invariant failed: job should exist")
            .state
    }

    #[test]
    fn test_lifecycle() {
        let registry = JobRegistry::new();
        let r = record();
        let id = r.id;
        registry.insert(r).expect("insert should succeed");
        assert_eq!(state(&registry, id), JobState::Pending);
        registry
            .transition(id, JobState::Running)
            .expect("pending to running should succeed");
        let failed = JobState::Failed {
            failure: JobFailure::new(FailureKind::Internal, "boom"),
        };
        registry
            .transition(id, failed.clone())
            .expect("running to failed should succeed");
        assert_eq!(state(&registry, id), failed);
        let result = registry.transition(id, JobState::Running);
        assert!(matches!(result, Err(JobError::IllegalTransition { .. })));
        assert_eq!(state(&registry, id), failed);
    }

    #[test]
    fn test_unknown_job() {
        let registry = JobRegistry::new();
        let id = JobId::new();
        assert!(matches!(registry.snapshot(id), Err(JobError::JobNotFound(_))));
        assert!(matches!(
            registry.transition(id, JobState::Running),
            Err(JobError::JobNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let registry = JobRegistry::new();
        let r = record();
        let duplicate = JobRecord::new(r.id, r.params.clone());
        registry.insert(r).expect("insert should succeed");
        assert!(registry.insert(duplicate).is_err());
        assert_eq!(registry.list().map(|l| l.len()).ok(), Some(1));
    }
}
