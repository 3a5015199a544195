use super::{
    pipeline::{self, PipelineContext, PipelineSettings},
    DatasetCache, JobError, JobRegistry,
};
use crate::{
    algorithm::render::MosaicRenderer,
    config::MosaicConfiguration,
    model::job::{
        FailureKind, JobFailure, JobId, JobRecord, JobSnapshot, JobState, MosaicArtifact,
        MosaicJobParams, PNG_CONTENT_TYPE,
    },
};
use std::{
    any::Any,
    panic::AssertUnwindSafe,
    path::Path,
    sync::{atomic::Ordering, Arc, Mutex},
    time::Duration,
};
use tokio::{runtime::Handle, task::JoinSet};

/// runs mosaic jobs on background workers and answers status queries about them.
///
/// each submitted job gets one worker on the blocking pool of the given runtime.
/// a job's record is written only by its worker; callers read snapshots.
pub struct JobManager {
    registry: Arc<JobRegistry>,
    cache: Arc<DatasetCache>,
    settings: Arc<PipelineSettings>,
    workers: Mutex<Option<JoinSet<()>>>,
    handle: Handle,
}

impl JobManager {
    pub fn new(config: &MosaicConfiguration, handle: Handle) -> Result<JobManager, JobError> {
        let renderer = MosaicRenderer::new(config.render.clone())?;
        let settings = PipelineSettings {
            output_directory: config.jobs.output_directory.clone(),
            write_csv: config.jobs.write_csv,
            probe_options: config.probe.clone(),
            renderer,
        };
        Ok(JobManager {
            registry: Arc::new(JobRegistry::new()),
            cache: Arc::new(DatasetCache::new(config.graph.link_fields.clone())),
            settings: Arc::new(settings),
            workers: Mutex::new(Some(JoinSet::new())),
            handle,
        })
    }

    /// validates a request, records it as PENDING and hands it to a worker. nothing
    /// is recorded when validation fails.
    pub fn submit(&self, params: MosaicJobParams) -> Result<JobId, JobError> {
        for path in [&params.link_dataset, &params.probe_dataset] {
            if !path.exists() {
                return Err(JobError::InputMissing(path.to_string_lossy().to_string()));
            }
        }
        params.validate().map_err(JobError::InvalidParameters)?;

        let mut guard = self
            .workers
            .lock()
            .map_err(|e| JobError::Internal(format!("worker set lock poisoned: {e}")))?;
        let workers = guard.as_mut().ok_or(JobError::ShutDown)?;
        while let Some(finished) = workers.try_join_next() {
            if let Err(e) = finished {
                log::error!("job worker ended abnormally: {e}");
            }
        }

        let job_id = JobId::new();
        let record = JobRecord::new(job_id, Arc::new(params));
        let params = record.params.clone();
        let cancel = record.cancel.clone();
        self.registry.insert(record)?;
        log::info!("job {job_id} submitted");

        let registry = self.registry.clone();
        let cache = self.cache.clone();
        let settings = self.settings.clone();
        workers.spawn_blocking_on(
            move || {
                let ctx = PipelineContext {
                    job_id,
                    params: &params,
                    cancel: &cancel,
                    cache: &cache,
                    settings: &settings,
                };
                run_job(&registry, &ctx)
            },
            &self.handle,
        );
        Ok(job_id)
    }

    pub fn status(&self, job_id: JobId) -> Result<JobSnapshot, JobError> {
        self.registry.snapshot(job_id)
    }

    /// the artifact of a COMPLETED job
    pub fn result(&self, job_id: JobId) -> Result<MosaicArtifact, JobError> {
        match self.registry.snapshot(job_id)?.state {
            JobState::Completed { artifact } => Ok(artifact),
            other => Err(JobError::ResultNotReady {
                job_id,
                state: other.name().to_string(),
            }),
        }
    }

    /// asks a job to stop at its next stage boundary. a job that has not started
    /// fails without running; terminal jobs are unaffected.
    pub fn cancel(&self, job_id: JobId) -> Result<JobSnapshot, JobError> {
        let flag = self.registry.cancel_flag(job_id)?;
        let snapshot = self.registry.snapshot(job_id)?;
        if !snapshot.state.is_terminal() {
            flag.store(true, Ordering::SeqCst);
            log::info!("job {job_id} cancellation requested");
        }
        self.registry.snapshot(job_id)
    }

    pub fn list(&self) -> Result<Vec<JobSnapshot>, JobError> {
        self.registry.list()
    }

    /// reads an artifact from the output directory. identifiers are bare file
    /// names; anything that could leave the directory is rejected.
    pub fn read_artifact(&self, artifact_id: &str) -> Result<Vec<u8>, JobError> {
        let invalid = artifact_id.is_empty()
            || artifact_id.contains("..")
            || artifact_id.contains('/')
            || artifact_id.contains('\\')
            || Path::new(artifact_id).is_absolute();
        if invalid {
            return Err(JobError::InvalidArtifactId(artifact_id.to_string()));
        }
        let path = self.settings.output_directory.join(artifact_id);
        if !path.is_file() {
            return Err(JobError::ArtifactNotFound(artifact_id.to_string()));
        }
        std::fs::read(&path).map_err(|source| JobError::ArtifactReadError {
            path: path.to_string_lossy().to_string(),
            source,
        })
    }

    /// polls a job until it reaches a terminal state.
    pub async fn wait(
        &self,
        job_id: JobId,
        poll_interval: Duration,
    ) -> Result<JobSnapshot, JobError> {
        loop {
            let snapshot = self.status(job_id)?;
            if snapshot.state.is_terminal() {
                return Ok(snapshot);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// stops accepting jobs and waits for every running worker to finish.
    pub async fn shutdown(&self) {
        let workers = match self.workers.lock() {
            Ok(mut guard) => guard.take(),
            Err(e) => {
                log::error!("worker set lock poisoned during shutdown: {e}");
                None
            }
        };
        if let Some(mut workers) = workers {
            while let Some(finished) = workers.join_next().await {
                if let Err(e) = finished {
                    log::error!("job worker ended abnormally: {e}");
                }
            }
        }
    }
}

/// content type of an artifact, by its file name
pub fn artifact_content_type(artifact_id: &str) -> &'static str {
    if artifact_id.ends_with(".csv") {
        "text/csv"
    } else {
        PNG_CONTENT_TYPE
    }
}

fn run_job(registry: &JobRegistry, ctx: &PipelineContext) {
    let job_id = ctx.job_id;
    if ctx.cancel.load(Ordering::SeqCst) {
        let failure = JobError::Cancelled(job_id).failure();
        finish(registry, job_id, JobState::Failed { failure });
        return;
    }
    if let Err(e) = registry.transition(job_id, JobState::Running) {
        log::error!("job {job_id} could not start: {e}");
        return;
    }
    log::info!("job {job_id} running");

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| pipeline::run_pipeline(ctx)));
    let next = match outcome {
        Ok(Ok(artifact)) => JobState::Completed { artifact },
        Ok(Err(e)) => JobState::Failed {
            failure: e.failure(),
        },
        Err(panic) => JobState::Failed {
            failure: JobFailure::new(
                FailureKind::Internal,
                format!("pipeline panicked: {}", panic_message(panic.as_ref())),
            ),
        },
    };
    finish(registry, job_id, next);
}

fn finish(registry: &JobRegistry, job_id: JobId, next: JobState) {
    match &next {
        JobState::Completed { artifact } => {
            log::info!("job {job_id} completed: {}", artifact.artifact_id)
        }
        JobState::Failed { failure } => log::warn!("job {job_id} failed: {failure}"),
        _ => {}
    }
    if let Err(e) = registry.transition(job_id, next) {
        log::error!("job {job_id} could not record its outcome: {e}");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{link::LinkId, mosaic::DateRange},
        util::test_utils::{ScratchDir, TWO_LINK_CSV},
    };
    use chrono::NaiveDate;
    use std::{path::PathBuf, sync::atomic::AtomicBool};

    #[test]
    fn test_cancel_before_start_fails_pending_job() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 7).expect("test invariant failed: bad date");
        let params = MosaicJobParams {
            link_ids: vec![LinkId::from("A")],
            route_geometry: None,
            date_range: DateRange::from_date(date),
            time_pitch_minutes: 60,
            data_credit: String::new(),
            title: None,
            link_dataset: PathBuf::from("/definitely/not/here/links.csv"),
            probe_dataset: PathBuf::from("/definitely/not/here/probe.csv"),
        };
        let registry = JobRegistry::new();
        let record = JobRecord::new(JobId::new(), Arc::new(params));
        let job_id = record.id;
        let params = record.params.clone();
        registry.insert(record).expect("insert should succeed");

        let cancel = AtomicBool::new(true);
        let cache = DatasetCache::default();
        let settings = PipelineSettings {
            output_directory: PathBuf::from("unused"),
            write_csv: false,
            probe_options: Default::default(),
            renderer: MosaicRenderer::default(),
        };
        let ctx = PipelineContext {
            job_id,
            params: &params,
            cancel: &cancel,
            cache: &cache,
            settings: &settings,
        };
        run_job(&registry, &ctx);
        let snapshot = registry.snapshot(job_id).expect("job should exist");
        match snapshot.state {
            JobState::Failed { failure } => assert_eq!(failure.kind, FailureKind::Cancelled),
            other => panic!("expected FAILED, found {}", other.name()),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancel_running_job_between_stages() {
        let dir = ScratchDir::new("job-manager").expect("test invariant failed: scratch dir");
        let link_dataset = dir
            .write("links.csv", TWO_LINK_CSV)
            .expect("test invariant failed: write fixture");
        let probe_dataset = dir
            .write("probe.csv", "timestamp,speed,link_id\n2025-11-07 08:05:00,30,A\n")
            .expect("test invariant failed: write fixture");
        let mut config = MosaicConfiguration::default();
        config.jobs.output_directory = dir.path().join("out");
        let manager = JobManager::new(&config, Handle::current()).expect("manager should build");

        // the worker blocks on this entry once it is RUNNING
        let entry = manager.cache.entry_for(&link_dataset);
        let held = entry.lock().expect("test invariant failed: entry lock");

        let date = NaiveDate::from_ymd_opt(2025, 11, 7).expect("test invariant failed: bad date");
        let job_id = manager
            .submit(MosaicJobParams {
                link_ids: vec![LinkId::from("A")],
                route_geometry: None,
                date_range: DateRange::from_date(date),
                time_pitch_minutes: 60,
                data_credit: String::new(),
                title: None,
                link_dataset,
                probe_dataset,
            })
            .expect("submit should succeed");

        let mut polls = 0;
        while !matches!(manager.status(job_id).map(|s| s.state), Ok(JobState::Running)) {
            polls += 1;
            assert!(polls < 1000, "job never started");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let snapshot = manager.cancel(job_id).expect("job should exist");
        assert!(snapshot.cancel_requested);
        drop(held);

        let done = manager
            .wait(job_id, Duration::from_millis(5))
            .await
            .expect("job should exist");
        match done.state {
            JobState::Failed { failure } => assert_eq!(failure.kind, FailureKind::Cancelled),
            other => panic!("expected FAILED, found {}", other.name()),
        }
        assert!(!dir.path().join("out").exists());
        manager.shutdown().await;
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("stage exploded");
        assert_eq!(panic_message(payload.as_ref()), "stage exploded");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }

    #[test]
    fn test_artifact_content_type() {
        assert_eq!(artifact_content_type("mosaic_x.png"), "image/png");
        assert_eq!(artifact_content_type("mosaic_x.csv"), "text/csv");
    }
}
