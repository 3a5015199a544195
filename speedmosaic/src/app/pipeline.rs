use super::{DatasetCache, JobError};
use crate::{
    algorithm::{
        aggregation,
        render::{MosaicMetadata, MosaicRenderer},
    },
    model::{
        job::{JobId, MosaicArtifact, MosaicJobParams, PNG_CONTENT_TYPE},
        link::LinkId,
        mosaic::Mosaic,
        probe::{ProbeLoadOptions, ProbeStore},
    },
    util::geo_utils,
};
use itertools::Itertools;
use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

const DEFAULT_TITLE: &str = "probe speed mosaic";

/// settings shared by every job of a manager
#[derive(Debug)]
pub struct PipelineSettings {
    pub output_directory: PathBuf,
    pub write_csv: bool,
    pub probe_options: ProbeLoadOptions,
    pub renderer: MosaicRenderer,
}

/// everything one run of the mosaic pipeline reads.
pub struct PipelineContext<'a> {
    pub job_id: JobId,
    pub params: &'a MosaicJobParams,
    pub cancel: &'a AtomicBool,
    pub cache: &'a DatasetCache,
    pub settings: &'a PipelineSettings,
}

impl PipelineContext<'_> {
    fn check_cancel(&self) -> Result<(), JobError> {
        if self.cancel.load(Ordering::SeqCst) {
            Err(JobError::Cancelled(self.job_id))
        } else {
            Ok(())
        }
    }
}

/// name of the image artifact of a job
pub fn artifact_filename(job_id: JobId) -> String {
    format!("mosaic_{job_id}.png")
}

/// name of the optional cell table of a job
pub fn cells_filename(job_id: JobId) -> String {
    format!("mosaic_{job_id}.csv")
}

/// runs route consumption, probe loading, aggregation, rendering and persistence,
/// checking for cancellation between stages.
pub fn run_pipeline(ctx: &PipelineContext) -> Result<MosaicArtifact, JobError> {
    let params = ctx.params;
    ctx.check_cancel()?;
    let store = ctx.cache.geometry(&params.link_dataset)?;
    let (link_ids, unknown): (Vec<LinkId>, Vec<LinkId>) = params
        .link_ids
        .iter()
        .cloned()
        .partition(|l| store.contains(l));
    if !unknown.is_empty() {
        log::warn!(
            "job {}: dropping {} link ids not in {}: {}",
            ctx.job_id,
            unknown.len(),
            store.source(),
            unknown.iter().take(10).join(", ")
        );
    }
    if link_ids.is_empty() {
        return Err(JobError::NoRouteLinks(
            params.link_ids.len(),
            store.source().to_string(),
        ));
    }

    ctx.check_cancel()?;
    let probes = ProbeStore::load(
        &params.probe_dataset,
        Some(store.as_ref()),
        &ctx.settings.probe_options,
    )?;

    ctx.check_cancel()?;
    let mosaic = aggregation::aggregate(
        &link_ids,
        probes.records(),
        params.time_pitch_minutes,
        &params.date_range,
    )?;

    ctx.check_cancel()?;
    let metadata = MosaicMetadata {
        title: params
            .title
            .clone()
            .unwrap_or_else(|| String::from(DEFAULT_TITLE)),
        data_credit: params.data_credit.clone(),
        route_length_meters: params
            .route_geometry
            .as_ref()
            .map(geo_utils::linestring_meters),
    };
    let png_bytes = ctx.settings.renderer.render(&mosaic, &metadata)?;

    ctx.check_cancel()?;
    persist(ctx, &mosaic, &png_bytes)
}

fn persist(
    ctx: &PipelineContext,
    mosaic: &Mosaic,
    png_bytes: &[u8],
) -> Result<MosaicArtifact, JobError> {
    let directory = &ctx.settings.output_directory;
    std::fs::create_dir_all(directory).map_err(|source| JobError::ArtifactWriteError {
        path: directory.to_string_lossy().to_string(),
        source,
    })?;
    let artifact_id = artifact_filename(ctx.job_id);
    let path = directory.join(&artifact_id);
    write_atomically(&path, png_bytes)?;

    let csv_path = if ctx.settings.write_csv {
        let csv_path = directory.join(cells_filename(ctx.job_id));
        write_cells(&csv_path, mosaic)?;
        Some(csv_path)
    } else {
        None
    };
    log::info!(
        "job {}: wrote mosaic of {} cells to {}",
        ctx.job_id,
        mosaic.cells().len(),
        path.to_string_lossy()
    );
    Ok(MosaicArtifact {
        artifact_id,
        path,
        csv_path,
        content_type: String::from(PNG_CONTENT_TYPE),
        n_links: mosaic.link_order().len(),
        n_buckets: mosaic.n_buckets(),
        n_cells: mosaic.cells().len(),
        n_samples: mosaic.sample_count(),
    })
}

/// writes to a sibling temporary file and renames it into place so that readers
/// never observe a partial artifact.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), JobError> {
    let write_error = |source| JobError::ArtifactWriteError {
        path: path.to_string_lossy().to_string(),
        source,
    };
    let tmp = path.with_extension("png.tmp");
    std::fs::write(&tmp, bytes).map_err(write_error)?;
    std::fs::rename(&tmp, path).map_err(write_error)
}

fn write_cells(path: &Path, mosaic: &Mosaic) -> Result<(), JobError> {
    let csv_error = |source| JobError::CsvWriteError {
        path: path.to_string_lossy().to_string(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in mosaic.csv_rows() {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer
        .flush()
        .map_err(|source| JobError::ArtifactWriteError {
            path: path.to_string_lossy().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::mosaic::DateRange,
        util::test_utils::{ScratchDir, TWO_LINK_CSV},
    };
    use chrono::NaiveDate;

    const PROBES: &str = "timestamp,speed,link_id
2025-11-07 08:05:00,30,A
2025-11-07 08:20:00,40,A
2025-11-07 08:55:00,50,A
2025-11-07 09:10:00,20,B
";

    struct Fixture {
        dir: ScratchDir,
        params: MosaicJobParams,
        settings: PipelineSettings,
    }

    fn fixture(link_ids: &[&str]) -> Fixture {
        let dir = ScratchDir::new("pipeline").expect("test invariant failed: scratch dir");
        let link_dataset = dir
            .write("links.csv", TWO_LINK_CSV)
            .expect("test invariant failed: write fixture");
        let probe_dataset = dir
            .write("probe.csv", PROBES)
            .expect("test invariant failed: write fixture");
        let date = NaiveDate::from_ymd_opt(2025, 11, 7).expect("test invariant failed: bad date");
        let params = MosaicJobParams {
            link_ids: link_ids.iter().map(|l| LinkId::from(*l)).collect(),
            route_geometry: None,
            date_range: DateRange::from_date(date),
            time_pitch_minutes: 60,
            data_credit: String::from("test probes"),
            title: None,
            link_dataset,
            probe_dataset,
        };
        let settings = PipelineSettings {
            output_directory: dir.path().join("out"),
            write_csv: true,
            probe_options: ProbeLoadOptions::default(),
            renderer: MosaicRenderer::default(),
        };
        Fixture {
            dir,
            params,
            settings,
        }
    }

    #[test]
    fn test_writes_png_and_cells() {
        let f = fixture(&["A", "B", "Z"]);
        let cache = DatasetCache::default();
        let cancel = AtomicBool::new(false);
        let ctx = PipelineContext {
            job_id: JobId::new(),
            params: &f.params,
            cancel: &cancel,
            cache: &cache,
            settings: &f.settings,
        };
        let artifact = run_pipeline(&ctx).expect("pipeline should succeed");
        assert_eq!(artifact.artifact_id, artifact_filename(ctx.job_id));
        assert_eq!(artifact.n_links, 2);
        assert_eq!(artifact.n_cells, 2);
        assert_eq!(artifact.n_samples, 4);
        let png = std::fs::read(&artifact.path).expect("png should exist");
        assert_eq!(&png[1..4], b"PNG");
        let csv_path = artifact.csv_path.expect("csv should be written");
        let cells = std::fs::read_to_string(csv_path).expect("csv should exist");
        assert!(cells.starts_with("link_id,bucket,bucket_start,average_speed_kph,sample_count"));
        assert!(cells.contains("A,8,2025-11-07T08:00:00,40.0,3"));
        assert!(f.dir.path().join("out").is_dir());
    }

    #[test]
    fn test_unknown_links_only() {
        let f = fixture(&["Q", "R"]);
        let cache = DatasetCache::default();
        let cancel = AtomicBool::new(false);
        let ctx = PipelineContext {
            job_id: JobId::new(),
            params: &f.params,
            cancel: &cancel,
            cache: &cache,
            settings: &f.settings,
        };
        let result = run_pipeline(&ctx);
        assert!(matches!(result, Err(JobError::NoRouteLinks(2, _))));
    }

    #[test]
    fn test_cancelled_before_first_stage() {
        let f = fixture(&["A"]);
        let cache = DatasetCache::default();
        let cancel = AtomicBool::new(true);
        let ctx = PipelineContext {
            job_id: JobId::new(),
            params: &f.params,
            cancel: &cancel,
            cache: &cache,
            settings: &f.settings,
        };
        let result = run_pipeline(&ctx);
        assert!(matches!(result, Err(JobError::Cancelled(_))));
        assert!(cache.is_empty());
        assert!(!f.dir.path().join("out").exists());
    }
}
