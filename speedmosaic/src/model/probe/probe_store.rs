use super::{timestamp_format, ProbeRecord};
use crate::model::{
    link::{GeometryStore, LinkId},
    DatasetError,
};
use geo::Coord;
use kdam::tqdm;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// the number of per-row problems logged at warn level before the rest are
/// demoted to debug.
const MAX_LOGGED_ROW_WARNINGS: usize = 10;

/// behaviors applied while loading a probe dataset
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ProbeLoadOptions {
    /// records with raw positions are matched to the nearest link no farther than this
    pub match_tolerance_meters: f64,
}

impl Default for ProbeLoadOptions {
    fn default() -> Self {
        Self {
            match_tolerance_meters: 30.0,
        }
    }
}

/// diagnostic counts from a probe dataset load.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeLoadSummary {
    pub rows_read: usize,
    pub loaded: usize,
    pub malformed: usize,
    /// records with no link within tolerance or with a link id outside the link dataset
    pub unmatched: usize,
    /// loaded records that carried a position instead of a link id
    pub matched_by_position: usize,
}

/// a row of a probe CSV dataset
#[derive(Deserialize, Debug)]
struct ProbeRow {
    #[serde(alias = "time", alias = "datetime")]
    timestamp: String,
    #[serde(alias = "speed_kph", alias = "velocity")]
    speed: f64,
    #[serde(default)]
    link_id: Option<String>,
    #[serde(default, alias = "lon", alias = "longitude")]
    x: Option<f64>,
    #[serde(default, alias = "lat", alias = "latitude")]
    y: Option<f64>,
}

enum RowOutcome {
    Loaded {
        record: ProbeRecord,
        by_position: bool,
    },
    Malformed(String),
    Unmatched,
}

/// probe records of one dataset load. loads are owned by the job that made them.
#[derive(Debug, Clone)]
pub struct ProbeStore {
    source: String,
    records: Vec<ProbeRecord>,
    summary: ProbeLoadSummary,
}

impl ProbeStore {
    /// reads a probe CSV. when a geometry store is given, positional records are
    /// map-matched to it and link ids are checked against it; otherwise positional
    /// records cannot be matched and are counted as unmatched.
    pub fn load(
        path: &Path,
        geometry: Option<&GeometryStore>,
        options: &ProbeLoadOptions,
    ) -> Result<ProbeStore, DatasetError> {
        let source = path.to_string_lossy().to_string();
        if !path.exists() {
            return Err(DatasetError::DatasetNotFound(source));
        }
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DatasetError::ReadError(source.clone(), e.to_string()))?;

        let mut rows: Vec<Result<ProbeRow, String>> = vec![];
        let iter = tqdm!(reader.deserialize::<ProbeRow>(), desc = "read probe csv");
        for (idx, row) in iter.enumerate() {
            rows.push(row.map_err(|e| format!("row {idx}: {e}")));
        }
        eprintln!();

        let outcomes: Vec<RowOutcome> = rows
            .into_par_iter()
            .map(|row| match row {
                Ok(r) => classify_row(r, geometry, options.match_tolerance_meters),
                Err(e) => RowOutcome::Malformed(e),
            })
            .collect();

        let mut summary = ProbeLoadSummary {
            rows_read: outcomes.len(),
            ..Default::default()
        };
        let mut records = Vec::with_capacity(outcomes.len());
        for outcome in outcomes.into_iter() {
            match outcome {
                RowOutcome::Loaded {
                    record,
                    by_position,
                } => {
                    if by_position {
                        summary.matched_by_position += 1;
                    }
                    records.push(record);
                }
                RowOutcome::Malformed(msg) => {
                    if summary.malformed < MAX_LOGGED_ROW_WARNINGS {
                        log::warn!("skipping malformed probe record in {source}: {msg}");
                    } else {
                        log::debug!("skipping malformed probe record in {source}: {msg}");
                    }
                    summary.malformed += 1;
                }
                RowOutcome::Unmatched => summary.unmatched += 1,
            }
        }
        summary.loaded = records.len();

        log::info!(
            "probe dataset {source}: read {}, loaded {} ({} by position), malformed {}, unmatched {}",
            summary.rows_read,
            summary.loaded,
            summary.matched_by_position,
            summary.malformed,
            summary.unmatched
        );
        if records.is_empty() {
            return Err(DatasetError::DatasetMalformed {
                path: source,
                msg: format!(
                    "no usable probe records ({} rows read, {} malformed, {} unmatched)",
                    summary.rows_read, summary.malformed, summary.unmatched
                ),
            });
        }
        Ok(ProbeStore {
            source,
            records,
            summary,
        })
    }

    /// wraps already-matched records
    pub fn from_records(source: &str, records: Vec<ProbeRecord>) -> ProbeStore {
        let summary = ProbeLoadSummary {
            rows_read: records.len(),
            loaded: records.len(),
            ..Default::default()
        };
        ProbeStore {
            source: source.to_string(),
            records,
            summary,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn records(&self) -> &[ProbeRecord] {
        &self.records
    }

    pub fn summary(&self) -> &ProbeLoadSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn classify_row(
    row: ProbeRow,
    geometry: Option<&GeometryStore>,
    tolerance_meters: f64,
) -> RowOutcome {
    let timestamp = match timestamp_format::parse_timestamp(&row.timestamp) {
        Ok(t) => t,
        Err(e) => return RowOutcome::Malformed(e),
    };
    if !row.speed.is_finite() || row.speed < 0.0 {
        return RowOutcome::Malformed(format!("invalid speed {}", row.speed));
    }
    let link_id = row
        .link_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    match (link_id, row.x, row.y) {
        (Some(id), _, _) => {
            let link_id = LinkId(id);
            match geometry {
                Some(g) if !g.contains(&link_id) => RowOutcome::Unmatched,
                _ => RowOutcome::Loaded {
                    record: ProbeRecord::new(timestamp, link_id, row.speed),
                    by_position: false,
                },
            }
        }
        (None, Some(x), Some(y)) if x.is_finite() && y.is_finite() => {
            let matched = geometry
                .and_then(|g| g.nearest_link_within(Coord { x, y }, tolerance_meters));
            match matched {
                Some((link, _)) => RowOutcome::Loaded {
                    record: ProbeRecord::new(timestamp, link.id.clone(), row.speed),
                    by_position: true,
                },
                None => RowOutcome::Unmatched,
            }
        }
        _ => RowOutcome::Malformed(String::from(
            "record has neither a link id nor a complete position",
        )),
    }
}
