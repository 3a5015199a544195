use super::{CellKey, DateRange, MosaicCell};
use crate::model::link::LinkId;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

/// sparse link × time-bucket matrix of average speeds. carries its axes so that
/// consumers can distinguish "no data" cells from cells outside the matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Mosaic {
    link_order: Vec<LinkId>,
    n_buckets: usize,
    time_pitch_minutes: i64,
    date_range: DateRange,
    cells: BTreeMap<CellKey, MosaicCell>,
}

/// flattened cell written to the optional CSV artifact
#[derive(Serialize, Debug)]
pub struct MosaicCsvRow {
    pub link_id: String,
    pub bucket: usize,
    pub bucket_start: NaiveDateTime,
    pub average_speed_kph: f64,
    pub sample_count: usize,
}

impl Mosaic {
    pub fn new(
        link_order: Vec<LinkId>,
        time_pitch_minutes: i64,
        date_range: DateRange,
        cells: BTreeMap<CellKey, MosaicCell>,
    ) -> Mosaic {
        let n_buckets = date_range.n_buckets(Duration::minutes(time_pitch_minutes));
        Mosaic {
            link_order,
            n_buckets,
            time_pitch_minutes,
            date_range,
            cells,
        }
    }

    /// distinct link ids in route order; the column axis.
    pub fn link_order(&self) -> &[LinkId] {
        &self.link_order
    }

    /// the row axis length
    pub fn n_buckets(&self) -> usize {
        self.n_buckets
    }

    pub fn time_pitch_minutes(&self) -> i64 {
        self.time_pitch_minutes
    }

    pub fn time_pitch(&self) -> Duration {
        Duration::minutes(self.time_pitch_minutes)
    }

    pub fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    pub fn cells(&self) -> &BTreeMap<CellKey, MosaicCell> {
        &self.cells
    }

    pub fn get(&self, link_id: &LinkId, bucket: usize) -> Option<&MosaicCell> {
        self.cells.get(&CellKey::new(link_id.clone(), bucket))
    }

    pub fn bucket_start(&self, bucket: usize) -> NaiveDateTime {
        self.date_range.bucket_start(bucket, self.time_pitch())
    }

    /// total probe samples across all cells
    pub fn sample_count(&self) -> usize {
        self.cells.values().map(|c| c.sample_count).sum()
    }

    /// cells in route order, then bucket order.
    pub fn csv_rows(&self) -> Vec<MosaicCsvRow> {
        let mut rows = vec![];
        for link_id in self.link_order.iter() {
            let start = CellKey::new(link_id.clone(), 0);
            let end = CellKey::new(link_id.clone(), usize::MAX);
            for (key, cell) in self.cells.range(start..=end) {
                rows.push(MosaicCsvRow {
                    link_id: key.link_id.to_string(),
                    bucket: key.bucket,
                    bucket_start: self.bucket_start(key.bucket),
                    average_speed_kph: cell.average_speed_kph,
                    sample_count: cell.sample_count,
                });
            }
        }
        rows
    }
}
