use crate::model::{link::LinkId, mosaic::DateRange};
use geo::LineString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// parameter snapshot of a mosaic job, fixed at submission.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MosaicJobParams {
    /// route link ids in traversal order, typically from a route result
    pub link_ids: Vec<LinkId>,
    /// route polyline, used for annotation only
    #[serde(default)]
    pub route_geometry: Option<LineString<f64>>,
    pub date_range: DateRange,
    pub time_pitch_minutes: i64,
    #[serde(default)]
    pub data_credit: String,
    #[serde(default)]
    pub title: Option<String>,
    pub link_dataset: PathBuf,
    pub probe_dataset: PathBuf,
}

impl MosaicJobParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.link_ids.is_empty() {
            return Err(String::from("link ids must not be empty"));
        }
        if self.link_ids.iter().any(|l| l.0.trim().is_empty()) {
            return Err(String::from("link ids must not contain blank values"));
        }
        if self.time_pitch_minutes <= 0 {
            return Err(format!(
                "time pitch must be positive, found {} minutes",
                self.time_pitch_minutes
            ));
        }
        self.date_range.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn params() -> MosaicJobParams {
        let date = NaiveDate::from_ymd_opt(2025, 11, 7).expect("test invariant failed: bad date");
        MosaicJobParams {
            link_ids: vec![LinkId::from("A")],
            route_geometry: None,
            date_range: DateRange::from_date(date),
            time_pitch_minutes: 60,
            data_credit: String::new(),
            title: None,
            link_dataset: PathBuf::from("links.csv"),
            probe_dataset: PathBuf::from("probe.csv"),
        }
    }

    #[test]
    fn test_validate() {
        assert!(params().validate().is_ok());
        let mut no_links = params();
        no_links.link_ids.clear();
        assert!(no_links.validate().is_err());
        let mut zero_pitch = params();
        zero_pitch.time_pitch_minutes = 0;
        assert!(zero_pitch.validate().is_err());
        let mut inverted = params();
        inverted.date_range.end = inverted.date_range.start;
        assert!(inverted.validate().is_err());
    }
}
