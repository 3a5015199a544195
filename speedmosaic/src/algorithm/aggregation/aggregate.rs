use super::{running_mean, AggregationError};
use crate::model::{
    link::LinkId,
    mosaic::{CellKey, DateRange, Mosaic, MosaicCell},
    probe::ProbeRecord,
};
use chrono::Duration;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

/// buckets probe speeds by (link, time bucket) and averages each cell.
///
/// bucket `k` covers `[start + k·pitch, start + (k+1)·pitch)` and the date range is
/// half-open, so a sample at exactly `date_range.end` is excluded. samples on links
/// outside `link_ids` are ignored. cells without samples are absent from the
/// result. repeated link ids keep their first position in the column order.
pub fn aggregate(
    link_ids: &[LinkId],
    probes: &[ProbeRecord],
    time_pitch_minutes: i64,
    date_range: &DateRange,
) -> Result<Mosaic, AggregationError> {
    if time_pitch_minutes <= 0 {
        return Err(AggregationError::InvalidParameters(format!(
            "time pitch must be positive, found {time_pitch_minutes} minutes"
        )));
    }
    if link_ids.is_empty() {
        return Err(AggregationError::InvalidParameters(String::from(
            "link ids must not be empty",
        )));
    }
    date_range
        .validate()
        .map_err(AggregationError::InvalidParameters)?;

    let pitch = Duration::minutes(time_pitch_minutes);
    let mut seen: HashSet<&LinkId> = HashSet::with_capacity(link_ids.len());
    let link_order: Vec<LinkId> = link_ids
        .iter()
        .filter(|l| seen.insert(*l))
        .cloned()
        .collect();

    let mut samples: HashMap<CellKey, Vec<f64>> = HashMap::new();
    let mut outside_range = 0;
    for probe in probes.iter() {
        if !seen.contains(&probe.link_id) {
            continue;
        }
        match date_range.bucket_of(&probe.timestamp, pitch) {
            Some(bucket) => samples
                .entry(CellKey::new(probe.link_id.clone(), bucket))
                .or_default()
                .push(probe.speed_kph),
            None => outside_range += 1,
        }
    }
    if outside_range > 0 {
        log::debug!("{outside_range} route probe samples fall outside {date_range}");
    }

    let cells: BTreeMap<CellKey, MosaicCell> = samples
        .into_par_iter()
        .filter_map(|(key, mut values)| {
            let acc = running_mean::stable_mean(&mut values);
            acc.mean().map(|average_speed_kph| {
                let cell = MosaicCell {
                    average_speed_kph,
                    sample_count: acc.count(),
                };
                (key, cell)
            })
        })
        .collect();

    log::info!(
        "aggregated {} cells over {} links and {} buckets",
        cells.len(),
        link_order.len(),
        date_range.n_buckets(pitch)
    );
    Ok(Mosaic::new(link_order, time_pitch_minutes, *date_range, cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 7)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("test invariant failed: bad time")
    }

    fn day() -> DateRange {
        DateRange::new(at(0, 0), at(0, 0) + Duration::days(1))
            .expect("test invariant failed: bad range")
    }

    fn probe(h: u32, m: u32, link: &str, speed: f64) -> ProbeRecord {
        ProbeRecord::new(at(h, m), LinkId::from(link), speed)
    }

    #[test]
    fn test_single_bucket_average() {
        let probes = vec![
            probe(8, 5, "A", 30.0),
            probe(8, 20, "A", 40.0),
            probe(8, 55, "A", 50.0),
        ];
        let mosaic = aggregate(&[LinkId::from("A")], &probes, 60, &day())
            .expect("aggregate should succeed");
        let cell = mosaic.get(&LinkId::from("A"), 8).expect("cell should exist");
        assert_eq!(cell.average_speed_kph, 40.0);
        assert_eq!(cell.sample_count, 3);
        assert_eq!(mosaic.cells().len(), 1);
    }

    #[test]
    fn test_shuffled_input_same_mosaic() {
        let probes = vec![
            probe(0, 1, "A", 13.7),
            probe(0, 2, "A", 99.1),
            probe(0, 3, "A", 0.3),
            probe(0, 4, "B", 22.2),
            probe(1, 0, "A", 41.0),
            probe(0, 9, "A", 57.77),
        ];
        let links = [LinkId::from("A"), LinkId::from("B")];
        let first = aggregate(&links, &probes, 30, &day()).expect("aggregate should succeed");
        let mut shuffled = probes.clone();
        shuffled.reverse();
        shuffled.swap(1, 4);
        let second = aggregate(&links, &shuffled, 30, &day()).expect("aggregate should succeed");
        assert_eq!(first, second);
        assert_eq!(first.cells().len(), 3);
    }

    #[test]
    fn test_filters_links_and_range() {
        let next_day = at(0, 0) + Duration::days(1);
        let probes = vec![
            probe(3, 0, "C", 10.0),
            ProbeRecord::new(next_day, LinkId::from("A"), 10.0),
            probe(23, 59, "A", 20.0),
        ];
        let links = [LinkId::from("B"), LinkId::from("A"), LinkId::from("B")];
        let mosaic = aggregate(&links, &probes, 60, &day()).expect("aggregate should succeed");
        assert_eq!(mosaic.link_order(), &[LinkId::from("B"), LinkId::from("A")]);
        assert_eq!(mosaic.n_buckets(), 24);
        assert_eq!(mosaic.cells().len(), 1);
        assert!(mosaic.get(&LinkId::from("A"), 23).is_some());
    }

    #[test]
    fn test_empty_probes_is_valid() {
        let mosaic = aggregate(&[LinkId::from("A")], &[], 15, &day())
            .expect("aggregate should succeed");
        assert!(mosaic.cells().is_empty());
        assert_eq!(mosaic.n_buckets(), 96);
    }

    #[test]
    fn test_invalid_parameters() {
        let links = [LinkId::from("A")];
        assert!(aggregate(&links, &[], 0, &day()).is_err());
        assert!(aggregate(&links, &[], -5, &day()).is_err());
        assert!(aggregate(&[], &[], 60, &day()).is_err());
        let empty = DateRange {
            start: at(5, 0),
            end: at(5, 0),
        };
        assert!(matches!(
            aggregate(&links, &[], 60, &empty),
            Err(AggregationError::InvalidParameters(_))
        ));
    }
}
