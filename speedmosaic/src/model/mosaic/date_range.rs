use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// a half-open interval of wall-clock time `[start, end)`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<DateRange, String> {
        let range = DateRange { start, end };
        range.validate()?;
        Ok(range)
    }

    /// the full calendar day of `date`.
    pub fn from_date(date: NaiveDate) -> DateRange {
        let start = date.and_time(chrono::NaiveTime::MIN);
        DateRange {
            start,
            end: start + Duration::days(1),
        }
    }

    /// every calendar day from `first` through `last`, inclusive.
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Result<DateRange, String> {
        let start = first.and_time(chrono::NaiveTime::MIN);
        let end = last.and_time(chrono::NaiveTime::MIN) + Duration::days(1);
        DateRange::new(start, end)
    }

    /// rejects empty and inverted ranges. deserialized ranges bypass [DateRange::new]
    /// and should be validated before use.
    pub fn validate(&self) -> Result<(), String> {
        if self.start >= self.end {
            Err(format!(
                "date range start {} must precede end {}",
                self.start, self.end
            ))
        } else {
            Ok(())
        }
    }

    pub fn contains(&self, t: &NaiveDateTime) -> bool {
        self.start <= *t && *t < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// number of buckets of `pitch` needed to cover the range, counting a trailing
    /// partial bucket.
    pub fn n_buckets(&self, pitch: Duration) -> usize {
        let range_ms = self.duration().num_milliseconds();
        let pitch_ms = pitch.num_milliseconds();
        if range_ms <= 0 || pitch_ms <= 0 {
            return 0;
        }
        ((range_ms + pitch_ms - 1) / pitch_ms) as usize
    }

    /// bucket `[start + k·pitch, start + (k+1)·pitch)` holding `t`, if `t` is in range.
    pub fn bucket_of(&self, t: &NaiveDateTime, pitch: Duration) -> Option<usize> {
        let pitch_ms = pitch.num_milliseconds();
        if !self.contains(t) || pitch_ms <= 0 {
            return None;
        }
        let offset_ms = (*t - self.start).num_milliseconds();
        Some((offset_ms / pitch_ms) as usize)
    }

    pub fn bucket_start(&self, bucket: usize, pitch: Duration) -> NaiveDateTime {
        let bucket = i64::try_from(bucket).unwrap_or(i64::MAX);
        let offset_ms = pitch.num_milliseconds().saturating_mul(bucket);
        Duration::try_milliseconds(offset_ms)
            .and_then(|offset| self.start.checked_add_signed(offset))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}
