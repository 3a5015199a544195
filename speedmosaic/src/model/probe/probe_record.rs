use crate::model::link::LinkId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// a single speed observation attributed to a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub timestamp: NaiveDateTime,
    pub link_id: LinkId,
    /// instantaneous speed in km/h
    pub speed_kph: f64,
}

impl ProbeRecord {
    pub fn new(timestamp: NaiveDateTime, link_id: LinkId, speed_kph: f64) -> ProbeRecord {
        ProbeRecord {
            timestamp,
            link_id,
            speed_kph,
        }
    }
}
