use crate::model::link::LinkId;
use serde::{Deserialize, Serialize};

/// position of a cell in the mosaic: a link and a time bucket index.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub link_id: LinkId,
    pub bucket: usize,
}

impl CellKey {
    pub fn new(link_id: LinkId, bucket: usize) -> CellKey {
        CellKey { link_id, bucket }
    }
}

/// aggregate of the probe samples falling in one cell. only cells with at least one
/// sample exist.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct MosaicCell {
    pub average_speed_kph: f64,
    pub sample_count: usize,
}
