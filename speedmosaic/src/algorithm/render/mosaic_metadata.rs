use serde::{Deserialize, Serialize};

/// descriptive annotations drawn into the mosaic header and embedded as png text.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MosaicMetadata {
    pub title: String,
    pub data_credit: String,
    /// length of the route the mosaic was built for, when known
    pub route_length_meters: Option<f64>,
}
