use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const PNG_CONTENT_TYPE: &str = "image/png";

/// output of a completed mosaic job.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MosaicArtifact {
    /// file name of the image within the output directory, used for retrieval
    pub artifact_id: String,
    pub path: PathBuf,
    pub csv_path: Option<PathBuf>,
    pub content_type: String,
    pub n_links: usize,
    pub n_buckets: usize,
    pub n_cells: usize,
    pub n_samples: usize,
}
