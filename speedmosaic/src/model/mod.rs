mod dataset_error;
pub mod graph;
pub mod job;
pub mod link;
pub mod mosaic;
pub mod probe;

pub use dataset_error::DatasetError;
