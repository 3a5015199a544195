mod probe_record;
mod probe_store;
mod timestamp_format;

pub use probe_record::ProbeRecord;
pub use probe_store::{ProbeLoadOptions, ProbeLoadSummary, ProbeStore};
pub use timestamp_format::parse_timestamp;
