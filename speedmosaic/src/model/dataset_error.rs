use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("dataset not found: '{0}'")]
    DatasetNotFound(String),
    #[error("dataset '{path}' is malformed: {msg}")]
    DatasetMalformed { path: String, msg: String },
    #[error("unsupported dataset file type for '{0}', expected one of [{1}]")]
    UnsupportedFormat(String, String),
    #[error("failure reading dataset '{0}': {1}")]
    ReadError(String, String),
}
