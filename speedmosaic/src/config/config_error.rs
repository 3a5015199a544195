use thiserror::Error;

#[derive(Error, Debug)]
pub enum MosaicConfigError {
    #[error("unsupported configuration file type: {0}, expected .toml or .json")]
    UnsupportedFileType(String),
    #[error("{msg}: {source}")]
    ConfigReadError {
        msg: String,
        source: config::ConfigError,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
