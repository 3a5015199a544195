mod config_error;
mod mosaic_config;

pub use config_error::MosaicConfigError;
pub use mosaic_config::{
    DatasetsConfig, GraphConfig, JobsConfig, MosaicConfiguration, ENV_PREFIX, ENV_SEPARATOR,
};
