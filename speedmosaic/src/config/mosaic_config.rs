use super::MosaicConfigError;
use crate::{
    algorithm::{render::RenderOptions, routing::DEFAULT_MAX_SNAP_DISTANCE_METERS},
    model::{graph::EdgeWeight, link::LinkFieldNames, probe::ProbeLoadOptions},
};
use config::{Config, Environment, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// environment variables with this prefix override file values,
/// e.g. `SPEEDMOSAIC__JOBS__OUTPUT_DIRECTORY`.
pub const ENV_PREFIX: &str = "SPEEDMOSAIC";
/// separates the prefix and nested keys of override variables
pub const ENV_SEPARATOR: &str = "__";

/// defines behaviors for routing and mosaic generation
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct MosaicConfiguration {
    pub graph: GraphConfig,
    pub probe: ProbeLoadOptions,
    pub render: RenderOptions,
    pub jobs: JobsConfig,
    pub datasets: DatasetsConfig,
}

/// road graph construction and snapping
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    pub edge_weight: EdgeWeight,
    pub max_snap_distance_meters: f64,
    pub link_fields: LinkFieldNames,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            edge_weight: EdgeWeight::default(),
            max_snap_distance_meters: DEFAULT_MAX_SNAP_DISTANCE_METERS,
            link_fields: LinkFieldNames::default(),
        }
    }
}

/// background job execution
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct JobsConfig {
    /// directory that mosaic artifacts are written to and served from
    pub output_directory: PathBuf,
    /// also write the sparse cells of each mosaic as CSV
    pub write_csv: bool,
    /// status polling interval used by the command line
    pub poll_interval_millis: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("mosaic_output"),
            write_csv: false,
            poll_interval_millis: 250,
        }
    }
}

/// fallback dataset locations for when none are given on the command line
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct DatasetsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_dataset: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_dataset: Option<PathBuf>,
}

impl MosaicConfiguration {
    /// reads a configuration from an optional TOML or JSON file, then applies
    /// environment overrides. missing values take their defaults.
    pub fn load(file: Option<&Path>) -> Result<MosaicConfiguration, MosaicConfigError> {
        let mut builder = Config::builder();
        let mut source_name = String::from("environment");
        if let Some(path) = file {
            let filename = path.to_string_lossy().to_string();
            let format = match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => FileFormat::Toml,
                Some("json") => FileFormat::Json,
                _ => return Err(MosaicConfigError::UnsupportedFileType(filename)),
            };
            builder = builder.add_source(config::File::new(&filename, format));
            source_name = filename;
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| MosaicConfigError::ConfigReadError {
                msg: format!("failed reading '{source_name}'"),
                source: e,
            })?;
        let result = config
            .try_deserialize::<MosaicConfiguration>()
            .map_err(|e| MosaicConfigError::ConfigReadError {
                msg: format!("failed decoding '{source_name}'"),
                source: e,
            })?;
        result.validate()?;
        Ok(result)
    }

    pub fn validate(&self) -> Result<(), MosaicConfigError> {
        let invalid = MosaicConfigError::InvalidConfiguration;
        self.graph.edge_weight.validate().map_err(invalid)?;
        if !(self.graph.max_snap_distance_meters > 0.0) {
            return Err(invalid(format!(
                "graph.max_snap_distance_meters must be positive, found {}",
                self.graph.max_snap_distance_meters
            )));
        }
        if !(self.probe.match_tolerance_meters > 0.0) {
            return Err(invalid(format!(
                "probe.match_tolerance_meters must be positive, found {}",
                self.probe.match_tolerance_meters
            )));
        }
        self.render
            .validate()
            .map_err(|e| invalid(e.to_string()))?;
        if self.jobs.poll_interval_millis == 0 {
            return Err(invalid(String::from(
                "jobs.poll_interval_millis must be positive",
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_utils::ScratchDir;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = ScratchDir::new("config").expect("test invariant failed: scratch dir");
        let contents = "
[graph]
max_snap_distance_meters = 250.0

[graph.edge_weight]
type = \"travel_time\"
default_speed_kph = 40.0

[jobs]
write_csv = true
";
        let file = dir
            .write("speedmosaic.toml", contents)
            .expect("test invariant failed: write fixture");
        let conf = MosaicConfiguration::load(Some(&file)).expect("config should load");
        assert_eq!(conf.graph.max_snap_distance_meters, 250.0);
        assert_eq!(
            conf.graph.edge_weight,
            EdgeWeight::TravelTime {
                default_speed_kph: 40.0
            }
        );
        assert!(conf.jobs.write_csv);
        assert_eq!(conf.render, RenderOptions::default());
        assert_eq!(conf.probe.match_tolerance_meters, 30.0);
    }

    #[test]
    fn test_json_and_validation() {
        let dir = ScratchDir::new("config").expect("test invariant failed: scratch dir");
        let file = dir
            .write("bad.json", "{\"probe\": {\"match_tolerance_meters\": -1.0}}")
            .expect("test invariant failed: write fixture");
        let result = MosaicConfiguration::load(Some(&file));
        assert!(matches!(
            result,
            Err(MosaicConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = MosaicConfiguration::load(Some(Path::new("speedmosaic.yaml")));
        assert!(matches!(
            result,
            Err(MosaicConfigError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let conf = MosaicConfiguration::default();
        let text = toml::to_string_pretty(&conf).expect("default config should serialize");
        let decoded: MosaicConfiguration = toml::from_str(&text).expect("should decode");
        assert_eq!(conf, decoded);
    }
}
