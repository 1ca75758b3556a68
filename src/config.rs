use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::cmr::{DEFAULT_TOOL, GranuleQuery};
use crate::domain::{BoundingBox, ConceptId, TimeRange, parse_date, parse_timestamp};
use crate::error::ViirsError;

pub const CONFIG_FILE_NAME: &str = "viirs-fetch.json";
pub const DEFAULT_CONCEPT_ID: &str = "C1562021084-LAADS";
pub const DEFAULT_BOUNDING_BOX: &str = "130.0,42.3,131.5,43.2";
pub const DEFAULT_START: &str = "2025-02-16T00:00:00Z";
pub const DEFAULT_END: &str = "2025-02-16T23:59:59Z";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub concept_id: Option<String>,
    #[serde(default)]
    pub bounding_box: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    /// `YYYY-MM-DD`; wins over `start`/`end` from the same source.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
}

/// Values given on the command line; each one replaces the file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub concept_id: Option<String>,
    pub bounding_box: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub date: Option<String>,
    pub output_dir: Option<String>,
    pub tool: Option<String>,
}

impl Config {
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        fn merge(target: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *target = value;
            }
        }
        if overrides.start.is_some() || overrides.end.is_some() {
            self.date = None;
        }
        merge(&mut self.concept_id, overrides.concept_id);
        merge(&mut self.bounding_box, overrides.bounding_box);
        merge(&mut self.start, overrides.start);
        merge(&mut self.end, overrides.end);
        merge(&mut self.date, overrides.date);
        merge(&mut self.output_dir, overrides.output_dir);
        merge(&mut self.tool, overrides.tool);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub query: GranuleQuery,
    pub output_dir: Utf8PathBuf,
    pub tool: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `viirs-fetch.json` from the current directory when
    /// present, falling back to built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Config, ViirsError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE_NAME),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ViirsError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| ViirsError::ConfigParse(err.to_string()))
    }

    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, ViirsError> {
        let config = Self::load(path)?.apply(overrides);
        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, ViirsError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let concept_id: ConceptId = config
            .concept_id
            .as_deref()
            .unwrap_or(DEFAULT_CONCEPT_ID)
            .parse()?;
        let bounding_box: BoundingBox = config
            .bounding_box
            .as_deref()
            .unwrap_or(DEFAULT_BOUNDING_BOX)
            .parse()?;
        let time_range = match config.date.as_deref() {
            Some(date) => TimeRange::day(parse_date(date)?),
            None => TimeRange::new(
                parse_timestamp(config.start.as_deref().unwrap_or(DEFAULT_START))?,
                parse_timestamp(config.end.as_deref().unwrap_or(DEFAULT_END))?,
            )?,
        };
        let output_dir = config
            .output_dir
            .map(Utf8PathBuf::from)
            .unwrap_or_else(default_output_dir);

        Ok(ResolvedConfig {
            schema_version,
            query: GranuleQuery {
                concept_id,
                time_range,
                bounding_box,
            },
            output_dir,
            tool: config.tool.unwrap_or_else(|| DEFAULT_TOOL.to_string()),
        })
    }
}

/// `<home>/Desktop/file_VIIRS`, or the same path relative to the working
/// directory when no home directory is known.
pub fn default_output_dir() -> Utf8PathBuf {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.home_dir().join("Desktop").join("file_VIIRS")).ok()
        })
        .unwrap_or_else(|| Utf8PathBuf::from("Desktop").join("file_VIIRS"))
}
