use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ViirsError {
    #[error("invalid concept id: {0}")]
    InvalidConceptId(String),

    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid time range: start {start} is after end {end}")]
    InvalidTimeRange { start: String, end: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("required tool not found: {0}")]
    #[diagnostic(help("install cmrfetch and make sure it is available on PATH"))]
    MissingTool(String),

    #[error("{tool} exited with {status}: {message}")]
    ToolFailed {
        tool: String,
        status: String,
        message: String,
    },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("netCDF error in {path}: {message}")]
    NetCdf { path: String, message: String },

    #[error("missing variable: {0}")]
    MissingVariable(String),

    #[error("unexpected shape for {name}: {message}")]
    Shape { name: String, message: String },

    #[error("cannot resample empty {0} axis")]
    EmptyAxis(String),
}
