use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use camino::Utf8Path;
use serde::Serialize;
use tracing::debug;

use crate::domain::{BoundingBox, ConceptId, GranuleListing, TimeRange};
use crate::error::ViirsError;

pub const DEFAULT_TOOL: &str = "cmrfetch";

/// One catalog search: product, time window and area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GranuleQuery {
    pub concept_id: ConceptId,
    pub time_range: TimeRange,
    pub bounding_box: BoundingBox,
}

impl GranuleQuery {
    pub fn search_args(&self) -> Vec<String> {
        vec![
            "granules".to_string(),
            "-c".to_string(),
            self.concept_id.as_str().to_string(),
            "-t".to_string(),
            self.time_range.to_arg(),
            "--bounding-box".to_string(),
            self.bounding_box.to_string(),
        ]
    }

    pub fn download_args(&self, destination: &Utf8Path) -> Vec<String> {
        let mut args = self.search_args();
        args.push("--download".to_string());
        args.push(destination.to_string());
        args
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub path: Option<String>,
    pub version: Option<String>,
}

pub trait CatalogClient {
    /// `Ok(None)` when the catalog has nothing for the query.
    fn search(&self, query: &GranuleQuery) -> Result<Option<GranuleListing>, ViirsError>;
    fn download(&self, query: &GranuleQuery, destination: &Utf8Path) -> Result<(), ViirsError>;
    fn tool_info(&self) -> ToolInfo;
}

/// Runs the catalog tool installed on this machine.
#[derive(Debug, Clone)]
pub struct SystemCatalogClient {
    name: String,
    program: Option<PathBuf>,
}

impl SystemCatalogClient {
    pub fn new(tool: &str) -> Self {
        let program = if tool.contains(std::path::MAIN_SEPARATOR) || tool.contains('/') {
            let path = PathBuf::from(tool);
            path.is_file().then_some(path)
        } else {
            find_in_path(tool)
        };
        Self {
            name: tool.to_string(),
            program,
        }
    }

    pub fn with_program(program: PathBuf) -> Self {
        Self {
            name: program.display().to_string(),
            program: Some(program),
        }
    }

    fn require_program(&self) -> Result<&PathBuf, ViirsError> {
        self.program
            .as_ref()
            .ok_or_else(|| ViirsError::MissingTool(self.name.clone()))
    }

    fn run_cmd(&self, args: &[String]) -> Result<String, ViirsError> {
        let program = self.require_program()?;
        debug!(program = %program.display(), args = ?args, "running catalog tool");
        let output = Command::new(program).args(args).output().map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                ViirsError::MissingTool(self.name.clone())
            } else {
                ViirsError::ToolFailed {
                    tool: self.name.clone(),
                    status: "spawn error".to_string(),
                    message: err.to_string(),
                }
            }
        })?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("command failed: {}", program.display())
        } else {
            stderr
        };
        Err(ViirsError::ToolFailed {
            tool: self.name.clone(),
            status: output.status.to_string(),
            message,
        })
    }
}

impl Default for SystemCatalogClient {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL)
    }
}

impl CatalogClient for SystemCatalogClient {
    fn search(&self, query: &GranuleQuery) -> Result<Option<GranuleListing>, ViirsError> {
        let stdout = self.run_cmd(&query.search_args())?;
        if stdout.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(GranuleListing::new(stdout)))
    }

    fn download(&self, query: &GranuleQuery, destination: &Utf8Path) -> Result<(), ViirsError> {
        self.run_cmd(&query.download_args(destination)).map(|_| ())
    }

    fn tool_info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name.clone(),
            path: self
                .program
                .as_ref()
                .map(|path| path.display().to_string()),
            version: self
                .program
                .as_ref()
                .and_then(|path| tool_version(path, &["--version"])),
        }
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.is_file() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.is_file() {
            return Some(plain);
        }
    }
    None
}

fn tool_version(path: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new(path).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}
