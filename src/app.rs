use std::fs;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;
use tracing::{info, warn};

use crate::cmr::{CatalogClient, GranuleQuery, ToolInfo};
use crate::config::ResolvedConfig;
use crate::convert::{ConversionReport, Converter};
use crate::domain::GranuleListing;
use crate::error::ViirsError;
use crate::granule::{GranuleReader, GranuleWriter};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Skip conversion when the download step failed.
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    Skipped,
    Succeeded,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub query: GranuleQuery,
    pub output_dir: String,
    pub granules: Option<GranuleListing>,
    pub download: DownloadOutcome,
    pub conversion: Option<ConversionReport>,
}

impl RunReport {
    pub fn exit_code(&self) -> u8 {
        if self.granules.is_none() {
            return 2;
        }
        let download_failed = matches!(self.download, DownloadOutcome::Failed { .. });
        let files_failed = self
            .conversion
            .as_ref()
            .map(|report| report.failed() > 0)
            .unwrap_or(false);
        if download_failed || files_failed { 4 } else { 0 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub query: GranuleQuery,
    pub granules: Option<GranuleListing>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    pub query: GranuleQuery,
    pub output_dir: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Lookup, download and conversion wired together.
pub struct App<C: CatalogClient, R: GranuleReader, W: GranuleWriter> {
    catalog: C,
    converter: Converter<R, W>,
}

impl<C: CatalogClient, R: GranuleReader, W: GranuleWriter> App<C, R, W> {
    pub fn new(catalog: C, reader: R, writer: W) -> Self {
        Self {
            catalog,
            converter: Converter::new(reader, writer),
        }
    }

    pub fn tool_info(&self) -> ToolInfo {
        self.catalog.tool_info()
    }

    pub fn search(
        &self,
        query: &GranuleQuery,
        sink: &dyn ProgressSink,
    ) -> Result<SearchResult, ViirsError> {
        sink.event(ProgressEvent {
            message: format!(
                "phase=Lookup; {} {} [{}]",
                query.concept_id, query.time_range, query.bounding_box
            ),
            elapsed: None,
        });
        let started = Instant::now();
        let granules = self.catalog.search(query)?;
        match &granules {
            Some(listing) => {
                info!(concept_id = %query.concept_id, "granules found");
                sink.event(ProgressEvent {
                    message: format!("phase=Lookup; granules found:\n{}", listing.as_str().trim_end()),
                    elapsed: Some(started.elapsed()),
                });
            }
            None => {
                sink.event(ProgressEvent {
                    message: format!(
                        "phase=Lookup; no granules found for {} in the requested period and area",
                        query.concept_id
                    ),
                    elapsed: Some(started.elapsed()),
                });
            }
        }
        Ok(SearchResult {
            query: query.clone(),
            granules,
        })
    }

    pub fn download(
        &self,
        query: &GranuleQuery,
        output_dir: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<DownloadResult, ViirsError> {
        sink.event(ProgressEvent {
            message: format!("phase=Download; {} -> {output_dir}", query.concept_id),
            elapsed: None,
        });
        let started = Instant::now();
        fs::create_dir_all(output_dir.as_std_path())
            .map_err(|err| ViirsError::Filesystem(format!("create {output_dir}: {err}")))?;
        self.catalog.download(query, output_dir)?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Download; data for {} downloaded to {output_dir}",
                query.concept_id
            ),
            elapsed: Some(started.elapsed()),
        });
        Ok(DownloadResult {
            query: query.clone(),
            output_dir: output_dir.to_string(),
        })
    }

    pub fn convert(
        &self,
        dir: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<ConversionReport, ViirsError> {
        self.converter.convert_directory(dir, sink)
    }

    /// Full pipeline. Lookup failures are returned as errors; an empty
    /// lookup ends the run early. Conversion runs after a failed download
    /// unless `options.strict` is set.
    pub fn run(
        &self,
        config: &ResolvedConfig,
        options: RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<RunReport, ViirsError> {
        let output_dir = config.output_dir.as_path();
        fs::create_dir_all(output_dir.as_std_path())
            .map_err(|err| ViirsError::Filesystem(format!("create {output_dir}: {err}")))?;

        let search = self.search(&config.query, sink)?;
        let mut report = RunReport {
            query: config.query.clone(),
            output_dir: output_dir.to_string(),
            granules: search.granules,
            download: DownloadOutcome::Skipped,
            conversion: None,
        };
        if report.granules.is_none() {
            return Ok(report);
        }

        report.download = match self.download(&config.query, output_dir, sink) {
            Ok(_) => DownloadOutcome::Succeeded,
            Err(err) => {
                warn!(error = %err, "granule download failed");
                sink.event(ProgressEvent {
                    message: format!("phase=Download; download failed: {err}"),
                    elapsed: None,
                });
                DownloadOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        if options.strict && matches!(report.download, DownloadOutcome::Failed { .. }) {
            sink.event(ProgressEvent {
                message: "phase=Convert; skipped after failed download".to_string(),
                elapsed: None,
            });
            return Ok(report);
        }

        report.conversion = Some(self.convert(output_dir, sink)?);
        Ok(report)
    }
}
