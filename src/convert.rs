use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use camino::Utf8Path;
use ndarray::Array1;
use serde::Serialize;
use tracing::{debug, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::error::ViirsError;
use crate::fs_util;
use crate::granule::{
    GeoAxis, GranuleReader, GranuleRecord, GranuleWriter, LATITUDE, LONGITUDE, NormalizedGranule,
    TIME,
};
use crate::resample;

/// Subdirectory of the download folder that receives normalized granules.
pub const NORMALIZED_DIR_NAME: &str = "xarray.Dataset";
pub const GRANULE_EXTENSION: &str = "nc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    /// Per-scan-line rows averaged into one row.
    Averaged,
    /// Linearly resampled over the index range.
    Interpolated,
    /// Replaced by evenly spaced values between min and max.
    Regenerated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisAdjustment {
    pub axis: String,
    pub from: usize,
    pub to: usize,
    pub kind: AdjustmentKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub input: String,
    pub output: Option<String>,
    pub adjustments: Vec<AxisAdjustment>,
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub input_dir: String,
    pub output_dir: Option<String>,
    pub no_input_files: bool,
    pub files: Vec<FileOutcome>,
}

impl ConversionReport {
    pub fn converted(&self) -> usize {
        self.files.iter().filter(|file| file.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.converted()
    }
}

/// Brings the geolocation and time axes of a granule in line with its cloud
/// mask. The mask itself is passed through untouched.
pub fn normalize(
    record: GranuleRecord,
) -> Result<(NormalizedGranule, Vec<AxisAdjustment>), ViirsError> {
    let (time_dim, lat_dim, lon_dim) = record.cloud_mask.dim();
    let mut adjustments = Vec::new();

    let latitude = fit_geo_axis(record.latitude, lat_dim, LATITUDE, &mut adjustments)?;
    let longitude = fit_geo_axis(record.longitude, lon_dim, LONGITUDE, &mut adjustments)?;

    let mut time = record.scan_start_time;
    if time.len() != time_dim {
        let regenerated = resample::regenerate_axis(&time.to_vec(), time_dim, TIME)?;
        adjustments.push(AxisAdjustment {
            axis: TIME.to_string(),
            from: time.len(),
            to: time_dim,
            kind: AdjustmentKind::Regenerated,
        });
        time = Array1::from(regenerated);
    }

    let granule = NormalizedGranule::new(time, latitude, longitude, record.cloud_mask)?;
    Ok((granule, adjustments))
}

fn fit_geo_axis(
    axis: GeoAxis,
    target: usize,
    name: &str,
    adjustments: &mut Vec<AxisAdjustment>,
) -> Result<Array1<f64>, ViirsError> {
    let values = match axis {
        GeoAxis::Flat(values) => values,
        GeoAxis::PerScanLine(grid) => {
            let rows = grid.nrows();
            let collapsed = resample::collapse_scan_lines(&grid, name)?;
            adjustments.push(AxisAdjustment {
                axis: name.to_string(),
                from: rows,
                to: 1,
                kind: AdjustmentKind::Averaged,
            });
            collapsed
        }
    };
    if values.len() == target {
        return Ok(values);
    }
    let resampled = resample::resample_linear(&values.to_vec(), target, name)?;
    adjustments.push(AxisAdjustment {
        axis: name.to_string(),
        from: values.len(),
        to: target,
        kind: AdjustmentKind::Interpolated,
    });
    Ok(Array1::from(resampled))
}

pub struct Converter<R: GranuleReader, W: GranuleWriter> {
    reader: R,
    writer: W,
}

impl<R: GranuleReader, W: GranuleWriter> Converter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Converts every granule directly inside `dir` into
    /// `<dir>/xarray.Dataset/<file name>`. A failing file is recorded in the
    /// report and does not stop the others.
    pub fn convert_directory(
        &self,
        dir: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<ConversionReport, ViirsError> {
        sink.event(ProgressEvent {
            message: format!("phase=Convert; scanning {dir}"),
            elapsed: None,
        });

        let inputs = fs_util::find_files_with_ext(dir.as_std_path(), GRANULE_EXTENSION)?;
        if inputs.is_empty() {
            sink.event(ProgressEvent {
                message: format!("phase=Convert; no .{GRANULE_EXTENSION} files found in {dir}"),
                elapsed: None,
            });
            return Ok(ConversionReport {
                input_dir: dir.to_string(),
                output_dir: None,
                no_input_files: true,
                files: Vec::new(),
            });
        }

        let output_dir = dir.join(NORMALIZED_DIR_NAME);
        fs::create_dir_all(output_dir.as_std_path())
            .map_err(|err| ViirsError::Filesystem(format!("create {output_dir}: {err}")))?;

        let mut files = Vec::with_capacity(inputs.len());
        for input in inputs {
            files.push(self.convert_one(&input, &output_dir, sink));
        }

        Ok(ConversionReport {
            input_dir: dir.to_string(),
            output_dir: Some(output_dir.to_string()),
            no_input_files: false,
            files,
        })
    }

    fn convert_one(
        &self,
        input: &Path,
        output_dir: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> FileOutcome {
        let started = Instant::now();
        let input_display = input.display().to_string();
        match self.convert_file(input, output_dir, sink) {
            Ok((output, adjustments)) => {
                sink.event(ProgressEvent {
                    message: format!("phase=Convert; wrote {}", output.display()),
                    elapsed: Some(started.elapsed()),
                });
                FileOutcome {
                    input: input_display,
                    output: Some(output.display().to_string()),
                    adjustments,
                    error: None,
                }
            }
            Err(err) => {
                warn!(file = %input_display, error = %err, "granule conversion failed");
                sink.event(ProgressEvent {
                    message: format!("phase=Convert; failed {input_display}: {err}"),
                    elapsed: Some(started.elapsed()),
                });
                FileOutcome {
                    input: input_display,
                    output: None,
                    adjustments: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn convert_file(
        &self,
        input: &Path,
        output_dir: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<(PathBuf, Vec<AxisAdjustment>), ViirsError> {
        let file_name = input
            .file_name()
            .ok_or_else(|| ViirsError::Filesystem(format!("no file name: {}", input.display())))?;
        debug!(file = %input.display(), "converting granule");

        let record = self.reader.read(input)?;
        let (granule, adjustments) = normalize(record)?;
        for adjustment in &adjustments {
            sink.event(ProgressEvent {
                message: format!(
                    "phase=Convert; {} {:?} {} -> {}",
                    adjustment.axis, adjustment.kind, adjustment.from, adjustment.to
                ),
                elapsed: None,
            });
        }

        let output = output_dir.as_std_path().join(file_name);
        fs_util::write_atomic(&output, |temp| self.writer.write(&granule, temp))?;
        Ok((output, adjustments))
    }
}
