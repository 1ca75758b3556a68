use std::path::Path;

use ndarray::{Array1, Array2, Array3};

use crate::error::ViirsError;

pub const GEOLOCATION_GROUP: &str = "geolocation_data";
pub const SCAN_LINE_GROUP: &str = "scan_line_attributes";
pub const GEOPHYSICAL_GROUP: &str = "geophysical_data";

pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const SCAN_START_TIME: &str = "scan_start_time";
pub const TIME: &str = "time";
pub const CLOUD_MASK: &str = "Cloud_Mask";

/// Geolocation axis as stored in a granule: either already one dimensional or
/// replicated once per scan line.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoAxis {
    Flat(Array1<f64>),
    PerScanLine(Array2<f64>),
}

impl GeoAxis {
    pub fn from_shape(name: &str, shape: &[usize], values: Vec<f64>) -> Result<Self, ViirsError> {
        let shape_error = |err: ndarray::ShapeError| ViirsError::Shape {
            name: name.to_string(),
            message: err.to_string(),
        };
        match *shape {
            [len] => Array1::from_shape_vec(len, values)
                .map(GeoAxis::Flat)
                .map_err(shape_error),
            [rows, cols] => Array2::from_shape_vec((rows, cols), values)
                .map(GeoAxis::PerScanLine)
                .map_err(shape_error),
            _ => Err(ViirsError::Shape {
                name: name.to_string(),
                message: format!("expected 1 or 2 dimensions, got {}", shape.len()),
            }),
        }
    }
}

/// Arrays extracted from one downloaded cloud-mask granule.
#[derive(Debug, Clone, PartialEq)]
pub struct GranuleRecord {
    pub latitude: GeoAxis,
    pub longitude: GeoAxis,
    pub scan_start_time: Array1<f64>,
    /// Indexed by (time, latitude, longitude).
    pub cloud_mask: Array3<i16>,
}

/// Labeled grid whose coordinate axes match the cloud-mask dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGranule {
    time: Array1<f64>,
    latitude: Array1<f64>,
    longitude: Array1<f64>,
    cloud_mask: Array3<i16>,
}

impl NormalizedGranule {
    pub fn new(
        time: Array1<f64>,
        latitude: Array1<f64>,
        longitude: Array1<f64>,
        cloud_mask: Array3<i16>,
    ) -> Result<Self, ViirsError> {
        let (time_dim, lat_dim, lon_dim) = cloud_mask.dim();
        if time_dim == 0 || lat_dim == 0 || lon_dim == 0 {
            return Err(ViirsError::Shape {
                name: CLOUD_MASK.to_string(),
                message: format!("empty dimension in {time_dim}x{lat_dim}x{lon_dim}"),
            });
        }
        for (name, len, dim) in [
            (TIME, time.len(), time_dim),
            (LATITUDE, latitude.len(), lat_dim),
            (LONGITUDE, longitude.len(), lon_dim),
        ] {
            if len != dim {
                return Err(ViirsError::Shape {
                    name: name.to_string(),
                    message: format!("axis has {len} points but {CLOUD_MASK} expects {dim}"),
                });
            }
        }
        Ok(Self {
            time,
            latitude,
            longitude,
            cloud_mask,
        })
    }

    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    pub fn latitude(&self) -> &Array1<f64> {
        &self.latitude
    }

    pub fn longitude(&self) -> &Array1<f64> {
        &self.longitude
    }

    pub fn cloud_mask(&self) -> &Array3<i16> {
        &self.cloud_mask
    }
}

pub trait GranuleReader {
    fn read(&self, path: &Path) -> Result<GranuleRecord, ViirsError>;
}

pub trait GranuleWriter {
    /// Writes the granule to `path`, replacing any existing file.
    fn write(&self, granule: &NormalizedGranule, path: &Path) -> Result<(), ViirsError>;
}
