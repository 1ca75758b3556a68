use std::path::Path;

use chrono::Utc;
use ndarray::{Array1, Array3};
use tracing::debug;

use crate::error::ViirsError;
use crate::granule::{
    CLOUD_MASK, GEOLOCATION_GROUP, GEOPHYSICAL_GROUP, GeoAxis, GranuleReader, GranuleRecord,
    GranuleWriter, LATITUDE, LONGITUDE, NormalizedGranule, SCAN_LINE_GROUP, SCAN_START_TIME, TIME,
};

/// Reads grouped netCDF-4 / HDF5 granules and writes the flat CF layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetcdfGranuleIo;

impl GranuleReader for NetcdfGranuleIo {
    fn read(&self, path: &Path) -> Result<GranuleRecord, ViirsError> {
        let file = netcdf::open(path).map_err(|err| nc_error(path, err))?;

        let (lat_shape, lat_values) = read_f64(&file, path, GEOLOCATION_GROUP, LATITUDE)?;
        let (lon_shape, lon_values) = read_f64(&file, path, GEOLOCATION_GROUP, LONGITUDE)?;
        let (time_shape, time_values) = read_f64(&file, path, SCAN_LINE_GROUP, SCAN_START_TIME)?;
        let (mask_shape, mask_values) = read_i16(&file, path, GEOPHYSICAL_GROUP, CLOUD_MASK)?;
        debug!(
            path = %path.display(),
            latitude = ?lat_shape,
            longitude = ?lon_shape,
            cloud_mask = ?mask_shape,
            "granule arrays loaded"
        );

        if time_shape.len() != 1 {
            return Err(ViirsError::Shape {
                name: SCAN_START_TIME.to_string(),
                message: format!("expected 1 dimension, got {}", time_shape.len()),
            });
        }
        let [time_dim, lat_dim, lon_dim] = mask_shape[..] else {
            return Err(ViirsError::Shape {
                name: CLOUD_MASK.to_string(),
                message: format!("expected 3 dimensions, got {}", mask_shape.len()),
            });
        };
        let cloud_mask = Array3::from_shape_vec((time_dim, lat_dim, lon_dim), mask_values)
            .map_err(|err| ViirsError::Shape {
                name: CLOUD_MASK.to_string(),
                message: err.to_string(),
            })?;

        Ok(GranuleRecord {
            latitude: GeoAxis::from_shape(LATITUDE, &lat_shape, lat_values)?,
            longitude: GeoAxis::from_shape(LONGITUDE, &lon_shape, lon_values)?,
            scan_start_time: Array1::from(time_values),
            cloud_mask,
        })
    }
}

impl GranuleWriter for NetcdfGranuleIo {
    fn write(&self, granule: &NormalizedGranule, path: &Path) -> Result<(), ViirsError> {
        let err = |err: netcdf::Error| nc_error(path, err);
        let mut file = netcdf::create(path).map_err(err)?;

        file.add_dimension(TIME, granule.time().len()).map_err(err)?;
        file.add_dimension(LATITUDE, granule.latitude().len())
            .map_err(err)?;
        file.add_dimension(LONGITUDE, granule.longitude().len())
            .map_err(err)?;

        {
            let mut var = file.add_variable::<f64>(TIME, &[TIME]).map_err(err)?;
            var.put_attribute("long_name", "scan start time").map_err(err)?;
            var.put_values(&granule.time().to_vec(), ..).map_err(err)?;
        }
        {
            let mut var = file
                .add_variable::<f64>(LATITUDE, &[LATITUDE])
                .map_err(err)?;
            var.put_attribute("long_name", "latitude").map_err(err)?;
            var.put_attribute("units", "degrees_north").map_err(err)?;
            var.put_values(&granule.latitude().to_vec(), ..)
                .map_err(err)?;
        }
        {
            let mut var = file
                .add_variable::<f64>(LONGITUDE, &[LONGITUDE])
                .map_err(err)?;
            var.put_attribute("long_name", "longitude").map_err(err)?;
            var.put_attribute("units", "degrees_east").map_err(err)?;
            var.put_values(&granule.longitude().to_vec(), ..)
                .map_err(err)?;
        }
        {
            let mask: Vec<i16> = granule.cloud_mask().iter().copied().collect();
            let mut var = file
                .add_variable::<i16>(CLOUD_MASK, &[TIME, LATITUDE, LONGITUDE])
                .map_err(err)?;
            var.put_attribute("long_name", "cloud mask").map_err(err)?;
            var.put_values(&mask, ..).map_err(err)?;
        }

        file.add_attribute("Conventions", "CF-1.8").map_err(err)?;
        let history = format!(
            "{}: normalized by viirs-fetch",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        file.add_attribute("history", history.as_str())
            .map_err(err)?;
        Ok(())
    }
}

fn nc_error(path: &Path, err: netcdf::Error) -> ViirsError {
    ViirsError::NetCdf {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn open_group<'f>(
    file: &'f netcdf::File,
    path: &Path,
    group: &str,
    name: &str,
) -> Result<netcdf::Group<'f>, ViirsError> {
    file.group(group)
        .map_err(|err| nc_error(path, err))?
        .ok_or_else(|| ViirsError::MissingVariable(format!("{group}/{name}")))
}

fn read_f64(
    file: &netcdf::File,
    path: &Path,
    group: &str,
    name: &str,
) -> Result<(Vec<usize>, Vec<f64>), ViirsError> {
    let nc_group = open_group(file, path, group, name)?;
    let var = nc_group
        .variable(name)
        .ok_or_else(|| ViirsError::MissingVariable(format!("{group}/{name}")))?;
    let shape = var.dimensions().iter().map(|dim| dim.len()).collect();
    let values = var
        .get_values::<f64, _>(..)
        .map_err(|err| nc_error(path, err))?;
    Ok((shape, values))
}

fn read_i16(
    file: &netcdf::File,
    path: &Path,
    group: &str,
    name: &str,
) -> Result<(Vec<usize>, Vec<i16>), ViirsError> {
    let nc_group = open_group(file, path, group, name)?;
    let var = nc_group
        .variable(name)
        .ok_or_else(|| ViirsError::MissingVariable(format!("{group}/{name}")))?;
    let shape = var.dimensions().iter().map(|dim| dim.len()).collect();
    let values = var
        .get_values::<i16, _>(..)
        .map_err(|err| nc_error(path, err))?;
    Ok((shape, values))
}
