pub mod app;
pub mod cmr;
pub mod config;
pub mod convert;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod granule;
pub mod netcdf_io;
pub mod output;
pub mod resample;
