use std::fs;
use std::path::Path;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use ndarray::{Array1, Array3};

use viirs_fetch::app::{App, DownloadOutcome, RunOptions};
use viirs_fetch::cmr::{CatalogClient, GranuleQuery, ToolInfo};
use viirs_fetch::config::{Config, ConfigLoader, ResolvedConfig};
use viirs_fetch::convert::NORMALIZED_DIR_NAME;
use viirs_fetch::domain::GranuleListing;
use viirs_fetch::error::ViirsError;
use viirs_fetch::granule::{GeoAxis, GranuleReader, GranuleRecord, GranuleWriter, NormalizedGranule};
use viirs_fetch::output::JsonOutput;

#[derive(Default)]
struct MockCatalog {
    listing: Option<String>,
    search_fails: bool,
    download_fails: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl MockCatalog {
    fn with_listing(listing: &str) -> Self {
        Self {
            listing: Some(listing.to_string()),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl CatalogClient for &MockCatalog {
    fn search(&self, _query: &GranuleQuery) -> Result<Option<GranuleListing>, ViirsError> {
        self.calls.lock().unwrap().push("search");
        if self.search_fails {
            return Err(ViirsError::MissingTool("cmrfetch".to_string()));
        }
        Ok(self.listing.as_deref().map(GranuleListing::new))
    }

    fn download(&self, _query: &GranuleQuery, _destination: &Utf8Path) -> Result<(), ViirsError> {
        self.calls.lock().unwrap().push("download");
        if self.download_fails {
            return Err(ViirsError::ToolFailed {
                tool: "cmrfetch".to_string(),
                status: "exit status: 1".to_string(),
                message: "unauthorized".to_string(),
            });
        }
        Ok(())
    }

    fn tool_info(&self) -> ToolInfo {
        ToolInfo {
            name: "mock".to_string(),
            path: None,
            version: None,
        }
    }
}

/// Any file whose name contains "broken" fails to read.
struct MockReader;

impl GranuleReader for MockReader {
    fn read(&self, path: &Path) -> Result<GranuleRecord, ViirsError> {
        if path.to_string_lossy().contains("broken") {
            return Err(ViirsError::MissingVariable(
                "geophysical_data/Cloud_Mask".to_string(),
            ));
        }
        Ok(GranuleRecord {
            latitude: GeoAxis::Flat(Array1::from(vec![42.3, 43.2])),
            longitude: GeoAxis::Flat(Array1::from(vec![130.0, 131.5])),
            scan_start_time: Array1::from(vec![0.0]),
            cloud_mask: Array3::zeros((1, 2, 2)),
        })
    }
}

struct MockWriter;

impl GranuleWriter for MockWriter {
    fn write(&self, granule: &NormalizedGranule, path: &Path) -> Result<(), ViirsError> {
        fs::write(path, format!("{:?}", granule.cloud_mask().dim()))
            .map_err(|err| ViirsError::Filesystem(err.to_string()))
    }
}

fn config_for(dir: &Path) -> ResolvedConfig {
    let mut resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
    resolved.output_dir = Utf8PathBuf::from_path_buf(dir.to_path_buf()).unwrap();
    resolved
}

fn outputs(dir: &Path) -> Vec<String> {
    let out_dir = dir.join(NORMALIZED_DIR_NAME);
    if !out_dir.exists() {
        return Vec::new();
    }
    let mut names: Vec<String> = fs::read_dir(out_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn empty_lookup_skips_download_and_conversion() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("stale.nc"), b"").unwrap();
    let catalog = MockCatalog::default();
    let app = App::new(&catalog, MockReader, MockWriter);

    let report = app
        .run(&config_for(temp.path()), RunOptions::default(), &JsonOutput)
        .unwrap();

    assert_eq!(catalog.calls(), vec!["search"]);
    assert!(report.granules.is_none());
    assert!(matches!(report.download, DownloadOutcome::Skipped));
    assert!(report.conversion.is_none());
    assert!(outputs(temp.path()).is_empty());
    assert_eq!(report.exit_code(), 2);
}

#[test]
fn lookup_failure_is_terminal() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = MockCatalog {
        search_fails: true,
        ..MockCatalog::default()
    };
    let app = App::new(&catalog, MockReader, MockWriter);

    let err = app
        .run(&config_for(temp.path()), RunOptions::default(), &JsonOutput)
        .unwrap_err();

    assert!(matches!(err, ViirsError::MissingTool(_)));
    assert_eq!(catalog.calls(), vec!["search"]);
}

#[test]
fn failed_download_still_converts_existing_files() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("A2025047.nc"), b"").unwrap();
    let catalog = MockCatalog {
        download_fails: true,
        ..MockCatalog::with_listing("A2025047.nc\n")
    };
    let app = App::new(&catalog, MockReader, MockWriter);

    let report = app
        .run(&config_for(temp.path()), RunOptions::default(), &JsonOutput)
        .unwrap();

    assert_eq!(catalog.calls(), vec!["search", "download"]);
    assert!(matches!(report.download, DownloadOutcome::Failed { .. }));
    let conversion = report.conversion.as_ref().unwrap();
    assert_eq!(conversion.converted(), 1);
    assert_eq!(outputs(temp.path()), vec!["A2025047.nc"]);
    assert_eq!(report.exit_code(), 4);
}

#[test]
fn strict_mode_skips_conversion_after_failed_download() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("A2025047.nc"), b"").unwrap();
    let catalog = MockCatalog {
        download_fails: true,
        ..MockCatalog::with_listing("A2025047.nc\n")
    };
    let app = App::new(&catalog, MockReader, MockWriter);

    let report = app
        .run(
            &config_for(temp.path()),
            RunOptions { strict: true },
            &JsonOutput,
        )
        .unwrap();

    assert!(report.conversion.is_none());
    assert!(outputs(temp.path()).is_empty());
}

#[test]
fn broken_file_does_not_stop_the_others() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("good.nc"), b"").unwrap();
    fs::write(temp.path().join("broken.nc"), b"").unwrap();
    let catalog = MockCatalog::with_listing("good.nc\nbroken.nc\n");
    let app = App::new(&catalog, MockReader, MockWriter);

    let report = app
        .run(&config_for(temp.path()), RunOptions::default(), &JsonOutput)
        .unwrap();

    assert!(matches!(report.download, DownloadOutcome::Succeeded));
    let conversion = report.conversion.as_ref().unwrap();
    assert_eq!(conversion.converted(), 1);
    assert_eq!(conversion.failed(), 1);
    let failed = conversion.files.iter().find(|f| !f.is_ok()).unwrap();
    assert!(failed.input.ends_with("broken.nc"));
    assert!(failed.error.as_deref().unwrap().contains("Cloud_Mask"));
    assert_eq!(outputs(temp.path()), vec!["good.nc"]);
}

#[test]
fn empty_folder_converts_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let catalog = MockCatalog::with_listing("A2025047.nc\n");
    let app = App::new(&catalog, MockReader, MockWriter);

    let report = app
        .run(&config_for(temp.path()), RunOptions::default(), &JsonOutput)
        .unwrap();

    let conversion = report.conversion.as_ref().unwrap();
    assert!(conversion.no_input_files);
    assert!(conversion.files.is_empty());
    assert!(!temp.path().join(NORMALIZED_DIR_NAME).exists());
    assert_eq!(report.exit_code(), 0);
}
