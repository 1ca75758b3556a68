use std::fs;

use assert_matches::assert_matches;

use viirs_fetch::config::{ConfigLoader, ConfigOverrides};
use viirs_fetch::error::ViirsError;

#[test]
fn file_values_are_resolved() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("viirs-fetch.json");
    fs::write(
        &path,
        r#"{
            "concept_id": "C1607563719-LAADS",
            "bounding_box": "-10,35,5,45",
            "start": "2024-07-01T00:00:00Z",
            "end": "2024-07-01T12:00:00Z",
            "output_dir": "/data/viirs"
        }"#,
    )
    .unwrap();

    let resolved =
        ConfigLoader::resolve(path.to_str(), ConfigOverrides::default()).unwrap();

    assert_eq!(resolved.query.concept_id.as_str(), "C1607563719-LAADS");
    assert_eq!(resolved.query.bounding_box.to_string(), "-10,35,5,45");
    assert_eq!(
        resolved.query.time_range.to_arg(),
        "2024-07-01T00:00:00Z,2024-07-01T12:00:00Z"
    );
    assert_eq!(resolved.output_dir.as_str(), "/data/viirs");
    assert_eq!(resolved.tool, "cmrfetch");
}

#[test]
fn overrides_replace_file_values() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("viirs-fetch.json");
    fs::write(&path, r#"{ "date": "2024-07-01", "tool": "cmrfetch" }"#).unwrap();

    let overrides = ConfigOverrides {
        date: Some("2025-01-31".to_string()),
        tool: Some("/opt/bin/cmrfetch".to_string()),
        ..ConfigOverrides::default()
    };
    let resolved = ConfigLoader::resolve(path.to_str(), overrides).unwrap();

    assert_eq!(
        resolved.query.time_range.to_arg(),
        "2025-01-31T00:00:00Z,2025-01-31T23:59:59Z"
    );
    assert_eq!(resolved.tool, "/opt/bin/cmrfetch");
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str(), ConfigOverrides::default()).unwrap_err();
    assert_matches!(err, ViirsError::ConfigRead(_));
}

#[test]
fn malformed_json_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("viirs-fetch.json");
    fs::write(&path, "{ not json").unwrap();
    let err = ConfigLoader::resolve(path.to_str(), ConfigOverrides::default()).unwrap_err();
    assert_matches!(err, ViirsError::ConfigParse(_));
}

#[test]
fn reversed_time_range_is_rejected() {
    let overrides = ConfigOverrides {
        start: Some("2025-02-17T00:00:00Z".to_string()),
        end: Some("2025-02-16T00:00:00Z".to_string()),
        ..ConfigOverrides::default()
    };
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("viirs-fetch.json");
    fs::write(&path, "{}").unwrap();
    let err = ConfigLoader::resolve(path.to_str(), overrides).unwrap_err();
    assert_matches!(err, ViirsError::InvalidTimeRange { .. });
}

#[test]
fn command_line_range_beats_file_date() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("viirs-fetch.json");
    fs::write(&path, r#"{ "date": "2024-07-01" }"#).unwrap();

    let overrides = ConfigOverrides {
        start: Some("2025-01-31T06:00:00Z".to_string()),
        end: Some("2025-01-31T18:00:00Z".to_string()),
        ..ConfigOverrides::default()
    };
    let resolved = ConfigLoader::resolve(path.to_str(), overrides).unwrap();

    assert_eq!(
        resolved.query.time_range.to_arg(),
        "2025-01-31T06:00:00Z,2025-01-31T18:00:00Z"
    );
}
