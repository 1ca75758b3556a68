use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ViirsError;

static CONCEPT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^C\d+-[A-Za-z0-9_]+$").expect("valid concept id regex"));

/// Catalog identifier of a dataset product, e.g. `C1562021084-LAADS`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptId(String);

impl ConceptId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Provider suffix after the dash (`LAADS` for `C1562021084-LAADS`).
    pub fn provider(&self) -> &str {
        self.0.split_once('-').map(|(_, rest)| rest).unwrap_or("")
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConceptId {
    type Err = ViirsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        if !CONCEPT_ID_RE.is_match(normalized) {
            return Err(ViirsError::InvalidConceptId(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, ViirsError> {
        let bbox = Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    fn validate(&self) -> Result<(), ViirsError> {
        let lon_ok = |v: f64| (-180.0..=180.0).contains(&v);
        let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);
        if !(lon_ok(self.min_lon) && lon_ok(self.max_lon)) {
            return Err(ViirsError::InvalidBoundingBox(format!(
                "{self}: longitude outside [-180, 180]"
            )));
        }
        if !(lat_ok(self.min_lat) && lat_ok(self.max_lat)) {
            return Err(ViirsError::InvalidBoundingBox(format!(
                "{self}: latitude outside [-90, 90]"
            )));
        }
        if self.min_lon > self.max_lon || self.min_lat > self.max_lat {
            return Err(ViirsError::InvalidBoundingBox(format!(
                "{self}: minimum exceeds maximum"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

impl FromStr for BoundingBox {
    type Err = ViirsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts = value
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ViirsError::InvalidBoundingBox(value.to_string()))?;
        let [min_lon, min_lat, max_lon, max_lat] = parts[..] else {
            return Err(ViirsError::InvalidBoundingBox(value.to_string()));
        };
        if parts.iter().any(|v| !v.is_finite()) {
            return Err(ViirsError::InvalidBoundingBox(value.to_string()));
        }
        Self::new(min_lon, min_lat, max_lon, max_lat)
    }
}

/// Inclusive UTC time window for a granule search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ViirsError> {
        if start > end {
            return Err(ViirsError::InvalidTimeRange {
                start: format_timestamp(&start),
                end: format_timestamp(&end),
            });
        }
        Ok(Self { start, end })
    }

    /// Whole calendar day, `00:00:00` through `23:59:59`.
    pub fn day(date: NaiveDate) -> Self {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = date
            .and_hms_opt(23, 59, 59)
            .map(|value| value.and_utc())
            .unwrap_or(start);
        Self { start, end }
    }

    /// Rendered as `<start>,<end>` for the `-t` flag.
    pub fn to_arg(&self) -> String {
        format!(
            "{},{}",
            format_timestamp(&self.start),
            format_timestamp(&self.end)
        )
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            format_timestamp(&self.start),
            format_timestamp(&self.end)
        )
    }
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ViirsError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|_| ViirsError::InvalidTimestamp(value.to_string()))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ViirsError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ViirsError::InvalidTimestamp(value.to_string()))
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Raw listing printed by the catalog tool. Never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GranuleListing(String);

impl GranuleListing {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GranuleListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
