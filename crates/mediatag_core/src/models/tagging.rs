//! Tagging parameters collected once per batch.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// EXIF date/time layout (`YYYY:MM:DD HH:mm:ss`).
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Errors raised while building tagging parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("{year:04}-{month:02}-{day:02} is not a valid calendar date")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("Cannot parse date '{0}' (expected YYYY-MM-DD)")]
    InvalidDateFormat(String),

    #[error("Invalid {axis} '{value}'")]
    InvalidCoordinate { axis: &'static str, value: String },
}

/// Ordered list of free-text tags.
///
/// Duplicates are kept; insertion order is the display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add tags from user input.
    ///
    /// The input is split on commas; each piece is trimmed and empty
    /// pieces are dropped. Returns how many tags were added.
    pub fn add_input(&mut self, input: &str) -> usize {
        let before = self.0.len();
        self.0.extend(
            input
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        );
        self.0.len() - before
    }

    /// Append a single tag verbatim.
    pub fn push(&mut self, tag: impl Into<String>) {
        self.0.push(tag.into());
    }

    /// Remove and return the most recently added tag.
    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Tags joined with `", "`.
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Review checkboxes that turn into extra tags at confirmation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFlags {
    pub legal: bool,
    pub safety: bool,
}

impl ReviewFlags {
    pub const LEGAL_TAG: &'static str = "✅ Reviewed by Legal";
    pub const SAFETY_TAG: &'static str = "✅ Reviewed by Safety";

    /// Tags implied by the checked boxes, in display order.
    pub fn review_tags(&self) -> Vec<&'static str> {
        let mut tags = Vec::new();
        if self.legal {
            tags.push(Self::LEGAL_TAG);
        }
        if self.safety {
            tags.push(Self::SAFETY_TAG);
        }
        tags
    }

    /// Return a copy of `tags` with the review tags appended.
    pub fn apply(&self, tags: &TagSet) -> TagSet {
        let mut confirmed = tags.clone();
        for tag in self.review_tags() {
            confirmed.push(tag);
        }
        confirmed
    }
}

/// Compose the description embedded into every file.
///
/// Format: `Tags: a, b - People: x, y`.
pub fn compose_description(tags: &TagSet, people: &[String]) -> String {
    format!("Tags: {} - People: {}", tags.joined(), people.join(", "))
}

/// A named place with decimal-degree coordinates.
///
/// Coordinates are kept string-encoded as received from the geocoder
/// and parsed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub display_name: String,
    pub latitude: String,
    pub longitude: String,
}

impl Location {
    pub fn new(
        display_name: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }

    /// Latitude in decimal degrees, validated to [-90, 90].
    pub fn lat(&self) -> Result<f64, ModelError> {
        parse_coordinate("latitude", &self.latitude, 90.0)
    }

    /// Longitude in decimal degrees, validated to [-180, 180].
    pub fn lon(&self) -> Result<f64, ModelError> {
        parse_coordinate("longitude", &self.longitude, 180.0)
    }

    /// Check that both coordinates parse and are in range.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.lat()?;
        self.lon()?;
        Ok(())
    }

    /// Signed ISO 6709 point used in container metadata, e.g. `+40.712800-74.006000/`.
    pub fn iso6709(&self) -> Result<String, ModelError> {
        Ok(format!("{:+.6}{:+.6}/", self.lat()?, self.lon()?))
    }
}

fn parse_coordinate(axis: &'static str, raw: &str, limit: f64) -> Result<f64, ModelError> {
    let invalid = || ModelError::InvalidCoordinate {
        axis,
        value: raw.to_string(),
    };
    let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() || value.abs() > limit {
        return Err(invalid());
    }
    Ok(value)
}

/// Capture date chosen for the batch (no time component).
///
/// Always a real calendar date; the instant it denotes is UTC midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CaptureDate(NaiveDate);

impl CaptureDate {
    /// Build from a year/month/day triple, rejecting impossible dates.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, ModelError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or(ModelError::InvalidDate { year, month, day })
    }

    /// Today's date in the local time zone.
    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        chrono::Datelike::year(&self.0)
    }

    pub fn month(&self) -> u32 {
        chrono::Datelike::month(&self.0)
    }

    pub fn day(&self) -> u32 {
        chrono::Datelike::day(&self.0)
    }

    /// UTC midnight of this date.
    pub fn instant(&self) -> DateTime<Utc> {
        self.0.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// EXIF rendering: `YYYY:MM:DD 00:00:00`.
    pub fn exif_string(&self) -> String {
        self.instant().format(EXIF_DATETIME_FORMAT).to_string()
    }

    /// Strict UTC instant for container `creation_time`.
    pub fn iso_utc(&self) -> String {
        self.instant()
            .format("%Y-%m-%dT%H:%M:%S%.6fZ")
            .to_string()
    }

    /// The same instant rendered as local time with an explicit offset.
    pub fn iso_with_offset(&self, offset: FixedOffset) -> String {
        self.instant()
            .with_timezone(&offset)
            .format("%Y-%m-%dT%H:%M:%S%z")
            .to_string()
    }

    /// Parse an EXIF date/time string back into a UTC instant.
    pub fn parse_exif(value: &str) -> Result<DateTime<Utc>, ModelError> {
        NaiveDateTime::parse_from_str(value.trim(), EXIF_DATETIME_FORMAT)
            .map(|dt| dt.and_utc())
            .map_err(|_| ModelError::InvalidDateFormat(value.to_string()))
    }
}

impl FromStr for CaptureDate {
    type Err = ModelError;

    /// Parse `YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, '-');
        let mut next = || -> Result<&str, ModelError> {
            parts
                .next()
                .ok_or_else(|| ModelError::InvalidDateFormat(s.to_string()))
        };
        let year = next()?
            .parse::<i32>()
            .map_err(|_| ModelError::InvalidDateFormat(s.to_string()))?;
        let month = next()?
            .parse::<u32>()
            .map_err(|_| ModelError::InvalidDateFormat(s.to_string()))?;
        let day = next()?
            .parse::<u32>()
            .map_err(|_| ModelError::InvalidDateFormat(s.to_string()))?;
        Self::new(year, month, day)
    }
}

impl TryFrom<String> for CaptureDate {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CaptureDate> for String {
    fn from(date: CaptureDate) -> Self {
        date.to_string()
    }
}

impl std::fmt::Display for CaptureDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
