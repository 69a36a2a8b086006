//! Bucketizer configuration: parsing, validation, and loading.
//!
//! A TOML document describes one bucketizer:
//!
//! ```toml
//! granularity = "hour"
//! start = "1980-02-02T03:04:05Z"
//! end = "1980-02-03T00:00:00Z"
//! ```
//!
//! Every key is optional; a missing granularity means day, missing bounds stay
//! unset so callers can supply fallbacks (for example the min/max of the data).
//!
//! Entrypoints:
//! - Parse from a TOML string: [`load_config_str`]
//! - Parse from a file path: [`load_config_path`]
//! - Turn a config into a ready bucketizer: [`BucketizerConfig::build`]

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    bucketizer::DateBucketizer,
    error::{BucketizerError, Result},
    granularity::Granularity,
};

/// Declarative description of a bucketizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BucketizerConfig {
    /// Bucket granularity (`"hour"`, `"day"`, `"month"`).
    #[serde(default)]
    pub granularity: Granularity,
    /// Inclusive start (RFC-3339).
    pub start: Option<DateTime<Utc>>,
    /// End of bucketing (RFC-3339).
    pub end: Option<DateTime<Utc>>,
}

impl BucketizerConfig {
    /// Overlays explicitly given values on top of this config.
    ///
    /// `None` leaves the existing value in place.
    pub fn merge(
        mut self,
        granularity: Option<Granularity>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        if let Some(g) = granularity {
            self.granularity = g;
        }
        self.start = start.or(self.start);
        self.end = end.or(self.end);
        self
    }

    /// Validates the range and constructs a configured [`DateBucketizer`].
    ///
    /// Errors:
    /// - [`BucketizerError::Config`] when both bounds are set and `end < start`.
    pub fn build(&self) -> Result<DateBucketizer> {
        if let (Some(start), Some(end)) = (self.start, self.end)
            && end < start
        {
            return Err(BucketizerError::Config(format!(
                "end ({end}) must not be before start ({start})"
            )));
        }
        let mut b = DateBucketizer::with_granularity(self.granularity);
        b.set_start_date(self.start);
        b.set_end_date(self.end);
        Ok(b)
    }
}

/// Parse a bucketizer config from a TOML string.
pub fn load_config_str(toml_str: &str) -> Result<BucketizerConfig> {
    toml::from_str(toml_str)
        .map_err(|e| BucketizerError::Config(format!("failed to parse config TOML: {e}")))
}

/// Read a config TOML file from disk and parse it.
///
/// See [`load_config_str`] for parsing details.
pub fn load_config_path(path: impl AsRef<Path>) -> Result<BucketizerConfig> {
    let text = std::fs::read_to_string(path.as_ref())?;
    load_config_str(&text)
        .map_err(|e| BucketizerError::Config(format!("{}: {e}", path.as_ref().display())))
}
