//! Destination bucket settings.

use lmsx_core::BucketAmbiguity;
use serde::{Deserialize, Serialize};

use crate::serde_helpers::lenient_string;

fn default_prefix() -> String {
    String::from("lms")
}

fn default_log_prefix() -> String {
    String::from("tracking_logs")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BucketsConfig {
    /// Report (raw data) bucket. Discovered from the bucket listing when empty.
    #[serde(default, deserialize_with = "lenient_string")]
    pub data: String,

    /// Tracking-log (raw logs) bucket. Discovered from the bucket listing when empty.
    #[serde(default, deserialize_with = "lenient_string")]
    pub logs: String,

    /// Leading segment of discoverable bucket names:
    /// `<prefix>-<token>-raw-data-<token>-<timestamp>`.
    #[serde(default = "default_prefix", deserialize_with = "lenient_string")]
    pub prefix: String,

    /// Tie-break when several buckets match one pattern.
    #[serde(default)]
    pub ambiguity: BucketAmbiguity,

    /// Fixed first path segment under the log bucket.
    #[serde(default = "default_log_prefix", deserialize_with = "lenient_string")]
    pub log_prefix: String,
}

impl Default for BucketsConfig {
    fn default() -> Self {
        Self {
            data: String::new(),
            logs: String::new(),
            prefix: default_prefix(),
            ambiguity: BucketAmbiguity::default(),
            log_prefix: default_log_prefix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_require_discovery() {
        let config = BucketsConfig::default();
        assert!(config.data.is_empty());
        assert!(config.logs.is_empty());
        assert_eq!(config.prefix, "lms");
        assert_eq!(config.log_prefix, "tracking_logs");
        assert_eq!(config.ambiguity, BucketAmbiguity::Error);
    }
}
