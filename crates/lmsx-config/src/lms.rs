//! Deployment identity settings and LMS config file locations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::serde_helpers::lenient_string;

fn default_config_files() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/edx/etc/lms.yml"),
        PathBuf::from("/edx/app/edxapp/lms.auth.json"),
        PathBuf::from("/edx/app/edxapp/lms.env.json"),
    ]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LmsConfig {
    /// Deployment identity override (`host.domain`).
    #[serde(default, deserialize_with = "lenient_string")]
    pub host: String,

    /// LMS configuration files probed for `LMS_BASE` and database credentials.
    /// `.json` files are parsed as JSON, anything else line by line.
    #[serde(default = "default_config_files")]
    pub config_files: Vec<PathBuf>,
}

impl Default for LmsConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            config_files: default_config_files(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_is_probed_before_json() {
        let config = LmsConfig::default();
        assert!(config.host.is_empty());
        assert_eq!(config.config_files.len(), 3);
        assert_eq!(
            config.config_files[0].extension().and_then(|e| e.to_str()),
            Some("yml")
        );
    }
}
