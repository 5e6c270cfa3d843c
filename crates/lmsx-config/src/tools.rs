//! External programs the pipeline shells out to.

use serde::{Deserialize, Serialize};

fn default_convert_program() -> String {
    String::from("csvformat")
}

fn default_convert_args() -> Vec<String> {
    vec![String::from("-t")]
}

fn default_aws() -> String {
    String::from("aws")
}

/// Row-to-text converter: reads tab-separated rows on stdin, writes CSV on stdout.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConvertConfig {
    #[serde(default = "default_convert_program")]
    pub program: String,

    #[serde(default = "default_convert_args")]
    pub args: Vec<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            program: default_convert_program(),
            args: default_convert_args(),
        }
    }
}

/// Object storage CLI used for bucket listing and recursive sync.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(default = "default_aws")]
    pub aws: String,

    /// Account the log sync runs as (`sudo -u`). Empty runs as the current user.
    #[serde(default)]
    pub log_user: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            aws: default_aws(),
            log_user: String::new(),
        }
    }
}
