//! Local directories and output ownership.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_report_root() -> PathBuf {
    PathBuf::from("/edx/var/lmsx/reports")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/edx/var/log/tracking")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Staging tree synchronized to the data bucket.
    #[serde(default = "default_report_root")]
    pub report_root: PathBuf,

    /// Tracking-log tree synchronized to the log bucket. Never written.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Owner (`user` or `user:group`) of each exported subtree. Empty keeps
    /// whatever the writing process produced.
    #[serde(default)]
    pub output_owner: String,

    /// Run directory creation and `chown` through `sudo`. Requires
    /// `output_owner`, since the exporter writes into the created
    /// directories as the invoking user.
    #[serde(default)]
    pub use_sudo: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            report_root: default_report_root(),
            log_dir: default_log_dir(),
            output_owner: String::new(),
            use_sudo: false,
        }
    }
}
