//! Course structure dump settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const fn default_enabled() -> bool {
    true
}

fn default_platform_dir() -> PathBuf {
    PathBuf::from("/edx/app/edxapp/edx-platform")
}

fn default_python() -> String {
    String::from("/edx/bin/python.edxapp")
}

fn default_manage_py() -> String {
    String::from("/edx/bin/manage.edxapp")
}

fn default_settings() -> String {
    String::from("production")
}

fn default_command() -> String {
    String::from("dump_course_structures")
}

fn default_hook_path() -> PathBuf {
    PathBuf::from("lms/djangoapps/courseware/management/commands/dump_course_structures.py")
}

fn default_bundled_hook() -> PathBuf {
    PathBuf::from("/usr/local/share/lmsx/dump_course_structures.py")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StructuresConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Web application checkout; the management command runs from here.
    #[serde(default = "default_platform_dir")]
    pub platform_dir: PathBuf,

    #[serde(default = "default_python")]
    pub python: String,

    #[serde(default = "default_manage_py")]
    pub manage_py: String,

    /// Settings profile passed as `--settings=<settings>`.
    #[serde(default = "default_settings")]
    pub settings: String,

    /// Management command that prints the structure dump on stdout.
    #[serde(default = "default_command")]
    pub command: String,

    /// Location of the management command, relative to `platform_dir`.
    #[serde(default = "default_hook_path")]
    pub hook_path: PathBuf,

    /// Bundled implementation the hook is linked to when missing.
    #[serde(default = "default_bundled_hook")]
    pub bundled_hook: PathBuf,

    /// Account the management command runs as (`sudo -u`). Empty runs as the current user.
    #[serde(default)]
    pub app_user: String,
}

impl Default for StructuresConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            platform_dir: default_platform_dir(),
            python: default_python(),
            manage_py: default_manage_py(),
            settings: default_settings(),
            command: default_command(),
            hook_path: default_hook_path(),
            bundled_hook: default_bundled_hook(),
            app_user: String::new(),
        }
    }
}

impl StructuresConfig {
    /// Absolute location of the management command file.
    #[must_use]
    pub fn hook_file(&self) -> PathBuf {
        self.platform_dir.join(&self.hook_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_file_is_under_platform_dir() {
        let config = StructuresConfig::default();
        assert!(config.hook_file().starts_with(&config.platform_dir));
        assert!(config.hook_file().ends_with("dump_course_structures.py"));
    }
}
