use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Dot-separated DNS labels, at least two of them.
static HOST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("valid host regex")
});

/// The bare host name that identifies one LMS installation.
///
/// Used as the `lms=<identity>` partition key of every exported file and as
/// the prefix of synchronized tracking logs. Only constructible through
/// [`DeploymentIdentity::parse`], so a value in hand is always `host.domain`
/// with no scheme, port, path or quoting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeploymentIdentity(String);

impl DeploymentIdentity {
    /// Normalize and validate a raw value, typically scraped from a config file.
    ///
    /// Strips quote/comma decoration, a leading `scheme://`, any trailing
    /// `/path` and a `:port` suffix before validating. Case is kept as written.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIdentity`] when nothing host-shaped remains.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let stripped = strip_decoration(raw);
        let without_scheme = stripped
            .split_once("://")
            .map_or(stripped.as_str(), |(_, rest)| rest);
        let host = without_scheme
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();
        let host = host.split(':').next().unwrap_or_default().trim();

        if host.is_empty() {
            return Err(CoreError::InvalidIdentity {
                value: raw.to_string(),
                reason: "empty host".to_string(),
            });
        }
        if !HOST_REGEX.is_match(host) {
            return Err(CoreError::InvalidIdentity {
                value: raw.to_string(),
                reason: "expected the shape host.domain".to_string(),
            });
        }

        Ok(Self(host.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `lms=<identity>` directory name used in the report tree.
    #[must_use]
    pub fn partition(&self) -> String {
        format!("lms={}", self.0)
    }
}

impl fmt::Display for DeploymentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeploymentIdentity {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DeploymentIdentity> for String {
    fn from(value: DeploymentIdentity) -> Self {
        value.0
    }
}

/// Strip the decoration config scraping leaves around a raw value.
///
/// Removes surrounding whitespace, trailing commas and semicolons, and one
/// matching pair of single or double quotes wrapping the value.
#[must_use]
pub fn strip_decoration(raw: &str) -> String {
    let value = raw.trim().trim_end_matches([',', ';']).trim();
    ['"', '\'']
        .iter()
        .find_map(|quote| {
            value
                .strip_prefix(*quote)
                .and_then(|inner| inner.strip_suffix(*quote))
        })
        .unwrap_or(value)
        .trim()
        .to_string()
}
