//! Bucket discovery by naming pattern.
//!
//! Provisioned buckets are named
//! `<prefix>-<8 char token>-raw-data-<token>-<unix timestamp>` for reports and
//! `<prefix>-<8 char token>-raw-logs-<token>-<unix timestamp>` for tracking logs.

use lmsx_core::BucketAmbiguity;
use regex::Regex;
use tracing::warn;

use crate::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    Data,
    Logs,
}

impl BucketKind {
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Data => "raw-data",
            Self::Logs => "raw-logs",
        }
    }

    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Data => "data bucket",
            Self::Logs => "log bucket",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BucketMatcher {
    data: Regex,
    logs: Regex,
}

impl BucketMatcher {
    /// Build the two patterns for a name prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Pattern`] if the compiled pattern is invalid.
    pub fn new(prefix: &str) -> Result<Self, ResolveError> {
        Ok(Self {
            data: Self::pattern(prefix, BucketKind::Data)?,
            logs: Self::pattern(prefix, BucketKind::Logs)?,
        })
    }

    fn pattern(prefix: &str, kind: BucketKind) -> Result<Regex, regex::Error> {
        Regex::new(&format!(
            r"^{}-[a-z0-9]{{8}}-{}-[a-z0-9]+-[0-9]+$",
            regex::escape(prefix.trim()),
            kind.segment()
        ))
    }

    #[must_use]
    pub fn matches(&self, kind: BucketKind, name: &str) -> bool {
        match kind {
            BucketKind::Data => self.data.is_match(name),
            BucketKind::Logs => self.logs.is_match(name),
        }
    }

    /// Choose the bucket of `kind` from a listing.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Unresolved`] when nothing matches and
    /// [`ResolveError::AmbiguousBucket`] when several match under
    /// [`BucketAmbiguity::Error`].
    pub fn select(
        &self,
        kind: BucketKind,
        names: &[String],
        policy: BucketAmbiguity,
    ) -> Result<String, ResolveError> {
        let candidates = names
            .iter()
            .filter(|name| self.matches(kind, name))
            .cloned()
            .collect::<Vec<_>>();

        match (candidates.as_slice(), policy) {
            ([], _) => Err(ResolveError::Unresolved {
                field: kind.field(),
                reason: format!(
                    "no bucket in the listing matches the {} pattern",
                    kind.segment()
                ),
            }),
            ([only], _) => Ok(only.clone()),
            ([first, ..], BucketAmbiguity::First) => {
                warn!(
                    kind = kind.segment(),
                    chosen = %first,
                    candidates = candidates.len(),
                    "several buckets match; using the first listed"
                );
                Ok(first.clone())
            }
            (_, BucketAmbiguity::Error) => Err(ResolveError::AmbiguousBucket {
                kind: kind.segment(),
                candidates,
            }),
        }
    }
}

/// Bucket names from `aws s3 ls` output (`<date> <time> <name>` per line).
#[must_use]
pub fn parse_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().nth(2))
        .map(ToString::to_string)
        .collect()
}
