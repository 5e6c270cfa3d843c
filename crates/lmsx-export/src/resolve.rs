//! Configuration resolution.
//!
//! Produces the four values a run needs: deployment identity, data bucket,
//! log bucket and MySQL credentials. Priority: explicit configuration
//! (flags, env, config file) > LMS configuration files > bucket listing.
//!
//! Probes are lazy: LMS files are read only while identity or login is
//! missing, and the bucket listing is requested at most once, only when a
//! bucket is missing.

use std::cell::OnceCell;
use std::fmt;
use std::path::Path;

use lmsx_config::ExportConfig;
use lmsx_core::DeploymentIdentity;
use tracing::{debug, info};

use crate::buckets::{BucketKind, BucketMatcher, parse_listing};
use crate::runner::{CommandRunner, Invocation};
use crate::scrape::{ConfigFormat, DatabaseSelector, ScrapedSettings, scrape};
use crate::{ResolveError, StepError};

const FALLBACK_HOST: &str = "localhost";
const FALLBACK_DATABASE: &str = "edxapp";

/// MySQL login threaded explicitly through the table exporter.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("database", &self.database)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub lms: Option<DeploymentIdentity>,
    /// Empty when unresolved.
    pub data_bucket: String,
    /// Empty when unresolved or not needed.
    pub log_bucket: String,
    pub credentials: Credentials,
}

/// Settings plus everything that could not be resolved.
#[derive(Debug)]
pub struct Resolution {
    pub settings: ResolvedSettings,
    pub problems: Vec<ResolveError>,
}

impl Resolution {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Read-only access to the outside world during resolution.
pub trait Probe {
    /// Content of an LMS configuration file; `None` when absent or unreadable.
    fn read_config(&self, path: &Path) -> Option<String>;

    /// Every bucket name visible to the configured account, in listing order.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when the listing command fails.
    fn list_buckets(&self) -> Result<Vec<String>, StepError>;
}

/// Reads files from disk and lists buckets with `aws s3 ls`.
pub struct SystemProbe<'a, R> {
    runner: &'a R,
    aws: String,
}

impl<'a, R: CommandRunner> SystemProbe<'a, R> {
    pub fn new(runner: &'a R, aws: impl Into<String>) -> Self {
        Self {
            runner,
            aws: aws.into(),
        }
    }
}

impl<R: CommandRunner> Probe for SystemProbe<'_, R> {
    fn read_config(&self, path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(error) => {
                debug!(path = %path.display(), %error, "LMS config not readable");
                None
            }
        }
    }

    fn list_buckets(&self) -> Result<Vec<String>, StepError> {
        let invocation = Invocation::new(&self.aws).args(["s3", "ls"]);
        let stdout = self.runner.run(&invocation)?.into_stdout(&self.aws)?;
        Ok(parse_listing(&String::from_utf8_lossy(&stdout)))
    }
}

pub struct Resolver<'a, P> {
    config: &'a ExportConfig,
    probe: &'a P,
}

impl<'a, P: Probe> Resolver<'a, P> {
    pub const fn new(config: &'a ExportConfig, probe: &'a P) -> Self {
        Self { config, probe }
    }

    /// Resolve every value; never fails, problems are collected instead.
    ///
    /// `require_log_bucket` is false when log sync is excluded, so a missing
    /// log bucket is not a problem.
    pub fn resolve(&self, require_log_bucket: bool) -> Resolution {
        let mut problems = Vec::new();

        let mysql = &self.config.mysql;
        let needs_files = self.config.lms.host.trim().is_empty() || !mysql.has_login();
        let scraped = if needs_files {
            self.scrape_files()
        } else {
            debug!("identity and login supplied; LMS config files not probed");
            ScrapedSettings::default()
        };

        let lms = self.resolve_identity(scraped.lms_base.as_deref(), &mut problems);
        let credentials = Self::resolve_credentials(self.config, &scraped, &mut problems);

        let listing = OnceCell::new();
        let data_bucket = self.resolve_bucket(
            BucketKind::Data,
            &self.config.buckets.data,
            &listing,
            &mut problems,
        );
        let log_bucket = if require_log_bucket {
            self.resolve_bucket(
                BucketKind::Logs,
                &self.config.buckets.logs,
                &listing,
                &mut problems,
            )
        } else {
            self.config.buckets.logs.trim().to_string()
        };

        Resolution {
            settings: ResolvedSettings {
                lms,
                data_bucket,
                log_bucket,
                credentials,
            },
            problems,
        }
    }

    fn scrape_files(&self) -> ScrapedSettings {
        let mysql = &self.config.mysql;
        let selector = DatabaseSelector {
            alias: &mysql.alias,
            user: Some(mysql.user.trim()).filter(|user| !user.is_empty()),
        };

        let mut scraped = ScrapedSettings::default();
        for path in &self.config.lms.config_files {
            let Some(content) = self.probe.read_config(path) else {
                continue;
            };
            let found = scrape(&content, ConfigFormat::from_path(path), selector);
            debug!(
                path = %path.display(),
                lms_base = found.lms_base.is_some(),
                db_user = found.db_user.is_some(),
                db_password = found.db_password.is_some(),
                "scraped LMS config"
            );
            scraped.merge_missing(found);
            if scraped.is_complete() {
                break;
            }
        }
        scraped
    }

    fn resolve_identity(
        &self,
        scraped: Option<&str>,
        problems: &mut Vec<ResolveError>,
    ) -> Option<DeploymentIdentity> {
        let (raw, source) = if self.config.lms.host.trim().is_empty() {
            match scraped {
                Some(value) => (value, "LMS config"),
                None => {
                    problems.push(ResolveError::Unresolved {
                        field: "deployment identity",
                        reason: "no override and no LMS_BASE in any LMS config file".to_string(),
                    });
                    return None;
                }
            }
        } else {
            (self.config.lms.host.as_str(), "override")
        };

        match DeploymentIdentity::parse(raw) {
            Ok(identity) => {
                info!(lms = %identity, source, "deployment identity resolved");
                Some(identity)
            }
            Err(error) => {
                problems.push(ResolveError::Unresolved {
                    field: "deployment identity",
                    reason: error.to_string(),
                });
                None
            }
        }
    }

    fn resolve_credentials(
        config: &ExportConfig,
        scraped: &ScrapedSettings,
        problems: &mut Vec<ResolveError>,
    ) -> Credentials {
        let pick = |explicit: &str, scraped: Option<&String>| {
            let explicit = explicit.trim();
            if explicit.is_empty() {
                scraped.cloned().unwrap_or_default()
            } else {
                explicit.to_string()
            }
        };

        let mysql = &config.mysql;
        let user = pick(&mysql.user, scraped.db_user.as_ref());
        // Passwords may legitimately carry surrounding spaces; keep explicit ones verbatim.
        let password = if mysql.password.is_empty() {
            scraped.db_password.clone().unwrap_or_default()
        } else {
            mysql.password.clone()
        };
        let mut host = pick(&mysql.host, scraped.db_host.as_ref());
        if host.is_empty() {
            host = FALLBACK_HOST.to_string();
        }
        let mut database = pick(&mysql.database, scraped.db_name.as_ref());
        if database.is_empty() {
            database = FALLBACK_DATABASE.to_string();
        }

        if user.is_empty() {
            problems.push(ResolveError::Unresolved {
                field: "mysql user",
                reason: "no override and no USER in the selected DATABASES entry".to_string(),
            });
        }
        if password.is_empty() {
            problems.push(ResolveError::Unresolved {
                field: "mysql password",
                reason: "no override and no PASSWORD in the selected DATABASES entry".to_string(),
            });
        }

        Credentials {
            host,
            user,
            password,
            database,
        }
    }

    fn resolve_bucket(
        &self,
        kind: BucketKind,
        explicit: &str,
        listing: &OnceCell<Result<Vec<String>, String>>,
        problems: &mut Vec<ResolveError>,
    ) -> String {
        let explicit = explicit.trim();
        if !explicit.is_empty() {
            return explicit.to_string();
        }

        let names = listing.get_or_init(|| {
            debug!("listing buckets for discovery");
            self.probe.list_buckets().map_err(|error| error.to_string())
        });
        let names = match names {
            Ok(names) => names,
            Err(reason) => {
                problems.push(ResolveError::Unresolved {
                    field: kind.field(),
                    reason: format!("bucket listing failed: {reason}"),
                });
                return String::new();
            }
        };

        let matcher = match BucketMatcher::new(&self.config.buckets.prefix) {
            Ok(matcher) => matcher,
            Err(error) => {
                problems.push(error);
                return String::new();
            }
        };

        match matcher.select(kind, names, self.config.buckets.ambiguity) {
            Ok(name) => {
                info!(kind = kind.segment(), bucket = %name, "bucket discovered");
                name
            }
            Err(error) => {
                problems.push(error);
                String::new()
            }
        }
    }
}
