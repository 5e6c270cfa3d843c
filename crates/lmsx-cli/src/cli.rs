use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use lmsx_config::ExportConfig;
use lmsx_core::HaltPolicy;
use lmsx_export::RunOptions;

/// Run-report rendering on stdout.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Top-level CLI parser for the `lmsx` binary.
///
/// Every value flag overrides the matching configuration key; anything left
/// unset is resolved from the config layers, the LMS config files and the
/// bucket listing.
#[derive(Debug, Parser)]
#[command(
    name = "lmsx",
    version,
    about = "Export LMS tables, course structures and tracking logs to object storage"
)]
pub struct Cli {
    /// Deployment identity (LMS host name)
    #[arg(short = 'l', long, value_name = "HOST")]
    pub lms_host: Option<String>,

    /// Data bucket receiving the report tree
    #[arg(short = 'b', long, value_name = "NAME")]
    pub bucket: Option<String>,

    /// MySQL user
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// MySQL password
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Log bucket receiving the tracking logs
    #[arg(short = 'L', long, value_name = "NAME")]
    pub log_bucket: Option<String>,

    /// MySQL host
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Count rows and preview syncs without writing anything
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Debug logging; refuse to run with unresolved values
    #[arg(short, long)]
    pub verbose: bool,

    /// Skip the tracking-log sync
    #[arg(short = 'x', long)]
    pub exclude_logs: bool,

    /// Exporter config file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Stop at the first failed step
    #[arg(long)]
    pub halt_on_error: bool,

    /// Run-report format: text, json
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Apply flag overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut ExportConfig) {
        let overrides = [
            (&self.lms_host, &mut config.lms.host),
            (&self.bucket, &mut config.buckets.data),
            (&self.user, &mut config.mysql.user),
            (&self.password, &mut config.mysql.password),
            (&self.log_bucket, &mut config.buckets.logs),
            (&self.host, &mut config.mysql.host),
        ];
        for (flag, field) in overrides {
            if let Some(value) = flag {
                field.clone_from(value);
            }
        }
        if self.halt_on_error {
            config.run.halt = HaltPolicy::Halt;
        }
    }

    #[must_use]
    pub const fn options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            verbose: self.verbose,
            exclude_logs: self.exclude_logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn short_flags_parse() {
        let cli = Cli::try_parse_from([
            "lmsx",
            "-l",
            "campus.example.com",
            "-b",
            "data",
            "-u",
            "reader",
            "-p",
            "secret",
            "-L",
            "logs",
            "-H",
            "replica.internal",
            "-d",
            "-v",
            "-x",
        ])
        .expect("cli should parse");

        assert_eq!(cli.lms_host.as_deref(), Some("campus.example.com"));
        assert_eq!(cli.bucket.as_deref(), Some("data"));
        assert_eq!(cli.user.as_deref(), Some("reader"));
        assert_eq!(cli.password.as_deref(), Some("secret"));
        assert_eq!(cli.log_bucket.as_deref(), Some("logs"));
        assert_eq!(cli.host.as_deref(), Some("replica.internal"));
        assert_eq!(
            cli.options(),
            RunOptions {
                dry_run: true,
                verbose: true,
                exclude_logs: true,
            }
        );
    }

    #[test]
    fn no_flags_means_no_overrides() {
        let cli = Cli::try_parse_from(["lmsx"]).expect("cli should parse");
        let mut config = ExportConfig::default();
        let before = format!("{config:?}");
        cli.apply(&mut config);
        assert_eq!(format!("{config:?}"), before);
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.options(), RunOptions::default());
    }

    #[test]
    fn flags_override_config_values() {
        let cli = Cli::try_parse_from([
            "lmsx",
            "--lms-host",
            "campus.example.com",
            "--host",
            "replica.internal",
            "--halt-on-error",
        ])
        .expect("cli should parse");
        let mut config = ExportConfig::default();
        config.mysql.host = "from-file".to_string();
        config.mysql.user = "from-file".to_string();

        cli.apply(&mut config);

        assert_eq!(config.lms.host, "campus.example.com");
        assert_eq!(config.mysql.host, "replica.internal");
        assert_eq!(config.mysql.user, "from-file");
        assert_eq!(config.run.halt, HaltPolicy::Halt);
    }

    #[test]
    fn format_rejects_invalid_value() {
        assert!(Cli::try_parse_from(["lmsx", "--format", "xml"]).is_err());
        let cli = Cli::try_parse_from(["lmsx", "-f", "json", "-q"]).expect("cli should parse");
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.quiet);
    }

    #[test]
    fn help_short_flag_is_not_mysql_host() {
        let error = Cli::try_parse_from(["lmsx", "-h"]).unwrap_err();
        assert_eq!(error.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
