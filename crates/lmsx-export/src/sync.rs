//! Sync publisher: recursive, additive `aws s3 sync` of the report and log trees.

use std::path::Path;

use lmsx_config::ExportConfig;
use lmsx_core::{DeploymentIdentity, RunMode};
use tracing::info;

use crate::StepError;
use crate::runner::{CommandRunner, Invocation, RunAs};

pub struct SyncPublisher<'a, R> {
    runner: &'a R,
    config: &'a ExportConfig,
}

impl<'a, R: CommandRunner> SyncPublisher<'a, R> {
    pub const fn new(runner: &'a R, config: &'a ExportConfig) -> Self {
        Self { runner, config }
    }

    /// Upload the report tree to the root of `bucket`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Missing`] for an empty bucket name, or the sync failure.
    pub fn publish_reports(&self, bucket: &str, mode: RunMode) -> Result<String, StepError> {
        if bucket.is_empty() {
            return Err(StepError::Missing("data bucket"));
        }
        let target = report_target(bucket);
        self.sync(&self.config.paths.report_root, &target, None, mode)
    }

    /// Upload the tracking-log tree under `<log_prefix>/<identity>/` in `bucket`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Missing`] for an empty bucket or identity, or the sync failure.
    pub fn publish_logs(
        &self,
        bucket: &str,
        lms: Option<&DeploymentIdentity>,
        mode: RunMode,
    ) -> Result<String, StepError> {
        if bucket.is_empty() {
            return Err(StepError::Missing("log bucket"));
        }
        let lms = lms.ok_or(StepError::Missing("deployment identity"))?;
        let target = log_target(bucket, &self.config.buckets.log_prefix, lms);
        self.sync(
            &self.config.paths.log_dir,
            &target,
            RunAs::user(&self.config.sync.log_user),
            mode,
        )
    }

    fn sync(
        &self,
        source: &Path,
        target: &str,
        run_as: Option<RunAs>,
        mode: RunMode,
    ) -> Result<String, StepError> {
        let aws = &self.config.sync.aws;
        let mut invocation = Invocation::new(aws)
            .args(["s3", "sync"])
            .arg(source.to_string_lossy())
            .arg(target)
            .run_as(run_as);
        if mode.is_dry() {
            invocation = invocation.arg("--dryrun");
        }

        let stdout = self.runner.run(&invocation)?.into_stdout(aws)?;
        let transfers = count_transfers(&String::from_utf8_lossy(&stdout));

        info!(
            source = %source.display(),
            target,
            transfers,
            dry_run = mode.is_dry(),
            "sync finished"
        );
        let verb = if mode.is_dry() { "would upload" } else { "uploaded" };
        Ok(format!("{verb} {transfers} file(s) to {target}"))
    }
}

#[must_use]
pub fn report_target(bucket: &str) -> String {
    format!("s3://{bucket}/")
}

#[must_use]
pub fn log_target(bucket: &str, log_prefix: &str, lms: &DeploymentIdentity) -> String {
    let prefix = log_prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("s3://{bucket}/{lms}/")
    } else {
        format!("s3://{bucket}/{prefix}/{lms}/")
    }
}

/// Count `upload:` lines, with or without the `(dryrun)` marker.
fn count_transfers(stdout: &str) -> usize {
    stdout
        .lines()
        .map(str::trim_start)
        .map(|line| line.strip_prefix("(dryrun)").map_or(line, str::trim_start))
        .filter(|line| line.starts_with("upload:") || line.starts_with("copy:"))
        .count()
}
