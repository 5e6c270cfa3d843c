//! Orchestrator.
//!
//! Runs resolution, then each table export, the structure export, the report
//! sync and the log sync in that order. Every step yields a [`StepOutcome`];
//! the configured [`lmsx_core::HaltPolicy`] decides whether a failure stops
//! the remaining steps.

use std::time::Instant;

use chrono::Utc;
use lmsx_config::ExportConfig;
use lmsx_core::{RunMode, RunReport, StepKind, StepOutcome, StepReport, TableExportSpec};
use tracing::{error, info, warn};

use crate::resolve::{Probe, ResolvedSettings, Resolver};
use crate::runner::CommandRunner;
use crate::structures::StructureExporter;
use crate::sync::SyncPublisher;
use crate::tables::TableExporter;
use crate::{ExportError, StepError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub dry_run: bool,
    pub verbose: bool,
    pub exclude_logs: bool,
}

impl RunOptions {
    #[must_use]
    pub const fn mode(self) -> RunMode {
        if self.dry_run { RunMode::Dry } else { RunMode::Live }
    }

    /// Dry or verbose runs refuse to start with unresolved values.
    #[must_use]
    pub const fn is_diagnostic(self) -> bool {
        self.dry_run || self.verbose
    }
}

/// Progress callbacks, e.g. for a terminal progress bar.
pub trait PipelineObserver {
    fn planned(&self, _steps: usize) {}
    fn step_started(&self, _name: &str) {}
    fn step_finished(&self, _report: &StepReport) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl PipelineObserver for Silent {}

pub struct Pipeline<'a, R, P> {
    config: &'a ExportConfig,
    runner: &'a R,
    probe: &'a P,
    options: RunOptions,
}

enum Step<'a> {
    Table(&'a TableExportSpec),
    Structures,
    ReportSync,
    LogSync,
}

impl Step<'_> {
    fn name(&self) -> String {
        match self {
            Self::Table(spec) => format!("table:{}", spec.name),
            Self::Structures => "structures".to_string(),
            Self::ReportSync => "sync:reports".to_string(),
            Self::LogSync => "sync:logs".to_string(),
        }
    }

    const fn kind(&self) -> StepKind {
        match self {
            Self::Table(_) => StepKind::TableExport,
            Self::Structures => StepKind::StructureExport,
            Self::ReportSync => StepKind::ReportSync,
            Self::LogSync => StepKind::LogSync,
        }
    }
}

impl<'a, R: CommandRunner, P: Probe> Pipeline<'a, R, P> {
    pub const fn new(
        config: &'a ExportConfig,
        runner: &'a R,
        probe: &'a P,
        options: RunOptions,
    ) -> Self {
        Self {
            config,
            runner,
            probe,
            options,
        }
    }

    /// Resolve configuration and run every step.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Core`] for an unusable table spec and
    /// [`ExportError::Unresolved`] when a diagnostic run is missing values.
    /// Step failures are reported inside the [`RunReport`], not as errors.
    pub fn run(&self, observer: &dyn PipelineObserver) -> Result<RunReport, ExportError> {
        let started_at = Utc::now();
        let mode = self.options.mode();

        for spec in &self.config.tables {
            spec.validate()?;
        }

        let resolution =
            Resolver::new(self.config, self.probe).resolve(!self.options.exclude_logs);
        if !resolution.problems.is_empty() {
            if self.options.is_diagnostic() {
                for problem in &resolution.problems {
                    error!(%problem, "configuration unresolved");
                }
                return Err(ExportError::Unresolved(resolution.problems));
            }
            for problem in &resolution.problems {
                warn!(%problem, "configuration unresolved; continuing with an empty value");
            }
        }
        let settings = resolution.settings;

        let mut steps = self
            .config
            .tables
            .iter()
            .map(Step::Table)
            .collect::<Vec<_>>();
        steps.extend([Step::Structures, Step::ReportSync, Step::LogSync]);
        observer.planned(steps.len());

        let mut halted = false;
        let mut reports = Vec::with_capacity(steps.len());
        for step in &steps {
            let name = step.name();
            if halted {
                let report = StepReport {
                    name,
                    kind: step.kind(),
                    outcome: StepOutcome::NotRun,
                    elapsed_ms: 0,
                };
                observer.step_finished(&report);
                reports.push(report);
                continue;
            }

            observer.step_started(&name);
            let clock = Instant::now();
            let outcome = self.execute(step, &settings, mode);
            let elapsed_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);

            if let StepOutcome::Failed { reason } = &outcome {
                error!(step = %name, %reason, "step failed");
                if self.config.run.halt.halts() {
                    warn!(step = %name, "halt policy: remaining steps will not run");
                    halted = true;
                }
            }

            let report = StepReport {
                name,
                kind: step.kind(),
                outcome,
                elapsed_ms,
            };
            observer.step_finished(&report);
            reports.push(report);
        }

        let report = RunReport {
            mode,
            lms: settings.lms.as_ref().map(ToString::to_string),
            data_bucket: settings.data_bucket.clone(),
            log_bucket: settings.log_bucket.clone(),
            started_at,
            finished_at: Utc::now(),
            halted,
            steps: reports,
        };
        info!(
            success = report.is_success(),
            failed = report.failed_steps().count(),
            halted,
            "run finished"
        );
        Ok(report)
    }

    fn execute(&self, step: &Step<'_>, settings: &ResolvedSettings, mode: RunMode) -> StepOutcome {
        let layout = self.config.layout();
        let lms = settings.lms.as_ref();

        let result: Result<String, StepError> = match step {
            Step::Table(spec) => TableExporter::new(self.runner, self.config, &layout).export(
                spec,
                lms,
                &settings.credentials,
                mode,
            ),
            Step::Structures => {
                if !self.config.structures.enabled {
                    return skipped("structure export disabled");
                }
                if mode.is_dry() {
                    return skipped("dry run");
                }
                StructureExporter::new(self.runner, self.config, &layout).export(lms)
            }
            Step::ReportSync => SyncPublisher::new(self.runner, self.config)
                .publish_reports(&settings.data_bucket, mode),
            Step::LogSync => {
                if self.options.exclude_logs {
                    return skipped("logs excluded");
                }
                SyncPublisher::new(self.runner, self.config).publish_logs(
                    &settings.log_bucket,
                    lms,
                    mode,
                )
            }
        };

        match result {
            Ok(detail) => StepOutcome::Succeeded { detail },
            Err(error) => StepOutcome::Failed {
                reason: error.to_string(),
            },
        }
    }
}

fn skipped(reason: &str) -> StepOutcome {
    StepOutcome::Skipped {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_and_verbose_are_diagnostic() {
        assert!(!RunOptions::default().is_diagnostic());
        assert!(
            RunOptions {
                dry_run: true,
                ..Default::default()
            }
            .is_diagnostic()
        );
        assert!(
            RunOptions {
                verbose: true,
                ..Default::default()
            }
            .is_diagnostic()
        );
    }

    #[test]
    fn mode_follows_dry_flag() {
        assert_eq!(RunOptions::default().mode(), RunMode::Live);
        assert_eq!(
            RunOptions {
                dry_run: true,
                ..Default::default()
            }
            .mode(),
            RunMode::Dry
        );
    }
}
