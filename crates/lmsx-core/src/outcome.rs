use chrono::{DateTime, Utc};
use serde::Serialize;

/// Whether a run mutates anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Live,
    /// Read-only probes and simulated syncs.
    Dry,
}

impl RunMode {
    #[must_use]
    pub const fn is_dry(self) -> bool {
        matches!(self, Self::Dry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    TableExport,
    StructureExport,
    ReportSync,
    LogSync,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded { detail: String },
    Skipped { reason: String },
    Failed { reason: String },
    /// An earlier failure halted the run before this step.
    NotRun,
}

impl StepOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Succeeded { .. } => "ok",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
            Self::NotRun => "not run",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Display name, e.g. `table:auth_user` or `sync:logs`.
    pub name: String,
    pub kind: StepKind,
    #[serde(flatten)]
    pub outcome: StepOutcome,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub lms: Option<String>,
    pub data_bucket: String,
    pub log_bucket: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// True when the halt policy stopped the run early.
    pub halted: bool,
    pub steps: Vec<StepReport>,
}

impl RunReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.steps.iter().any(|step| step.outcome.is_failure())
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|step| step.outcome.is_failure())
    }

    #[must_use]
    pub fn count(&self, kind: StepKind, label: &str) -> usize {
        self.steps
            .iter()
            .filter(|step| step.kind == kind && step.outcome.label() == label)
            .count()
    }
}
