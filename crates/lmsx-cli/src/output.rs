use std::fmt::Write as _;

use lmsx_core::{RunMode, RunReport, StepOutcome};

use crate::cli::OutputFormat;

/// Render a run report in the requested format.
pub fn render(report: &RunReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => Ok(render_text(report)),
    }
}

/// Print a run report to stdout.
pub fn output(report: &RunReport, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(report, format)?;
    println!("{rendered}");
    Ok(())
}

fn render_text(report: &RunReport) -> String {
    let mode = match report.mode {
        RunMode::Live => "run",
        RunMode::Dry => "dry run",
    };
    let lms = report.lms.as_deref().unwrap_or("(unresolved)");
    let mut out = format!("lmsx {mode} for {lms}\n");
    let _ = writeln!(out, "  data bucket: {}", or_unresolved(&report.data_bucket));
    let _ = writeln!(out, "  log bucket:  {}", or_unresolved(&report.log_bucket));
    out.push('\n');

    let width = report
        .steps
        .iter()
        .map(|step| step.name.len())
        .max()
        .unwrap_or(0);
    for step in &report.steps {
        let detail = match &step.outcome {
            StepOutcome::Succeeded { detail } => detail.as_str(),
            StepOutcome::Skipped { reason } | StepOutcome::Failed { reason } => reason.as_str(),
            StepOutcome::NotRun => "",
        };
        let line = format!(
            "{label:<8} {name:<width$}  {detail}",
            label = step.outcome.label(),
            name = step.name,
        );
        let _ = writeln!(out, "{}", line.trim_end());
    }

    let tally = |label: &str| {
        report
            .steps
            .iter()
            .filter(|step| step.outcome.label() == label)
            .count()
    };
    let _ = write!(
        out,
        "\n{} ok, {} skipped, {} failed, {} not run",
        tally("ok"),
        tally("skipped"),
        tally("failed"),
        tally("not run"),
    );
    if report.halted {
        out.push_str(" (halted)");
    }
    out
}

fn or_unresolved(value: &str) -> &str {
    if value.is_empty() { "(unresolved)" } else { value }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use lmsx_core::{StepKind, StepReport};
    use pretty_assertions::assert_eq;

    use super::*;

    fn step(name: &str, kind: StepKind, outcome: StepOutcome) -> StepReport {
        StepReport {
            name: name.to_string(),
            kind,
            outcome,
            elapsed_ms: 12,
        }
    }

    fn sample(halted: bool) -> RunReport {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap();
        RunReport {
            mode: RunMode::Live,
            lms: Some("campus.example.com".to_string()),
            data_bucket: "data".to_string(),
            log_bucket: String::new(),
            started_at: at,
            finished_at: at,
            halted,
            steps: vec![
                step(
                    "table:auth_user",
                    StepKind::TableExport,
                    StepOutcome::Succeeded {
                        detail: "wrote 10 bytes to /r/a.csv".to_string(),
                    },
                ),
                step(
                    "structures",
                    StepKind::StructureExport,
                    StepOutcome::Failed {
                        reason: "missing deployment identity".to_string(),
                    },
                ),
                step("sync:reports", StepKind::ReportSync, StepOutcome::NotRun),
            ],
        }
    }

    #[test]
    fn text_lists_every_step_and_a_tally() {
        let text = render(&sample(true), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "\
lmsx run for campus.example.com
  data bucket: data
  log bucket:  (unresolved)

ok       table:auth_user  wrote 10 bytes to /r/a.csv
failed   structures       missing deployment identity
not run  sync:reports

1 ok, 0 skipped, 1 failed, 1 not run (halted)"
        );
    }

    #[test]
    fn json_flattens_outcomes() {
        let json = render(&sample(false), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["mode"], "live");
        assert_eq!(value["halted"], false);
        assert_eq!(value["steps"][0]["status"], "succeeded");
        assert_eq!(value["steps"][0]["kind"], "table_export");
        assert_eq!(value["steps"][1]["reason"], "missing deployment identity");
        assert_eq!(value["steps"][2]["status"], "not_run");
    }
}
