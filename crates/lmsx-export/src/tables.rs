//! Table exporter: query -> strip `\r` -> convert -> partitioned file.

use lmsx_config::ExportConfig;
use lmsx_core::{DeploymentIdentity, ReportLayout, RunMode, TableExportSpec};
use tracing::{debug, info};

use crate::StepError;
use crate::resolve::Credentials;
use crate::runner::{CommandRunner, Invocation};
use crate::staging::Staging;

/// Child-only variable the mysql client reads its password from.
const MYSQL_PASSWORD_ENV: &str = "MYSQL_PWD";

pub struct TableExporter<'a, R> {
    runner: &'a R,
    config: &'a ExportConfig,
    layout: &'a ReportLayout,
}

impl<'a, R: CommandRunner> TableExporter<'a, R> {
    pub const fn new(runner: &'a R, config: &'a ExportConfig, layout: &'a ReportLayout) -> Self {
        Self {
            runner,
            config,
            layout,
        }
    }

    /// Export one table, or probe its row count in dry mode.
    ///
    /// Returns a human-readable detail line for the run report.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Missing`] without a deployment identity, and
    /// [`StepError`] for any failing query, conversion or write.
    pub fn export(
        &self,
        spec: &TableExportSpec,
        lms: Option<&DeploymentIdentity>,
        credentials: &Credentials,
        mode: RunMode,
    ) -> Result<String, StepError> {
        let lms = lms.ok_or(StepError::Missing("deployment identity"))?;
        let file = self.layout.table_file(spec, lms)?;

        if mode.is_dry() {
            let rows = self.count_rows(spec, credentials)?;
            info!(table = %spec.name, rows, path = %file.display(), "dry run: would export");
            return Ok(format!("would export {rows} rows to {}", file.display()));
        }

        let tsv = self.query(&spec.query(), credentials, false)?;
        let tsv = strip_carriage_returns(tsv);
        let csv = self.convert(tsv)?;

        let staging = Staging::new(self.runner, self.config, self.layout);
        staging.prepare(&file)?;
        staging.write(&file, &csv)?;

        info!(table = %spec.name, bytes = csv.len(), path = %file.display(), "table exported");
        Ok(format!("wrote {} bytes to {}", csv.len(), file.display()))
    }

    fn count_rows(&self, spec: &TableExportSpec, credentials: &Credentials) -> Result<u64, StepError> {
        let stdout = self.query(&spec.count_query(), credentials, true)?;
        let text = String::from_utf8_lossy(&stdout);
        text.trim().parse::<u64>().map_err(|error| StepError::Output {
            program: self.config.mysql.client.clone(),
            reason: format!("row count '{}' is not a number: {error}", text.trim()),
        })
    }

    fn query(
        &self,
        sql: &str,
        credentials: &Credentials,
        skip_column_names: bool,
    ) -> Result<Vec<u8>, StepError> {
        let client = &self.config.mysql.client;
        let mut invocation = Invocation::new(client).args(["--batch", "--raw"]);
        if skip_column_names {
            invocation = invocation.arg("--skip-column-names");
        }
        let invocation = invocation
            .arg(format!("--host={}", credentials.host))
            .arg(format!("--user={}", credentials.user))
            .arg(format!("--database={}", credentials.database))
            .arg("--execute")
            .arg(sql)
            .env(MYSQL_PASSWORD_ENV, credentials.password.clone());

        debug!(sql, host = %credentials.host, "querying");
        self.runner.run(&invocation)?.into_stdout(client)
    }

    fn convert(&self, tsv: Vec<u8>) -> Result<Vec<u8>, StepError> {
        let convert = &self.config.convert;
        let invocation = Invocation::new(&convert.program)
            .args(convert.args.iter().cloned())
            .stdin(tsv);
        self.runner.run(&invocation)?.into_stdout(&convert.program)
    }
}

/// Drop every `\r` byte from mysql output.
#[must_use]
pub fn strip_carriage_returns(mut bytes: Vec<u8>) -> Vec<u8> {
    bytes.retain(|byte| *byte != b'\r');
    bytes
}
