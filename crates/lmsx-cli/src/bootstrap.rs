use anyhow::Context;
use lmsx_config::ExportConfig;

use crate::cli::Cli;

/// Load `.env`, every config layer and the flag overrides, then validate.
pub fn load_config(cli: &Cli) -> anyhow::Result<ExportConfig> {
    let mut config = ExportConfig::load_with_dotenv(cli.config.as_deref())
        .context("failed to load lmsx configuration")?;

    cli.apply(&mut config);
    config.validate().context("invalid lmsx configuration")?;

    tracing::debug!(
        tables = config.tables.len(),
        report_root = %config.paths.report_root.display(),
        halt = ?config.run.halt,
        "configuration loaded"
    );
    Ok(config)
}
