use lmsx_config::ExportConfig;
use lmsx_core::{DeploymentIdentity, ReportLayout};
use tracing::info;

use crate::StepError;
use crate::runner::{CommandRunner, Invocation, RunAs};
use crate::staging::Staging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    /// The management command was already installed.
    Present,
    /// The bundled implementation was linked into place.
    Linked,
}

/// Course structure exporter.
///
/// The dump comes from a management command of the web application; its
/// stdout is stored verbatim, never parsed.
pub struct StructureExporter<'a, R> {
    runner: &'a R,
    config: &'a ExportConfig,
    layout: &'a ReportLayout,
}

impl<'a, R: CommandRunner> StructureExporter<'a, R> {
    pub const fn new(runner: &'a R, config: &'a ExportConfig, layout: &'a ReportLayout) -> Self {
        Self {
            runner,
            config,
            layout,
        }
    }

    fn app_identity(&self) -> Option<RunAs> {
        RunAs::user(&self.config.structures.app_user)
    }

    /// Link the bundled management command into the platform if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] if `ln` fails.
    pub fn ensure_hook(&self) -> Result<HookStatus, StepError> {
        let structures = &self.config.structures;
        let hook = structures.hook_file();
        // symlink_metadata so a dangling link still counts as installed.
        if hook.symlink_metadata().is_ok() {
            return Ok(HookStatus::Present);
        }

        let invocation = Invocation::new("ln")
            .arg("-s")
            .arg(structures.bundled_hook.to_string_lossy())
            .arg(hook.to_string_lossy())
            .run_as(self.app_identity());
        self.runner.run(&invocation)?.into_stdout("ln")?;

        info!(
            hook = %hook.display(),
            target = %structures.bundled_hook.display(),
            "linked structure dump command"
        );
        Ok(HookStatus::Linked)
    }

    /// Run the dump and store it under the structures partition.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Missing`] without a deployment identity, and
    /// [`StepError`] if the hook, the command or the write fails.
    pub fn export(&self, lms: Option<&DeploymentIdentity>) -> Result<String, StepError> {
        let lms = lms.ok_or(StepError::Missing("deployment identity"))?;
        let structures = &self.config.structures;

        self.ensure_hook()?;

        let invocation = Invocation::new(&structures.python)
            .arg(&structures.manage_py)
            .arg("lms")
            .arg(format!("--settings={}", structures.settings))
            .arg(&structures.command)
            .current_dir(&structures.platform_dir)
            .run_as(self.app_identity());
        let dump = self
            .runner
            .run(&invocation)?
            .into_stdout(&structures.python)?;

        let file = self.layout.structures_file(lms);
        let staging = Staging::new(self.runner, self.config, self.layout);
        staging.prepare(&file)?;
        staging.write(&file, &dump)?;

        info!(bytes = dump.len(), path = %file.display(), "course structures exported");
        Ok(format!("wrote {} bytes to {}", dump.len(), file.display()))
    }
}
