//! Writing into the report tree.
//!
//! Directories are created (through `sudo mkdir -p` when configured) and the
//! containing subtree is handed to the configured output owner before this
//! process writes into it, and again afterwards so the new file is covered.

use std::path::Path;

use lmsx_config::ExportConfig;
use lmsx_core::ReportLayout;
use tracing::debug;

use crate::StepError;
use crate::runner::{CommandRunner, Invocation, RunAs};

pub struct Staging<'a, R> {
    runner: &'a R,
    config: &'a ExportConfig,
    layout: &'a ReportLayout,
}

impl<'a, R: CommandRunner> Staging<'a, R> {
    pub const fn new(runner: &'a R, config: &'a ExportConfig, layout: &'a ReportLayout) -> Self {
        Self {
            runner,
            config,
            layout,
        }
    }

    fn privileged(&self) -> Option<RunAs> {
        self.config.paths.use_sudo.then_some(RunAs::Root)
    }

    fn run_checked(&self, invocation: &Invocation) -> Result<(), StepError> {
        self.runner
            .run(invocation)?
            .into_stdout(&invocation.program)
            .map(drop)
    }

    /// Make sure the parent directory of `file` exists and is owned by the output owner.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] if the directory cannot be created or handed over.
    pub fn prepare(&self, file: &Path) -> Result<(), StepError> {
        let Some(parent) = file.parent() else {
            return Ok(());
        };
        if self.config.paths.use_sudo {
            let invocation = Invocation::new("mkdir")
                .arg("-p")
                .arg(parent.to_string_lossy())
                .run_as(self.privileged());
            self.run_checked(&invocation)?;
        } else {
            std::fs::create_dir_all(parent).map_err(|source| StepError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.hand_over(file)
    }

    /// Write `bytes` to `file`, replacing any previous content, then apply ownership.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] if the write or the ownership change fails.
    pub fn write(&self, file: &Path, bytes: &[u8]) -> Result<(), StepError> {
        std::fs::write(file, bytes).map_err(|source| StepError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        debug!(path = %file.display(), bytes = bytes.len(), "wrote export file");
        self.hand_over(file)
    }

    fn hand_over(&self, file: &Path) -> Result<(), StepError> {
        let owner = self.config.paths.output_owner.trim();
        if owner.is_empty() {
            return Ok(());
        }
        let subtree = self.layout.subtree_of(file);
        let invocation = Invocation::new("chown")
            .args(["-R", owner])
            .arg(subtree.to_string_lossy())
            .run_as(self.privileged());
        self.run_checked(&invocation)
    }
}
