//! Subprocess seam.
//!
//! Every external collaborator (mysql, the converter, aws, the management
//! command, ln, chown) is reached through [`CommandRunner`]. Production code
//! uses [`SystemRunner`]; tests substitute a recording fake.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::StepError;

/// Process identity a command runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunAs {
    /// `sudo` without a target user.
    Root,
    /// `sudo -u <user>`.
    User(String),
}

impl RunAs {
    /// `None` for an empty account name.
    #[must_use]
    pub fn user(name: &str) -> Option<Self> {
        let name = name.trim();
        (!name.is_empty()).then(|| Self::User(name.to_string()))
    }
}

/// A fully described subprocess call.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Variables set on the child only; values never appear in logs.
    pub env: Vec<(String, String)>,
    pub run_as: Option<RunAs>,
    pub current_dir: Option<PathBuf>,
    pub stdin: Option<Vec<u8>>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            run_as: None,
            current_dir: None,
            stdin: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn run_as(mut self, run_as: Option<RunAs>) -> Self {
        self.run_as = run_as;
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn stdin(mut self, bytes: Vec<u8>) -> Self {
        self.stdin = Some(bytes);
        self
    }

    /// True if the program or any argument contains `needle`.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.program.contains(needle) || self.args.iter().any(|arg| arg.contains(needle))
    }

    /// The argv actually executed, including any `sudo` wrapper.
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 6);
        if let Some(run_as) = &self.run_as {
            argv.push("sudo".to_string());
            argv.push("-n".to_string());
            if let RunAs::User(user) = run_as {
                argv.push("-u".to_string());
                argv.push(user.clone());
                argv.push("-H".to_string());
            }
            if !self.env.is_empty() {
                let keys = self
                    .env
                    .iter()
                    .map(|(key, _)| key.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                argv.push(format!("--preserve-env={keys}"));
            }
            argv.push("--".to_string());
        }
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Shell-like rendering for logs.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.argv().join(" ")
    }

    fn build(&self) -> Command {
        let argv = self.argv();
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field(
                "env",
                &self.env.iter().map(|(key, _)| key).collect::<Vec<_>>(),
            )
            .field("run_as", &self.run_as)
            .field("current_dir", &self.current_dir)
            .field("stdin_bytes", &self.stdin.as_ref().map(Vec::len))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when killed by a signal.
    pub status: Option<i32>,
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(code),
            success: false,
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout of a successful run.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Exit`] carrying stderr when the run failed.
    pub fn into_stdout(self, program: &str) -> Result<Vec<u8>, StepError> {
        if self.success {
            return Ok(self.stdout);
        }
        Err(StepError::Exit {
            program: program.to_string(),
            status: self
                .status
                .map_or_else(|| "signal".to_string(), |code| format!("status {code}")),
            stderr: String::from_utf8_lossy(&self.stderr).trim().to_string(),
        })
    }
}

pub trait CommandRunner {
    /// Run `invocation` to completion and capture its output.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Spawn`] when the process cannot be started or
    /// waited on. A non-zero exit is not an error at this level.
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, StepError>;
}

/// Runs commands on the host with `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, StepError> {
        debug!(command = %invocation.command_line(), "running");

        let spawn_error = |source| StepError::Spawn {
            program: invocation.program.clone(),
            source,
        };

        let mut command = invocation.build();
        command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = command.spawn().map_err(spawn_error)?;

        // Feed stdin from a helper thread so a large input cannot deadlock
        // against a full stdout pipe.
        let writer = match (child.stdin.take(), invocation.stdin.clone()) {
            (Some(mut pipe), Some(bytes)) => {
                Some(std::thread::spawn(move || pipe.write_all(&bytes)))
            }
            _ => None,
        };

        let output = child.wait_with_output().map_err(spawn_error)?;

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                // The child may legitimately exit without draining stdin.
                Ok(Err(error)) if error.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(error)) => return Err(spawn_error(error)),
                Err(_) => {
                    return Err(StepError::Output {
                        program: invocation.program.clone(),
                        reason: "stdin writer panicked".to_string(),
                    });
                }
            }
        }

        Ok(CommandOutput {
            status: output.status.code(),
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
