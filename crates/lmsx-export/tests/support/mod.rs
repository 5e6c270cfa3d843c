//! Recording fakes for the subprocess and probe seams.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lmsx_config::ExportConfig;
use lmsx_export::{CommandOutput, CommandRunner, Invocation, Probe, StepError};

pub const LMS: &str = "campus.example.com";
pub const DATA_BUCKET: &str = "lms-a1b2c3d4-raw-data-k9x2-1614852672";
pub const LOG_BUCKET: &str = "lms-a1b2c3d4-raw-logs-k9x2-1614852673";

/// Answers every external program with deterministic output and records the call.
#[derive(Default)]
pub struct ScriptedRunner {
    calls: RefCell<Vec<Invocation>>,
    fail_needles: Vec<String>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any invocation mentioning `needle` exits with status 1.
    pub fn fail_when(mut self, needle: &str) -> Self {
        self.fail_needles.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.program == program)
            .cloned()
            .collect()
    }

    fn sql_of(invocation: &Invocation) -> String {
        invocation
            .args
            .iter()
            .skip_while(|arg| arg.as_str() != "--execute")
            .nth(1)
            .cloned()
            .unwrap_or_default()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, StepError> {
        self.calls.borrow_mut().push(invocation.clone());

        if self
            .fail_needles
            .iter()
            .any(|needle| invocation.mentions(needle))
        {
            return Ok(CommandOutput::failed(1, "scripted failure"));
        }

        let output = match invocation.program.as_str() {
            "mysql" if invocation.args.iter().any(|a| a == "--skip-column-names") => {
                CommandOutput::ok("3\n")
            }
            "mysql" => {
                let sql = Self::sql_of(invocation);
                CommandOutput::ok(format!("id\tquery\r\n1\t{sql}\r\n2\tsecond row\r\n"))
            }
            "csvformat" => {
                let stdin = invocation.stdin.clone().unwrap_or_default();
                let csv = String::from_utf8_lossy(&stdin).replace('\t', ",");
                CommandOutput::ok(csv)
            }
            "aws" if invocation.args.first().map(String::as_str) == Some("s3")
                && invocation.args.get(1).map(String::as_str) == Some("ls") =>
            {
                CommandOutput::ok(format!(
                    "2021-03-04 10:11:12 {DATA_BUCKET}\n2021-03-04 10:11:13 {LOG_BUCKET}\n"
                ))
            }
            "aws" => {
                let prefix = if invocation.args.iter().any(|a| a == "--dryrun") {
                    "(dryrun) "
                } else {
                    ""
                };
                CommandOutput::ok(format!("{prefix}upload: a.csv to s3://bucket/a.csv\n"))
            }
            "mkdir" => {
                if let Some(dir) = invocation.args.last() {
                    std::fs::create_dir_all(dir).map_err(|source| StepError::Io {
                        path: PathBuf::from(dir),
                        source,
                    })?;
                }
                CommandOutput::ok("")
            }
            program if program.contains("python") => {
                CommandOutput::ok("course_id,structure\ncourse-v1:Demo+101+2024,{\"blocks\":3}\n")
            }
            _ => CommandOutput::ok(""),
        };
        Ok(output)
    }
}

/// Probe over in-memory files and a fixed bucket listing, counting every call.
#[derive(Default)]
pub struct StaticProbe {
    pub files: HashMap<PathBuf, String>,
    pub buckets: Vec<String>,
    pub reads: Cell<usize>,
    pub listings: Cell<usize>,
}

impl StaticProbe {
    pub fn with_buckets() -> Self {
        Self {
            buckets: vec![DATA_BUCKET.to_string(), LOG_BUCKET.to_string()],
            ..Default::default()
        }
    }

    pub fn probes(&self) -> usize {
        self.reads.get() + self.listings.get()
    }
}

impl Probe for StaticProbe {
    fn read_config(&self, path: &Path) -> Option<String> {
        self.reads.set(self.reads.get() + 1);
        self.files.get(path).cloned()
    }

    fn list_buckets(&self) -> Result<Vec<String>, StepError> {
        self.listings.set(self.listings.get() + 1);
        Ok(self.buckets.clone())
    }
}

/// Config with every value overridden and all paths under `root`.
pub fn overridden_config(root: &Path) -> ExportConfig {
    let mut config = ExportConfig::default();
    config.lms.host = LMS.to_string();
    config.mysql.user = "reader".to_string();
    config.mysql.password = "pw".to_string();
    config.buckets.data = DATA_BUCKET.to_string();
    config.buckets.logs = LOG_BUCKET.to_string();
    config.paths.report_root = root.join("reports");
    config.paths.log_dir = root.join("tracking");
    config.structures.platform_dir = root.join("platform");
    config.structures.bundled_hook = root.join("bundle/dump_course_structures.py");
    config
}

/// Every file under `dir`, as relative path -> content, sorted.
pub fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out);
            } else if let Ok(content) = std::fs::read(&path) {
                let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                out.push((relative, content));
            }
        }
    }

    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}
