//! Executor abstraction for external tool invocation.
//!
//! The [`CommandExecutor`] trait decouples the pipeline from real process
//! spawning. Tests use scripted executors that return predetermined exit
//! codes without spawning anything.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::command::CommandSpec;
use crate::core::types::ExecResult;
use crate::io::process::run_command_teeing_stderr;

/// Abstraction over command execution backends.
pub trait CommandExecutor {
    /// Run `command` to completion.
    ///
    /// A non-zero exit is a normal `Ok` result; `Err` means the command could
    /// not be run at all (e.g. program not found).
    fn exec(&mut self, command: &CommandSpec) -> Result<ExecResult>;
}

/// Executor that spawns real processes in a working directory.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    workdir: PathBuf,
    output_limit_bytes: usize,
}

impl SystemExecutor {
    pub fn new(workdir: impl Into<PathBuf>, output_limit_bytes: usize) -> Self {
        Self {
            workdir: workdir.into(),
            output_limit_bytes,
        }
    }
}

impl CommandExecutor for SystemExecutor {
    #[instrument(skip_all, fields(program = %command.program))]
    fn exec(&mut self, command: &CommandSpec) -> Result<ExecResult> {
        info!(workdir = %self.workdir.display(), command = %command, "running command");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).current_dir(&self.workdir);

        let output = run_command_teeing_stderr(cmd, self.output_limit_bytes)
            .with_context(|| format!("run {}", command.program))?;

        let mut captured = output.stderr.clone();
        captured.extend_from_slice(output.stderr_truncated_notice(&command.program).as_bytes());

        if output.status.success() {
            debug!("command completed successfully");
        } else {
            warn!(exit_code = ?output.status.code(), "command failed");
        }

        Ok(ExecResult {
            code: output.status.code(),
            output: captured,
        })
    }
}
