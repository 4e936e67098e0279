//! Shared deterministic types for the deployment pipeline.
//!
//! These describe the fixed stage order and how each stage reacts to
//! failure. Nothing here touches the filesystem or spawns processes.

use thiserror::Error;

use crate::core::command::CommandSpec;

/// One stage of the deployment pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Test,
    Clean,
    Build,
    UploadStaging,
    UploadProd,
    GitPush,
}

/// What happens to the run when a stage's command fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the pipeline; the completion banner is never printed.
    Abort,
    /// Report the failure and keep going.
    Report,
}

impl Stage {
    /// All stages in the order they run.
    pub const ALL: [Stage; 6] = [
        Stage::Test,
        Stage::Clean,
        Stage::Build,
        Stage::UploadStaging,
        Stage::UploadProd,
        Stage::GitPush,
    ];

    /// Short label printed as `Running: <description>`.
    pub fn description(self) -> &'static str {
        match self {
            Stage::Test => "Unit Tests",
            Stage::Clean => "Cleanup",
            Stage::Build => "Build",
            Stage::UploadStaging => "Upload to TestPyPI",
            Stage::UploadProd => "Upload to PyPI",
            Stage::GitPush => "Git Commit & Push",
        }
    }

    /// Line printed before the stage starts.
    pub fn announcement(self) -> Option<&'static str> {
        match self {
            Stage::Test => Some("Running unit tests..."),
            Stage::Clean => Some("Cleaning up old build artifacts..."),
            Stage::Build => Some("Building the package..."),
            Stage::UploadStaging => Some("Uploading to TestPyPI..."),
            Stage::UploadProd => Some("Uploading to PyPI..."),
            Stage::GitPush => None,
        }
    }

    pub fn success_message(self) -> Option<&'static str> {
        match self {
            Stage::UploadStaging => Some("Upload to TestPyPI successful."),
            Stage::UploadProd => Some("Upload to PyPI completed successfully."),
            Stage::GitPush => Some("Changes pushed to GitHub successfully."),
            Stage::Test | Stage::Clean | Stage::Build => None,
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Stage::Test => "Unit tests failed. Aborting deployment.",
            Stage::Clean => "Cleanup failed. Aborting deployment.",
            Stage::Build => "Build failed. Aborting deployment.",
            Stage::UploadStaging => "Upload to TestPyPI failed. Aborting deployment.",
            Stage::UploadProd => "Upload to PyPI failed.",
            Stage::GitPush => "Git commit or push failed.",
        }
    }

    /// Mandatory stages run unconditionally; optional ones need confirmation.
    pub fn is_mandatory(self) -> bool {
        matches!(
            self,
            Stage::Test | Stage::Clean | Stage::Build | Stage::UploadStaging
        )
    }

    pub fn failure_policy(self) -> FailurePolicy {
        match self {
            Stage::GitPush => FailurePolicy::Report,
            _ => FailurePolicy::Abort,
        }
    }
}

/// A stage together with the commands it runs, in order.
///
/// Commands behave like a `&&` chain: the first failure ends the step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub stage: Stage,
    pub commands: Vec<CommandSpec>,
}

/// Exit status and captured output of one finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// `None` when the process was killed by a signal or never started.
    pub code: Option<i32>,
    /// Captured diagnostic output (stderr tail).
    pub output: Vec<u8>,
}

impl ExecResult {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            output: Vec::new(),
        }
    }

    pub fn failure(code: i32, output: impl Into<Vec<u8>>) -> Self {
        Self {
            code: Some(code),
            output: output.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A step whose command exited unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage:?} failed running `{command}`")]
pub struct StepFailure {
    pub stage: Stage,
    /// Display form of the failing command.
    pub command: String,
    pub code: Option<i32>,
    pub output: Vec<u8>,
}

impl StepFailure {
    /// Captured output decoded permissively.
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

pub fn display_code(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "unknown".to_string(),
    }
}

/// Result of an optional git commit/push step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitPushOutcome {
    Declined,
    Pushed,
    Failed,
}

/// Final result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The completion banner was printed.
    Completed {
        prod_uploaded: bool,
        git: GitPushOutcome,
    },
    /// A stage with [`FailurePolicy::Abort`] failed.
    Aborted(StepFailure),
}

impl PipelineOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineOutcome::Completed { .. })
    }
}
