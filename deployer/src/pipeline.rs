//! Orchestration for one deployment run.
//!
//! Stages run strictly in order: test, clean, build, staging upload, then
//! the two operator-confirmed stages (production upload, git commit/push).
//! Progress text goes to `out`; diagnostics go through `tracing`.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::command::CommandSpec;
use crate::core::types::{
    ExecResult, FailurePolicy, GitPushOutcome, PipelineOutcome, Stage, Step, StepFailure,
    display_code,
};
use crate::io::config::DeployConfig;
use crate::io::executor::CommandExecutor;
use crate::io::operator::Operator;
use crate::plan::{git_push_step, plan_step};

pub const PROD_UPLOAD_QUESTION: &str = "Do you want to upload to PyPI?";
pub const GIT_PUSH_QUESTION: &str = "Do you want to commit and push changes to GitHub?";
pub const COMMIT_MESSAGE_QUESTION: &str = "Enter commit message:";

const RULE: &str = "========================================";

/// Run the full pipeline in `root`.
///
/// Returns `Ok(Aborted)` when a stage with [`FailurePolicy::Abort`] fails;
/// `Err` only for problems outside the pipeline's control (unwritable
/// output, unreadable operator input, bad configuration).
#[instrument(skip_all, fields(root = %root.display(), package = %config.package_name))]
pub fn run_pipeline<E, O, W>(
    root: &Path,
    config: &DeployConfig,
    executor: &mut E,
    operator: &mut O,
    out: &mut W,
) -> Result<PipelineOutcome>
where
    E: CommandExecutor,
    O: Operator,
    W: Write,
{
    config.validate()?;
    banner(out, &format!("Deploying {}", config.package_name))?;

    // Planned right before running: clean globs and dist files must reflect
    // what the previous stage left on disk.
    for stage in Stage::ALL.into_iter().filter(|stage| stage.is_mandatory()) {
        let step = plan_step(root, config, stage)?;
        if let Some(failure) = execute(&step, executor, out)?
            && aborts(&failure)
        {
            return Ok(PipelineOutcome::Aborted(failure));
        }
    }

    let prod_uploaded = if operator.ask_yes_no(PROD_UPLOAD_QUESTION)? {
        let step = plan_step(root, config, Stage::UploadProd)?;
        if let Some(failure) = execute(&step, executor, out)?
            && aborts(&failure)
        {
            return Ok(PipelineOutcome::Aborted(failure));
        }
        true
    } else {
        writeln!(out, "Skipping upload to PyPI.").context("write progress")?;
        false
    };

    let git = if operator.ask_yes_no(GIT_PUSH_QUESTION)? {
        let answer =
            operator.ask_text(COMMIT_MESSAGE_QUESTION, &config.commit_message_default)?;
        let message = commit_message(&answer, &config.commit_message_default);
        debug!(message, "commit message");
        match execute(&git_push_step(message), executor, out)? {
            None => GitPushOutcome::Pushed,
            Some(_) => GitPushOutcome::Failed,
        }
    } else {
        GitPushOutcome::Declined
    };

    banner(out, "Process completed successfully.")?;
    info!(prod_uploaded, git = ?git, "deployment completed");
    Ok(PipelineOutcome::Completed { prod_uploaded, git })
}

/// Blank answers fall back to the default message.
fn commit_message<'a>(answer: &'a str, default: &'a str) -> &'a str {
    let trimmed = answer.trim();
    if trimmed.is_empty() { default } else { trimmed }
}

fn aborts(failure: &StepFailure) -> bool {
    failure.stage.failure_policy() == FailurePolicy::Abort
}

/// Run a step, printing its announcement and success or failure message.
///
/// Returns the failure, if any; the caller applies the stage's policy.
fn execute<E: CommandExecutor, W: Write>(
    step: &Step,
    executor: &mut E,
    out: &mut W,
) -> Result<Option<StepFailure>> {
    let stage = step.stage;
    if let Some(announcement) = stage.announcement() {
        writeln!(out, "{announcement}").context("write progress")?;
    }

    let err = match run_step(step, executor, out) {
        Ok(()) => {
            if let Some(message) = stage.success_message() {
                writeln!(out, "{message}").context("write progress")?;
            }
            return Ok(None);
        }
        Err(err) => err,
    };

    let failure = err.downcast::<StepFailure>()?;
    writeln!(out, "{}", stage.failure_message()).context("write progress")?;
    warn!(stage = ?stage, policy = ?stage.failure_policy(), "step failed");
    Ok(Some(failure))
}

/// Run each of the step's commands until one fails.
///
/// A failing command is reported to `out` and surfaces as a [`StepFailure`]
/// inside the returned error; other errors are output failures.
pub fn run_step<E: CommandExecutor, W: Write>(
    step: &Step,
    executor: &mut E,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Running: {}", step.stage.description()).context("write progress")?;
    out.flush().context("flush progress")?;

    for command in &step.commands {
        let result = match executor.exec(command) {
            Ok(result) => result,
            Err(err) => {
                warn!(err = %err, "command could not be started");
                ExecResult {
                    code: None,
                    output: format!("{err:#}").into_bytes(),
                }
            }
        };
        if result.is_success() {
            continue;
        }
        report_failure(out, command, &result)?;
        return Err(StepFailure {
            stage: step.stage,
            command: command.display(),
            code: result.code,
            output: result.output,
        }
        .into());
    }
    Ok(())
}

fn report_failure<W: Write>(
    out: &mut W,
    command: &CommandSpec,
    result: &ExecResult,
) -> Result<()> {
    writeln!(out, "\nError while running: {command}").context("write progress")?;
    writeln!(out, "Exit status: {}", display_code(result.code)).context("write progress")?;
    if !result.output.is_empty() {
        writeln!(
            out,
            "Command output (if any): {}",
            String::from_utf8_lossy(&result.output)
        )
        .context("write progress")?;
    }
    Ok(())
}

fn banner<W: Write>(out: &mut W, title: &str) -> Result<()> {
    writeln!(out, "\n{RULE}\n{title}\n{RULE}").context("write progress")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{build_step, test_step};
    use crate::test_support::ScriptedExecutor;

    #[test]
    fn commit_message_defaults_when_blank() {
        assert_eq!(commit_message("", "fix"), "fix");
        assert_eq!(commit_message("   ", "fix"), "fix");
        assert_eq!(commit_message(" release v1 ", "fix"), "release v1");
    }

    #[test]
    fn run_step_stops_at_first_failing_command() {
        let mut executor = ScriptedExecutor::new().fail_on("git commit", 1);
        let mut out = Vec::new();
        let step = git_push_step("msg");

        let err = run_step(&step, &mut executor, &mut out).unwrap_err();
        let failure = err.downcast_ref::<StepFailure>().expect("step failure");
        assert_eq!(failure.stage, Stage::GitPush);
        assert_eq!(failure.command, "git commit -m msg");
        assert_eq!(
            executor.invoked_display(),
            vec!["git add .", "git commit -m msg"]
        );
    }

    #[test]
    fn run_step_reports_command_status_and_output() {
        let mut executor = ScriptedExecutor::new().fail_with_output(
            "python -m build",
            2,
            b"no setup\xff".to_vec(),
        );
        let mut out = Vec::new();
        let step = build_step(&DeployConfig::default()).expect("plan");

        assert!(run_step(&step, &mut executor, &mut out).is_err());
        let printed = String::from_utf8(out).expect("utf8");
        assert!(printed.starts_with("Running: Build\n"));
        assert!(printed.contains("\nError while running: python -m build\n"));
        assert!(printed.contains("Exit status: 2\n"));
        assert!(printed.contains("Command output (if any): no setup\u{FFFD}"));
    }

    #[test]
    fn run_step_without_output_skips_output_line() {
        let mut executor = ScriptedExecutor::new().fail_on("pytest", 1);
        let mut out = Vec::new();
        let step = test_step(&DeployConfig::default()).expect("plan");

        assert!(run_step(&step, &mut executor, &mut out).is_err());
        let printed = String::from_utf8(out).expect("utf8");
        assert!(printed.contains("Exit status: 1"));
        assert!(!printed.contains("Command output"));
    }

    #[test]
    fn spawn_error_becomes_step_failure() {
        let mut executor = ScriptedExecutor::new().missing("pytest");
        let mut out = Vec::new();
        let step = test_step(&DeployConfig::default()).expect("plan");

        let err = run_step(&step, &mut executor, &mut out).unwrap_err();
        let failure = err.downcast_ref::<StepFailure>().expect("step failure");
        assert_eq!(failure.code, None);
        assert!(failure.output_text().contains("pytest"));
        let printed = String::from_utf8(out).expect("utf8");
        assert!(printed.contains("Exit status: unknown"));
    }

    #[test]
    fn execute_returns_git_failure_without_success_message() {
        let mut executor = ScriptedExecutor::new().fail_on("git push", 128);
        let mut out = Vec::new();

        let failure = execute(&git_push_step("fix"), &mut executor, &mut out)
            .expect("execute")
            .expect("failure");
        assert!(!aborts(&failure));
        let printed = String::from_utf8(out).expect("utf8");
        assert!(printed.contains("Git commit or push failed."));
        assert!(!printed.contains("pushed to GitHub successfully"));
    }

    #[test]
    fn mandatory_failures_abort() {
        let mut executor = ScriptedExecutor::new().fail_on("pytest", 1);
        let mut out = Vec::new();
        let step = test_step(&DeployConfig::default()).expect("plan");

        let failure = execute(&step, &mut executor, &mut out)
            .expect("execute")
            .expect("failure");
        assert!(aborts(&failure));
    }
}
