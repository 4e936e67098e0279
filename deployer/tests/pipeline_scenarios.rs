//! End-to-end pipeline scenarios with scripted tools and operator answers.
//!
//! These drive `run_pipeline` through every branch of the stage sequence and
//! check which commands ran, what was printed, and the final outcome.

use deployer::core::types::{GitPushOutcome, PipelineOutcome, Stage};
use deployer::io::config::DeployConfig;
use deployer::pipeline::{
    COMMIT_MESSAGE_QUESTION, GIT_PUSH_QUESTION, PROD_UPLOAD_QUESTION, run_pipeline,
};
use deployer::test_support::{Answer, ScriptedExecutor, ScriptedOperator, TestProject};

const COMPLETION: &str = "Process completed successfully.";

struct Run {
    outcome: PipelineOutcome,
    executor: ScriptedExecutor,
    operator: ScriptedOperator,
    printed: String,
}

fn run(executor: ScriptedExecutor, answers: Vec<Answer>) -> Run {
    let project = TestProject::with_name("demo-pkg").expect("project");
    let config = DeployConfig {
        package_name: "demo-pkg".to_string(),
        ..DeployConfig::default()
    };
    let mut executor = executor;
    let mut operator = ScriptedOperator::new(answers);
    let mut out = Vec::new();
    let outcome = run_pipeline(
        project.path(),
        &config,
        &mut executor,
        &mut operator,
        &mut out,
    )
    .expect("pipeline");
    Run {
        outcome,
        executor,
        operator,
        printed: String::from_utf8(out).expect("utf8"),
    }
}

/// Test failure stops the run before anything else touches the project.
#[test]
fn failing_tests_abort_before_any_other_step() {
    let run = run(ScriptedExecutor::new().fail_on("pytest", 1), Vec::new());

    match &run.outcome {
        PipelineOutcome::Aborted(failure) => {
            assert_eq!(failure.stage, Stage::Test);
            assert_eq!(failure.code, Some(1));
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert_eq!(
        run.executor.invoked_display(),
        vec!["pytest --maxfail=1 --disable-warnings"]
    );
    assert!(run.operator.asked().is_empty());
    assert!(run.printed.contains("Unit tests failed. Aborting deployment."));
    assert!(!run.printed.contains(COMPLETION));
}

#[test]
fn failing_clean_aborts_before_build() {
    let run = run(ScriptedExecutor::new().fail_on("rm", 1), Vec::new());

    assert!(matches!(
        &run.outcome,
        PipelineOutcome::Aborted(failure) if failure.stage == Stage::Clean
    ));
    assert!(!run.executor.ran("python -m build"));
    assert!(run.printed.contains("Cleanup failed. Aborting deployment."));
    assert!(!run.printed.contains(COMPLETION));
}

#[test]
fn failing_build_aborts_before_uploads() {
    let run = run(ScriptedExecutor::new().fail_on("python", 1), Vec::new());

    assert!(matches!(
        &run.outcome,
        PipelineOutcome::Aborted(failure) if failure.stage == Stage::Build
    ));
    assert!(!run.executor.ran("twine"));
    assert!(run.printed.contains("Build failed. Aborting deployment."));
}

#[test]
fn failing_staging_upload_aborts_before_prompts() {
    let run = run(
        ScriptedExecutor::new().fail_with_output(
            "twine upload --repository testpypi",
            1,
            b"403 Forbidden".to_vec(),
        ),
        Vec::new(),
    );

    assert!(matches!(
        &run.outcome,
        PipelineOutcome::Aborted(failure) if failure.stage == Stage::UploadStaging
    ));
    assert!(run.operator.asked().is_empty());
    assert!(run.printed.contains("Command output (if any): 403 Forbidden"));
    assert!(
        run.printed
            .contains("Upload to TestPyPI failed. Aborting deployment.")
    );
}

/// Scenario: everything succeeds, operator declines both optional steps.
#[test]
fn declining_both_prompts_still_completes() {
    let run = run(ScriptedExecutor::new(), vec![Answer::No, Answer::No]);

    assert_eq!(
        run.outcome,
        PipelineOutcome::Completed {
            prod_uploaded: false,
            git: GitPushOutcome::Declined,
        }
    );
    assert_eq!(
        run.executor.invoked_display(),
        vec![
            "pytest --maxfail=1 --disable-warnings",
            "rm -rf dist build",
            "python -m build",
            "twine upload --repository testpypi 'dist/*'",
        ]
    );
    assert_eq!(
        run.operator.asked(),
        &[PROD_UPLOAD_QUESTION.to_string(), GIT_PUSH_QUESTION.to_string()]
    );
    assert!(!run.executor.ran("git"));
    assert!(run.printed.contains("Skipping upload to PyPI."));
    assert!(run.printed.contains("Upload to TestPyPI successful."));
    assert!(run.printed.contains(COMPLETION));
}

/// Scenario: operator accepts both prompts with an explicit message.
#[test]
fn accepting_both_prompts_uploads_then_pushes() {
    let run = run(
        ScriptedExecutor::new(),
        vec![
            Answer::Yes,
            Answer::Yes,
            Answer::Text("release v1".to_string()),
        ],
    );

    assert_eq!(
        run.outcome,
        PipelineOutcome::Completed {
            prod_uploaded: true,
            git: GitPushOutcome::Pushed,
        }
    );
    let invoked = run.executor.invoked_display();
    assert_eq!(
        &invoked[4..],
        &[
            "twine upload 'dist/*'".to_string(),
            "git add .".to_string(),
            "git commit -m 'release v1'".to_string(),
            "git push".to_string(),
        ]
    );
    let commit = &run.executor.invoked()[6];
    assert_eq!(commit.args.last().map(String::as_str), Some("release v1"));
    assert_eq!(run.operator.asked()[2], COMMIT_MESSAGE_QUESTION);
    assert!(run.printed.contains("Upload to PyPI completed successfully."));
    assert!(run.printed.contains("Changes pushed to GitHub successfully."));

    let pushed = run.printed.find("Changes pushed").expect("pushed");
    let done = run.printed.find(COMPLETION).expect("done");
    assert!(pushed < done);
}

#[test]
fn blank_commit_message_defaults_to_fix() {
    let run = run(
        ScriptedExecutor::new(),
        vec![Answer::No, Answer::Yes, Answer::Text("   ".to_string())],
    );

    assert!(run.executor.ran("git commit -m fix"));
    assert!(run.printed.contains("Skipping upload to PyPI."));
}

#[test]
fn failed_prod_upload_halts_before_git_prompt() {
    let run = run(
        ScriptedExecutor::new().fail_on("twine upload 'dist/*'", 1),
        vec![Answer::Yes],
    );

    assert!(matches!(
        &run.outcome,
        PipelineOutcome::Aborted(failure) if failure.stage == Stage::UploadProd
    ));
    assert_eq!(run.operator.asked(), &[PROD_UPLOAD_QUESTION.to_string()]);
    assert!(!run.executor.ran("git"));
    assert!(run.printed.contains("Upload to PyPI failed."));
    assert!(!run.printed.contains(COMPLETION));
}

#[test]
fn failed_git_push_is_reported_and_run_completes() {
    let run = run(
        ScriptedExecutor::new().fail_on("git push", 128),
        vec![Answer::No, Answer::Yes, Answer::Text("wip".to_string())],
    );

    assert_eq!(
        run.outcome,
        PipelineOutcome::Completed {
            prod_uploaded: false,
            git: GitPushOutcome::Failed,
        }
    );
    assert!(run.printed.contains("Exit status: 128"));
    assert!(run.printed.contains("Git commit or push failed."));
    assert!(run.printed.contains(COMPLETION));
    assert_eq!(run.operator.remaining(), 0);
}

#[test]
fn failed_git_commit_skips_push() {
    let run = run(
        ScriptedExecutor::new().fail_on("git commit", 1),
        vec![Answer::No, Answer::Yes, Answer::Text("nothing".to_string())],
    );

    assert!(!run.executor.ran("git push"));
    assert!(run.outcome.is_completed());
}

#[test]
fn missing_tool_is_reported_as_step_failure() {
    let run = run(ScriptedExecutor::new().missing("pytest"), Vec::new());

    assert!(matches!(
        &run.outcome,
        PipelineOutcome::Aborted(failure) if failure.stage == Stage::Test && failure.code.is_none()
    ));
    assert!(run.printed.contains("Exit status: unknown"));
}

#[test]
fn banner_names_package_and_progress_is_ordered() {
    let run = run(ScriptedExecutor::new(), vec![Answer::No, Answer::No]);

    assert!(
        run.printed
            .starts_with("\n========================================\nDeploying demo-pkg\n")
    );
    let order = [
        "Running unit tests...",
        "Running: Unit Tests",
        "Cleaning up old build artifacts...",
        "Running: Cleanup",
        "Building the package...",
        "Running: Build",
        "Uploading to TestPyPI...",
        "Running: Upload to TestPyPI",
        "Skipping upload to PyPI.",
        COMPLETION,
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|line| run.printed.find(line).expect(line))
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}
