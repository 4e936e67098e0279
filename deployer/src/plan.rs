//! Construction of the concrete commands each stage runs.
//!
//! Upload steps must be planned after the build step has run, since the
//! distribution file list is resolved from disk at planning time.

use std::path::Path;

use anyhow::{Result, anyhow};

use crate::core::command::CommandSpec;
use crate::core::types::{Stage, Step};
use crate::io::artifacts::{clean_paths, dist_files};
use crate::io::config::DeployConfig;

/// Plan any stage except [`Stage::GitPush`], which needs a commit message.
pub fn plan_step(root: &Path, config: &DeployConfig, stage: Stage) -> Result<Step> {
    match stage {
        Stage::Test => test_step(config),
        Stage::Clean => clean_step(root, config),
        Stage::Build => build_step(config),
        Stage::UploadStaging | Stage::UploadProd => upload_step(root, config, stage),
        Stage::GitPush => Err(anyhow!("git push is planned with git_push_step")),
    }
}

pub fn test_step(config: &DeployConfig) -> Result<Step> {
    Ok(Step {
        stage: Stage::Test,
        commands: vec![command_from(&config.test_command, "test_command")?],
    })
}

/// `rm -rf` over the clean targets, with globs expanded under `root`.
pub fn clean_step(root: &Path, config: &DeployConfig) -> Result<Step> {
    let paths = clean_paths(root, &config.clean_targets)?;
    Ok(Step {
        stage: Stage::Clean,
        commands: vec![CommandSpec::new("rm").arg("-rf").args(&paths)],
    })
}

pub fn build_step(config: &DeployConfig) -> Result<Step> {
    Ok(Step {
        stage: Stage::Build,
        commands: vec![command_from(&config.build_command, "build_command")?],
    })
}

/// Upload every distribution file to the staging or production index.
pub fn upload_step(root: &Path, config: &DeployConfig, stage: Stage) -> Result<Step> {
    let base = match stage {
        Stage::UploadStaging => {
            command_from(&config.staging_upload_command, "staging_upload_command")?
        }
        Stage::UploadProd => command_from(&config.prod_upload_command, "prod_upload_command")?,
        other => return Err(anyhow!("{other:?} is not an upload stage")),
    };
    let files = dist_files(root, &config.dist_dir)?;
    Ok(Step {
        stage,
        commands: vec![base.args(&files)],
    })
}

/// Stage everything, commit with `message`, push.
///
/// The message is passed to git as a single argument, never through a shell.
pub fn git_push_step(message: &str) -> Step {
    Step {
        stage: Stage::GitPush,
        commands: vec![
            CommandSpec::new("git").arg("add").arg("."),
            CommandSpec::new("git").arg("commit").arg("-m").arg(message),
            CommandSpec::new("git").arg("push"),
        ],
    }
}

fn command_from(argv: &[String], name: &str) -> Result<CommandSpec> {
    CommandSpec::from_argv(argv).ok_or_else(|| anyhow!("{name} is empty"))
}
