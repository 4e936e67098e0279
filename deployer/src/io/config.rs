//! Deployment settings and package metadata lookup.
//!
//! There is no deployer configuration file: the commands below are fixed
//! defaults. The only thing read from disk is the package name in
//! `pyproject.toml`, used for the start banner.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_PACKAGE_NAME: &str = "tks-api-official";
pub const DEFAULT_COMMIT_MESSAGE: &str = "fix";
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 64 * 1024;

/// Commands and paths used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// Name shown in the start banner.
    pub package_name: String,

    /// Test runner invocation (e.g. `["pytest", ...]`).
    pub test_command: Vec<String>,

    /// Paths (glob patterns allowed) removed by the clean step.
    pub clean_targets: Vec<String>,

    pub build_command: Vec<String>,

    /// Upload invocation; distribution files are appended.
    pub staging_upload_command: Vec<String>,
    pub prod_upload_command: Vec<String>,

    /// Directory the build step writes distributions into.
    pub dist_dir: String,

    pub commit_message_default: String,

    /// Keep at most this many bytes of a command's stderr for failure reports.
    pub output_limit_bytes: usize,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            test_command: argv(&["pytest", "--maxfail=1", "--disable-warnings"]),
            clean_targets: argv(&["dist", "build", "*.egg-info"]),
            build_command: argv(&["python", "-m", "build"]),
            staging_upload_command: argv(&["twine", "upload", "--repository", "testpypi"]),
            prod_upload_command: argv(&["twine", "upload"]),
            dist_dir: "dist".to_string(),
            commit_message_default: DEFAULT_COMMIT_MESSAGE.to_string(),
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

impl DeployConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, command) in [
            ("test_command", &self.test_command),
            ("build_command", &self.build_command),
            ("staging_upload_command", &self.staging_upload_command),
            ("prod_upload_command", &self.prod_upload_command),
        ] {
            if command.is_empty() || command[0].trim().is_empty() {
                return Err(anyhow!("{name} must be a non-empty array"));
            }
        }
        if self.clean_targets.is_empty() {
            return Err(anyhow!("clean_targets must not be empty"));
        }
        if self.dist_dir.trim().is_empty() {
            return Err(anyhow!("dist_dir must not be empty"));
        }
        if self.commit_message_default.trim().is_empty() {
            return Err(anyhow!("commit_message_default must not be empty"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Build the config for the project rooted at `root`.
///
/// The package name comes from `pyproject.toml` when it names one.
pub fn load_config(root: &Path) -> Result<DeployConfig> {
    let mut cfg = DeployConfig::default();
    if let Some(name) = read_package_name(&root.join("pyproject.toml"))? {
        cfg.package_name = name;
    }
    cfg.validate()?;
    Ok(cfg)
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    project: Option<NamedTable>,
    tool: Option<ToolTable>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolTable {
    poetry: Option<NamedTable>,
}

#[derive(Debug, Default, Deserialize)]
struct NamedTable {
    name: Option<String>,
}

/// Read `[project].name` (or `[tool.poetry].name`) from a `pyproject.toml`.
///
/// A missing file or a file without a name yields `Ok(None)`.
pub fn read_package_name(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        debug!(path = %path.display(), "no pyproject.toml");
        return Ok(None);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let pyproject: PyProject =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    let name = pyproject
        .project
        .and_then(|project| project.name)
        .or_else(|| pyproject.tool.and_then(|tool| tool.poetry).and_then(|p| p.name))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    debug!(package = ?name, "read package name");
    Ok(name)
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}
