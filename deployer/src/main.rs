//! Deploy a Python package: test, clean, build, upload to TestPyPI, then
//! optionally upload to PyPI and commit/push.

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use deployer::core::types::PipelineOutcome;
use deployer::exit_codes;
use deployer::io::config::load_config;
use deployer::io::executor::SystemExecutor;
use deployer::io::operator::TerminalOperator;
use deployer::logging;
use deployer::pipeline::run_pipeline;
use tracing::error;

#[derive(Parser)]
#[command(
    name = "deployer",
    version,
    about = "Test, build and publish the Python package in the current directory"
)]
struct Cli {}

fn main() {
    let _cli = Cli::parse();
    logging::init();
    let code = match run() {
        Ok(PipelineOutcome::Completed { .. }) => exit_codes::OK,
        Ok(PipelineOutcome::Aborted(failure)) => {
            error!(stage = ?failure.stage, code = ?failure.code, "deployment aborted");
            exit_codes::ABORTED
        }
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<PipelineOutcome> {
    let root = std::env::current_dir().context("determine working directory")?;
    let config = load_config(&root)?;
    let mut executor = SystemExecutor::new(&root, config.output_limit_bytes);
    let mut operator = TerminalOperator::stdio();
    let mut out = io::stdout().lock();
    run_pipeline(&root, &config, &mut executor, &mut operator, &mut out)
}
