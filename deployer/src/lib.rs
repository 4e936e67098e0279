//! Deployment pipeline runner for Python packages.
//!
//! Runs tests, cleans and builds the package, uploads it to TestPyPI, and
//! then, with operator confirmation, uploads to PyPI and commits/pushes.
//!
//! - **[`core`]**: Pure types: stages, failure policies, command descriptions.
//! - **[`io`]**: Side-effecting adapters (process execution, prompts, config,
//!   artifact globbing). Isolated behind traits so tests can script them.
//!
//! [`plan`] turns configuration into concrete steps and [`pipeline`] runs them.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod plan;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
