//! I/O helpers for the deployment pipeline.

pub mod artifacts;
pub mod config;
pub mod executor;
pub mod operator;
pub mod process;
