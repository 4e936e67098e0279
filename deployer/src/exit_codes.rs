//! Stable exit codes for the deployer CLI.

/// Pipeline completed (optional steps may have been declined or failed softly).
pub const OK: i32 = 0;
/// A mandatory step, or a confirmed production upload, failed.
pub const ABORTED: i32 = 1;
/// Internal error: working directory, operator input, or project metadata.
pub const INVALID: i32 = 2;
