//! Glob expansion for build outputs, done in-process instead of by a shell.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Expand `pattern` relative to `root`, returning sorted matches relative to `root`.
///
/// Patterns without glob metacharacters are returned unchanged, whether or
/// not the path exists (e.g. `rm -rf dist` with no `dist`).
pub fn expand(root: &Path, pattern: &str) -> Result<Vec<String>> {
    if !pattern.contains(['*', '?', '[']) {
        return Ok(vec![pattern.to_string()]);
    }
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let full = format!("{escaped_root}/{pattern}");
    let mut matches = Vec::new();
    // Like a shell, `*` does not match a leading dot.
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };
    let entries = glob::glob_with(&full, options)
        .with_context(|| format!("invalid glob pattern {pattern}"))?;
    for entry in entries {
        let path = entry.with_context(|| format!("read glob match for {pattern}"))?;
        let relative = path.strip_prefix(root).unwrap_or(&path);
        matches.push(relative.to_string_lossy().into_owned());
    }
    matches.sort();
    debug!(pattern, count = matches.len(), "expanded glob");
    Ok(matches)
}

/// Expand every clean target; unmatched globs are dropped.
pub fn clean_paths(root: &Path, targets: &[String]) -> Result<Vec<String>> {
    let mut paths = Vec::new();
    for target in targets {
        paths.extend(expand(root, target)?);
    }
    Ok(paths)
}

/// Distribution files under `dist_dir`.
///
/// When nothing matches, the literal `<dist_dir>/*` pattern is returned so
/// the upload tool reports the missing files, as it would under a shell.
pub fn dist_files(root: &Path, dist_dir: &str) -> Result<Vec<String>> {
    let pattern = format!("{}/*", dist_dir.trim_end_matches('/'));
    let files = expand(root, &pattern)?;
    if files.is_empty() {
        return Ok(vec![pattern]);
    }
    Ok(files)
}
