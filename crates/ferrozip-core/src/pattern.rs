//! Shell-glob matching against an entry's base name

use glob::Pattern;
use std::path::Path;
use tracing::debug;

/// Return the final segment of a slash-separated name.
///
/// `a/b/` yields `b`. Names without a normal final segment (`.`, `..`, `/`)
/// are returned unchanged.
pub fn base_name(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
}

/// Check whether the base name of `name` matches any of `patterns`.
///
/// An empty pattern list matches nothing. Patterns that fail to parse are
/// skipped rather than reported.
pub fn matches_any<S: AsRef<str>>(name: &str, patterns: &[S]) -> bool {
    let base = base_name(name);
    patterns.iter().any(|p| match Pattern::new(p.as_ref()) {
        Ok(pattern) => pattern.matches(base),
        Err(e) => {
            debug!(pattern = p.as_ref(), error = %e, "Ignoring invalid glob pattern");
            false
        }
    })
}
