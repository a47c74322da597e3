//! Version normalization.
//!
//! Registry versions look like `3.24.2`, `3.22.0-beta.3` or
//! `4.0.0-canary.20250301T001122`. The picker shows pre-release builds under
//! their tag name only, so `3.22.0-beta.3` normalizes to `3.22.0-beta`.

use std::sync::LazyLock;

use regex::Regex;

/// Collapses `<tag>.<anything>` to `<tag>`.
static PRE_RELEASE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z]+)\..*").expect("Invalid pre-release suffix regex"));

/// Normalize a raw registry version for display and selection.
///
/// Only the first `<lowercase-word>.` occurrence and everything after it is
/// collapsed; stable versions pass through unchanged.
#[must_use]
pub fn normalize_version(raw: &str) -> String {
    PRE_RELEASE_SUFFIX.replacen(raw.trim(), 1, "$1").into_owned()
}
