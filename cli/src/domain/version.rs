//! Agent version normalization and comparison.
//!
//! Agent versions are four-part strings (`2.7.0.0`), so they usually do not
//! parse as semver. Three-part versions are compared as semver with build
//! metadata ignored; everything else falls back to normalized string equality.

/// Trim whitespace and a leading `v`/`V`.
#[must_use]
pub fn normalize(version: &str) -> &str {
    let trimmed = version.trim();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed)
}

/// Whether an installed version satisfies the target.
///
/// Absence of either side counts as a mismatch.
#[must_use]
pub fn versions_match(installed: Option<&str>, target: Option<&str>) -> bool {
    let (Some(installed), Some(target)) = (installed, target) else {
        return false;
    };
    let (installed, target) = (normalize(installed), normalize(target));
    if installed.is_empty() || target.is_empty() {
        return false;
    }
    match (semver::Version::parse(installed), semver::Version::parse(target)) {
        (Ok(a), Ok(b)) => {
            a.major == b.major && a.minor == b.minor && a.patch == b.patch && a.pre == b.pre
        }
        _ => installed == target,
    }
}
