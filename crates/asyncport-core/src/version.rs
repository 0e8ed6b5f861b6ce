//! Semantic version ordering and bump strategies
//!
//! Version strings stored in the catalog are plain semantic versions
//! (`MAJOR.MINOR.PATCH`). The highest valid version of a collection is always
//! treated as the latest one.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Version assigned when nothing else is requested
pub const INITIAL_VERSION: &str = "1.0.0";

/// How the next version is derived from the latest existing one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BumpStrategy {
    #[default]
    Patch,
    Minor,
}

impl fmt::Display for BumpStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patch => write!(f, "bump_patch"),
            Self::Minor => write!(f, "bump_minor"),
        }
    }
}

impl FromStr for BumpStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bump_patch" | "patch" => Ok(Self::Patch),
            "bump_minor" | "minor" => Ok(Self::Minor),
            _ => Err(CoreError::UnknownSetting {
                setting: "version strategy",
                value: s.to_string(),
                expected: "bump_patch, bump_minor",
            }),
        }
    }
}

/// Version selection policy used at the call site of a versioned reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStrategy {
    /// Increment the latest existing version
    Bump(BumpStrategy),
    /// The created version must match the requested one exactly
    Exact,
}

impl Default for VersionStrategy {
    fn default() -> Self {
        Self::Bump(BumpStrategy::Patch)
    }
}

impl FromStr for VersionStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "exact_version" | "exact" => Ok(Self::Exact),
            _ => s.parse::<BumpStrategy>().map(Self::Bump).map_err(|_| CoreError::UnknownSetting {
                setting: "version strategy",
                value: s.to_string(),
                expected: "bump_patch, bump_minor, exact_version",
            }),
        }
    }
}

/// Parse a version string, mapping failures to a content error
pub fn parse_version(s: &str) -> Result<Version> {
    Version::parse(s).map_err(|e| CoreError::InvalidVersion {
        version: s.to_string(),
        reason: e.to_string(),
    })
}

/// Check whether a string is a valid semantic version
pub fn is_valid_semver(s: &str) -> bool {
    Version::parse(s).is_ok()
}

/// Compare two version strings using semantic version precedence
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering> {
    Ok(parse_version(a)?.cmp_precedence(&parse_version(b)?))
}

/// Compute the version that follows `base` under the given strategy
pub fn next_version(base: &str, strategy: BumpStrategy) -> Result<String> {
    let parsed = parse_version(base)?;
    let next = match strategy {
        BumpStrategy::Patch => parsed
            .patch
            .checked_add(1)
            .map(|patch| Version::new(parsed.major, parsed.minor, patch)),
        BumpStrategy::Minor => parsed
            .minor
            .checked_add(1)
            .map(|minor| Version::new(parsed.major, minor, 0)),
    };
    next.map(|v| v.to_string()).ok_or_else(|| CoreError::InvalidVersion {
        version: base.to_string(),
        reason: format!("cannot apply {strategy} without overflowing"),
    })
}

/// Find the highest version among `versions`
///
/// The scan starts from an implicit floor of `0.0.0`, so an empty collection
/// yields `None`. A string that fails to parse aborts the scan.
pub fn latest_version<'a, I>(versions: I) -> Result<Option<Version>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut latest = Version::new(0, 0, 0);
    let mut found = false;
    for candidate in versions {
        let parsed = parse_version(candidate)?;
        if !found || parsed.cmp_precedence(&latest) == Ordering::Greater {
            latest = parsed;
            found = true;
        }
    }
    Ok(found.then_some(latest))
}

/// True if `candidate` sorts strictly after `current`
pub fn is_greater(candidate: &str, current: &str) -> Result<bool> {
    Ok(compare_versions(candidate, current)? == Ordering::Greater)
}
