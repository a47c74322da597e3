//! API generations of the validation library.

use std::fmt;

/// Major number of a version string such as `3.24.2`, `v4.1.0` or
/// `4.0.0-beta`.
#[must_use]
pub fn major_version(version: &str) -> Option<u32> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    let digits: String = version.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// The library surface shared by every version of one major.
///
/// Issue codes, message wording and a handful of exports differ between
/// generations; everything else is common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiGeneration {
    /// Major 3.
    V3,
    /// Major 4.
    V4,
}

impl ApiGeneration {
    /// Generation for a major version number.
    #[must_use]
    pub const fn from_major(major: u32) -> Option<Self> {
        match major {
            3 => Some(Self::V3),
            4 => Some(Self::V4),
            _ => None,
        }
    }

    /// Generation for a version string such as `3.24.2` or `4.0.0-beta`.
    #[must_use]
    pub fn for_version(version: &str) -> Option<Self> {
        major_version(version).and_then(Self::from_major)
    }

    /// Major version number.
    #[must_use]
    pub const fn major(self) -> u32 {
        match self {
            Self::V3 => 3,
            Self::V4 => 4,
        }
    }
}

impl fmt::Display for ApiGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.major())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("3.22.0-beta"), Some(3));
        assert_eq!(major_version(" v4.1.0"), Some(4));
        assert_eq!(major_version("12.0.0"), Some(12));
        assert_eq!(major_version("latest"), None);
    }

    #[test]
    fn test_for_version() {
        assert_eq!(ApiGeneration::for_version("3.24.2"), Some(ApiGeneration::V3));
        assert_eq!(ApiGeneration::for_version("4.0.0-beta"), Some(ApiGeneration::V4));
        assert_eq!(ApiGeneration::for_version("2.5.0"), None);
        assert_eq!(ApiGeneration::for_version("latest"), None);
    }
}
