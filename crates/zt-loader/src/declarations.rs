//! Candidate paths for type-declaration files.

use zt_schema::ApiGeneration;

/// Candidate declaration paths per major, tried in order.
const DECLARATION_PATHS: &[(u32, &[&str])] = &[
    (3, &["lib/types.d.ts", "lib/index.d.ts"]),
    (4, &["v4/classic/schemas.d.ts", "index.d.ts"]),
];

/// Declaration paths to try for `version`; empty for unknown majors.
#[must_use]
pub fn candidate_paths(version: &str) -> &'static [&'static str] {
    ApiGeneration::for_version(version)
        .map(ApiGeneration::major)
        .and_then(|major| {
            DECLARATION_PATHS
                .iter()
                .find(|(m, _)| *m == major)
                .map(|(_, paths)| *paths)
        })
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_by_major() {
        assert_eq!(candidate_paths("3.24.2"), &["lib/types.d.ts", "lib/index.d.ts"]);
        assert_eq!(candidate_paths("4.0.0-beta.20250420"), &["v4/classic/schemas.d.ts", "index.d.ts"]);
        assert!(candidate_paths("1.11.17").is_empty());
        assert!(candidate_paths("garbage").is_empty());
        assert_eq!(candidate_paths(" v3.24.2"), &["lib/types.d.ts", "lib/index.d.ts"]);
    }
}
