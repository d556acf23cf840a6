//! Repository scopes.
//!
//! A tenant's scope is the list of `org/repo` identifiers read from its
//! container label. The token cache is keyed by [`ScopeKey`], which
//! normalizes that list so that input order never produces a second mint.

use std::collections::BTreeSet;
use std::fmt;

/// Normalized, order-independent identifier for a set of repositories.
///
/// Built by sorting and de-duplicating the repository names and joining
/// them with `,`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeKey(String);

impl ScopeKey {
    /// Derive the key for a set of repositories.
    pub fn from_repos<S: AsRef<str>>(repos: &[S]) -> Self {
        let sorted: BTreeSet<&str> = repos.iter().map(AsRef::as_ref).collect();
        Self(sorted.into_iter().collect::<Vec<_>>().join(","))
    }

    /// The key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split a comma-separated repository label into individual entries.
///
/// Entries are trimmed of surrounding whitespace; empty entries are dropped.
pub fn parse_repos(label: &str) -> Vec<String> {
    label
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strip the organization prefix from each `org/repo` entry.
///
/// The installation token endpoint only accepts bare repository names.
pub fn short_repo_names<S: AsRef<str>>(repos: &[S]) -> Vec<String> {
    repos
        .iter()
        .map(|r| {
            let r = r.as_ref();
            match r.split_once('/') {
                Some((_, name)) => name.to_string(),
                None => r.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_key_is_order_independent() {
        let a = ScopeKey::from_repos(&["org/repoB", "org/repoA", "org/repoC"]);
        let b = ScopeKey::from_repos(&["org/repoC", "org/repoB", "org/repoA"]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "org/repoA,org/repoB,org/repoC");
    }

    #[test]
    fn test_scope_key_distinguishes_sets() {
        let a = ScopeKey::from_repos(&["org/repoA"]);
        let b = ScopeKey::from_repos(&["org/repoB", "org/repoC"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_scope_key_ignores_duplicates() {
        let a = ScopeKey::from_repos(&["org/a", "org/b", "org/a"]);
        let b = ScopeKey::from_repos(&["org/b", "org/a"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_repos_trims_entries() {
        assert_eq!(
            parse_repos(" org/a ,org/b,  org/c"),
            vec!["org/a", "org/b", "org/c"]
        );
    }

    #[test]
    fn test_parse_repos_empty_label() {
        assert!(parse_repos("").is_empty());
        assert!(parse_repos(" , ").is_empty());
    }

    #[test]
    fn test_short_repo_names() {
        assert_eq!(
            short_repo_names(&["org/a", "b", "org/nested/c"]),
            vec!["a", "b", "nested/c"]
        );
    }
}
