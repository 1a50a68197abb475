//! Repository admission by `owner/name` allow-list.
use thiserror::Error;
use tracing::{error, warn};

/// Why a repository was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("invalid repository format")]
    InvalidFormat,
    #[error("repository not in allowed repositories")]
    NotAllowed,
}

/// Allow-list of `owner/name` patterns, each half a literal or `*`.
///
/// An empty list admits every well-formed repository.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowList {
    patterns: Vec<String>,
}

impl AllowList {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// Admit `repository` or say why not. Nothing is logged for the target.
    pub fn check(&self, repository: &str) -> Result<(), Rejection> {
        check(repository, &self.patterns)
    }
}

/// Returns `true` when `target` (`owner/name`) matches any entry of `allowed`.
///
/// A target that is not exactly two `/`-separated parts is always rejected,
/// even against an empty list. Malformed entries are skipped.
pub fn match_allowed_repo(target: &str, allowed: &[String]) -> bool {
    match check(target, allowed) {
        Ok(()) => true,
        Err(Rejection::InvalidFormat) => {
            error!(repository = target, "invalid repository format");
            false
        }
        Err(Rejection::NotAllowed) => false,
    }
}

fn check(target: &str, allowed: &[String]) -> Result<(), Rejection> {
    let (owner, name) = split_repo(target).ok_or(Rejection::InvalidFormat)?;
    if allowed.is_empty() {
        return Ok(());
    }

    let matched = allowed.iter().any(|entry| match split_repo(entry) {
        Some((allowed_owner, allowed_name)) => {
            (allowed_owner == "*" || allowed_owner == owner)
                && (allowed_name == "*" || allowed_name == name)
        }
        None => {
            warn!(entry = %entry, "invalid allowed repository format");
            false
        }
    });
    if matched { Ok(()) } else { Err(Rejection::NotAllowed) }
}

fn split_repo(repo: &str) -> Option<(&str, &str)> {
    let mut parts = repo.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) => Some((owner, name)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_list_admits_everything() {
        assert!(match_allowed_repo("org/repo", &[]));
    }

    #[test]
    fn wildcard_name_matches_owner() {
        assert!(match_allowed_repo("org/repo", &list(&["org/*"])));
        assert!(!match_allowed_repo("org/repo", &list(&["other/*"])));
    }

    #[test]
    fn wildcard_owner_and_literal_pairs() {
        assert!(match_allowed_repo("org/repo", &list(&["*/repo"])));
        assert!(match_allowed_repo("org/repo", &list(&["*/*"])));
        assert!(match_allowed_repo("org/repo", &list(&["x/y", "org/repo"])));
        assert!(!match_allowed_repo("org/repo", &list(&["org/other"])));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!match_allowed_repo("Org/repo", &list(&["org/repo"])));
    }

    #[test]
    fn malformed_targets_are_rejected() {
        for target in ["", "org", "org/repo/extra", "a/b/c/d"] {
            assert!(!match_allowed_repo(target, &[]), "{target}");
            assert!(!match_allowed_repo(target, &list(&["*/*"])), "{target}");
        }
    }

    #[test]
    fn malformed_entries_are_skipped() {
        assert!(!match_allowed_repo("org/repo", &list(&["org", "a/b/c"])));
        assert!(match_allowed_repo("org/repo", &list(&["org", "org/*"])));
    }

    #[test]
    fn check_reports_the_rejection_reason() {
        let allow = AllowList::new(list(&["team/*"]));
        assert_eq!(allow.check("team/app"), Ok(()));
        assert_eq!(allow.check("other/app"), Err(Rejection::NotAllowed));
        assert_eq!(allow.check("not-a-repo"), Err(Rejection::InvalidFormat));
        assert_eq!(AllowList::default().check("any/repo"), Ok(()));
        assert_eq!(AllowList::default().check("a/b/c"), Err(Rejection::InvalidFormat));
    }
}
