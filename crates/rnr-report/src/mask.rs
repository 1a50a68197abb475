use aho_corasick::{AhoCorasick, MatchKind};
use tracing::error;

/// Replacement written in place of every secret occurrence.
pub const MASK: &str = "***";

/// Append-only set of secrets with a single-pass replacer.
///
/// The automaton is rebuilt whenever a secret is added, so replacement is
/// simultaneous across all secrets: a written `***` is never rescanned and
/// overlapping secrets are replaced once, preferring the longest match.
#[derive(Debug, Default)]
pub struct Masker {
    secrets: Vec<String>,
    matcher: Option<AhoCorasick>,
}

impl Masker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `secret`; returns `false` for empty or already known secrets.
    pub fn add(&mut self, secret: &str) -> bool {
        if secret.is_empty() || self.secrets.iter().any(|s| s == secret) {
            return false;
        }
        self.secrets.push(secret.to_string());
        self.rebuild();
        true
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    pub fn mask(&self, line: &str) -> String {
        let Some(matcher) = &self.matcher else {
            return line.to_string();
        };

        let mut out = String::with_capacity(line.len());
        matcher.replace_all_with(line, &mut out, |_, _, dst| {
            dst.push_str(MASK);
            true
        });
        out
    }

    fn rebuild(&mut self) {
        match AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&self.secrets)
        {
            Ok(matcher) => self.matcher = Some(matcher),
            // Only size limits fail the build; the previous matcher stays in place.
            Err(e) => error!(error = %e, secrets = self.secrets.len(), "failed to rebuild mask matcher"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_secrets_is_identity() {
        assert_eq!(Masker::new().mask("plain text"), "plain text");
    }

    #[test]
    fn replaces_every_occurrence() {
        let mut m = Masker::new();
        m.add("tok");
        assert_eq!(m.mask("tok tok-tok"), "*** ***-***");
    }

    #[test]
    fn empty_and_duplicate_secrets_are_ignored() {
        let mut m = Masker::new();
        assert!(!m.add(""));
        assert!(m.add("a1"));
        assert!(!m.add("a1"));
        assert_eq!(m.len(), 1);
        assert_eq!(m.mask("xa1x"), "x***x");
    }

    #[test]
    fn overlapping_secrets_prefer_longest() {
        let mut m = Masker::new();
        m.add("pass");
        m.add("password");
        assert_eq!(m.mask("my password"), "my ***");
    }

    #[test]
    fn longest_match_wins_regardless_of_insertion_order() {
        let mut m = Masker::new();
        m.add("password");
        m.add("pass");
        assert_eq!(m.mask("my password, pass"), "my ***, ***");
    }

    #[test]
    fn adjacent_secrets_are_each_replaced() {
        let mut m = Masker::new();
        m.add("ab");
        m.add("cd");
        assert_eq!(m.mask("abcdab"), "*********");
    }

    #[test]
    fn replacement_is_not_rescanned() {
        let mut m = Masker::new();
        m.add("a");
        m.add("**");
        // A sequential replacer would turn the first "***" into "****".
        assert_eq!(m.mask("a"), "***");
        assert_eq!(m.mask("a**"), "******");
    }
}
