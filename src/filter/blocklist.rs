//! Host blocklist.
//!
//! Exact string match on the trimmed hostname. `bad.com` does not cover
//! `sub.bad.com` and no wildcard syntax exists.

use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    hosts: HashSet<String>,
}

impl Blocklist {
    /// Build from an iterator of entries; entries are trimmed and blanks dropped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = entries
            .into_iter()
            .map(|entry| entry.as_ref().trim().to_string())
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { hosts }
    }

    pub fn is_blocked(&self, host: &str) -> bool {
        self.hosts.contains(host.trim())
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_only() {
        let blocklist = Blocklist::new(["bad.com"]);
        assert!(blocklist.is_blocked("bad.com"));
        assert!(!blocklist.is_blocked("sub.bad.com"));
        assert!(!blocklist.is_blocked("bad.com.evil"));
    }

    #[test]
    fn entries_are_trimmed_and_blanks_skipped() {
        let blocklist = Blocklist::new(["  ads.example  ", "", "   ", "tracker.net\r"]);
        assert_eq!(blocklist.len(), 2);
        assert!(blocklist.is_blocked("ads.example"));
        assert!(blocklist.is_blocked("tracker.net"));
    }
}
