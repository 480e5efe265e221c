//! Target whitelist.
//!
//! A target is allowed when it contains at least one configured substring.
//! An empty list allows everything.

use crate::error::ProxyError;

#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    entries: Vec<String>,
}

impl Whitelist {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn allows(&self, target: &str) -> bool {
        self.entries.is_empty() || self.entries.iter().any(|entry| target.contains(entry.as_str()))
    }

    /// `WhitelistRejected` unless `target` is allowed.
    pub fn check(&self, target: &str) -> Result<(), ProxyError> {
        if self.allows(target) {
            Ok(())
        } else {
            tracing::debug!(target_url = %target, "Target not whitelisted");
            Err(ProxyError::WhitelistRejected(target.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allows_all() {
        assert!(Whitelist::default().allows("github.com/anyone/anything"));
    }

    #[test]
    fn substring_match() {
        let list = Whitelist::new(vec!["/alice/".into(), "gist.github.com".into()]);
        assert!(list.allows("github.com/alice/repo/archive/main.zip"));
        assert!(list.allows("https://gist.github.com/bob/123/raw"));
        assert!(!list.allows("github.com/bob/repo/archive/main.zip"));
        assert!(matches!(
            list.check("bob/repo"),
            Err(ProxyError::WhitelistRejected(_))
        ));
    }
}
