//! Remote repository address parsing.
//!
//! Two shapes are recognized:
//! - HTTPS: `https://host/OWNER/REPO[.git]`
//! - SSH: `user@host:OWNER/REPO[.git]`

use regex::Regex;
use std::sync::LazyLock;

static HTTPS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://([^/\s]+)/([^/\s]+)/([^/\s]+?)(?:\.git)?/?$").unwrap()
});

static SSH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s/]+@([^:\s/]+):([^/\s]+)/([^/\s]+?)(?:\.git)?/?$").unwrap()
});

/// Host, owner and repository name extracted from a remote address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub host: String,
    pub owner: String,
    pub repo: String,
}

impl RemoteRef {
    /// Parse an HTTPS or SSH remote address. Returns `None` for anything else.
    pub fn parse(url: &str) -> Option<Self> {
        let url = url.trim();
        let caps = HTTPS_REGEX
            .captures(url)
            .or_else(|| SSH_REGEX.captures(url))?;

        Some(Self {
            host: caps[1].to_string(),
            owner: caps[2].to_string(),
            repo: caps[3].to_string(),
        })
    }

    /// `OWNER/REPO`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https() {
        let remote = RemoteRef::parse("https://github.com/acme/widgets").unwrap();
        assert_eq!(remote.host, "github.com");
        assert_eq!(remote.owner, "acme");
        assert_eq!(remote.repo, "widgets");
    }

    #[test]
    fn test_parse_https_strips_git_suffix() {
        let remote = RemoteRef::parse("https://gitlab.example.com/team/api.git").unwrap();
        assert_eq!(remote.host, "gitlab.example.com");
        assert_eq!(remote.full_name(), "team/api");
    }

    #[test]
    fn test_parse_ssh() {
        let remote = RemoteRef::parse("git@github.com:acme/AM-Suisse.git").unwrap();
        assert_eq!(remote.host, "github.com");
        assert_eq!(remote.owner, "acme");
        assert_eq!(remote.repo, "AM-Suisse");
    }

    #[test]
    fn test_reject_unrecognized_shapes() {
        assert!(RemoteRef::parse("github.com/acme/widgets").is_none());
        assert!(RemoteRef::parse("https://github.com/acme").is_none());
        assert!(RemoteRef::parse("/srv/git/widgets.git").is_none());
        assert!(RemoteRef::parse("").is_none());
    }
}
