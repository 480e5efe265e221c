//! GitHub URL classification.
//!
//! # Responsibilities
//! - Tag a target string with the kind of GitHub resource it points at
//! - Normalize the scheme of path-mode targets
//! - Derive CDN and raw-link rewrites for file-view links
//!
//! # Design Decisions
//! - Patterns are an ordered list of `(regex, kind)` pairs; first match wins
//! - Matching is case-insensitive and the scheme is optional
//! - Compiled once at startup and shared immutably

use regex::Regex;

/// Host that file-view links are redirected to when the CDN mirror is on.
pub const JSDELIVR_BASE: &str = "https://cdn.jsdelivr.net/gh";

/// Kind of resource a target refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Release asset or source archive download.
    ReleasesArchive,
    /// Human-facing file view (`blob`) or raw redirect (`raw`) on github.com.
    BlobRaw,
    /// Smart-HTTP endpoints used by `git clone`.
    GitProtocol,
    /// File served from raw.githubusercontent.com.
    RawContentHost,
    /// Gist content.
    Gist,
    /// Tags listing page.
    Tags,
    Unrecognized,
}

impl TargetKind {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::ReleasesArchive => "releases_archive",
            TargetKind::BlobRaw => "blob_raw",
            TargetKind::GitProtocol => "git_protocol",
            TargetKind::RawContentHost => "raw_content_host",
            TargetKind::Gist => "gist",
            TargetKind::Tags => "tags",
            TargetKind::Unrecognized => "unrecognized",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved destination of a forwarded request together with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    /// Absolute target URL (scheme always present).
    pub url: String,
    pub kind: TargetKind,
}

/// Patterns in priority order.
const PATTERNS: &[(&str, TargetKind)] = &[
    (
        r"(?i)^(?:https?://)?github\.com/.+?/.+?/(?:releases|archive)/.*$",
        TargetKind::ReleasesArchive,
    ),
    (
        r"(?i)^(?:https?://)?github\.com/.+?/.+?/(?:blob|raw)/.*$",
        TargetKind::BlobRaw,
    ),
    (
        r"(?i)^(?:https?://)?github\.com/.+?/.+?/(?:info|git-).*$",
        TargetKind::GitProtocol,
    ),
    (
        r"(?i)^(?:https?://)?raw\.(?:githubusercontent|github)\.com/.+?/.+?/.+?/.+$",
        TargetKind::RawContentHost,
    ),
    (
        r"(?i)^(?:https?://)?gist\.(?:githubusercontent|github)\.com/.+?/.+?/.+$",
        TargetKind::Gist,
    ),
    (
        r"(?i)^(?:https?://)?github\.com/.+?/.+?/tags.*$",
        TargetKind::Tags,
    ),
];

/// Ordered GitHub URL matcher.
#[derive(Debug, Clone)]
pub struct Classifier {
    patterns: Vec<(Regex, TargetKind)>,
    collapsed_scheme: Regex,
    file_view: Regex,
}

impl Classifier {
    /// Compile the pattern table.
    pub fn new() -> Result<Self, regex::Error> {
        let patterns = PATTERNS
            .iter()
            .map(|(pattern, kind)| Ok((Regex::new(pattern)?, *kind)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            patterns,
            collapsed_scheme: Regex::new(r"(?i)^https?:/+")?,
            file_view: Regex::new(r"(?i)^(?:https?://)?github\.com/(.+?)/(.+?)/(?:blob|raw)/(.*)$")?,
        })
    }

    /// Classify a target string. Total: anything unmatched is `Unrecognized`.
    pub fn classify(&self, target: &str) -> TargetKind {
        self.patterns
            .iter()
            .find(|(pattern, _)| pattern.is_match(target))
            .map(|(_, kind)| *kind)
            .unwrap_or(TargetKind::Unrecognized)
    }

    /// True if the target matches any GitHub pattern.
    pub fn is_recognized(&self, target: &str) -> bool {
        self.classify(target) != TargetKind::Unrecognized
    }

    /// Classify and attach an absolute URL.
    pub fn describe(&self, target: &str) -> TargetDescriptor {
        TargetDescriptor {
            url: with_scheme(target),
            kind: self.classify(target),
        }
    }

    /// Rewrite `http:/x`, `https:///x` and friends to `https://x`.
    ///
    /// Some platforms merge `//` in request paths, so a target embedded in a
    /// path often arrives as `https:/github.com/...`.
    pub fn normalize(&self, target: &str) -> String {
        self.collapsed_scheme.replace(target, "https://").into_owned()
    }

    /// jsDelivr URL for a github.com file-view link.
    pub fn cdn_url(&self, target: &str) -> Option<String> {
        let caps = self.file_view.captures(target)?;
        Some(format!(
            "{}/{}/{}@{}",
            JSDELIVR_BASE, &caps[1], &caps[2], &caps[3]
        ))
    }
}

/// Turn a file-view link into the equivalent raw link.
pub fn blob_to_raw(target: &str) -> String {
    target.replacen("/blob/", "/raw/", 1)
}

/// Prefix `https://` unless the target already carries an http(s) scheme.
pub fn with_scheme(target: &str) -> String {
    let lower = target.get(..8).unwrap_or(target).to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        target.to_string()
    } else {
        format!("https://{}", target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new().unwrap()
    }

    #[test]
    fn test_classify_kinds() {
        let c = classifier();
        let cases = [
            ("github.com/user/repo/archive/main.zip", TargetKind::ReleasesArchive),
            (
                "https://github.com/user/repo/releases/download/v1.0/app.tar.gz",
                TargetKind::ReleasesArchive,
            ),
            ("github.com/user/repo/blob/main/README.md", TargetKind::BlobRaw),
            ("github.com/user/repo/raw/main/README.md", TargetKind::BlobRaw),
            (
                "github.com/user/repo.git/info/refs?service=git-upload-pack",
                TargetKind::GitProtocol,
            ),
            ("https://github.com/user/repo/git-upload-pack", TargetKind::GitProtocol),
            (
                "raw.githubusercontent.com/user/repo/main/install.sh",
                TargetKind::RawContentHost,
            ),
            (
                "https://gist.githubusercontent.com/user/abc123/raw/file.txt",
                TargetKind::Gist,
            ),
            ("github.com/user/repo/tags", TargetKind::Tags),
            ("example.com/data.json", TargetKind::Unrecognized),
            ("github.com/user", TargetKind::Unrecognized),
            ("", TargetKind::Unrecognized),
        ];

        for (target, expected) in cases {
            assert_eq!(c.classify(target), expected, "target: {}", target);
        }
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let c = classifier();
        assert_eq!(
            c.classify("HTTPS://GitHub.com/User/Repo/ARCHIVE/v1.zip"),
            TargetKind::ReleasesArchive
        );
    }

    #[test]
    fn test_first_match_wins() {
        let c = classifier();
        // Matches both the releases and the blob shape; releases is listed first.
        assert_eq!(
            c.classify("github.com/user/repo/blob/main/releases/notes.md"),
            TargetKind::ReleasesArchive
        );
    }

    #[test]
    fn test_normalize_collapsed_scheme() {
        let c = classifier();
        assert_eq!(
            c.normalize("https:/github.com/user/repo"),
            "https://github.com/user/repo"
        );
        assert_eq!(
            c.normalize("http:///github.com/user/repo"),
            "https://github.com/user/repo"
        );
        assert_eq!(c.normalize("github.com/user/repo"), "github.com/user/repo");
    }

    #[test]
    fn test_cdn_url() {
        let c = classifier();
        assert_eq!(
            c.cdn_url("github.com/user/repo/blob/main/dir/file.js").as_deref(),
            Some("https://cdn.jsdelivr.net/gh/user/repo@main/dir/file.js")
        );
        assert_eq!(c.cdn_url("github.com/user/repo/archive/main.zip"), None);
    }

    #[test]
    fn test_describe_adds_scheme() {
        let c = classifier();
        let descriptor = c.describe("gist.github.com/user/abc/raw");
        assert_eq!(descriptor.url, "https://gist.github.com/user/abc/raw");
        assert_eq!(descriptor.kind, TargetKind::Gist);

        let descriptor = c.describe("http://example.com/x");
        assert_eq!(descriptor.url, "http://example.com/x");
        assert_eq!(descriptor.kind, TargetKind::Unrecognized);
    }

    #[test]
    fn test_blob_to_raw() {
        assert_eq!(
            blob_to_raw("https://github.com/u/r/blob/main/a/blob/b"),
            "https://github.com/u/r/raw/main/a/blob/b"
        );
    }
}
