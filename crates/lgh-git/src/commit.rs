//! Commit and file diff types produced by the log parser

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Date layout used by `git log` without a `--date` option
const GIT_DEFAULT_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y %z";

/// Extension that marks a vector-image payload
const VECTOR_IMAGE_EXTENSION: &str = ".svg";

/// A commit reconstructed from `git log -p` output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The commit hash as printed on the `commit` line
    pub hash: String,
    /// Author line contents (`Name <email>`), if present
    pub author: Option<String>,
    /// Date line contents, if present
    pub date: Option<String>,
    /// Message lines in log order, each followed by a newline
    pub message: String,
    /// File diffs in the order they appear in the log
    pub diffs: Vec<FileDiff>,
}

impl Commit {
    /// Check if this is a merge commit
    ///
    /// A first-parent log shows no diff for a merge, so a commit with no
    /// recorded file diffs is treated as one.
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.diffs.is_empty()
    }

    /// The message with the log's indentation and blank padding trimmed
    #[must_use]
    pub fn trimmed_message(&self) -> &str {
        self.message.trim()
    }

    /// Get the first non-empty line of the message (subject)
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    }

    /// Get the short hash (first 7 characters)
    #[must_use]
    pub fn short_hash(&self) -> &str {
        self.hash.get(..7).unwrap_or(&self.hash)
    }

    /// Parse the date line in git's default format
    ///
    /// Returns `None` when the commit has no date or the date uses
    /// another layout.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        let date = self.date.as_deref()?;
        DateTime::parse_from_str(date.trim(), GIT_DEFAULT_DATE_FORMAT).ok()
    }
}

/// Changes to a single file within a commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Path from the `a/` side of the `diff --git` header
    pub path: String,
    /// Object id before the change, empty without an `index` line
    pub index_before: String,
    /// Object id after the change, empty without an `index` line
    pub index_after: String,
    /// Raw content lines, kept individually so consumers can cap by line
    pub contents: Vec<String>,
}

impl FileDiff {
    /// Create an empty diff for the given path
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Whether the path names a vector image, whose body is never kept
    #[must_use]
    pub fn is_vector_image(&self) -> bool {
        self.path.contains(VECTOR_IMAGE_EXTENSION)
    }

    /// Total size of the retained content lines in bytes
    #[must_use]
    pub fn content_bytes(&self) -> usize {
        self.contents.iter().map(String::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use similar_asserts::assert_eq;

    fn sample_commit() -> Commit {
        Commit {
            hash: "1945ab9c752534e733c38ba0109dc3b741f0a6eb".to_string(),
            author: Some("Test Author <test@example.com>".to_string()),
            date: Some("Sat Jan 17 02:33:06 2026 +0900".to_string()),
            message: "\n    feat: add release notes\n\n    Detailed description here.\n\n"
                .to_string(),
            diffs: vec![FileDiff::new("src/lib.rs")],
        }
    }

    #[test]
    fn test_commit_serialization_roundtrip() {
        let commit = sample_commit();
        let json = serde_json::to_string(&commit).expect("serialize");
        let deserialized: Commit = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(commit, deserialized);
    }

    #[test]
    fn test_is_merge_without_diffs() {
        let mut commit = sample_commit();
        commit.diffs.clear();
        assert!(commit.is_merge());
    }

    #[test]
    fn test_is_merge_with_diffs() {
        assert!(!sample_commit().is_merge());
    }

    #[test]
    fn test_trimmed_message() {
        let commit = sample_commit();
        assert_eq!(
            commit.trimmed_message(),
            "feat: add release notes\n\n    Detailed description here."
        );
    }

    #[test]
    fn test_subject_skips_leading_blank_lines() {
        assert_eq!(sample_commit().subject(), "feat: add release notes");
    }

    #[test]
    fn test_subject_empty_message() {
        let mut commit = sample_commit();
        commit.message = String::new();
        assert_eq!(commit.subject(), "");
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(sample_commit().short_hash(), "1945ab9");
    }

    #[test]
    fn test_short_hash_handles_short_input() {
        let mut commit = sample_commit();
        commit.hash = "abc".to_string();
        assert_eq!(commit.short_hash(), "abc");
    }

    #[test]
    fn test_timestamp_parses_git_default_format() {
        let ts = sample_commit().timestamp().expect("should parse");
        assert_eq!(ts.year(), 2026);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 17);
        assert_eq!(ts.hour(), 2);
        assert_eq!(ts.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_timestamp_single_digit_day() {
        let mut commit = sample_commit();
        commit.date = Some("Thu Apr 7 15:13:13 2005 -0700".to_string());
        let ts = commit.timestamp().expect("should parse");
        assert_eq!(ts.day(), 7);
    }

    #[test]
    fn test_timestamp_missing_or_unparseable() {
        let mut commit = sample_commit();
        commit.date = None;
        assert!(commit.timestamp().is_none());
        commit.date = Some("yesterday".to_string());
        assert!(commit.timestamp().is_none());
    }

    #[test]
    fn test_file_diff_vector_image() {
        assert!(FileDiff::new("assets/logo.svg").is_vector_image());
        assert!(FileDiff::new("assets/logo.svg.orig").is_vector_image());
        assert!(!FileDiff::new("assets/logo.png").is_vector_image());
    }

    #[test]
    fn test_file_diff_content_bytes() {
        let mut diff = FileDiff::new("a.txt");
        diff.contents = vec!["+abc".to_string(), "-de".to_string()];
        assert_eq!(diff.content_bytes(), 7);
    }
}
