// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! `git log -p` output parsing
//!
//! This module turns the raw text of `git log --first-parent -p --no-color`
//! into an ordered sequence of [`Commit`] values in a single pass.
//!
//! Each line is classified by its prefix ([`LogLine::classify`]) and fed to a
//! small state machine that holds at most one open commit and one open file
//! diff. An open value is sealed into its parent when a boundary line of equal
//! or higher rank arrives, or when input ends.
//!
//! # Example
//!
//! ```
//! use lgh_git::parser::parse_log;
//!
//! let log = "commit 1a2b3c\nAuthor: Jane <jane@example.com>\n\n    Fix typo\n";
//! let commits = parse_log(log).unwrap();
//! assert_eq!(commits.len(), 1);
//! assert_eq!(commits[0].trimmed_message(), "Fix typo");
//! assert!(commits[0].is_merge());
//! ```

use std::io::{BufRead, Read};

use tracing::{debug, warn};

use crate::commit::{Commit, FileDiff};
use crate::error::GitError;

// ============================================================================
// Line Classification
// ============================================================================

/// Syntactic role of one line of `git log -p` output
///
/// Prefixes are tested in priority order and the first match wins. A content
/// line that itself starts with `+++ ` or `--- ` is therefore read as a file
/// header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLine<'a> {
    /// `commit <hash> [decoration]` starts a new commit, carrying the hash
    CommitHeader(&'a str),
    /// `Author: <name>`
    Author(&'a str),
    /// `Date:   <date>`
    Date(&'a str),
    /// `diff --git a/<path> b/<path>`, carrying the `a/`-stripped path
    DiffHeader(&'a str),
    /// `index <before>..<after> [mode]`, carrying the id pair token
    Index(&'a str),
    /// `--- a/<path>` or `+++ b/<path>`
    FileHeader,
    /// `@@ -l,s +l,s @@` hunk marker
    Hunk(&'a str),
    /// `Binary files ... differ`
    Binary(&'a str),
    /// Any other line: diff content or commit message
    Text(&'a str),
}

impl<'a> LogLine<'a> {
    /// Classify a single line (without its line terminator)
    #[must_use]
    pub fn classify(line: &'a str) -> Self {
        if let Some(rest) = line.strip_prefix("commit ") {
            Self::CommitHeader(rest.split_whitespace().next().unwrap_or(""))
        } else if let Some(author) = line.strip_prefix("Author: ") {
            Self::Author(author)
        } else if let Some(date) = line.strip_prefix("Date:   ") {
            Self::Date(date)
        } else if let Some(rest) = line.strip_prefix("diff --git ") {
            let first = rest.split_whitespace().next().unwrap_or("");
            Self::DiffHeader(first.strip_prefix("a/").unwrap_or(first))
        } else if let Some(rest) = line.strip_prefix("index ") {
            Self::Index(rest.split_whitespace().next().unwrap_or(""))
        } else if line.starts_with("+++ ") || line.starts_with("--- ") {
            Self::FileHeader
        } else if line.starts_with("@@") {
            Self::Hunk(line)
        } else if line.starts_with("Binary files ") {
            Self::Binary(line)
        } else {
            Self::Text(line)
        }
    }
}

// ============================================================================
// Parser State
// ============================================================================

/// What the parser currently has open
#[derive(Debug, Default)]
enum ParseState {
    /// Before the first `commit` line
    #[default]
    NoCommit,
    /// Inside a commit's header or message
    InCommit(Commit),
    /// Inside a file diff section of a commit
    InCommitInDiff(Commit, FileDiff),
}

impl ParseState {
    fn commit_mut(&mut self) -> Option<&mut Commit> {
        match self {
            Self::NoCommit => None,
            Self::InCommit(commit) | Self::InCommitInDiff(commit, _) => Some(commit),
        }
    }

    /// Close the open diff (if any) into its commit and hand the commit back
    fn seal(self) -> Option<Commit> {
        match self {
            Self::NoCommit => None,
            Self::InCommit(commit) => Some(commit),
            Self::InCommitInDiff(mut commit, diff) => {
                commit.diffs.push(diff);
                Some(commit)
            }
        }
    }
}

// ============================================================================
// Log Parser
// ============================================================================

/// Single-pass parser for `git log -p` output
#[derive(Debug)]
pub struct LogParser {
    state: ParseState,
    commits: Vec<Commit>,
    max_line_bytes: usize,
    skipped_lines: usize,
}

impl LogParser {
    /// Default maximum length of a single line (2 MiB)
    ///
    /// Minified assets and generated files routinely produce diff lines far
    /// longer than a typical read buffer.
    pub const MAX_LINE_BYTES: usize = 2 * 1024 * 1024;

    /// Create a new parser with the default line limit
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ParseState::NoCommit,
            commits: Vec::new(),
            max_line_bytes: Self::MAX_LINE_BYTES,
            skipped_lines: 0,
        }
    }

    /// Override the maximum accepted line length in bytes
    #[must_use]
    pub fn with_max_line_bytes(mut self, limit: usize) -> Self {
        self.max_line_bytes = limit;
        self
    }

    /// The maximum accepted line length in bytes
    #[must_use]
    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    /// Feed one line (without its terminator) into the state machine
    pub fn process_line(&mut self, line: &str) {
        match LogLine::classify(line) {
            LogLine::CommitHeader(hash) => {
                self.seal_commit();
                self.state = ParseState::InCommit(Commit {
                    hash: hash.to_string(),
                    ..Default::default()
                });
            }
            LogLine::Author(author) => match self.state.commit_mut() {
                Some(commit) => commit.author = Some(author.to_string()),
                None => self.skipped_lines += 1,
            },
            LogLine::Date(date) => match self.state.commit_mut() {
                Some(commit) => commit.date = Some(date.to_string()),
                None => self.skipped_lines += 1,
            },
            LogLine::DiffHeader(path) => match std::mem::take(&mut self.state) {
                ParseState::NoCommit => self.skipped_lines += 1,
                ParseState::InCommit(commit) => {
                    self.state = ParseState::InCommitInDiff(commit, FileDiff::new(path));
                }
                ParseState::InCommitInDiff(mut commit, diff) => {
                    commit.diffs.push(diff);
                    self.state = ParseState::InCommitInDiff(commit, FileDiff::new(path));
                }
            },
            LogLine::Index(ids) => {
                if let ParseState::InCommitInDiff(_, diff) = &mut self.state {
                    match ids.split_once("..") {
                        Some((before, after)) => {
                            diff.index_before = before.to_string();
                            diff.index_after = after.to_string();
                        }
                        None => debug!(path = %diff.path, line = %line, "Index line without id range"),
                    }
                }
            }
            LogLine::FileHeader => {}
            LogLine::Hunk(text) | LogLine::Binary(text) | LogLine::Text(text) => {
                match &mut self.state {
                    ParseState::InCommitInDiff(_, diff) => {
                        if !diff.is_vector_image() {
                            diff.contents.push(text.to_string());
                        }
                    }
                    ParseState::InCommit(commit) => {
                        commit.message.push_str(text);
                        commit.message.push('\n');
                    }
                    ParseState::NoCommit => self.skipped_lines += 1,
                }
            }
        }
    }

    /// Seal whatever is open and return the commits in log order
    #[must_use]
    pub fn finish(mut self) -> Vec<Commit> {
        self.seal_commit();
        if self.skipped_lines > 0 {
            warn!(
                lines = self.skipped_lines,
                "Ignored log lines outside of any commit"
            );
        }
        self.commits
    }

    /// Parse a complete log from a buffered reader
    ///
    /// Lines may end in `\n` or `\r\n`. Nothing is returned unless the whole
    /// input parses.
    ///
    /// Every line must be UTF-8. A single diff line from a file in another
    /// encoding (Latin-1, Shift_JIS, ...) fails the whole parse with
    /// `MalformedLog`, naming the line so the offending file can be found.
    ///
    /// # Errors
    ///
    /// Returns `GitError::LineTooLong` if a line exceeds the line limit,
    /// `GitError::MalformedLog` if a line is not valid UTF-8, and
    /// `GitError::Io` if the reader fails.
    pub fn parse_reader<R: BufRead>(mut self, mut reader: R) -> Result<Vec<Commit>, GitError> {
        let chunk_limit = self.max_line_bytes as u64 + 1;
        let mut buf = Vec::new();
        let mut line_number = 0;

        loop {
            buf.clear();
            let read = reader
                .by_ref()
                .take(chunk_limit)
                .read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            line_number += 1;

            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            } else if read as u64 == chunk_limit {
                return Err(GitError::LineTooLong {
                    line: line_number,
                    limit: self.max_line_bytes,
                });
            }

            let line = std::str::from_utf8(&buf).map_err(|e| GitError::MalformedLog {
                line: line_number,
                message: e.to_string(),
            })?;
            self.process_line(line);
        }

        debug!(lines = line_number, "Finished reading log");
        Ok(self.finish())
    }

    fn seal_commit(&mut self) {
        if let Some(commit) = std::mem::take(&mut self.state).seal() {
            debug!(
                hash = %commit.short_hash(),
                diffs = commit.diffs.len(),
                "Sealed commit"
            );
            self.commits.push(commit);
        }
    }
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `git log -p` text with the default line limit
///
/// # Errors
///
/// Returns `GitError::LineTooLong` if a single line exceeds
/// [`LogParser::MAX_LINE_BYTES`].
pub fn parse_log(text: &str) -> Result<Vec<Commit>, GitError> {
    LogParser::new().parse_reader(text.as_bytes())
}

/// Parse raw `git log -p` output bytes with the default line limit
///
/// # Errors
///
/// Returns `GitError::MalformedLog` if the bytes are not UTF-8 and
/// `GitError::LineTooLong` if a single line is too long.
pub fn parse_log_bytes(bytes: &[u8]) -> Result<Vec<Commit>, GitError> {
    LogParser::new().parse_reader(bytes)
}
