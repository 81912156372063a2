// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for lgh-git

use thiserror::Error;

/// Errors that can occur while reading or parsing branch history
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found at the specified path
    #[error("Repository not found: {path}")]
    RepositoryNotFound {
        /// The path that was searched for a repository
        path: String,
    },

    /// A branch, tag, or commit reference does not resolve
    #[error("Reference `{reference}` does not exist")]
    ReferenceNotFound {
        /// The reference string that could not be resolved
        reference: String,
    },

    /// The two references share no history
    #[error("No common ancestor between `{base}` and `{target}`: {message}")]
    NoCommonAncestor {
        /// The base reference of the range
        base: String,
        /// The target reference of the range
        target: String,
        /// Diagnostic output of the failed lookup
        message: String,
    },

    /// The `git` executable could not be started or exited non-zero
    #[error("`git {command}` failed: {message}")]
    ExternalTool {
        /// Arguments passed to `git`, space separated
        command: String,
        /// Diagnostic output of the tool (stderr or the spawn error)
        message: String,
    },

    /// The log text is not line-structured UTF-8
    #[error("Malformed log output at line {line}: {message}")]
    MalformedLog {
        /// 1-based line number of the offending line
        line: usize,
        /// Description of the decoding failure
        message: String,
    },

    /// A single log line exceeds the parser's line buffer
    #[error("Log line {line} exceeds the {limit}-byte line limit")]
    LineTooLong {
        /// 1-based line number of the offending line
        line: usize,
        /// The configured maximum line length in bytes
        limit: usize,
    },

    /// Error reading log text from a stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
