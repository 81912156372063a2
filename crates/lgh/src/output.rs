//! Artifact files for a branch summary
//!
//! Every run writes into `<root>/<repository>/<branch>`: one `CLnnnnn` change
//! log per regular commit, one `CSnnnnn` summary per commit and `commits.json`.
//! A summarizing run adds the branch-wide `summary.txt`; a dry run adds
//! `prompts.json` instead.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

/// Prefix of per-commit change log files
pub const CHANGE_LOG_PREFIX: &str = "CL";

/// Prefix of per-commit summary files
pub const COMMIT_SUMMARY_PREFIX: &str = "CS";

/// Release notes for the whole branch
pub const SUMMARY_FILE: &str = "summary.txt";

/// Structured dump of the parsed commits
pub const COMMITS_FILE: &str = "commits.json";

/// Prepared chat prompts
pub const PROMPTS_FILE: &str = "prompts.json";

/// Errors writing artifacts
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Filesystem failure
    #[error("Failed to write {path}: {source}")]
    Io {
        /// Path being written
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// JSON encoding failure
    #[error("Failed to encode {path}: {source}")]
    Json {
        /// Path being written
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
}

impl OutputError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Number used in artifact names for commit `index` of `total`
///
/// The oldest commit gets 1, so file names sort chronologically.
#[must_use]
pub fn artifact_number(total: usize, index: usize) -> usize {
    total - index
}

/// Directory name for a branch, with `/` replaced by `_`
#[must_use]
pub fn branch_dir_name(target: &str) -> String {
    target.replace('/', "_")
}

/// Output directory for one branch of one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    /// Locate the directory for `target` in repository `repo_name` under `root`
    #[must_use]
    pub fn for_branch(root: &Path, repo_name: &str, target: &str) -> Self {
        Self {
            path: root.join(repo_name).join(branch_dir_name(target)),
        }
    }

    /// Directory path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory and remove artifacts left by an earlier run
    ///
    /// Only files this module names are removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or listed.
    pub fn prepare(&self) -> Result<(), OutputError> {
        fs::create_dir_all(&self.path).map_err(|e| OutputError::io(&self.path, e))?;

        let entries = fs::read_dir(&self.path).map_err(|e| OutputError::io(&self.path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| OutputError::io(&self.path, e))?;
            let name = entry.file_name();
            if is_artifact_name(&name.to_string_lossy()) {
                let stale = entry.path();
                debug!(path = %stale.display(), "Removing stale artifact");
                fs::remove_file(&stale).map_err(|e| OutputError::io(&stale, e))?;
            }
        }
        Ok(())
    }

    /// Write the change log of a regular commit
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_change_log(&self, number: usize, text: &str) -> Result<PathBuf, OutputError> {
        self.write_text(&numbered(CHANGE_LOG_PREFIX, number), text)
    }

    /// Write the summary of one commit
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_commit_summary(&self, number: usize, text: &str) -> Result<PathBuf, OutputError> {
        self.write_text(&numbered(COMMIT_SUMMARY_PREFIX, number), text)
    }

    /// Write the branch-wide release notes
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_summary(&self, text: &str) -> Result<PathBuf, OutputError> {
        self.write_text(SUMMARY_FILE, text)
    }

    /// Write a value as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<PathBuf, OutputError> {
        let path = self.path.join(name);
        let json = serde_json::to_string_pretty(value).map_err(|source| OutputError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|e| OutputError::io(&path, e))?;
        Ok(path)
    }

    fn write_text(&self, name: &str, text: &str) -> Result<PathBuf, OutputError> {
        let path = self.path.join(name);
        fs::write(&path, text).map_err(|e| OutputError::io(&path, e))?;
        debug!(path = %path.display(), bytes = text.len(), "Wrote artifact");
        Ok(path)
    }
}

fn numbered(prefix: &str, number: usize) -> String {
    format!("{prefix}{number:05}")
}

fn is_artifact_name(name: &str) -> bool {
    if [COMMITS_FILE, PROMPTS_FILE, SUMMARY_FILE].contains(&name) {
        return true;
    }
    [CHANGE_LOG_PREFIX, COMMIT_SUMMARY_PREFIX].iter().any(|prefix| {
        name.strip_prefix(prefix)
            .is_some_and(|rest| rest.len() >= 5 && rest.bytes().all(|b| b.is_ascii_digit()))
    })
}
