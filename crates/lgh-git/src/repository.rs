// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Reading branch history through the `git` executable
//!
//! [`GitRepo`] locates a repository with `git2` and then reads history by
//! running `git` as a subprocess in the repository's working directory, so the
//! raw `git log -p` text can be handed to the [`parser`](crate::parser).

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, info};

use crate::commit::Commit;
use crate::error::GitError;
use crate::parser::LogParser;

/// Options fixing the `git log -p` layout the parser expects
///
/// Each one overrides a user or repository setting that would otherwise
/// change the text: `format.pretty`, `log.decorate`, `log.abbrevCommit`,
/// `log.date`, `log.showSignature`, `diff.external`, textconv drivers,
/// `diff.noprefix`/`diff.mnemonicPrefix` and `color.ui`. Newer git also diffs
/// merges against their first parent under `--first-parent` unless told not to.
const LOG_FORMAT_ARGS: &[&str] = &[
    "--first-parent",
    "--diff-merges=off",
    "-p",
    "--format=medium",
    "--no-decorate",
    "--no-abbrev-commit",
    "--date=default",
    "--no-show-signature",
    "--no-ext-diff",
    "--no-textconv",
    "--src-prefix=a/",
    "--dst-prefix=b/",
    "--no-color",
];

/// A git repository read through the `git` command line tool
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    /// Open a git repository at the given path
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if the path is not a git repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = git2::Repository::open(path).map_err(|_| GitError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self::from_git2(&repo))
    }

    /// Discover and open a git repository containing the given path
    ///
    /// This walks up the directory tree to find a `.git` directory.
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if no repository is found.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = git2::Repository::discover(path).map_err(|_| GitError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self::from_git2(&repo))
    }

    fn from_git2(repo: &git2::Repository) -> Self {
        // Bare repositories have no working directory; run git in the git dir
        let root = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        Self { root }
    }

    /// Directory the `git` subprocess runs in
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the repository directory, used to key output locations
    #[must_use]
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().trim_end_matches(".git").to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "repository".to_string())
    }

    /// Confirm that a branch, tag, or commit reference resolves
    ///
    /// # Errors
    ///
    /// Returns `GitError::ReferenceNotFound` naming the reference if it does
    /// not resolve, or `GitError::ExternalTool` if `git` cannot be started.
    pub fn verify_reference(&self, reference: &str) -> Result<(), GitError> {
        let output = self.spawn_git(&["rev-parse", "--verify", reference])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(GitError::ReferenceNotFound {
                reference: reference.to_string(),
            })
        }
    }

    /// Find the most recent common ancestor of two references
    ///
    /// # Errors
    ///
    /// Returns `GitError::NoCommonAncestor` if `git merge-base` fails, or
    /// `GitError::ExternalTool` if `git` cannot be started.
    pub fn merge_base(&self, base: &str, target: &str) -> Result<String, GitError> {
        let output = self.spawn_git(&["merge-base", base, target])?;
        if !output.status.success() {
            return Err(GitError::NoCommonAncestor {
                base: base.to_string(),
                target: target.to_string(),
                message: diagnostic(&output),
            });
        }

        let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(base_ref = %base, target_ref = %target, merge_base = %commit, "Resolved merge base");
        Ok(commit)
    }

    /// Raw first-parent `git log -p` output for `merge-base(base, target)..target`
    ///
    /// # Errors
    ///
    /// Returns `GitError::NoCommonAncestor` if the references share no
    /// history, or `GitError::ExternalTool` if `git log` fails.
    pub fn log_range(&self, base: &str, target: &str) -> Result<Vec<u8>, GitError> {
        let merge_base = self.merge_base(base, target)?;
        let range = format!("{merge_base}..{target}");
        let mut args = vec!["log"];
        args.extend_from_slice(LOG_FORMAT_ARGS);
        args.push(range.as_str());
        self.exec_git(&args)
    }

    /// Commits reachable from `target` but not from `base`, newest first
    ///
    /// Both references are verified before any log is read so the error
    /// names the reference that is missing.
    ///
    /// # Errors
    ///
    /// Returns `GitError::ReferenceNotFound` for an unknown reference,
    /// `GitError::NoCommonAncestor` for unrelated histories,
    /// `GitError::ExternalTool` if `git` fails, and the parser errors if the
    /// log output cannot be parsed.
    pub fn commits_on_branch(&self, target: &str, base: &str) -> Result<Vec<Commit>, GitError> {
        self.verify_reference(target)?;
        self.verify_reference(base)?;

        let raw = self.log_range(base, target)?;
        let commits = LogParser::new().parse_reader(raw.as_slice())?;

        info!(
            target_ref = %target,
            base_ref = %base,
            commits = commits.len(),
            merges = commits.iter().filter(|c| c.is_merge()).count(),
            "Read branch history"
        );
        Ok(commits)
    }

    /// Run git and fail on a non-zero exit
    fn exec_git(&self, args: &[&str]) -> Result<Vec<u8>, GitError> {
        let output = self.spawn_git(args)?;
        if !output.status.success() {
            return Err(GitError::ExternalTool {
                command: args.join(" "),
                message: diagnostic(&output),
            });
        }
        Ok(output.stdout)
    }

    /// Run git and return its output regardless of exit status
    fn spawn_git(&self, args: &[&str]) -> Result<Output, GitError> {
        debug!(cwd = %self.root.display(), args = ?args, "Running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| GitError::ExternalTool {
                command: args.join(" "),
                message: e.to_string(),
            })
    }
}

/// Diagnostic text of a failed git run
fn diagnostic(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_open_nonexistent_repository() {
        let result = GitRepo::open("/nonexistent/path");
        match result {
            Err(GitError::RepositoryNotFound { path }) => {
                assert!(path.contains("nonexistent"));
            }
            _ => panic!("Expected RepositoryNotFound error"),
        }
    }

    #[test]
    fn test_discover_nonexistent_repository() {
        assert!(matches!(
            GitRepo::discover("/nonexistent/path"),
            Err(GitError::RepositoryNotFound { .. })
        ));
    }

    #[test]
    fn test_name_strips_git_suffix() {
        let repo = GitRepo {
            root: PathBuf::from("/srv/git/project.git"),
        };
        assert_eq!(repo.name(), "project");
    }

    #[test]
    fn test_name_of_working_tree() {
        let repo = GitRepo {
            root: PathBuf::from("/home/dev/lgh/"),
        };
        assert_eq!(repo.name(), "lgh");
    }
}
