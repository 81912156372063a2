// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! lgh-git: structured branch history from `git log -p`
//!
//! This library crate reads the first-parent history of a branch with the
//! `git` executable and parses the raw patch log into [`Commit`] values, each
//! carrying its per-file [`FileDiff`]s, for consumption by the lgh release
//! notes tool.

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use lgh_git::GitRepo;
//!
//! let repo = GitRepo::discover(".").expect("open repo");
//! let commits = repo.commits_on_branch("feature/login", "main")
//!     .expect("read branch");
//!
//! for c in commits {
//!     println!("{} {} ({} files)", c.short_hash(), c.subject(), c.diffs.len());
//! }
//! ```

pub mod commit;
pub mod error;
pub mod parser;
pub mod repository;

pub use commit::{Commit, FileDiff};
pub use error::GitError;
pub use parser::{LogLine, LogParser, parse_log, parse_log_bytes};
pub use repository::GitRepo;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commit::{Commit, FileDiff};
    pub use crate::error::GitError;
    pub use crate::parser::{LogParser, parse_log};
    pub use crate::repository::GitRepo;
}
