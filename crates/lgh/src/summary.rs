// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Change-summary text and chat prompts for parsed commits
//!
//! [`CommitText`] turns one [`Commit`] into an overview (message plus a
//! tagged file list) and one body per changed file. [`PromptSet`] wraps those
//! texts into chat messages asking a model for per-file, per-commit and
//! whole-branch summaries.

use std::fmt;

use lgh_git::{Commit, FileDiff};
use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::config::Language;

/// Maximum bytes of diff content kept per file body
pub const DIFF_BYTE_LIMIT: usize = 40 * 1024;

const NEW_FILE_MARKER: &str = "new file mode ";
const DELETED_FILE_MARKER: &str = "deleted file mode ";
const BINARY_MARKER: &str = "Binary files ";

/// How a file changed within a commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeStatus {
    /// File created by the commit
    Added,
    /// File edited, renamed, or otherwise changed
    #[default]
    Modified,
    /// File removed by the commit
    Deleted,
}

impl ChangeStatus {
    /// Derive the status from a diff's header lines
    #[must_use]
    pub fn of(diff: &FileDiff) -> Self {
        diff.contents
            .iter()
            .find_map(|line| Self::from_marker(line))
            .unwrap_or_default()
    }

    fn from_marker(line: &str) -> Option<Self> {
        if line.starts_with(NEW_FILE_MARKER) {
            Some(Self::Added)
        } else if line.starts_with(DELETED_FILE_MARKER) {
            Some(Self::Deleted)
        } else {
            None
        }
    }

    /// Three-letter tag used in change lists
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Added => "ADD",
            Self::Modified => "MOD",
            Self::Deleted => "DEL",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One file's contribution to a commit summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange<'a> {
    /// Repository-relative path
    pub path: &'a str,
    /// Added, modified, or deleted
    pub status: ChangeStatus,
    /// Trimmed diff lines kept for the body
    pub lines: Vec<&'a str>,
}

impl<'a> FileChange<'a> {
    /// Select the lines of `diff` worth sending, keeping at most `limit` bytes
    ///
    /// The byte count uses the untrimmed line length. Vector images keep no
    /// lines at all.
    #[must_use]
    pub fn from_diff(diff: &'a FileDiff, limit: usize) -> Self {
        let mut lines = Vec::new();
        let mut bytes = 0usize;

        if !diff.is_vector_image() {
            for line in &diff.contents {
                if ChangeStatus::from_marker(line).is_some() || line.starts_with(BINARY_MARKER) {
                    continue;
                }
                if bytes + line.len() > limit {
                    break;
                }
                bytes += line.len();
                lines.push(line.trim());
            }
        }

        Self {
            path: &diff.path,
            status: ChangeStatus::of(diff),
            lines,
        }
    }

    /// "<TAG> <path>" entry for the change list
    #[must_use]
    pub fn list_entry(&self) -> String {
        format!("{} {}", self.status, self.path)
    }

    /// Markdown body: a file heading plus a fenced block of kept lines
    #[must_use]
    pub fn body(&self) -> String {
        let mut body = format!("### File: {}\n", self.path);
        if !self.lines.is_empty() {
            body.push_str("```\n");
            body.push_str(&self.lines.join("\n"));
            body.push_str("\n```\n");
        }
        body
    }
}

/// Summary texts for one non-merge commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitText {
    /// Message and tagged file list
    pub overview: String,
    /// One markdown body per changed file, in diff order
    pub bodies: Vec<String>,
}

impl CommitText {
    /// Build the texts with the default [`DIFF_BYTE_LIMIT`]
    #[must_use]
    pub fn build(commit: &Commit) -> Self {
        Self::with_limit(commit, DIFF_BYTE_LIMIT)
    }

    /// Build the texts keeping at most `limit` diff bytes per file
    #[must_use]
    pub fn with_limit(commit: &Commit, limit: usize) -> Self {
        let changes: Vec<FileChange<'_>> = commit
            .diffs
            .iter()
            .map(|d| FileChange::from_diff(d, limit))
            .collect();

        let mut overview = format!(
            "## Message\n{}\n## All change list:\n",
            commit.trimmed_message()
        );
        for change in &changes {
            overview.push_str(&change.list_entry());
            overview.push('\n');
        }

        Self {
            overview,
            bodies: changes.iter().map(FileChange::body).collect(),
        }
    }

    /// Full change log: overview followed by every file body
    #[must_use]
    pub fn change_log(&self) -> String {
        let mut log = format!("{}\n## Change details:\n", self.overview);
        for body in &self.bodies {
            log.push_str(body);
        }
        log
    }
}

/// Summary line recorded for a merge commit
#[must_use]
pub fn merge_summary(commit: &Commit) -> String {
    format!("* Merged: {}", commit.trimmed_message())
}

const LANGUAGE_SLOT: &str = "{language}";
const CONTENT_SLOT: &str = "{content}";

const SYSTEM_PROMPT: &str = "Act as an expert project manager. Your mission is to make a report \
on the changes made in the git repository for the client.";

const OVERVIEW_CONTEXT: &str =
    "Below is the overview of this entire commit. Take it into account as needed:\n";

const FILE_TEMPLATE: &str = "# Instruction:
Please summarize the file change briefly, using bullet points and word-for-word descriptions.
* Focus on the purpose of the change.
* Just return the change of the following file.
* Only the filename and brief changes are required.
* Preferred language is {language}.

# Expected Output Format:
### file.ext (ADD/MOD/DEL)
* Add feature X
* Change B setting
* Fix C bug

# File change to summarize:
{content}
";

const COMMIT_TEMPLATE: &str = "# Instruction:
Please summarize the git commit briefly, using bullet points and word-for-word descriptions, like release notes.
* Focus on the purpose of the commit, ignore the file-level details.
* Preferred language is {language}.

# Expected Output Format:
* Add feature X to screen A (if the screen name is not clear, assume it based on the file name)
* Change B setting from Y to Z
* Fix C bug

# Commit to summarize:
{content}
";

const BRANCH_TEMPLATE: &str = "# Instruction:
Please summarize the changes briefly, using bullet points and word-for-word descriptions, like release notes.
* If there are any duplicate or similar commits, combine them, the first one should be the main source.
* Combine related items in one section.
* Preferred language is {language}.

# Expected Output Format:
## Implement feature X
* details of the feature and the implementation
## Fix C bug
* details of the bug and the fix

# Changes to summarize:
{content}
";

/// Prompt texts used to request summaries
///
/// Templates carry a `{language}` and a `{content}` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    system: String,
    file_template: String,
    commit_template: String,
    branch_template: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
            file_template: FILE_TEMPLATE.to_string(),
            commit_template: COMMIT_TEMPLATE.to_string(),
            branch_template: BRANCH_TEMPLATE.to_string(),
        }
    }
}

impl PromptSet {
    /// The shared system message
    #[must_use]
    pub fn system_message(&self) -> ChatMessage {
        ChatMessage::system(self.system.clone())
    }

    /// Messages asking for a summary of one file body
    ///
    /// The commit overview goes in as extra context so the model knows what
    /// else the commit touched.
    #[must_use]
    pub fn file_prompt(&self, overview: &str, body: &str, lang: Language) -> Vec<ChatMessage> {
        vec![
            self.system_message(),
            ChatMessage::system(format!("{OVERVIEW_CONTEXT}{overview}")),
            ChatMessage::user(render(&self.file_template, body, lang)),
        ]
    }

    /// Messages asking for release-note bullets for a whole commit
    #[must_use]
    pub fn commit_prompt(&self, change_log: &str, lang: Language) -> Vec<ChatMessage> {
        vec![
            self.system_message(),
            ChatMessage::user(render(&self.commit_template, change_log, lang)),
        ]
    }

    /// Messages asking to merge every commit summary into branch notes
    #[must_use]
    pub fn branch_prompt(&self, summaries: &str, lang: Language) -> Vec<ChatMessage> {
        vec![
            self.system_message(),
            ChatMessage::user(render(&self.branch_template, summaries, lang)),
        ]
    }
}

fn render(template: &str, content: &str, lang: Language) -> String {
    // Language first so a literal slot inside the content is left alone
    template
        .replace(LANGUAGE_SLOT, lang.full_name())
        .replace(CONTENT_SLOT, content)
}

/// Prompts prepared for one non-merge commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPrompts {
    /// Artifact number shared with the `CL` file
    pub number: usize,
    /// Full commit hash
    pub hash: String,
    /// One message list per file body
    pub files: Vec<Vec<ChatMessage>>,
    /// Message list for the whole-commit summary
    pub commit: Vec<ChatMessage>,
}

impl CommitPrompts {
    /// Prepare every prompt for `commit`
    #[must_use]
    pub fn new(
        number: usize,
        commit: &Commit,
        text: &CommitText,
        prompts: &PromptSet,
        lang: Language,
    ) -> Self {
        Self {
            number,
            hash: commit.hash.clone(),
            files: text
                .bodies
                .iter()
                .map(|body| prompts.file_prompt(&text.overview, body, lang))
                .collect(),
            commit: prompts.commit_prompt(&text.change_log(), lang),
        }
    }
}
