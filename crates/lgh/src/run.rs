// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Subcommand execution
//!
//! [`summarize_branch`] reads a branch, asks a chat backend for per-file,
//! per-commit and whole-branch summaries, and writes the artifacts.
//! [`prepare_branch`] writes the same change logs with the prompts instead of
//! calling the backend. [`save_settings`] backs the `config` subcommand.

use std::path::{Path, PathBuf};

use lgh_git::{Commit, GitError, GitRepo};
use tracing::{debug, info};

use crate::chat::{ChatBackend, ChatError, ChatMessage, TokenUsage};
use crate::config::{ConfigError, Language, Settings};
use crate::output::{COMMITS_FILE, OutputDir, OutputError, PROMPTS_FILE, artifact_number};
use crate::summary::{CommitPrompts, CommitText, PromptSet, merge_summary};

/// Errors from running a branch summary
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Repository access or history parsing failed
    #[error(transparent)]
    Git(#[from] GitError),

    /// Artifacts could not be written
    #[error(transparent)]
    Output(#[from] OutputError),

    /// A summary request failed
    #[error(transparent)]
    Chat(#[from] ChatError),
}

/// Inputs for [`summarize_branch`] and [`prepare_branch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSummaryOptions {
    /// Any path inside the repository
    pub repo: PathBuf,
    /// Branch to summarize
    pub target: String,
    /// Branch the target was created from
    pub base: String,
    /// Root of the output tree
    pub workdir_root: PathBuf,
    /// Language requested in prompts
    pub lang: Language,
}

/// What a branch summary produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Directory holding the artifacts
    pub output_dir: PathBuf,
    /// Commits read from the branch
    pub commits: usize,
    /// Merge commits among them
    pub merges: usize,
    /// File diffs across all regular commits
    pub files: usize,
    /// Tokens spent on chat requests, zero for a dry run
    pub usage: TokenUsage,
}

/// Read the branch and write change logs, commit summaries and `summary.txt`
///
/// Every regular commit costs one request per changed file plus one for the
/// commit; the branch costs one more. Merge commits are summarized locally.
///
/// # Errors
///
/// Returns an error if the repository or references cannot be resolved, the
/// log cannot be read or parsed, a chat request fails, or an artifact cannot
/// be written.
pub fn summarize_branch<C: ChatBackend + ?Sized>(
    options: &BranchSummaryOptions,
    prompts: &PromptSet,
    chat: &C,
) -> Result<RunReport, RunError> {
    let (commits, out, mut report) = open_branch(options)?;
    let total = commits.len();
    let mut summaries = String::new();

    for (index, commit) in commits.iter().enumerate() {
        let number = artifact_number(total, index);
        if commit.is_merge() {
            out.write_commit_summary(number, &merge_summary(commit))?;
            report.merges += 1;
            continue;
        }

        let text = CommitText::build(commit);
        let mut log = format!("{}\n## Change details:\n", text.overview);
        for body in &text.bodies {
            let messages = prompts.file_prompt(&text.overview, body, options.lang);
            log.push_str(&ask(chat, &messages, &mut report.usage)?);
            log.push('\n');
        }
        out.write_change_log(number, &log)?;
        report.files += commit.diffs.len();

        let messages = prompts.commit_prompt(&log, options.lang);
        let summary = format!("{}\n", ask(chat, &messages, &mut report.usage)?);
        out.write_commit_summary(number, &summary)?;
        summaries.push_str(&summary);
        info!(commit = %commit.short_hash(), number, "Commit summarized");
    }

    let messages = prompts.branch_prompt(&summaries, options.lang);
    let notes = ask(chat, &messages, &mut report.usage)?;
    out.write_summary(&format!("{notes}\n"))?;

    info!(
        output = %report.output_dir.display(),
        commits = report.commits,
        merges = report.merges,
        files = report.files,
        prompt_tokens = report.usage.prompt_tokens,
        completion_tokens = report.usage.completion_tokens,
        total_tokens = report.usage.prompt_tokens + report.usage.completion_tokens,
        "Branch summary written"
    );
    Ok(report)
}

/// Read the branch and write its change logs, merge summaries and prompts
///
/// Nothing is sent anywhere: `prompts.json` holds the messages a summarizing
/// run would send for each regular commit.
///
/// # Errors
///
/// Returns an error if the repository or references cannot be resolved, the
/// log cannot be read or parsed, or an artifact cannot be written.
pub fn prepare_branch(
    options: &BranchSummaryOptions,
    prompts: &PromptSet,
) -> Result<RunReport, RunError> {
    let (commits, out, mut report) = open_branch(options)?;
    let total = commits.len();
    let mut prepared = Vec::new();

    for (index, commit) in commits.iter().enumerate() {
        let number = artifact_number(total, index);
        if commit.is_merge() {
            out.write_commit_summary(number, &merge_summary(commit))?;
            report.merges += 1;
            continue;
        }

        let text = CommitText::build(commit);
        out.write_change_log(number, &text.change_log())?;
        report.files += commit.diffs.len();
        prepared.push(CommitPrompts::new(
            number,
            commit,
            &text,
            prompts,
            options.lang,
        ));
    }

    out.write_json(PROMPTS_FILE, &prepared)?;

    info!(
        output = %report.output_dir.display(),
        commits = report.commits,
        merges = report.merges,
        files = report.files,
        "Branch prompts written"
    );
    Ok(report)
}

/// Read the commits, clear the output directory and record `commits.json`
fn open_branch(
    options: &BranchSummaryOptions,
) -> Result<(Vec<Commit>, OutputDir, RunReport), RunError> {
    let repo = GitRepo::discover(&options.repo)?;
    let commits = repo.commits_on_branch(&options.target, &options.base)?;

    let out = OutputDir::for_branch(&options.workdir_root, &repo.name(), &options.target);
    out.prepare()?;
    debug!(path = %out.path().display(), "Prepared output directory");
    out.write_json(COMMITS_FILE, &commits)?;

    let report = RunReport {
        output_dir: out.path().to_path_buf(),
        commits: commits.len(),
        ..Default::default()
    };
    Ok((commits, out, report))
}

/// Send one request, add its usage to `usage` and return the reply text
fn ask<C: ChatBackend + ?Sized>(
    chat: &C,
    messages: &[ChatMessage],
    usage: &mut TokenUsage,
) -> Result<String, ChatError> {
    let response = chat.chat(messages)?;
    *usage += response.usage;
    debug!(
        prompt_tokens = response.usage.prompt_tokens,
        completion_tokens = response.usage.completion_tokens,
        "Chat usage"
    );
    Ok(response.content()?.to_string())
}

/// Persist `settings` at `path`
///
/// # Errors
///
/// Returns an error if the settings file cannot be written.
pub fn save_settings(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    settings.save(path)?;
    info!(path = %path.display(), "Settings saved");
    Ok(())
}
