// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! End-to-end tests for the branch-summary workflow
//!
//! Each test builds a scratch repository, runs `run::summarize_branch`
//! against a scripted chat backend or `run::prepare_branch`, and inspects the
//! files written to the output directory.


use std::fs;
use std::path::Path;

use lgh::chat::{ApiKey, ChatError, Role, TokenUsage};
use lgh::config::{Language, Settings};
use lgh::run::{self, BranchSummaryOptions, RunError};
use lgh::summary::{CommitPrompts, PromptSet};
use lgh_git::{Commit, GitError};
use similar_asserts::assert_eq;
use test_utils::{MockChat, TestGitRepo};

fn options(repo: &TestGitRepo, target: &str, lang: Language) -> BranchSummaryOptions {
    BranchSummaryOptions {
        repo: repo.path().to_path_buf(),
        target: target.to_string(),
        base: "main".to_string(),
        workdir_root: repo.scratch(),
        lang,
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// Feature branch with a two-file commit on top of a merge on top of one commit
fn feature_with_merge(name: &str) -> TestGitRepo {
    let repo = TestGitRepo::new(name);
    repo.commit_file("README.md", "# demo\n", "Initial commit");
    repo.checkout_new("feature");
    repo.commit_file("src/login.rs", "fn login() {}\n", "Add login");
    repo.checkout_new("topic");
    repo.commit_file("t.txt", "t\n", "Topic work");
    repo.checkout("feature");
    repo.merge_no_ff("topic", "Merge topic");
    repo.write_file("src/a.rs", "pub fn a() {}\n")
        .write_file("src/b.rs", "pub fn b() {}\n");
    repo.commit("Polish");
    repo
}

#[test]
fn test_summarize_branch_writes_model_replies() {
    let repo = feature_with_merge("summarize");
    let chat = MockChat::new();

    let report = run::summarize_branch(
        &options(&repo, "feature", Language::En),
        &PromptSet::default(),
        &chat,
    )
    .expect("summarize branch");

    assert_eq!(report.commits, 3);
    assert_eq!(report.merges, 1);
    assert_eq!(report.files, 3);

    // Newest first: two files and the commit for "Polish", then one file and
    // the commit for "Add login", then the branch
    let requests = chat.requests();
    assert_eq!(requests.len(), 6);

    let polish = read(&report.output_dir.join("CL00003"));
    assert!(polish.starts_with("## Message\nPolish\n## All change list:\nADD src/a.rs\nADD src/b.rs\n"));
    assert!(polish.ends_with("\n## Change details:\nreply 1\nreply 2\n"));
    assert_eq!(read(&report.output_dir.join("CS00003")), "reply 3\n");

    assert_eq!(read(&report.output_dir.join("CS00002")), "* Merged: Merge topic");
    assert!(!report.output_dir.join("CL00002").exists());

    let login = read(&report.output_dir.join("CL00001"));
    assert!(login.ends_with("\n## Change details:\nreply 4\n"));
    assert_eq!(read(&report.output_dir.join("CS00001")), "reply 5\n");

    assert_eq!(read(&report.output_dir.join("summary.txt")), "reply 6\n");
    assert!(!report.output_dir.join("prompts.json").exists());

    assert_eq!(
        report.usage,
        TokenUsage {
            prompt_tokens: 60,
            completion_tokens: 12,
            total_tokens: 72,
        }
    );

    // File requests carry the commit overview, the commit request carries the
    // change log built from the file replies
    assert_eq!(requests[0].len(), 3);
    assert_eq!(requests[0][1].role, Role::System);
    assert!(requests[0][1].content.contains("## Message\nPolish\n"));
    assert!(requests[0][2].content.contains("### File: src/a.rs"));
    assert!(requests[2][1].content.contains(&polish));

    // Merge summaries stay out of the branch request
    let branch = &requests[5][1].content;
    assert!(branch.contains("# Changes to summarize:\nreply 3\nreply 5\n"));
    assert!(!branch.contains("Merged"));
}

#[test]
fn test_summarize_branch_stops_on_chat_error() {
    let repo = feature_with_merge("summarize_error");
    let chat = MockChat::failing_at(2);

    let result = run::summarize_branch(
        &options(&repo, "feature", Language::En),
        &PromptSet::default(),
        &chat,
    );

    assert!(matches!(
        result,
        Err(RunError::Chat(ChatError::Status { status: 500, .. }))
    ));
    assert_eq!(chat.requests().len(), 2);
    let out = repo.scratch().join("repo").join("feature");
    assert!(!out.join("CL00003").exists());
    assert!(!out.join("summary.txt").exists());
}

#[test]
fn test_summarize_empty_branch_still_writes_notes() {
    let repo = TestGitRepo::new("summarize_empty");
    repo.commit_file("a.txt", "a\n", "Initial commit");
    repo.checkout_new("idle");
    let chat = MockChat::new();

    let report = run::summarize_branch(
        &options(&repo, "idle", Language::Ja),
        &PromptSet::default(),
        &chat,
    )
    .expect("summarize branch");

    assert_eq!(report.commits, 0);
    let requests = chat.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0][1].content.contains("Japanese"));
    assert_eq!(read(&report.output_dir.join("summary.txt")), "reply 1\n");
}

#[test]
fn test_prepare_branch_writes_change_logs() {
    let repo = TestGitRepo::new("e2e_logs");
    repo.commit_file("README.md", "# demo\n", "Initial commit");
    repo.checkout_new("feature/login");
    repo.commit_file("src/login.rs", "fn login() {}\n", "Add login");
    repo.write_file("src/login.rs", "fn login() -> bool { true }\n")
        .remove_file("README.md");
    repo.commit("Return login status");

    let report = run::prepare_branch(
        &options(&repo, "feature/login", Language::En),
        &PromptSet::default(),
    )
    .expect("prepare branch");

    assert_eq!(
        report.output_dir,
        repo.scratch().join("repo").join("feature_login")
    );
    assert_eq!(report.commits, 2);
    assert_eq!(report.merges, 0);
    assert_eq!(report.files, 3);

    // Oldest commit gets the lowest number
    let oldest = read(&report.output_dir.join("CL00001"));
    assert!(oldest.starts_with("## Message\nAdd login\n## All change list:\nADD src/login.rs\n"));
    assert!(oldest.contains("\n## Change details:\n### File: src/login.rs\n```\n"));
    assert!(oldest.contains("+fn login() {}"));

    let newest = read(&report.output_dir.join("CL00002"));
    assert!(newest.contains("DEL README.md\n"));
    assert!(newest.contains("MOD src/login.rs\n"));
    assert!(newest.contains("-fn login() {}"));
    assert!(newest.contains("+fn login() -> bool { true }"));
}

#[test]
fn test_prepare_branch_merge_commit() {
    let repo = TestGitRepo::new("e2e_merge");
    repo.commit_file("a.txt", "a\n", "Initial commit");
    repo.checkout_new("feature");
    repo.commit_file("f.txt", "f\n", "Feature work");
    repo.checkout_new("topic");
    repo.commit_file("t.txt", "t\n", "Topic work");
    repo.checkout("feature");
    repo.merge_no_ff("topic", "Merge topic into feature");

    let report = run::prepare_branch(&options(&repo, "feature", Language::En), &PromptSet::default())
        .expect("prepare branch");

    assert_eq!(report.commits, 2);
    assert_eq!(report.merges, 1);
    assert_eq!(
        read(&report.output_dir.join("CS00002")),
        "* Merged: Merge topic into feature"
    );
    assert!(report.output_dir.join("CL00001").exists());
    assert!(!report.output_dir.join("CL00002").exists());
}

#[test]
fn test_prepare_branch_json_artifacts() {
    let repo = TestGitRepo::new("e2e_json");
    repo.commit_file("a.txt", "a\n", "Initial commit");
    repo.checkout_new("topic");
    let sha = repo.commit_file("b.txt", "b\n", "Add b");

    let report = run::prepare_branch(&options(&repo, "topic", Language::Ja), &PromptSet::default())
        .expect("prepare branch");

    let commits: Vec<Commit> =
        serde_json::from_str(&read(&report.output_dir.join("commits.json"))).expect("commits");
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].hash, sha);

    let prompts: Vec<CommitPrompts> =
        serde_json::from_str(&read(&report.output_dir.join("prompts.json"))).expect("prompts");
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].number, 1);
    assert_eq!(prompts[0].hash, sha);
    assert_eq!(prompts[0].files.len(), 1);

    let file_prompt = &prompts[0].files[0];
    assert_eq!(file_prompt.len(), 3);
    assert_eq!(file_prompt[2].role, Role::User);
    assert!(file_prompt[2].content.contains("Japanese"));
    assert!(file_prompt[2].content.contains("### File: b.txt"));

    let commit_prompt = &prompts[0].commit;
    assert!(commit_prompt[1].content.contains(&read(&report.output_dir.join("CL00001"))));
}

#[test]
fn test_prepare_branch_empty_branch() {
    let repo = TestGitRepo::new("e2e_empty");
    repo.commit_file("a.txt", "a\n", "Initial commit");
    repo.checkout_new("idle");

    let report = run::prepare_branch(&options(&repo, "idle", Language::En), &PromptSet::default())
        .expect("prepare branch");

    assert_eq!(report.commits, 0);
    assert_eq!(read(&report.output_dir.join("commits.json")).trim(), "[]");
    assert_eq!(read(&report.output_dir.join("prompts.json")).trim(), "[]");
}

#[test]
fn test_prepare_branch_removes_stale_artifacts() {
    let repo = TestGitRepo::new("e2e_stale");
    repo.commit_file("a.txt", "a\n", "Initial commit");
    repo.checkout_new("topic");
    repo.commit_file("b.txt", "b\n", "Add b");

    let opts = options(&repo, "topic", Language::En);
    let first = run::prepare_branch(&opts, &PromptSet::default()).expect("first run");
    fs::write(first.output_dir.join("CL00007"), "left over").expect("write stale");

    let second = run::prepare_branch(&opts, &PromptSet::default()).expect("second run");
    assert!(!second.output_dir.join("CL00007").exists());
    assert!(second.output_dir.join("CL00001").exists());
}

#[test]
fn test_prepare_branch_missing_branch() {
    let repo = TestGitRepo::new("e2e_missing");
    repo.commit_file("a.txt", "a\n", "Initial commit");

    let result = run::prepare_branch(
        &options(&repo, "does-not-exist", Language::En),
        &PromptSet::default(),
    );
    assert!(matches!(
        result,
        Err(RunError::Git(GitError::ReferenceNotFound { .. }))
    ));
}

#[test]
fn test_save_settings_round_trip() {
    let repo = TestGitRepo::new("settings");
    let path = repo.scratch().join(".lgh").join("config.toml");
    let settings = Settings {
        lang: Some(Language::Ja),
        workdir: Some(repo.scratch().join("notes")),
        openai_api_key: Some(ApiKey::from("sk-saved")),
    };

    run::save_settings(&settings, &path).expect("save");
    assert_eq!(Settings::load(&path).expect("load"), settings);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let parent = path.parent().expect("parent");
        let mode = fs::metadata(parent).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
