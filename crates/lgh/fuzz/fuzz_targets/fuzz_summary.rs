#![no_main]

//! Fuzz target for change-summary formatting
//!
//! Any log the parser accepts must format without panics, and the kept diff
//! lines must respect the byte limit.

use libfuzzer_sys::fuzz_target;

use lgh::summary::{CommitText, FileChange};
use lgh_git::parse_log_bytes;

const LIMIT: usize = 256;

fuzz_target!(|data: &[u8]| {
    let Ok(commits) = parse_log_bytes(data) else {
        return;
    };

    for commit in &commits {
        let text = CommitText::with_limit(commit, LIMIT);
        assert_eq!(text.bodies.len(), commit.diffs.len());

        for diff in &commit.diffs {
            let change = FileChange::from_diff(diff, LIMIT);
            let kept: usize = change.lines.iter().map(|l| l.len()).sum();
            assert!(kept <= LIMIT);
        }
    }
});
