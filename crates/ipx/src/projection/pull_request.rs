//! 🔀 Pull request / commit extractor: the part of the record that may or may not exist.
//!
//! 🎬 *[a record walks in. is it a PR? does it have commits? do the commits have files?]*
//! *[nobody knows. the JSON was exported by a script last touched in 2019.]*
//!
//! Two independent best-effort groups live here:
//!
//! 1. **PR-level**: status, review-comment count, and the PR copies of the issue fields.
//! 2. **Commit-derived**: everything read from the LAST commit, plus the commit count.
//!
//! Each group is all-or-nothing. Any lookup fault anywhere in a group's chain blanks
//! the WHOLE group, never just the cells that happened to fail. A half-filled group
//! looks like real data and lies to whoever opens the spreadsheet. Blank is honest.
//!
//! ## Knowledge Graph 🧠
//! - Input: the issue extractor's `IssueFields` + the raw record
//! - Output: `PullRequestFields` with exactly `PR_COLUMNS ∪ COMMIT_COLUMNS` filled
//! - Faults: `ExtractionFault`, mapped to blanks right here, never propagated 🦆

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::issue::IssueFields;
use super::{COMMIT_COLUMNS, Cell, Column, PR_COLUMNS, PartialRow, blank_columns, render_scalar};

/// 🧯 Something in the PR/commit chain wasn't where we expected it.
///
/// Recovered by blanking. Exists as a type so the "why" can be logged, and so the
/// recovery is one explicit `match` instead of a shrug.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum ExtractionFault {
    #[error("missing key '{0}'")]
    MissingKey(String),

    #[error("'{0}' is not a mapping")]
    NotAMapping(String),

    #[error("'{0}' is not a list")]
    NotAList(String),
}

/// 📦 Everything pulled from the last commit of a PR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommitFields {
    pub(crate) additions: String,
    pub(crate) changes: String,
    pub(crate) deletions: String,
    pub(crate) author_name: String,
    pub(crate) date: String,
    pub(crate) message: String,
    pub(crate) sha: String,
    pub(crate) patch_text: String,
    pub(crate) file_names: Vec<String>,
    /// 🔢 how many commits the PR has in total, not just the one we read
    pub(crate) num_commits: usize,
}

impl CommitFields {
    fn into_columns(self) -> PartialRow {
        let mut columns = PartialRow::new();
        columns.insert(Column::Additions, Cell::Text(self.additions));
        columns.insert(Column::Changes, Cell::Text(self.changes));
        columns.insert(Column::Deletions, Cell::Text(self.deletions));
        columns.insert(Column::CommitAuthorName, Cell::Text(self.author_name.clone()));
        // -- 🧑‍💻 the commit data only knows the author; the committer column reuses it
        columns.insert(Column::CommitterLogin, Cell::Text(self.author_name));
        columns.insert(Column::CommitDate, Cell::Text(self.date));
        columns.insert(Column::CommitMessage, Cell::Text(self.message));
        columns.insert(Column::Sha, Cell::Text(self.sha));
        columns.insert(Column::PatchText, Cell::Text(self.patch_text));
        columns.insert(
            Column::NumChangedFiles,
            Cell::Text(self.file_names.len().to_string()),
        );
        columns.insert(Column::FileNames, Cell::Files(self.file_names));
        columns.insert(Column::NumCommits, Cell::Text(self.num_commits.to_string()));
        columns
    }
}

/// 🔀 What the PR extractor hands to the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PullRequestFields {
    pub(crate) columns: PartialRow,
    /// 🧯 the record claimed to be a PR but the PR-level group had to be blanked
    pub(crate) pr_group_blanked: bool,
    /// 🧯 the record is a PR with commits, but the commit group had to be blanked
    pub(crate) commit_group_blanked: bool,
}

/// 🔀 Fill every PR/commit column for one record. Never fails. Never partially fills.
pub(crate) fn extract_pull_request_fields(
    issue_num: &str,
    issue: &IssueFields,
    record: &Map<String, Value>,
) -> PullRequestFields {
    if !issue.is_pr {
        // -- 📝 plain issue. nothing to see here. blanks all the way down.
        let mut columns = blank_columns(PR_COLUMNS);
        columns.extend(blank_columns(COMMIT_COLUMNS));
        return PullRequestFields {
            columns,
            pr_group_blanked: false,
            commit_group_blanked: false,
        };
    }

    let (mut columns, pr_group_blanked) = match try_extract_pr_fields(issue, record) {
        Ok(columns) => (columns, false),
        Err(fault) => {
            debug!("🧯 issue {issue_num}: PR fields blanked ({fault})");
            (blank_columns(PR_COLUMNS), true)
        }
    };

    let commit_group_blanked = match try_extract_commit_fields(record) {
        Ok(Some(commit)) => {
            columns.extend(commit.into_columns());
            false
        }
        Ok(None) => {
            // -- 🕳️ a PR with no commits. weird, but legal. blank, quietly.
            columns.extend(blank_columns(COMMIT_COLUMNS));
            false
        }
        Err(fault) => {
            debug!("🧯 issue {issue_num}: commit fields blanked ({fault})");
            columns.extend(blank_columns(COMMIT_COLUMNS));
            true
        }
    };

    PullRequestFields {
        columns,
        pr_group_blanked,
        commit_group_blanked,
    }
}

/// 🔀 The PR-level group. A PR and its originating issue share identity, body and
/// comment stream in this data, so most of this is the issue data wearing a PR hat.
fn try_extract_pr_fields(
    issue: &IssueFields,
    record: &Map<String, Value>,
) -> Result<PartialRow, ExtractionFault> {
    let copy_of = |column: Column| -> Result<Cell, ExtractionFault> {
        issue
            .columns
            .get(&column)
            .cloned()
            .ok_or_else(|| ExtractionFault::MissingKey(column.header().to_string()))
    };

    let mut columns = PartialRow::new();
    columns.insert(
        Column::NumReviewComments,
        Cell::Text(render_scalar(lookup(record, "num_review_comments")?)),
    );
    columns.insert(Column::Status, Cell::Text(render_scalar(lookup(record, "state")?)));
    columns.insert(Column::PrAuthorLogin, copy_of(Column::IssueAuthorLogin)?);
    columns.insert(Column::PrAuthorName, copy_of(Column::IssueAuthorId)?);
    columns.insert(Column::PrBody, copy_of(Column::IssueBody)?);
    columns.insert(Column::PrClosedDate, copy_of(Column::IssueClosedDate)?);
    columns.insert(Column::PrTitle, copy_of(Column::IssueTitle)?);
    columns.insert(Column::PrComments, Cell::Text(issue.joined_comments.clone()));
    Ok(columns)
}

/// 📦 Read the last commit of the record.
///
/// `Ok(None)` means "no commit data" (`commits` absent, `null`, or empty: all the same
/// thing). `Err` means the data was there but broken somewhere along the chain.
///
/// Only the LAST commit in insertion order is read. Earlier commits only contribute to
/// `num_commits`. Deliberate; nothing documents any other ordering for this mapping.
pub(crate) fn try_extract_commit_fields(
    record: &Map<String, Value>,
) -> Result<Option<CommitFields>, ExtractionFault> {
    let commits = match record.get("commits") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(commits)) => commits,
        Some(_) => return Err(ExtractionFault::NotAMapping("commits".to_string())),
    };

    let Some((_, last_commit)) = commits.iter().next_back() else {
        return Ok(None);
    };
    let last_commit = as_mapping(last_commit, "commits[last]")?;
    let files = as_mapping(lookup(last_commit, "files")?, "files")?;

    let file_names = match lookup(files, "file_list")? {
        Value::Array(names) => names.iter().map(render_scalar).collect(),
        _ => return Err(ExtractionFault::NotAList("files.file_list".to_string())),
    };

    let text = |map: &Map<String, Value>, key: &str| lookup(map, key).map(render_scalar);

    Ok(Some(CommitFields {
        additions: text(files, "additions")?,
        changes: text(files, "changes")?,
        deletions: text(files, "removals")?,
        patch_text: text(files, "patch_text")?,
        author_name: text(last_commit, "author_name")?,
        date: text(last_commit, "date")?,
        message: text(last_commit, "message")?,
        sha: text(last_commit, "sha")?,
        file_names,
        num_commits: commits.len(),
    }))
}

fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a Value, ExtractionFault> {
    map.get(key)
        .ok_or_else(|| ExtractionFault::MissingKey(key.to_string()))
}

fn as_mapping<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, ExtractionFault> {
    value
        .as_object()
        .ok_or_else(|| ExtractionFault::NotAMapping(what.to_string()))
}
