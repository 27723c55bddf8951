//! 🗂️ Projection: the flattening engine. Nested JSON goes in, rectangles come out. 📐
//!
//! 🎬 COLD OPEN: INT. ANALYTICS TEAM STANDUP, 9:02 AM
//!
//! "Can we just get the issues as a spreadsheet?"
//! Somewhere, an issue record with four comments, a pull request, and eleven commits
//! hears this and starts sweating. It is not a spreadsheet. It has never been a spreadsheet.
//! It is a tree. Trees do not fit in cells. And yet, here we are.
//!
//! This module turns one issue/PR record into one row for a named output schema.
//! It never panics on missing PR or commit data: an issue that is not a PR, or a PR
//! with no commits, still produces a row with exactly as many cells as the schema has
//! columns. Blank cells are a feature. Ragged rows are a career-limiting event.
//!
//! ```text
//!   record ──▶ issue extractor ─────────────┐
//!          └─▶ pull request / commit ───────┤──▶ assembler ──▶ schema order ──▶ Vec<Cell>
//!              extractor (best effort)      │
//!                                           └── disjoint columns, merged, never colliding
//! ```
//!
//! ## Knowledge Graph 🧠
//! - `schema`: `OutputType` → ordered `&'static [Column]`
//! - `issue`: always runs, fails loudly on missing issue-level fields
//! - `pull_request`: runs per `is_pr`, blanks whole column groups on any lookup fault
//! - `assembler`: merges + projects, plus the per-document run loop
//! - Consumed by: `crate::run`, which hands the rows to a `Composer`
//!
//! ⚠️ Only the LAST commit of a PR is read. Yes, on purpose. No, don't "fix" it. 🦆

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

mod assembler;
mod issue;
mod pull_request;
mod schema;

pub(crate) use assembler::project_document;
pub use schema::{OutputType, ProjectionConfig};

/// 🏷️ Every column any extractor knows how to fill.
///
/// Typed instead of stringly so a typo is a compile error and not a `KeyError` at 4am.
/// `header()` gives the exact label written to the output; those labels are what
/// downstream spreadsheets, notebooks and dashboards already expect. Don't rename them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    // -- 📝 issue-level: always populated
    IssueNum,
    IssueTitle,
    IssueAuthorId,
    IssueAuthorLogin,
    IssueBody,
    IssueClosedDate,
    IssueCreatedDate,
    IssueComments,
    IsPr,
    NumComments,
    AuthorLogin,
    // -- 🔀 PR-level: populated only for pull requests
    NumReviewComments,
    PrAuthorLogin,
    PrAuthorName,
    PrBody,
    PrClosedDate,
    PrTitle,
    PrComments,
    Status,
    // -- 📦 commit-derived: populated only when a PR has a readable last commit
    Additions,
    Changes,
    CommitAuthorName,
    CommitDate,
    CommitMessage,
    CommitterLogin,
    Deletions,
    FileNames,
    NumChangedFiles,
    NumCommits,
    PatchText,
    Sha,
}

impl Column {
    /// 📋 The label that lands in the header row.
    pub const fn header(self) -> &'static str {
        match self {
            Column::IssueNum => "Issue_Num",
            Column::IssueTitle => "Issue_Title",
            Column::IssueAuthorId => "Issue_Author_ID",
            Column::IssueAuthorLogin => "Issue_Author_Login",
            Column::IssueBody => "Issue_Body",
            Column::IssueClosedDate => "Issue_Closed_Date",
            Column::IssueCreatedDate => "Issue_Created_Date",
            Column::IssueComments => "Issue_Comments",
            Column::IsPr => "isPR",
            Column::NumComments => "Num_Comments",
            Column::AuthorLogin => "Author_Login",
            Column::NumReviewComments => "Num_Review_Comments",
            Column::PrAuthorLogin => "PR_Author_Login",
            Column::PrAuthorName => "PR_Author_Name",
            Column::PrBody => "PR_Body",
            Column::PrClosedDate => "PR_Closed_Date",
            Column::PrTitle => "PR_Title",
            Column::PrComments => "PR_Comments",
            Column::Status => "Status",
            Column::Additions => "Additions",
            Column::Changes => "Changes",
            Column::CommitAuthorName => "Commit_Author_Name",
            Column::CommitDate => "Commit_Date",
            Column::CommitMessage => "Commit_Message",
            // -- 🧓 yes, a space and a lowercase "l". downstream consumers learned to love it.
            Column::CommitterLogin => "Committer login",
            Column::Deletions => "Deletions",
            Column::FileNames => "File_Names",
            Column::NumChangedFiles => "Num_Changed_Files",
            Column::NumCommits => "Num_Commits",
            Column::PatchText => "Patch_Text",
            Column::Sha => "SHA",
        }
    }
}

/// 🔀 Columns owned by the PR-level group. Blanked together or not at all.
pub(crate) const PR_COLUMNS: &[Column] = &[
    Column::NumReviewComments,
    Column::PrAuthorLogin,
    Column::PrAuthorName,
    Column::PrBody,
    Column::PrClosedDate,
    Column::PrTitle,
    Column::PrComments,
    Column::Status,
];

/// 📦 Columns owned by the commit-derived group. Same all-or-nothing deal.
pub(crate) const COMMIT_COLUMNS: &[Column] = &[
    Column::Additions,
    Column::Changes,
    Column::CommitAuthorName,
    Column::CommitDate,
    Column::CommitMessage,
    Column::CommitterLogin,
    Column::Deletions,
    Column::FileNames,
    Column::NumChangedFiles,
    Column::NumCommits,
    Column::PatchText,
    Column::Sha,
];

/// 🧱 One cell of output.
///
/// Mostly text. Except file lists, which stay a list until the composer decides how
/// to squash them, because the "quote it when there's more than one file" rule
/// belongs to the output format and not to the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Files(Vec<String>),
}

impl Cell {
    /// 🕳️ The empty string. The great rectangularizer.
    pub(crate) fn blank() -> Self {
        Cell::Text(String::new())
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Text(text) => text.is_empty(),
            Cell::Files(files) => files.is_empty(),
        }
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::Text(text)
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

/// 🧩 A partially filled row: whatever one extractor managed to say about a record.
pub(crate) type PartialRow = BTreeMap<Column, Cell>;

/// 🕳️ Fill `columns` with blanks. Used by every "nope, not this time" branch.
pub(crate) fn blank_columns(columns: &[Column]) -> PartialRow {
    columns.iter().map(|column| (*column, Cell::blank())).collect()
}

/// 🔤 Render one JSON scalar the way the tabular output has always rendered it.
///
/// Strings verbatim, numbers as written, `null` as nothing, booleans as `True`/`False`
/// (old files already carry that spelling). Nested structures fall back to compact JSON.
pub(crate) fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        nested => nested.to_string(),
    }
}

/// 💀 The ways a projection run can actually die.
///
/// Note what is NOT here: missing commits, missing PR fields, a commit without `files`.
/// Those are recovered in place with blank cells and never escape the extractor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("unknown output type '{0}' (expected one of: commits, pulls)")]
    UnknownOutputType(String),

    #[error("record '{issue}' is missing required field '{field}'")]
    MissingField { issue: String, field: String },

    #[error("record '{issue}' has field '{field}' that is not {expected}")]
    InvalidField {
        issue: String,
        field: String,
        expected: &'static str,
    },

    #[error("schema column '{0}' was not populated by any extractor")]
    MissingColumn(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn the_one_where_scalars_render_like_the_old_files() {
        assert_eq!(render_scalar(&json!("fix typo")), "fix typo");
        assert_eq!(render_scalar(&json!(42)), "42");
        assert_eq!(render_scalar(&json!(null)), "");
        assert_eq!(render_scalar(&json!(true)), "True");
        assert_eq!(render_scalar(&json!(false)), "False");
        assert_eq!(render_scalar(&json!(["a"])), r#"["a"]"#);
    }

    #[test]
    fn the_one_where_the_column_groups_never_overlap() {
        // 🧪 the assembler trusts these to be disjoint. trust, but verify.
        for column in PR_COLUMNS {
            assert!(
                !COMMIT_COLUMNS.contains(column),
                "{} lives in both groups",
                column.header()
            );
        }
    }

    #[test]
    fn the_one_where_blank_means_blank_for_every_cell_shape() {
        assert!(Cell::blank().is_blank());
        assert!(Cell::Files(vec![]).is_blank());
        assert!(!Cell::from("x").is_blank());
        assert!(!Cell::Files(vec!["a.rs".into()]).is_blank());
    }
}
