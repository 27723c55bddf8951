//! 📚 Schema registry: which columns, in which order, for which output.
//!
//! Static. Boring. Load-bearing. Two schemas, picked by name at the config boundary,
//! after which nobody ever handles a raw string identifier again. 🦆

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::{Column, ProjectionError};

/// 🗂️ The known output shapes. One variant per schema, matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum OutputType {
    /// 📦 One row per issue, centered on its last commit.
    Commits,
    /// 🔀 One row per issue, centered on the pull request.
    Pulls,
}

const COMMITS_COLUMNS: &[Column] = &[
    Column::AuthorLogin,
    Column::CommitterLogin,
    Column::IssueNum,
    Column::Sha,
    Column::CommitMessage,
    Column::FileNames,
    Column::PatchText,
    Column::Status,
    Column::Additions,
    Column::Deletions,
    Column::Changes,
];

const PULLS_COLUMNS: &[Column] = &[
    Column::IssueNum,
    Column::IssueAuthorLogin,
    Column::IssueAuthorId,
    Column::Status,
    Column::IssueCreatedDate,
    Column::IssueClosedDate,
    Column::IssueTitle,
    Column::IssueBody,
    Column::NumComments,
    Column::NumReviewComments,
    Column::Additions,
    Column::Deletions,
    Column::NumCommits,
    Column::NumChangedFiles,
];

impl OutputType {
    /// 📋 The ordered column list for this output type.
    pub fn columns(self) -> &'static [Column] {
        match self {
            OutputType::Commits => COMMITS_COLUMNS,
            OutputType::Pulls => PULLS_COLUMNS,
        }
    }

    /// 🏷️ The header row, exactly as written to the output.
    pub fn header(self) -> Vec<&'static str> {
        self.columns().iter().map(|column| column.header()).collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputType::Commits => "commits",
            OutputType::Pulls => "pulls",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = ProjectionError;

    /// 🔍 Raw identifier → schema. The `merged_closed_*` names are what older
    /// config files spell these as; they keep working.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "commits" | "merged_closed_commits" => Ok(OutputType::Commits),
            "pulls" | "merged_closed_pulls" => Ok(OutputType::Pulls),
            // -- 💀 "bogus" is not a schema. neither is "pr", Kevin. that one was deprecated.
            unknown => Err(ProjectionError::UnknownOutputType(unknown.to_string())),
        }
    }
}

impl TryFrom<String> for OutputType {
    type Error = ProjectionError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

/// 🎛️ The knobs the projector itself reads. Immutable for the whole run.
///
/// `separator` glues multiple comment bodies into one cell. It must not contain the
/// output delimiter or the quote character, or the tabular file turns into modern art.
/// That's on the caller; the run loop only grumbles about it in the logs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectionConfig {
    pub output_type: OutputType,
    pub separator: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_bogus_is_not_a_schema() {
        let verdict = "bogus".parse::<OutputType>();
        assert_eq!(
            verdict,
            Err(ProjectionError::UnknownOutputType("bogus".to_string()))
        );
    }

    #[test]
    fn the_one_where_old_names_still_open_the_door() {
        assert_eq!("merged_closed_commits".parse::<OutputType>(), Ok(OutputType::Commits));
        assert_eq!("merged_closed_pulls".parse::<OutputType>(), Ok(OutputType::Pulls));
        assert_eq!("pulls".parse::<OutputType>(), Ok(OutputType::Pulls));
    }

    #[test]
    fn the_one_where_the_pulls_header_is_in_the_sacred_order() {
        assert_eq!(
            OutputType::Pulls.header(),
            vec![
                "Issue_Num",
                "Issue_Author_Login",
                "Issue_Author_ID",
                "Status",
                "Issue_Created_Date",
                "Issue_Closed_Date",
                "Issue_Title",
                "Issue_Body",
                "Num_Comments",
                "Num_Review_Comments",
                "Additions",
                "Deletions",
                "Num_Commits",
                "Num_Changed_Files",
            ]
        );
    }

    #[test]
    fn the_one_where_the_commits_header_keeps_its_weird_space() {
        let header = OutputType::Commits.header();
        assert_eq!(header.len(), 11);
        assert_eq!(header[0], "Author_Login");
        assert_eq!(header[1], "Committer login");
        assert_eq!(header[10], "Changes");
    }

    #[test]
    fn the_one_where_serde_goes_through_the_same_gate() {
        let config: Result<ProjectionConfig, _> =
            serde_json::from_str(r#"{"output_type":"bogus","separator":"||"}"#);
        let complaint = config.expect_err("bogus must not deserialize").to_string();
        assert!(complaint.contains("unknown output type 'bogus'"), "{complaint}");
    }
}
