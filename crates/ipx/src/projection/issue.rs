//! 📝 Issue extractor: the part of every record that is always there.
//!
//! Author, title, body, dates, comment count, and all the comments glued into one
//! cell. If any of these are missing the record breaks the contract, and we say so
//! out loud instead of guessing. 🦆

use serde_json::{Map, Value};

use super::{Cell, Column, PartialRow, ProjectionError, render_scalar};

/// 📝 What the issue extractor hands to the rest of the pipeline.
///
/// The columns, plus the two facts the PR extractor needs without re-reading the
/// record: whether this is a PR, and the already-joined comment string (a PR's
/// comments are the same stream as its issue's).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IssueFields {
    pub(crate) columns: PartialRow,
    pub(crate) is_pr: bool,
    pub(crate) joined_comments: String,
}

/// 🔍 Look up a field the contract says must exist.
pub(super) fn required<'a>(
    record: &'a Map<String, Value>,
    issue_num: &str,
    field: &str,
) -> Result<&'a Value, ProjectionError> {
    record.get(field).ok_or_else(|| ProjectionError::MissingField {
        issue: issue_num.to_string(),
        field: field.to_string(),
    })
}

/// 📝 Extract the issue-level columns for one record.
///
/// Side-effect free. Fails with `MissingField` when a required issue field is absent
/// and `InvalidField` when `is_pr` is not a boolean or `comments` is not a collection.
pub(crate) fn extract_issue_fields(
    issue_num: &str,
    record: &Map<String, Value>,
    separator: &str,
) -> Result<IssueFields, ProjectionError> {
    let text = |field: &str| required(record, issue_num, field).map(render_scalar);

    let is_pr = match required(record, issue_num, "is_pr")? {
        Value::Bool(flag) => *flag,
        _ => {
            return Err(ProjectionError::InvalidField {
                issue: issue_num.to_string(),
                field: "is_pr".to_string(),
                expected: "a boolean",
            });
        }
    };

    let joined_comments = join_comments(issue_num, required(record, issue_num, "comments")?, separator)?;
    let author_login = text("userlogin")?;

    let mut columns = PartialRow::new();
    columns.insert(Column::IssueNum, Cell::from(issue_num));
    columns.insert(Column::IssueAuthorId, Cell::Text(text("userid")?));
    columns.insert(Column::IssueAuthorLogin, Cell::Text(author_login.clone()));
    columns.insert(Column::AuthorLogin, Cell::Text(author_login));
    columns.insert(Column::IssueBody, Cell::Text(text("body")?));
    columns.insert(Column::IssueClosedDate, Cell::Text(text("closed_at")?));
    columns.insert(Column::IssueCreatedDate, Cell::Text(text("created_at")?));
    columns.insert(Column::IssueTitle, Cell::Text(text("title")?));
    columns.insert(Column::IsPr, Cell::Text(render_scalar(&Value::Bool(is_pr))));
    columns.insert(Column::NumComments, Cell::Text(text("num_comments")?));
    columns.insert(Column::IssueComments, Cell::Text(joined_comments.clone()));

    Ok(IssueFields {
        columns,
        is_pr,
        joined_comments,
    })
}

/// 🧵 Glue every comment body together, in the record's own order, with `separator`.
///
/// Zero comments → empty string. One comment → just that body. No leading or trailing
/// separators, ever. `null` comments count as "nobody said anything".
fn join_comments(
    issue_num: &str,
    comments: &Value,
    separator: &str,
) -> Result<String, ProjectionError> {
    let bodies = match comments {
        Value::Null => return Ok(String::new()),
        Value::Object(by_id) => by_id
            .iter()
            .map(|(comment_id, comment)| comment_body(issue_num, comment_id, comment))
            .collect::<Result<Vec<_>, _>>()?,
        Value::Array(in_order) => in_order
            .iter()
            .enumerate()
            .map(|(position, comment)| comment_body(issue_num, &position.to_string(), comment))
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(ProjectionError::InvalidField {
                issue: issue_num.to_string(),
                field: "comments".to_string(),
                expected: "a mapping of comments",
            });
        }
    };

    Ok(bodies.join(separator))
}

fn comment_body(issue_num: &str, comment_id: &str, comment: &Value) -> Result<String, ProjectionError> {
    comment
        .get("body")
        .map(render_scalar)
        .ok_or_else(|| ProjectionError::MissingField {
            issue: issue_num.to_string(),
            field: format!("comments.{comment_id}.body"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("💀 test fixture must be an object, got {other}"),
        }
    }

    fn a_plain_issue() -> Map<String, Value> {
        record(json!({
            "userid": 1001,
            "userlogin": "octocat",
            "title": "Fix typo",
            "body": "teh -> the",
            "closed_at": null,
            "created_at": "2021-03-04T05:06:07Z",
            "is_pr": false,
            "num_comments": 2,
            "comments": {
                "11": {"body": "lgtm"},
                "12": {"body": "ship it"}
            }
        }))
    }

    #[test]
    fn the_one_where_two_comments_become_one_cell() -> Result<(), ProjectionError> {
        let fields = extract_issue_fields("7", &a_plain_issue(), "||")?;
        assert_eq!(fields.joined_comments, "lgtm||ship it");
        assert_eq!(
            fields.columns.get(&Column::IssueComments),
            Some(&Cell::from("lgtm||ship it"))
        );
        Ok(())
    }

    #[test]
    fn the_one_where_a_lonely_comment_gets_no_separator() -> Result<(), ProjectionError> {
        let mut issue = a_plain_issue();
        issue.insert("comments".into(), json!({"11": {"body": "lgtm"}}));
        assert_eq!(extract_issue_fields("7", &issue, "||")?.joined_comments, "lgtm");

        issue.insert("comments".into(), json!({}));
        assert_eq!(extract_issue_fields("7", &issue, "||")?.joined_comments, "");
        Ok(())
    }

    #[test]
    fn the_one_where_comment_order_is_the_records_order() -> Result<(), ProjectionError> {
        // 🧪 ids deliberately out of numeric order: insertion order wins, not sort order
        let mut issue = a_plain_issue();
        issue.insert(
            "comments".into(),
            json!({"99": {"body": "first"}, "1": {"body": "second"}, "50": {"body": "third"}}),
        );
        let fields = extract_issue_fields("7", &issue, " ; ")?;
        assert_eq!(fields.joined_comments, "first ; second ; third");
        Ok(())
    }

    #[test]
    fn the_one_where_the_issue_columns_show_up_rendered() -> Result<(), ProjectionError> {
        let fields = extract_issue_fields("7", &a_plain_issue(), "||")?;
        assert!(!fields.is_pr);
        assert_eq!(fields.columns.get(&Column::IssueNum), Some(&Cell::from("7")));
        assert_eq!(fields.columns.get(&Column::IssueAuthorId), Some(&Cell::from("1001")));
        assert_eq!(fields.columns.get(&Column::IssueAuthorLogin), Some(&Cell::from("octocat")));
        assert_eq!(fields.columns.get(&Column::AuthorLogin), Some(&Cell::from("octocat")));
        assert_eq!(fields.columns.get(&Column::IssueClosedDate), Some(&Cell::from("")));
        assert_eq!(fields.columns.get(&Column::IsPr), Some(&Cell::from("False")));
        assert_eq!(fields.columns.get(&Column::NumComments), Some(&Cell::from("2")));
        Ok(())
    }

    #[test]
    fn the_one_where_a_missing_title_stops_the_show() {
        let mut issue = a_plain_issue();
        issue.remove("title");
        assert_eq!(
            extract_issue_fields("7", &issue, "||"),
            Err(ProjectionError::MissingField {
                issue: "7".into(),
                field: "title".into()
            })
        );
    }

    #[test]
    fn the_one_where_a_comment_forgot_its_body() {
        let mut issue = a_plain_issue();
        issue.insert("comments".into(), json!({"11": {"author": "ghost"}}));
        assert_eq!(
            extract_issue_fields("7", &issue, "||"),
            Err(ProjectionError::MissingField {
                issue: "7".into(),
                field: "comments.11.body".into()
            })
        );
    }

    #[test]
    fn the_one_where_is_pr_is_a_string_and_we_refuse_to_guess() {
        let mut issue = a_plain_issue();
        issue.insert("is_pr".into(), json!("yes"));
        assert!(matches!(
            extract_issue_fields("7", &issue, "||"),
            Err(ProjectionError::InvalidField { ref field, .. }) if field == "is_pr"
        ));
    }
}
