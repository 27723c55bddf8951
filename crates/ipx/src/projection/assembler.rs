//! 🧱 Row assembler + the per-document run loop.
//!
//! Two partial rows walk in. They never fight over a column (the groups are disjoint).
//! One ordered row walks out, with exactly one cell per schema column. Every time.
//! Including the rows that are 90% blanks. Especially those. 📐

use serde_json::{Map, Value};
use tracing::debug;

use super::issue::extract_issue_fields;
use super::pull_request::extract_pull_request_fields;
use super::{Cell, Column, OutputType, PartialRow, ProjectionConfig, ProjectionError};

/// 🧱 One projected record, plus what had to be blanked to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AssembledRow {
    pub(crate) cells: Vec<Cell>,
    pub(crate) pr_group_blanked: bool,
    pub(crate) commit_group_blanked: bool,
}

/// 📊 A whole document, projected: header, rows in source order, and the tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Projection {
    pub(crate) header: Vec<&'static str>,
    pub(crate) rows: Vec<Vec<Cell>>,
    pub(crate) pr_groups_blanked: usize,
    pub(crate) commit_groups_blanked: usize,
}

/// 📐 Pull `columns` out of `row`, in order. A column nobody filled is a bug in the
/// schema/extractor pairing, not in the data, so it is an error and not a blank.
pub(crate) fn project_row(row: &PartialRow, columns: &[Column]) -> Result<Vec<Cell>, ProjectionError> {
    columns
        .iter()
        .map(|column| {
            row.get(column)
                .cloned()
                .ok_or(ProjectionError::MissingColumn(column.header()))
        })
        .collect()
}

/// 🧱 Issue extractor + PR extractor → merged → ordered by the schema.
pub(crate) fn assemble_row(
    issue_num: &str,
    record: &Map<String, Value>,
    config: &ProjectionConfig,
) -> Result<AssembledRow, ProjectionError> {
    let issue = extract_issue_fields(issue_num, record, &config.separator)?;
    let pull_request = extract_pull_request_fields(issue_num, &issue, record);

    let mut row = issue.columns;
    row.extend(pull_request.columns);

    Ok(AssembledRow {
        cells: project_row(&row, config.output_type.columns())?,
        pr_group_blanked: pull_request.pr_group_blanked,
        commit_group_blanked: pull_request.commit_group_blanked,
    })
}

/// 🔁 The run loop: every (issue number, record) pair, in source order, one row each.
///
/// No early exit for per-record PR/commit trouble (that's blanked in place). A record
/// missing its issue-level fields, or one that isn't even an object, ends the run.
pub(crate) fn project_document(
    document: &Map<String, Value>,
    config: &ProjectionConfig,
    mut on_row: impl FnMut(usize),
) -> Result<Projection, ProjectionError> {
    let output_type: OutputType = config.output_type;
    let mut projection = Projection {
        header: output_type.header(),
        rows: Vec::with_capacity(document.len()),
        pr_groups_blanked: 0,
        commit_groups_blanked: 0,
    };

    for (issue_num, record) in document {
        let record = record.as_object().ok_or_else(|| ProjectionError::InvalidField {
            issue: issue_num.clone(),
            field: "<record>".to_string(),
            expected: "a mapping",
        })?;

        let assembled = assemble_row(issue_num, record, config)?;
        debug!(
            "🧱 issue {issue_num}: {} cells ({} schema)",
            assembled.cells.len(),
            output_type
        );

        projection.pr_groups_blanked += usize::from(assembled.pr_group_blanked);
        projection.commit_groups_blanked += usize::from(assembled.commit_group_blanked);
        projection.rows.push(assembled.cells);
        on_row(projection.rows.len());
    }

    Ok(projection)
}
