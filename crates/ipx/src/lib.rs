//! 🗂️ ipx: issue/PR projector. GitHub issue dumps in, spreadsheets out.
//!
//! 🎬 *[narrator voice]* "It was a JSON object of ten thousand issues. Each one had
//! comments. Some had pull requests. A few of those had commits. One analyst wanted a CSV."
//!
//! Two jobs live here:
//! - `run`: read the issues document, project every record into one row of the chosen
//!   schema, render the rows as delimited text, and write it out.
//! - `update_metrics`: read a metrics document and write each metric into a Postgres
//!   table, one `UPDATE` per (key, metric), committed once.
//!
//! 🧠 Knowledge graph:
//! ```text
//! Source ─▶ read_document ─▶ project_document ─▶ Composer ─▶ Sink
//! Source ─▶ MetricsDocument ─▶ plan_updates ─▶ apply_updates ─▶ COMMIT
//! ```
//! Nothing is written until the whole document has been projected. A fatal record
//! error leaves the output file exactly as it was. 🦆

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use comfy_table::Table;
use serde_json::{Map, Value};
use tracing::{info, warn};

pub mod app_config;
pub(crate) mod backends;
pub(crate) mod composers;
pub mod metrics;
pub(crate) mod progress;
pub mod projection;

use crate::app_config::{MetricsConfig, ProjectorConfig};
use crate::backends::{Sink, SinkBackend, SourceBackend, read_document};
use crate::composers::{Composer, DelimitedComposer};
use crate::metrics::{
    ColumnUpdater, MetricsDocument, PgColumnUpdater, UpdatePlan, UpdateSummary, apply_updates,
    plan_updates,
};
use crate::progress::{ProgressMetrics, format_duration, format_number, two_column_table};
use crate::projection::{OutputType, ProjectionConfig, project_document};

/// 🧾 How the projection went, for the CLI's closing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output_type: OutputType,
    pub rows: usize,
    pub pr_groups_blanked: usize,
    pub commit_groups_blanked: usize,
    pub bytes_written: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn to_table(&self) -> Table {
        two_column_table(&[
            ("output type".into(), self.output_type.to_string()),
            ("rows written".into(), format_number(self.rows as u64)),
            (
                "PR groups blanked".into(),
                format_number(self.pr_groups_blanked as u64),
            ),
            (
                "commit groups blanked".into(),
                format_number(self.commit_groups_blanked as u64),
            ),
            ("bytes written".into(), format_number(self.bytes_written as u64)),
            ("elapsed".into(), format_duration(self.elapsed)),
        ])
    }
}

/// ⚠️ A separator with the delimiter or quote character in it still produces a valid file
/// (the cell gets quoted), but whoever splits that column later is in for a surprise.
fn warn_on_separator_collision(projection: &ProjectionConfig, composer: &DelimitedComposer) {
    let separator = &projection.separator;
    if separator.contains(composer.delimiter()) || separator.contains('"') {
        warn!(
            "⚠️ comment separator {separator:?} contains the delimiter {:?} or a quote; \
             comment cells will be quoted and splitting them back apart gets ambiguous",
            composer.delimiter()
        );
    }
}

/// 🧱 Document → rendered payload + summary. No output is touched in here.
pub(crate) fn project_to_payload(
    document: &Map<String, Value>,
    projection: &ProjectionConfig,
    composer: &DelimitedComposer,
) -> Result<(String, RunSummary)> {
    let started = Instant::now();
    warn_on_separator_collision(projection, composer);

    let mut progress = ProgressMetrics::new(
        format!("🧱 projecting issues ({})", projection.output_type),
        document.len() as u64,
    );
    let projected = project_document(document, projection, |done| progress.update(done as u64))
        .context("💀 A record could not be projected. Nothing was written; fix the record and rerun.")?;
    progress.finish();

    let payload = composer.compose(&projected.header, &projected.rows);
    let summary = RunSummary {
        output_type: projection.output_type,
        rows: projected.rows.len(),
        pr_groups_blanked: projected.pr_groups_blanked,
        commit_groups_blanked: projected.commit_groups_blanked,
        bytes_written: payload.len(),
        elapsed: started.elapsed(),
    };
    Ok((payload, summary))
}

/// 📡 Send the payload and close the sink. Close is not optional.
pub(crate) async fn deliver(sink: &mut SinkBackend, payload: String) -> Result<()> {
    sink.send(payload).await?;
    sink.close().await
}

/// 🚀 `ipx project`: the whole projection, from config to file.
pub async fn run(config: ProjectorConfig) -> Result<RunSummary> {
    info!(
        "🚀 projecting {:?} as '{}'",
        config.source_config, config.projection.output_type
    );
    let composer = DelimitedComposer::from_sink_config(&config.sink_config)?;

    let mut source = SourceBackend::from_config(&config.source_config).await?;
    let document = read_document(&mut source).await?;
    info!("📖 read {} records", document.len());

    let (payload, summary) = project_to_payload(&document, &config.projection, &composer)?;

    // -- 🕳️ the sink opens last: File::create truncates, and a failed run must not eat the old output
    let mut sink = SinkBackend::from_config(&config.sink_config).await?;
    deliver(&mut sink, payload).await?;
    info!(
        "✅ wrote {} rows ({} PR groups, {} commit groups blanked)",
        summary.rows, summary.pr_groups_blanked, summary.commit_groups_blanked
    );
    Ok(summary)
}

/// 🗺️ Source → metrics document → update plan.
pub(crate) async fn read_metrics_plan(source: &mut SourceBackend) -> Result<UpdatePlan> {
    let document = read_document(source).await?;
    let metrics: MetricsDocument = serde_json::from_value(Value::Object(document)).context(
        "💀 The metrics document has a 'per_issue' or 'per_period' that isn't a mapping. \
         We need key → metrics. We got a shrug in JSON form.",
    )?;
    let plan = plan_updates(&metrics);
    info!(
        "🗺️ planned {} updates ({} keys skipped)",
        plan.updates.len(),
        plan.skipped_keys
    );
    Ok(plan)
}

/// 🔁 `apply_updates`, with a progress bar on top.
pub(crate) async fn apply_with_progress<U: ColumnUpdater + ?Sized>(
    updater: &mut U,
    plan: &UpdatePlan,
) -> Result<UpdateSummary> {
    let mut progress = ProgressMetrics::new("✏️ updating metrics", plan.updates.len() as u64);
    let summary = apply_updates(updater, plan, |done| progress.update(done as u64)).await?;
    progress.finish();
    Ok(summary)
}

/// 📈 `ipx update-metrics`: metrics document → Postgres, committed once.
pub async fn update_metrics(config: MetricsConfig) -> Result<UpdateSummary> {
    let mut source = SourceBackend::from_config(&config.metrics_source).await?;
    let plan = read_metrics_plan(&mut source).await?;

    let mut updater = PgColumnUpdater::connect(&config.database, config.update.clone()).await?;
    apply_with_progress(&mut updater, &plan).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::{SinkConfig, SourceConfig};
    use crate::backends::CommonSinkConfig;
    use crate::backends::file::{FileSinkConfig, FileSourceConfig};
    use crate::backends::in_mem::{InMemorySink, InMemorySource, InMemorySourceConfig};
    use crate::metrics::InMemoryUpdater;
    use serde_json::json;

    fn issues_document() -> String {
        json!({
            "101": {
                "userid": 1, "userlogin": "alice", "title": "Fix typo", "body": "teh",
                "closed_at": null, "created_at": "2020-01-01", "is_pr": false,
                "num_comments": 0, "comments": {}
            },
            "102": {
                "userid": 2, "userlogin": "bob", "title": "Add feature, finally", "body": "adds",
                "closed_at": "2020-02-02", "created_at": "2020-01-15", "state": "closed",
                "is_pr": true, "num_comments": 2, "num_review_comments": 5,
                "comments": {"1": {"body": "lgtm"}, "2": {"body": "ship it"}},
                "commits": {
                    "abc123": {
                        "author_name": "bob", "date": "2020-01-16", "message": "wip", "sha": "abc123",
                        "files": {"file_list": ["a.rs"], "patch_text": "+a", "additions": 1, "removals": 0, "changes": 1}
                    },
                    "def456": {
                        "author_name": "bob", "date": "2020-01-17", "message": "done", "sha": "def456",
                        "files": {"file_list": ["a.rs", "b.rs"], "patch_text": "+b", "additions": 7, "removals": 2, "changes": 9}
                    }
                }
            }
        })
        .to_string()
    }

    fn projection(output_type: OutputType) -> ProjectionConfig {
        ProjectionConfig {
            output_type,
            separator: "||".into(),
        }
    }

    fn read_csv(payload: &str) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(payload.as_bytes())
            .records()
            .map(|record| {
                record
                    .expect("💀 output should be readable CSV")
                    .iter()
                    .map(str::to_string)
                    .collect()
            })
            .collect()
    }

    #[tokio::test]
    async fn the_one_where_issues_become_a_commits_spreadsheet() -> Result<()> {
        let mut source = SourceBackend::InMemory(InMemorySource::new(issues_document()));
        let document = read_document(&mut source).await?;
        let composer = DelimitedComposer::new(',')?;

        let (payload, summary) =
            project_to_payload(&document, &projection(OutputType::Commits), &composer)?;

        let peeker = InMemorySink::new();
        let mut sink = SinkBackend::InMemory(peeker.clone());
        deliver(&mut sink, payload).await?;

        let rows = read_csv(&peeker.contents().await);
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            OutputType::Commits
                .header()
                .iter()
                .map(|name| name.to_string())
                .collect::<Vec<_>>()
        );
        assert_eq!(rows[2][3], "def456");
        assert_eq!(rows[2][5], "a.rs,b.rs");
        assert!(rows[1][3].is_empty());
        assert_eq!(summary.rows, 2);
        assert!(*peeker.closed.lock().await);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_whole_run_goes_file_to_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("issues.json");
        let output = dir.path().join("pulls.csv");
        tokio::fs::write(&input, issues_document()).await?;

        let summary = run(ProjectorConfig {
            projection: projection(OutputType::Pulls),
            source_config: SourceConfig::File(FileSourceConfig {
                file_name: input.display().to_string(),
            }),
            sink_config: SinkConfig::File(FileSinkConfig {
                file_name: output.display().to_string(),
                common_config: CommonSinkConfig::default(),
            }),
        })
        .await?;

        let written = tokio::fs::read_to_string(&output).await?;
        assert!(written.ends_with("\r\n"));
        assert_eq!(summary.bytes_written, written.len());

        let rows = read_csv(&written);
        assert_eq!(rows[0][0], "Issue_Num");
        assert_eq!(rows[2][6], "Add feature, finally");
        // -- 🧮 Num_Commits is the 13th pulls column
        assert_eq!(rows[2][12], "2");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_broken_record_leaves_the_old_output_alone() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("pulls.csv");
        tokio::fs::write(&output, "yesterday's export\r\n").await?;

        let result = run(ProjectorConfig {
            projection: projection(OutputType::Pulls),
            source_config: SourceConfig::InMemory(InMemorySourceConfig {
                document: json!({"7": {"is_pr": false}}).to_string(),
            }),
            sink_config: SinkConfig::File(FileSinkConfig {
                file_name: output.display().to_string(),
                common_config: CommonSinkConfig::default(),
            }),
        })
        .await;

        assert!(result.is_err());
        assert_eq!(
            tokio::fs::read_to_string(&output).await?,
            "yesterday's export\r\n"
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_metrics_flow_from_json_to_the_updater() -> Result<()> {
        let mut source = SourceBackend::InMemory(InMemorySource::new(
            json!({
                "per_issue": {"101": {"num_lines": 12}},
                "per_period": {"2020-Q1": {"keys": [101, 102], "period_commits": 40}}
            })
            .to_string(),
        ));
        let plan = read_metrics_plan(&mut source).await?;

        let mut updater = InMemoryUpdater::default();
        let summary = apply_with_progress(&mut updater, &plan).await?;

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.applied, 3);
        assert_eq!(updater.commits, 1);
        let keys: Vec<&str> = updater.applied.iter().map(|u| u.key.as_str()).collect();
        assert_eq!(keys, vec!["101", "101", "102"]);
        Ok(())
    }

    #[test]
    fn the_one_where_the_summary_table_names_the_schema() {
        let table = RunSummary {
            output_type: OutputType::Pulls,
            rows: 10_000,
            pr_groups_blanked: 3,
            commit_groups_blanked: 1,
            bytes_written: 123_456,
            elapsed: Duration::from_secs(2),
        }
        .to_table()
        .to_string();
        assert!(table.contains("pulls"));
        assert!(table.contains("10,000"));
    }
}
