use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use comfy_table::Table;
use serde_json::Value;
use tracing::{info, warn};

use super::plan::{ColumnUpdate, UpdatePlan};
use crate::progress::{format_number, two_column_table};

/// 🎯 A value that can actually ride along as a bound parameter.
///
/// Scalars only. Arrays and objects have no column type waiting for them, so asking
/// for one is a per-statement fault, same as a column that doesn't exist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BoundValue<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'a str),
}

impl<'a> BoundValue<'a> {
    pub(crate) fn from_json(value: &'a Value) -> Result<Self> {
        Ok(match value {
            Value::Null => BoundValue::Null,
            Value::Bool(b) => BoundValue::Bool(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => BoundValue::Int(i),
                (None, Some(f)) => BoundValue::Float(f),
                // -- 🧮 unreachable without arbitrary_precision, but serde_json says "Option", so
                (None, None) => bail!("💀 the number {n} fits in neither i64 nor f64"),
            },
            Value::String(s) => BoundValue::Text(s),
            Value::Array(_) | Value::Object(_) => {
                bail!("💀 {value} is not a scalar, and a column holds exactly one of those")
            }
        })
    }
}

/// ✏️ Applies column updates inside one unit of work, then commits it.
///
/// # Contract 📜
/// - `update` applies one statement and returns the number of rows it touched. If it
///   fails, the unit of work must still be usable for the next one.
/// - `commit` makes everything that succeeded permanent. Called exactly once, at the end.
#[async_trait]
pub(crate) trait ColumnUpdater: std::fmt::Debug + Send {
    async fn update(&mut self, update: &ColumnUpdate) -> Result<u64>;
    async fn commit(&mut self) -> Result<()>;
}

/// 🧾 What happened, in numbers the CLI can put in a table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateSummary {
    pub attempted: usize,
    pub applied: usize,
    pub failed: usize,
    pub rows_affected: u64,
    pub skipped_keys: usize,
}

impl UpdateSummary {
    pub fn to_table(&self) -> Table {
        two_column_table(&[
            ("statements attempted".into(), format_number(self.attempted as u64)),
            ("applied".into(), format_number(self.applied as u64)),
            ("failed (skipped)".into(), format_number(self.failed as u64)),
            ("rows affected".into(), format_number(self.rows_affected)),
            ("keys skipped".into(), format_number(self.skipped_keys as u64)),
        ])
    }
}

/// 🔁 Every update in order. A failing statement is logged and skipped; the rest carry on,
/// and the whole lot is committed once at the end. Only the commit itself can sink the run.
pub(crate) async fn apply_updates<U: ColumnUpdater + ?Sized>(
    updater: &mut U,
    plan: &UpdatePlan,
    mut on_update: impl FnMut(usize) + Send,
) -> Result<UpdateSummary> {
    let mut summary = UpdateSummary {
        skipped_keys: plan.skipped_keys,
        ..UpdateSummary::default()
    };

    for update in &plan.updates {
        summary.attempted += 1;
        match updater.update(update).await {
            Ok(rows) => {
                summary.applied += 1;
                summary.rows_affected += rows;
                if rows == 0 {
                    warn!(
                        "⚠️ SET {} for key '{}' matched no rows. The key may not exist in the table.",
                        update.column, update.key
                    );
                }
            }
            Err(err) => {
                summary.failed += 1;
                warn!(
                    "⚠️ SET {} = {} for key '{}' failed, skipping it: {err:#}",
                    update.column, update.value, update.key
                );
            }
        }
        on_update(summary.attempted);
    }

    updater.commit().await.context(
        "💀 Every statement had its moment, and then the COMMIT failed. \
         Nothing from this run was saved. The table is exactly as we found it.",
    )?;
    info!(
        "✅ committed {} of {} metric updates ({} rows touched)",
        summary.applied, summary.attempted, summary.rows_affected
    );

    Ok(summary)
}

/// 🧪 Records what would have been written, and fails on command.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct InMemoryUpdater {
    pub(crate) applied: Vec<ColumnUpdate>,
    pub(crate) failing_columns: Vec<String>,
    pub(crate) commits: usize,
}

#[cfg(test)]
#[async_trait]
impl ColumnUpdater for InMemoryUpdater {
    async fn update(&mut self, update: &ColumnUpdate) -> Result<u64> {
        BoundValue::from_json(&update.value)?;
        if self.failing_columns.contains(&update.column) {
            bail!("column \"{}\" does not exist", update.column);
        }
        self.applied.push(update.clone());
        Ok(1)
    }

    async fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}
