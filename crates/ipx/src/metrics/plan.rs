//! 🗺️ From metrics document to a flat list of column updates.
//!
//! Two sections, two shapes:
//! - `per_issue`:  `{ "<key>": { "<column>": value, ... } }`
//! - `per_period`: `{ "<period>": { "keys": [<key>, ...], "<column>": value, ... } }`
//!
//! Every period's metrics apply to every key listed under it. The `keys` entry itself is
//! a list of targets, not a metric, so it never becomes a column.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::projection::render_scalar;

const PERIOD_KEYS: &str = "keys";

/// 📄 The metrics file, as written by whoever computed the metrics. A missing section is empty.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub(crate) struct MetricsDocument {
    #[serde(default)]
    pub(crate) per_issue: Map<String, Value>,
    #[serde(default)]
    pub(crate) per_period: Map<String, Value>,
}

/// ✏️ One `UPDATE`: set `column` to `value` on the row whose key column equals `key`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ColumnUpdate {
    pub(crate) key: String,
    pub(crate) column: String,
    pub(crate) value: Value,
}

/// 📋 The ordered updates, plus how many keys had to be skipped to get them.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct UpdatePlan {
    pub(crate) updates: Vec<ColumnUpdate>,
    pub(crate) skipped_keys: usize,
}

impl UpdatePlan {
    fn push_metrics<'a>(&mut self, key: &str, metrics: impl IntoIterator<Item = (&'a String, &'a Value)>) {
        for (column, value) in metrics {
            self.updates.push(ColumnUpdate {
                key: key.to_string(),
                column: column.clone(),
                value: value.clone(),
            });
        }
    }
}

/// 🔑 A key listed under a period may be a number or a string. Anything else can't match a row.
fn render_key(key: &Value) -> Option<String> {
    match key {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Some(render_scalar(key)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// 🗺️ Flatten the document: per-issue updates first, then per-period, each in file order.
pub(crate) fn plan_updates(document: &MetricsDocument) -> UpdatePlan {
    let mut plan = UpdatePlan::default();

    for (key, metrics) in &document.per_issue {
        match metrics.as_object() {
            Some(metrics) => plan.push_metrics(key, metrics),
            None => {
                warn!("⚠️ per_issue entry '{key}' is not a mapping of column → value, skipping it");
                plan.skipped_keys += 1;
            }
        }
    }

    for (period, period_data) in &document.per_period {
        let Some(period_data) = period_data.as_object() else {
            warn!("⚠️ per_period entry '{period}' is not a mapping, skipping the whole period");
            plan.skipped_keys += 1;
            continue;
        };
        let Some(keys) = period_data.get(PERIOD_KEYS).and_then(Value::as_array) else {
            warn!("⚠️ per_period entry '{period}' has no '{PERIOD_KEYS}' list, nobody to update");
            plan.skipped_keys += 1;
            continue;
        };

        let metrics: Vec<(&String, &Value)> = period_data
            .iter()
            .filter(|(column, _)| column.as_str() != PERIOD_KEYS)
            .collect();
        debug!(
            "🗓️ period '{period}': {} metrics × {} keys",
            metrics.len(),
            keys.len()
        );

        for key in keys {
            match render_key(key) {
                Some(key) => plan.push_metrics(&key, metrics.iter().copied()),
                None => {
                    warn!("⚠️ period '{period}' lists key {key} which can't identify a row, skipping it");
                    plan.skipped_keys += 1;
                }
            }
        }
    }

    plan
}
