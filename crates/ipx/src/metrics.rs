//! 📈 Metrics updater: the post-mining chore of writing computed numbers back to Postgres.
//!
//! Someone already crunched per-issue and per-period metrics into a JSON file. Someone
//! else already loaded the pull requests into a table. This module is the handshake
//! between the two: one `UPDATE` per (key, metric), one transaction, one commit.
//!
//! 🧠 Knowledge graph:
//! - `plan`: metrics document → flat, ordered `Vec<ColumnUpdate>`. Pure. Testable. Unbothered.
//! - `updater`: the `ColumnUpdater` seam + `apply_updates`, the loop that warns and moves on
//!   when a single statement fails, and still commits at the end.
//! - `postgres`: the sqlx implementation. One transaction for the run, one savepoint per
//!   statement, so a bad column name doesn't poison the other nine hundred updates.
//!
//! ```text
//! metrics.json ─▶ MetricsDocument ─▶ plan_updates ─▶ apply_updates(PgColumnUpdater) ─▶ COMMIT
//! ```
//!
//! 🦆 The duck has been granted read-only access. It cannot UPDATE anything. It is at peace.

mod plan;
mod postgres;
mod updater;

pub(crate) use plan::{MetricsDocument, UpdatePlan, plan_updates};
pub use postgres::{DatabaseConfig, UpdateTargetConfig};
pub(crate) use postgres::PgColumnUpdater;
pub(crate) use updater::{ColumnUpdater, apply_updates};
pub use updater::UpdateSummary;

#[cfg(test)]
pub(crate) use updater::InMemoryUpdater;
