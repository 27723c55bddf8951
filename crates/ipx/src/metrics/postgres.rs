//! 🐘 The Postgres side of the metrics updater.
//!
//! One pool, one connection, one transaction for the whole run. Each statement runs
//! inside its own savepoint: a failure rolls back just that statement and the
//! transaction lives on to commit everything else.
//!
//! SQL is built at runtime (the table and columns come from config and data), so
//! identifiers are double-quoted and every value travels as a bound parameter.
//! No string-spliced values. Not even the ones that look harmless.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use tracing::{debug, info};

use super::plan::ColumnUpdate;
use super::updater::{BoundValue, ColumnUpdater};

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_key_column() -> String {
    // -- 🔑 rows are pull requests, keyed by their number. history decided this.
    "pr".to_string()
}

/// 🔌 `[database]`: how to reach the server.
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

// 🔒 hand-rolled so the password never lands in a log line
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"🙈")
            .finish()
    }
}

/// 🎯 `[update]`: which table, and which column identifies a row.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct UpdateTargetConfig {
    pub table: String,
    #[serde(default = "default_key_column")]
    pub key_column: String,
}

/// 🏷️ `pull_requests` → `"pull_requests"`, `a"b` → `"a""b"`.
fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// 🏷️ Like `quote_identifier`, but `schema.table` stays two identifiers.
fn quote_qualified(name: &str) -> String {
    name.split('.').map(quote_identifier).collect::<Vec<_>>().join(".")
}

/// 🧱 The statement for one update. A null value becomes a literal `NULL`, so the key
/// moves up to `$1`. The key column is compared as text: keys arrive as strings, the
/// column might be an integer, and `'42'` should still find row 42.
pub(crate) fn build_update_sql(target: &UpdateTargetConfig, column: &str, value_is_null: bool) -> String {
    let table = quote_qualified(&target.table);
    let column = quote_identifier(column);
    let key_column = quote_identifier(&target.key_column);
    if value_is_null {
        format!("UPDATE {table} SET {column} = NULL WHERE {key_column}::text = $1")
    } else {
        format!("UPDATE {table} SET {column} = $1 WHERE {key_column}::text = $2")
    }
}

/// 🐘 `ColumnUpdater` over a single Postgres transaction.
pub(crate) struct PgColumnUpdater {
    pool: PgPool,
    // -- None once committed. Dropping a live one rolls everything back, which is the point.
    transaction: Option<Transaction<'static, Postgres>>,
    target: UpdateTargetConfig,
}

impl std::fmt::Debug for PgColumnUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgColumnUpdater")
            .field("target", &self.target)
            .field("in_transaction", &self.transaction.is_some())
            .finish()
    }
}

impl PgColumnUpdater {
    /// 🚀 Connect and open the run's transaction.
    pub(crate) async fn connect(database: &DatabaseConfig, target: UpdateTargetConfig) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&database.host)
            .port(database.port)
            .database(&database.database)
            .username(&database.user)
            .password(&database.password);

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context(format!(
                "💀 Postgres at {}:{} (database '{}') did not pick up. \
                 Is it running? Is it listening? Does it know who '{}' is?",
                database.host, database.port, database.database, database.user
            ))?;
        let transaction = pool
            .begin()
            .await
            .context("💀 Connected to Postgres, but it refused to BEGIN. Awkward.")?;
        info!(
            "🐘 connected to {}:{}/{}, updating {} by {}",
            database.host, database.port, database.database, target.table, target.key_column
        );

        Ok(Self {
            pool,
            transaction: Some(transaction),
            target,
        })
    }

    fn transaction(&mut self) -> Result<&mut Transaction<'static, Postgres>> {
        self.transaction
            .as_mut()
            .ok_or_else(|| anyhow!("💀 the transaction was already committed; no more updates"))
    }
}

#[async_trait]
impl ColumnUpdater for PgColumnUpdater {
    async fn update(&mut self, update: &ColumnUpdate) -> Result<u64> {
        let value = BoundValue::from_json(&update.value)?;
        let sql = build_update_sql(&self.target, &update.column, value == BoundValue::Null);

        let query = sqlx::query(&sql);
        let query = match value {
            BoundValue::Null => query,
            BoundValue::Bool(b) => query.bind(b),
            BoundValue::Int(i) => query.bind(i),
            BoundValue::Float(f) => query.bind(f),
            BoundValue::Text(s) => query.bind(s),
        };
        let query = query.bind(update.key.as_str());

        let transaction = self.transaction()?;
        let mut savepoint = Acquire::begin(&mut *transaction).await?;
        match query.execute(&mut *savepoint).await {
            Ok(result) => {
                savepoint.commit().await?;
                debug!("✏️ {sql} [{}] → {} rows", update.key, result.rows_affected());
                Ok(result.rows_affected())
            }
            Err(err) => {
                savepoint.rollback().await?;
                Err(err).context(format!("💀 {sql}"))
            }
        }
    }

    async fn commit(&mut self) -> Result<()> {
        let transaction = self
            .transaction
            .take()
            .ok_or_else(|| anyhow!("💀 commit called twice; the first one already won"))?;
        transaction.commit().await?;
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(table: &str) -> UpdateTargetConfig {
        UpdateTargetConfig {
            table: table.into(),
            key_column: default_key_column(),
        }
    }

    #[test]
    fn the_one_where_values_travel_as_parameters() {
        assert_eq!(
            build_update_sql(&target("pull_requests"), "num_lines", false),
            r#"UPDATE "pull_requests" SET "num_lines" = $1 WHERE "pr"::text = $2"#
        );
    }

    #[test]
    fn the_one_where_null_is_spelled_out() {
        assert_eq!(
            build_update_sql(&target("pull_requests"), "sentiment", true),
            r#"UPDATE "pull_requests" SET "sentiment" = NULL WHERE "pr"::text = $1"#
        );
    }

    #[test]
    fn the_one_where_bobby_tables_gets_quoted() {
        assert_eq!(
            build_update_sql(&target("mining.prs"), "x\"; DROP TABLE prs; --", false),
            r#"UPDATE "mining"."prs" SET "x""; DROP TABLE prs; --" = $1 WHERE "pr"::text = $2"#
        );
    }

    #[test]
    fn the_one_where_the_password_stays_off_the_record() {
        let database = DatabaseConfig {
            host: default_host(),
            port: default_port(),
            database: "ghdata".into(),
            user: "miner".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{database:?}").contains("hunter2"));
    }
}
