//! 📦 **Common Sink Config**: the shared DNA of every sink backend config.
//!
//! 🧠 Knowledge graph:
//! - `CommonSinkConfig`: embedded (flattened) in `FileSinkConfig`, and the whole payload of
//!   `SinkConfig::InMemory`. Controls how the table is rendered: which delimiter splits cells.
//! - The composer is resolved FROM this, because the output format is decided by where
//!   the rows are going, not where the issues came from.
//! - The quote character is always `"`. Downstream readers were told so in 2019. They remember.
//!
//! ⚠️ Lives in `backends` (not `app_config`) to avoid a circular import:
//!   `app_config` → `backends/file` → `app_config`. The module system has opinions. 🦆

use serde::Deserialize;

/// 🚰 Shared configuration embedded by every sink backend config.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CommonSinkConfig {
    /// ✂️ The cell delimiter. A comma, unless you enjoy tabs. Some people enjoy tabs.
    pub delimiter: char,
}

impl Default for CommonSinkConfig {
    fn default() -> Self {
        // -- 🎯 comma. the C in CSV. groundbreaking stuff.
        Self { delimiter: ',' }
    }
}
