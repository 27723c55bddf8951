//! 🔧 App Configuration: the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." (every developer at 3am) 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.
//!
//! 🧠 Knowledge graph:
//! - Two entry points, two roots: `ProjectorConfig` (`ipx project`) and
//!   `MetricsConfig` (`ipx update-metrics`). Both load through the same `load_config::<T>`.
//! - Backends are externally tagged enums: `[source_config.File]`, `[sink_config.InMemory]`.
//!   The tag IS the backend choice. No `type = "file"` stringly-typed nonsense.
//! - `projection.output_type` is validated during extraction, so `"bogus"` dies here,
//!   long before a single row exists.

use std::path::Path;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::info;

use crate::backends::CommonSinkConfig;
use crate::backends::file::{FileSinkConfig, FileSourceConfig};
use crate::backends::in_mem::InMemorySourceConfig;
use crate::metrics::{DatabaseConfig, UpdateTargetConfig};
use crate::projection::ProjectionConfig;

// -- 🏷️ every env var we listen to starts with this. IPX_PROJECTION__SEPARATOR, and so on.
const ENV_PREFIX: &str = "IPX_";

/// 🚰 Where does the JSON come from?
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    File(FileSourceConfig),
    InMemory(InMemorySourceConfig),
}

/// 🕳️ Where does the table go?
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    File(FileSinkConfig),
    InMemory(CommonSinkConfig),
}

impl SinkConfig {
    /// 📦 The shared bits every sink carries, whichever sink it is.
    pub fn common_config(&self) -> &CommonSinkConfig {
        match self {
            SinkConfig::File(file_config) => &file_config.common_config,
            SinkConfig::InMemory(common_config) => common_config,
        }
    }
}

/// 📦 Everything `ipx project` needs: what to project, from where, to where.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProjectorConfig {
    pub projection: ProjectionConfig,
    pub source_config: SourceConfig,
    pub sink_config: SinkConfig,
}

/// 📈 Everything `ipx update-metrics` needs: the metrics document and the table it lands in.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MetricsConfig {
    pub metrics_source: SourceConfig,
    pub database: DatabaseConfig,
    pub update: UpdateTargetConfig,
}

/// 🚀 Load a config root: from a file, from env vars, or from the sheer power of hoping.
///
/// 📐 DESIGN NOTE (tribal knowledge, no cap):
///   - `config_file_name` is None  → env vars only. No file. No assumptions.
///   - `config_file_name` is Some  → env vars + TOML file, merged. TOML wins on conflicts.
///   - Nested keys in env vars use `__`: `IPX_DATABASE__PASSWORD=hunter2`.
///
/// 💀 Returns an error if config is unparseable. Check the error message though:
/// it's contextual, informative, and written with love. Or despair. Hard to tell at 3am.
pub fn load_config<T: DeserializeOwned>(config_file_name: Option<&Path>) -> anyhow::Result<T> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    // 🏗️ Env vars as the base layer, like a good sourdough starter.
    let config = Figment::new().merge(Env::prefixed(ENV_PREFIX).split("__"));

    // 🎯 Layer in TOML only if a file was actually provided.
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables ({ENV_PREFIX}*). \
             The file exists in our hearts, but apparently not in a shape serde recognizes.",
            path.display()
        ),
        None => format!(
            "💀 Failed to parse configuration from environment variables ({ENV_PREFIX}*). \
             No file was provided, so this one's all on the environment. Classic."
        ),
    };

    config.extract().context(context_msg)
}
