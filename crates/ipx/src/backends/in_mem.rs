//! # Previously, on ipx...
//!
//! 🎬 The issues were trapped. Stranded in a fixture string like a traveler
//! stuck in a connecting airport with no WiFi and a dead phone. Someone had to
//! project them. Someone had to write a backend so simple it lives entirely in RAM,
//! gone the moment you blink.
//!
//! That someone was this module.
//!
//! `in_mem` provides an in-memory [`Source`](crate::backends::Source) and
//! [`Sink`](crate::backends::Sink) for tests and local poking. The [`InMemorySource`]
//! emits the document it was handed exactly once. The [`InMemorySink`] collects
//! payloads behind an `Arc<Mutex<...>>` so callers can inspect what arrived.
//!
//! 🦆
//!
//! ⚠️ This is NOT for production. If you're deploying this to prod, please also deploy a therapist.

use serde::Deserialize;

mod in_mem_sink;
mod in_mem_source;

pub(crate) use in_mem_sink::InMemorySink;
pub(crate) use in_mem_source::InMemorySource;

/// 📦 `[source_config.InMemory]`: the whole issues document, inline in the config. Great for
/// tests. Terrible for a repository with forty thousand pull requests.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct InMemorySourceConfig {
    pub document: String,
}
