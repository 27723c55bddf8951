//! 🔌 Backends: where the real I/O happens.
//!
//! 🚰 Source backends pour the issue document in, Sink backends slurp the rendered table out.
//! And in between, the projector does all the thinking. Backends don't think. Backends move bytes.
//!
//! 🎭 This module is the casting agency. Need to read the issues dump from disk?
//! Hand it a document straight from RAM for a test? Write a CSV next to it?
//! We've got a backend for that. Two, actually. We're a small agency.
//!
//! 🧠 Knowledge graph:
//! - Pattern: trait → concrete impls (File*, InMemory*) → *Backend enum → `from_config`
//! - `Source::next_page` returns raw text, uninterpreted. `read_document` stitches pages
//!   and parses once, preserving key order (issue order = row order).
//! - `Sink::send` writes an already-composed payload. No formatting decisions down here.
//!
//! 🦆 The duck is here because every file must have one. This is law. Do not question the duck.

use anyhow::{Context, Result};
use serde_json::{Map, Value};

pub(crate) mod common_config;
pub(crate) mod file;
pub(crate) mod in_mem;
mod sink;
mod source;

pub(crate) use common_config::CommonSinkConfig;
pub(crate) use sink::{Sink, SinkBackend};
pub(crate) use source::{Source, SourceBackend};

/// 📖 Drain a source and parse what it poured out as one JSON object.
///
/// The whole document lives in memory at once. That's the deal: no streaming,
/// no incremental parsing, just one `serde_json::from_str` and a prayer.
/// Key order is preserved, which matters more than it looks (see: "last commit").
pub(crate) async fn read_document(source: &mut SourceBackend) -> Result<Map<String, Value>> {
    let mut raw = String::new();
    while let Some(page) = source.next_page().await? {
        raw.push_str(&page);
    }

    serde_json::from_str(&raw).context(
        "💀 The input document is not a JSON object. We expected a mapping of keys to records, \
         and got something that would make a JSON linter file a complaint with HR.",
    )
}
