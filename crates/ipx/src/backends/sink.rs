use anyhow::Result;
use async_trait::async_trait;

use crate::app_config::SinkConfig;
use crate::backends::{file, in_mem};

/// 🕳️ A sink that sends pre-rendered payloads: pure I/O, zero logic.
///
/// The yin to the source's yang. The drain at the bottom of the pipeline tub.
/// Sinks do not buffer rows. They do not quote cells. They receive the full rendered
/// table and put it somewhere. Like a postal worker who delivers the mail without reading it.
///
/// # Contract 📜
/// - `send` accepts a fully rendered payload string and writes it. That's it.
/// - `close` flushes, finalizes, and bids the data a fond farewell. MUST be called.
///   Skipping `close` is a bug. It is also considered rude.
/// - Quoting, delimiters and line endings are the Composer's job, NOT this one's.
#[async_trait]
pub(crate) trait Sink: std::fmt::Debug {
    /// 📡 Send a fully rendered payload to the destination. I/O only. No questions asked.
    async fn send(&mut self, payload: String) -> Result<()>;
    /// 🗑️ Flush, finalize, and release. Call this. Always. No exceptions. Not even on Fridays.
    async fn close(&mut self) -> Result<()>;
}

/// 🎭 The many faces of a Sink: mirrors `SourceBackend` on the other end of the pipeline.
#[derive(Debug)]
pub(crate) enum SinkBackend {
    InMemory(in_mem::InMemorySink),
    File(file::FileSink),
}

impl SinkBackend {
    /// 🔧 Config → live sink. `File` truncates on open, so this is the point of no return.
    pub(crate) async fn from_config(config: &SinkConfig) -> Result<Self> {
        Ok(match config {
            SinkConfig::File(file_config) => {
                SinkBackend::File(file::FileSink::new(file_config.clone()).await?)
            }
            SinkConfig::InMemory(_) => SinkBackend::InMemory(in_mem::InMemorySink::new()),
        })
    }
}

#[async_trait]
impl Sink for SinkBackend {
    async fn send(&mut self, payload: String) -> Result<()> {
        match self {
            SinkBackend::InMemory(sink) => sink.send(payload).await,
            SinkBackend::File(sink) => sink.send(payload).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            SinkBackend::InMemory(sink) => sink.close().await,
            SinkBackend::File(sink) => sink.close().await,
        }
    }
}
