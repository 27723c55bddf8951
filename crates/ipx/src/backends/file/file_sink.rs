use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::{
    fs::File,
    io::{self, AsyncWriteExt},
};
use tracing::trace;

use crate::backends::{CommonSinkConfig, Sink};

// -- 🚰 FileSinkConfig: cousin of FileSourceConfig, equally traumatized by disk full errors.
// -- `delimiter` sits flat next to `file_name` in the TOML thanks to the flatten.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FileSinkConfig {
    pub file_name: String,
    #[serde(flatten, default)]
    pub common_config: CommonSinkConfig,
}

/// 🚰 FileSink: receives the fully rendered table and writes it to disk. I/O only.
///
/// It's a BufWriter around a tokio `File`. Simple. Honest. Does not complain.
/// Does not quote. Does not have opinions about your delimiter. It writes what you give it.
///
/// ⚠️ `File::create` truncates if the file exists. No warning. No backup. Just gone.
/// He who runs this without checking the output path, re-exports in shame.
#[derive(Debug)]
pub(crate) struct FileSink {
    file_buf: io::BufWriter<File>,
    sink_config: FileSinkConfig,
}

impl FileSink {
    /// 🚀 Creates (or obliterates and recreates) the output file and wraps it in a BufWriter.
    pub(crate) async fn new(sink_config: FileSinkConfig) -> Result<Self> {
        let file_handle = File::create(&sink_config.file_name).await.context(format!(
            "💀 The sink file '{}' could not be conjured into existence. \
                We stared at the path. The path stared back. \
                One of us was wrong about whether the parent directory existed. \
                It was us. It was always us.",
            &sink_config.file_name
        ))?;
        // -- 📦 BufWriter: because one syscall per row is a war crime.
        let file_buf = io::BufWriter::new(file_handle);
        Ok(Self {
            file_buf,
            sink_config,
        })
    }
}

#[async_trait]
impl Sink for FileSink {
    /// 📡 Write a fully rendered payload to the file. One write_all call. That's the whole job.
    async fn send(&mut self, payload: String) -> Result<()> {
        trace!(
            "📬 payload of {} bytes walked into '{}', writing it all down",
            payload.len(),
            self.sink_config.file_name
        );
        self.file_buf.write_all(payload.as_bytes()).await.context(format!(
            "💀 The write to '{}' failed mid-sentence. The disk may be full. The disk may be gone.",
            self.sink_config.file_name
        ))?;
        Ok(())
    }

    /// 🗑️ Flush the BufWriter and close up shop.
    ///
    /// Without this flush, the tail of the table might be sitting in the buffer,
    /// warm and cozy, never making it to disk. Like a letter you wrote but never sent.
    /// async Drop is not a thing, so this has to be explicit.
    async fn close(&mut self) -> Result<()> {
        trace!("🎬 final flush. the file sink takes its bow");
        self.file_buf.flush().await.context(
            "💀 Error flushing file: the buffer held its data to the very end, \
            like a hoarder who finally agreed to let go, only for the storage unit to be locked. \
            The rows are still in memory. The disk remains unwritten. The spreadsheet weeps.",
        )
    }
}
