use anyhow::Result;
use async_trait::async_trait;

use crate::app_config::SourceConfig;
use crate::backends::{file, in_mem};

/// 🚰 A source that produces one raw page per call, maximally ignorant of content format.
///
/// Implement this trait and you too can be the origin of someone else's data problems.
///
/// # Contract 📜
/// - `next_page` returns `Option<String>`: one raw page of text, uninterpreted.
/// - `None` = EOF. The well is dry. The golden retriever goes home. 🐕
/// - The source does NOT parse. It's a faucet, not a chef. `read_document` is the chef.
/// - The borrow checker demands `&mut self` because sources have state. And feelings. Mostly state.
#[async_trait]
pub(crate) trait Source: std::fmt::Debug {
    /// 📄 Fetch the next raw page of data. `Ok(None)` when the tap runs dry. 🏁
    async fn next_page(&mut self) -> Result<Option<String>>;
}

/// 🎭 The many faces of a Source: a polymorphic casting call for data origins.
///
/// Callers never need to know (or care) whether the issues came from disk or from a test
/// that typed them in by hand. Ancient proverb: "He who hardcodes the backend, reads only once."
#[derive(Debug)]
pub(crate) enum SourceBackend {
    InMemory(in_mem::InMemorySource),
    File(file::FileSource),
}

impl SourceBackend {
    /// 🔧 Config → live source. The file one may fail to open; the in-memory one never does.
    pub(crate) async fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(match config {
            SourceConfig::File(file_config) => {
                SourceBackend::File(file::FileSource::new(file_config.clone()).await?)
            }
            SourceConfig::InMemory(in_mem_config) => {
                SourceBackend::InMemory(in_mem::InMemorySource::new(in_mem_config.document.clone()))
            }
        })
    }
}

#[async_trait]
impl Source for SourceBackend {
    async fn next_page(&mut self) -> Result<Option<String>> {
        match self {
            SourceBackend::InMemory(i) => i.next_page().await,
            SourceBackend::File(f) => f.next_page().await,
        }
    }
}
