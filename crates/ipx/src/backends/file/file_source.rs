use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::backends::Source;

// -- 📂 FileSourceConfig: "It's just a file", said no sysadmin ever before the disk filled up.
// -- Co-located with the FileSource that actually uses it. One backend = one config = one file.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FileSourceConfig {
    pub file_name: String,
}

/// 📂 FileSource: reads the whole document in one go, hands it over, and retires.
///
/// The issues dump is a single JSON object. There is no such thing as half a JSON object,
/// so there is no such thing as half a page here either. One page, then `None`.
#[derive(Debug)]
pub(crate) struct FileSource {
    source_config: FileSourceConfig,
    has_yielded: bool,
}

impl FileSource {
    /// 🚀 Checks the file is actually there before anyone gets their hopes up.
    ///
    /// If the file doesn't exist: 💀 anyhow will tell you with *theatrical flair*.
    /// The read itself happens on the first `next_page`.
    pub(crate) async fn new(source_config: FileSourceConfig) -> Result<Self> {
        // -- 💀 The door. It's locked. Or it doesn't exist. Or the filesystem lied to you.
        let metadata = tokio::fs::metadata(&source_config.file_name)
            .await
            .context(format!(
                "💀 The door to '{}' would not budge. We knocked. We pleaded. \
                We checked if it existed (it might not). We checked permissions (they might be wrong). \
                The door remained closed. The file remains unopened. We remain outside.",
                source_config.file_name
            ))?;
        debug!(
            "📂 source file '{}' found, {} bytes of issues await",
            source_config.file_name,
            metadata.len()
        );

        Ok(Self {
            source_config,
            has_yielded: false,
        })
    }
}

#[async_trait]
impl Source for FileSource {
    /// 📄 The whole file as one page, then `None` forever after.
    async fn next_page(&mut self) -> Result<Option<String>> {
        if self.has_yielded {
            return Ok(None);
        }
        self.has_yielded = true;

        let page = tokio::fs::read_to_string(&self.source_config.file_name)
            .await
            .context(format!(
                "💀 '{}' opened fine and then refused to be read. Maybe it isn't UTF-8. \
                Maybe it was deleted between the knock and the handshake. Either way: no page.",
                self.source_config.file_name
            ))?;
        trace!("📄 read {} bytes from '{}'", page.len(), self.source_config.file_name);
        Ok(Some(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn the_one_where_the_file_is_read_exactly_once() -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new()?;
        write!(tmp, r#"{{"1": {{}}}}"#)?;

        let mut source = FileSource::new(FileSourceConfig {
            file_name: tmp.path().display().to_string(),
        })
        .await?;

        assert_eq!(source.next_page().await?, Some(r#"{"1": {}}"#.to_string()));
        assert_eq!(source.next_page().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_file_was_never_there() {
        let nowhere = FileSource::new(FileSourceConfig {
            file_name: "/definitely/not/a/real/issues.json".to_string(),
        })
        .await;
        assert!(nowhere.is_err());
    }
}
