use anyhow::Result;
use async_trait::async_trait;

use crate::backends::Source;

/// 📦 The world's most optimistic data source.
///
/// It knows exactly one document: the one you gave it. It will give it back once,
/// and only once, because it is a one-trick pony who has already done its trick.
#[derive(Debug, Default)]
pub(crate) struct InMemorySource {
    document: Option<String>, // -- None = "I already gave you everything I had, please stop asking"
}

impl InMemorySource {
    /// 🚀 No I/O. No environment variables lurking in the shadows. Just a string in a box.
    pub(crate) fn new(document: String) -> Self {
        Self {
            document: Some(document),
        }
    }
}

#[async_trait]
impl Source for InMemorySource {
    /// 📄 The document, then `None`. The snack cabinet is empty. 🍪
    async fn next_page(&mut self) -> Result<Option<String>> {
        Ok(self.document.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn the_one_where_the_pony_does_its_trick_once() -> Result<()> {
        let mut source = InMemorySource::new("{}".to_string());
        assert_eq!(source.next_page().await?, Some("{}".to_string()));
        assert_eq!(source.next_page().await?, None);
        assert_eq!(source.next_page().await?, None);
        Ok(())
    }
}
