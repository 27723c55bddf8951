use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backends::Sink;

/// 📦 A sink that never forgets. Unlike my dad, who forgot my soccer game in 1998.
///
/// `InMemorySink` receives fully rendered payload strings and hoards them in a shared Vec
/// wrapped in a Mutex wrapped in an Arc. It's types all the way down.
///
/// Clone-able because tests need to peek inside after handing `self` off to the
/// pipeline. The `Arc` means everyone shares the same Vec.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemorySink {
    /// 🔒 The evidence locker. Each entry = one fully rendered payload string.
    pub(crate) received: Arc<Mutex<Vec<String>>>,
    /// 🚪 Flipped by `close`, so tests can catch a pipeline that forgot its manners.
    pub(crate) closed: Arc<Mutex<bool>>,
}

impl InMemorySink {
    /// 🚀 An empty Vec, full of potential, unmarred by payloads. Downhill from here.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 📋 Everything that arrived, glued back together in arrival order.
    pub(crate) async fn contents(&self) -> String {
        self.received.lock().await.concat()
    }
}

#[async_trait]
impl Sink for InMemorySink {
    /// 📡 Lock, push, done. Like a fax machine but for bytes. 🦆
    async fn send(&mut self, payload: String) -> Result<()> {
        // 🔒 The Mutex is load-bearing. Do not remove. I know it looks optional. It isn't.
        self.received.lock().await.push(payload);
        Ok(())
    }

    /// 🗑️ Nothing to flush. We live in RAM. We just write down that we were asked.
    async fn close(&mut self) -> Result<()> {
        *self.closed.lock().await = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn the_one_where_a_clone_sees_what_the_original_received() -> Result<()> {
        let mut sink = InMemorySink::new();
        let peeker = sink.clone();

        sink.send("header\r\n".to_string()).await?;
        sink.send("row\r\n".to_string()).await?;
        sink.close().await?;

        assert_eq!(peeker.contents().await, "header\r\nrow\r\n");
        assert!(*peeker.closed.lock().await);
        Ok(())
    }
}
