use tokio::sync::watch;
use tokio::task::JoinHandle;
use anyhow::Result;

/// Holds the dev node's background tasks and their shutdown channel.
/// Call `shutdown()` to stop them gracefully.
pub struct ServiceHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<anyhow::Result<()>>)>,
}

impl Default for ServiceHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceHandle {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        ServiceHandle { shutdown_tx, tasks: vec![] }
    }

    /// Attach a named background task so shutdown waits for it.
    pub fn attach(&mut self, name: &'static str, h: JoinHandle<anyhow::Result<()>>) {
        self.tasks.push((name, h));
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Receiver that flips to `true` when shutdown is requested.
    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown to all tasks and await them in attach order.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown_tx.send_replace(true);
        for (name, h) in self.tasks {
            match h.await {
                Ok(Ok(())) => tracing::debug!(task = name, "service task stopped"),
                Ok(Err(e)) => tracing::error!(task = name, "service task returned error: {:?}", e),
                Err(e) => tracing::error!(task = name, "task join error: {:?}", e),
            }
        }
        Ok(())
    }
}
