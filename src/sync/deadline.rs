//! Soft deadlines: race an operation against a timer without cancelling it.
//!
//! When the timer wins, the iteration is marked degraded and the caller gets
//! `None`, while the operation keeps running to completion in its own task.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

use crate::utils::metrics::{BLOCK_WAIT_TIMEOUTS, METRICS};

/// Soft-fail flag shared by everything running inside one iteration.
#[derive(Debug, Clone)]
pub struct IterationHealth {
    good: Arc<AtomicBool>,
}

impl Default for IterationHealth {
    fn default() -> Self {
        Self { good: Arc::new(AtomicBool::new(true)) }
    }
}

impl IterationHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_degraded(&self) {
        self.good.store(false, Ordering::SeqCst);
    }

    pub fn is_good(&self) -> bool {
        self.good.load(Ordering::SeqCst)
    }
}

/// First result wins: `Some(output)` if `op` finished within `limit`, else `None`.
pub async fn with_soft_deadline<F, T>(op: F, limit: Duration, health: &IterationHealth) -> Option<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let mut task = tokio::spawn(op);
    tokio::select! {
        joined = &mut task => match joined {
            Ok(out) => Some(out),
            Err(e) => {
                error!(error = %e, "soft deadline task failed");
                health.mark_degraded();
                None
            }
        },
        _ = tokio::time::sleep(limit) => {
            // dropping the handle detaches the task, it is not aborted
            warn!(ms = limit.as_millis() as u64, "timeout");
            METRICS.inc_counter(BLOCK_WAIT_TIMEOUTS);
            health.mark_degraded();
            None
        }
    }
}
