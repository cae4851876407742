//! One-shot delayed tasks on the tokio runtime.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

/// A future that runs once after a delay unless cancelled first.
///
/// Cancelling (explicitly or by dropping the handle) before the delay has
/// elapsed guarantees the work never starts. Once the work has started it is
/// left to finish.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
    fired: Arc<AtomicBool>,
}

impl ScheduledTask {
    pub fn after<F>(delay: Duration, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let fired = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn({
            let cancelled = Arc::clone(&cancelled);
            let fired = Arc::clone(&fired);
            async move {
                tokio::time::sleep(delay).await;
                if cancelled.load(Ordering::SeqCst) {
                    return;
                }
                fired.store(true, Ordering::SeqCst);
                work.await;
            }
        });

        Self { handle, cancelled, fired }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if !self.fired.load(Ordering::SeqCst) {
            self.handle.abort();
        }
    }

    /// Whether the delay elapsed and the work started.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
