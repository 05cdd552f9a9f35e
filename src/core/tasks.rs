// Fire-and-forget background work.
//
// Slow steps (AI extraction, document generation, research) are handed to a
// spawner and the request returns immediately. Nobody keeps the handle: there
// is no join, no cancellation and no completion signal back to the caller.

use std::future::Future;
use std::pin::Pin;

pub type BackgroundTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub trait TaskSpawner: Send + Sync {
    fn spawn(&self, name: &'static str, task: BackgroundTask);
}

/// Detaches tasks onto the ambient tokio runtime.
pub struct TokioSpawner;

impl TaskSpawner for TokioSpawner {
    fn spawn(&self, name: &'static str, task: BackgroundTask) {
        tracing::debug!(task = name, "Spawning background task");
        tokio::spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn tokio_spawner_runs_detached_tasks() {
        let done = Arc::new(AtomicBool::new(false));
        let (tx, rx) = tokio::sync::oneshot::channel();
        let flag = Arc::clone(&done);

        TokioSpawner.spawn(
            "test",
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
                let _ = tx.send(());
            }),
        );

        rx.await.unwrap();
        assert!(done.load(Ordering::SeqCst));
    }
}
