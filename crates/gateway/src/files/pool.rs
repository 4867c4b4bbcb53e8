//! Per-call bounded worker pool.
//!
//! Search and replace fan their per-file work out over a small set of
//! blocking workers that pull from a shared queue. Results arrive in
//! completion order. Stopping the pool discards queued work; items already
//! being processed run to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

/// Handle over a running fan-out.
#[derive(Debug)]
pub struct FanOut<T> {
    results: mpsc::UnboundedReceiver<T>,
    stop: Arc<AtomicBool>,
}

impl<T> FanOut<T> {
    /// Next result in completion order, or `None` once every worker exited.
    pub async fn next(&mut self) -> Option<T> {
        self.results.recv().await
    }

    /// Stop handing out queued items.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl<T> Drop for FanOut<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run `work` over `items` on at most `workers` blocking threads.
///
/// Must be called from within a tokio runtime.
pub fn fan_out<I, T, F>(items: Vec<I>, workers: usize, work: F) -> FanOut<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> T + Send + Sync + 'static,
{
    let (tx, results) = mpsc::unbounded_channel();
    let stop = Arc::new(AtomicBool::new(false));
    let count = workers.max(1).min(items.len());
    let queue = Arc::new(Mutex::new(items.into_iter()));
    let work = Arc::new(work);

    for _ in 0..count {
        let queue = Arc::clone(&queue);
        let tx = tx.clone();
        let stop = Arc::clone(&stop);
        let work = Arc::clone(&work);

        tokio::task::spawn_blocking(move || loop {
            if stop.load(Ordering::Relaxed) {
                break;
            }

            let next = match queue.lock() {
                Ok(mut queue) => queue.next(),
                Err(poisoned) => poisoned.into_inner().next(),
            };
            let Some(item) = next else {
                break;
            };

            if tx.send(work(item)).is_err() {
                break;
            }
        });
    }

    FanOut { results, stop }
}
