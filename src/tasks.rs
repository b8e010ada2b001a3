use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};

// ---------------------------------------------------------------------------
// One-shot background task
// ---------------------------------------------------------------------------

/// A job running on its own thread that reports exactly one result.
///
/// The UI thread polls it every frame. Once the result arrives the worker
/// thread is joined before the result is handed out, so state is only ever
/// touched on the UI thread.
pub struct BackgroundTask<T> {
    label: &'static str,
    rx: Receiver<Result<T>>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    /// Run `job` on a new thread. `notify` is called after the result has
    /// been sent (used to wake the UI).
    pub fn spawn<F, N>(label: &'static str, job: F, notify: N) -> Result<Self>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        N: FnOnce() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(format!("{label}-worker"))
            .spawn(move || {
                let _ = tx.send(job());
                notify();
            })?;
        log::debug!("{label} task started");
        Ok(Self {
            label,
            rx,
            handle: Some(handle),
        })
    }

    /// Non-blocking check. Returns `Some` once, when the task has finished.
    pub fn poll(&mut self) -> Option<Result<T>> {
        let result = match self.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            // Sender dropped without a result: the job panicked.
            Err(TryRecvError::Disconnected) => {
                Err(anyhow!("{} task stopped unexpectedly", self.label))
            }
        };
        Some(self.finish(result))
    }

    /// Block until the task has finished.
    #[cfg(test)]
    fn wait(mut self) -> Result<T> {
        let result = self
            .rx
            .recv()
            .unwrap_or_else(|_| Err(anyhow!("{} task stopped unexpectedly", self.label)));
        self.finish(result)
    }

    fn finish(&mut self, result: Result<T>) -> Result<T> {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("{} worker thread panicked", self.label);
            }
        }
        log::debug!("{} task finished", self.label);
        result
    }
}
