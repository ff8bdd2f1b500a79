//! Hand-off of work to the host's interactive thread.
//!
//! The host's display API is not thread-safe, so the last step of every run
//! goes through an [`InteractiveDispatcher`] instead of being called from the
//! background worker.

use tokio::sync::mpsc;

/// Unit of work for the interactive thread.
pub type InteractiveTask = Box<dyn FnOnce() + Send + 'static>;

/// Schedules tasks on the host's interactive thread.
pub trait InteractiveDispatcher: Send + Sync {
    fn dispatch(&self, task: InteractiveTask);
}

/// Runs tasks immediately on the calling thread.
///
/// For headless hosts without a UI thread, and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl InteractiveDispatcher for InlineDispatcher {
    fn dispatch(&self, task: InteractiveTask) {
        task();
    }
}

/// Queues tasks for the host to drain through an [`InteractiveQueue`].
#[derive(Debug, Clone)]
pub struct QueueDispatcher {
    tx: mpsc::UnboundedSender<InteractiveTask>,
}

/// Receiving end owned by the interactive thread.
pub struct InteractiveQueue {
    rx: mpsc::UnboundedReceiver<InteractiveTask>,
}

/// Create a connected dispatcher/queue pair.
pub fn interactive_channel() -> (QueueDispatcher, InteractiveQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueDispatcher { tx }, InteractiveQueue { rx })
}

impl InteractiveDispatcher for QueueDispatcher {
    fn dispatch(&self, task: InteractiveTask) {
        if self.tx.send(task).is_err() {
            tracing::warn!("Interactive queue closed; dropping display update");
        }
    }
}

impl InteractiveQueue {
    /// Run every task queued so far without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait for the next task and run it. Returns `false` once every
    /// dispatcher has been dropped and the queue is empty.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Number of tasks waiting to run.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
