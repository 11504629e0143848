//! Bounded crawl frontier with quiescence detection
//!
//! This module handles:
//! - A bounded FIFO queue of crawl tasks shared by all workers
//! - Best-effort enqueueing (a full queue drops the task)
//! - An in-flight counter that detects when the crawl has drained
//! - The shared cancellation signal that stops idle workers

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Default frontier capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// A URL waiting for a crawl worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: String,
    pub depth: usize,
}

/// Frontier shared by the crawl workers
///
/// `in_flight` counts tasks that are queued or being processed. It is
/// incremented before a task enters the queue and decremented by
/// [`Frontier::complete`] after the task, including the enqueueing of
/// everything it discovered, is finished. When it drops to zero nothing can
/// produce more work, so the frontier closes itself.
pub struct Frontier {
    tx: mpsc::Sender<CrawlTask>,
    rx: Mutex<mpsc::Receiver<CrawlTask>>,
    capacity: usize,
    in_flight: AtomicUsize,
    cancel: CancellationToken,
}

impl Frontier {
    /// Creates a new frontier
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of queued tasks
    /// * `cancel` - Cancellation signal shared with the crawl
    pub fn new(capacity: usize, cancel: CancellationToken) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);

        Self {
            tx,
            rx: Mutex::new(rx),
            capacity,
            in_flight: AtomicUsize::new(0),
            cancel,
        }
    }

    /// Adds a task to the queue
    ///
    /// Returns false when the task was dropped because the queue is full or
    /// the frontier is closed.
    pub fn push(&self, task: CrawlTask) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        match self.tx.try_send(task) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(task)) => {
                tracing::debug!("Frontier full, dropping {}", task.url);
                self.complete();
                false
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                tracing::trace!("Frontier closed, dropping {}", task.url);
                self.complete();
                false
            }
        }
    }

    /// Waits for the next task
    ///
    /// Returns None once the frontier is closed.
    pub async fn pop(&self) -> Option<CrawlTask> {
        if self.cancel.is_cancelled() {
            return None;
        }

        let mut rx = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            rx = self.rx.lock() => rx,
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            task = rx.recv() => task,
        }
    }

    /// Marks one task as fully processed
    pub fn complete(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if previous == 1 {
            tracing::debug!("Frontier drained, closing");
            self.cancel.cancel();
        }
    }

    /// Closes the frontier; idle workers exit
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Number of tasks queued or being processed
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Number of tasks waiting in the queue
    pub fn queued(&self) -> usize {
        self.capacity - self.tx.capacity()
    }
}
