//! Bounded worker pool for poll jobs.
//!
//! Jobs are futures pushed into a queue holding at most twice the number of
//! workers; `submit` waits for a free slot when the queue is full. Workers are
//! spawned by the first `submit`. Each job runs in its own task so a panic is
//! contained to that job.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::SchedulerError;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fixed-size pool executing each submitted job exactly once.
pub struct Scheduler {
    workers: usize,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    /// Taken by the first `submit` to start the workers.
    receiver: Mutex<Option<mpsc::Receiver<Job>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    /// Jobs accepted and not yet finished.
    pending: Arc<watch::Sender<usize>>,
}

impl Scheduler {
    /// Create a pool of `workers` workers (at least one).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel(workers * 2);
        let (pending, _) = watch::channel(0);

        Self {
            workers,
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            handles: Mutex::new(Vec::new()),
            pending: Arc::new(pending),
        }
    }

    /// Number of accepted jobs that have not finished yet.
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Queue a job, waiting while the queue is full.
    ///
    /// Returns [`SchedulerError::Closed`] once [`close`](Self::close) was called.
    pub async fn submit<F>(&self, job: F) -> Result<(), SchedulerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sender = lock(&self.sender)
            .as_ref()
            .cloned()
            .ok_or(SchedulerError::Closed)?;

        self.start();

        let permit = sender.reserve().await.map_err(|_| SchedulerError::Closed)?;
        self.pending.send_modify(|n| *n += 1);
        permit.send(Box::pin(job));
        Ok(())
    }

    /// Spawn the workers. Only the caller that takes the receiver does so.
    fn start(&self) {
        let Some(receiver) = lock(&self.receiver).take() else {
            return;
        };

        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let mut handles = lock(&self.handles);
        for id in 0..self.workers {
            handles.push(tokio::spawn(worker(
                id,
                receiver.clone(),
                self.pending.clone(),
            )));
        }

        tracing::debug!(workers = self.workers, "Scheduler started");
    }

    /// Resolve once every job accepted so far has finished.
    ///
    /// Jobs accepted while waiting are awaited too. Does not stop the pool.
    pub async fn wait(&self) {
        let mut pending = self.pending.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = pending.wait_for(|n| *n == 0).await;
    }

    /// Stop accepting jobs. Queued jobs still run, then the workers exit.
    pub fn close(&self) {
        if lock(&self.sender).take().is_some() {
            tracing::debug!("Scheduler closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.sender).is_none()
    }

    /// Close the pool and wait for every worker to exit.
    pub async fn shutdown(&self) {
        self.close();
        // Workers were never started; nothing is queued.
        lock(&self.receiver).take();

        let handles = std::mem::take(&mut *lock(&self.handles));
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Worker terminated abnormally");
            }
        }
    }
}

async fn worker(
    id: usize,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    pending: Arc<watch::Sender<usize>>,
) {
    loop {
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };

        if let Err(e) = tokio::spawn(job).await {
            tracing::warn!(worker = id, error = %e, "Job failed");
        }
        pending.send_modify(|n| *n = n.saturating_sub(1));
    }

    tracing::trace!(worker = id, "Worker exiting");
}
