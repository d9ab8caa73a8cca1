//! Asynchronous writer pool draining insert statements into the driver.
//!
//! The pool is a bounded work queue with a fixed set of worker tasks.
//! Submitting enqueues the insert and hands back a single-slot result
//! channel; the enqueue itself awaits queue capacity, which is the
//! backpressure mechanism. Fanning a batch out over several workers
//! speeds large batches up considerably; read-back ordering comes from
//! the clustering key, not from insertion order, so the pool makes no
//! ordering promises across workers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::driver::{CqlArg, Driver};
use crate::error::{Error, Result};

/// One queued insert together with the slot its outcome is posted to.
struct InsertOperation {
    statement: String,
    args: Vec<CqlArg>,
    result_tx: oneshot::Sender<Result<()>>,
}

type SharedReceiver = Arc<Mutex<mpsc::Receiver<InsertOperation>>>;

/// A fixed set of writer tasks consuming a bounded insert queue.
///
/// The driver is assumed to be connected before inserts are submitted;
/// until then workers simply post the driver's not-connected error.
pub(crate) struct WriterPool {
    work_tx: mpsc::Sender<InsertOperation>,
    work_rx: SharedReceiver,
    stop: CancellationToken,
    stopped: AtomicBool,
}

impl WriterPool {
    /// Creates the pool, spawns `workers` writer tasks and marks the
    /// pool started. At most `buffer` inserts queue up before further
    /// submissions block.
    pub(crate) fn new(driver: Arc<dyn Driver>, workers: usize, buffer: usize) -> Self {
        let (work_tx, work_rx) = mpsc::channel(buffer);
        let work_rx: SharedReceiver = Arc::new(Mutex::new(work_rx));
        let stop = CancellationToken::new();

        tracing::debug!(workers, "starting cassandra writers");
        for _ in 0..workers {
            spawn_worker(Arc::clone(&driver), Arc::clone(&work_rx), stop.clone());
        }

        Self {
            work_tx,
            work_rx,
            stop,
            stopped: AtomicBool::new(false),
        }
    }

    /// Enqueues an insert and returns the channel its result will be
    /// posted to, exactly once, by whichever worker claims it.
    ///
    /// Blocks while the queue is full. When the pool has been stopped the
    /// returned channel is already resolved with [`Error::WriteRejected`]
    /// and nothing is enqueued.
    pub(crate) async fn submit(
        &self,
        statement: String,
        args: Vec<CqlArg>,
    ) -> oneshot::Receiver<Result<()>> {
        let (result_tx, result_rx) = oneshot::channel();
        if self.stopped.load(Ordering::Acquire) {
            let _ = result_tx.send(Err(Error::WriteRejected));
            return result_rx;
        }

        let op = InsertOperation {
            statement,
            args,
            result_tx,
        };
        if let Err(mpsc::error::SendError(op)) = self.work_tx.send(op).await {
            let _ = op.result_tx.send(Err(Error::WriteRejected));
        }
        result_rx
    }

    /// Stops the workers and fails fast on subsequent submissions.
    ///
    /// Idempotent. A worker that has already claimed an operation
    /// finishes it and posts the result; operations still queued are
    /// drained here and resolved with [`Error::WriteRejected`] so no
    /// submitter is left waiting on a channel nobody will fill.
    pub(crate) async fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!("stopping cassandra writers");
        self.stop.cancel();

        let mut work_rx = self.work_rx.lock().await;
        while let Ok(op) = work_rx.try_recv() {
            let _ = op.result_tx.send(Err(Error::WriteRejected));
        }
    }
}

fn spawn_worker(driver: Arc<dyn Driver>, work_rx: SharedReceiver, stop: CancellationToken) {
    tokio::spawn(async move {
        loop {
            let op = tokio::select! {
                _ = stop.cancelled() => return,
                op = recv_next(&work_rx) => match op {
                    Some(op) => op,
                    // channel closed: pool dropped
                    None => return,
                },
            };
            let result = driver.execute(&op.statement, &op.args).await;
            // the submitter may have walked away; nothing to do then
            let _ = op.result_tx.send(result);
        }
    });
}

async fn recv_next(work_rx: &SharedReceiver) -> Option<InsertOperation> {
    work_rx.lock().await.recv().await
}
