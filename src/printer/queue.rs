//! # Print Queue
//!
//! The device handle is not safe for concurrent use, and a health check
//! followed by a print must not interleave with another job. Every device
//! operation is therefore funnelled through one bounded channel into a
//! dedicated OS thread that owns the [`PrinterConnection`].
//!
//! ```text
//! handler ──try_send──► [ bounded mpsc ] ──blocking_recv──► printer-worker
//!    ▲                                                           │
//!    └──────────── oneshot reply (awaited with timeout) ◄────────┘
//! ```
//!
//! A caller that times out only stops waiting. The job still runs to
//! completion on the worker; paper that has been printed cannot be recalled.

use std::io;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::{PrinterConnection, PrinterStatus};
use crate::driver::Backend;
use crate::error::SubmitError;
use crate::job::FaxJob;

/// Default number of tasks waiting for the worker.
pub const DEFAULT_CAPACITY: usize = 8;

/// Default time a caller waits for its task to finish.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

type Reply<T> = oneshot::Sender<Result<T, SubmitError>>;

enum Task {
    Print { job: Box<FaxJob>, reply: Reply<()> },
    Status { reply: Reply<PrinterStatus> },
}

/// Handle for submitting work to the printer worker. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PrintQueue {
    tx: mpsc::Sender<Task>,
    timeout: Duration,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::Print { job, .. } => write!(f, "Print({})", job.id()),
            Task::Status { .. } => f.write_str("Status"),
        }
    }
}

impl PrintQueue {
    /// Start the worker thread, handing it ownership of `conn`.
    ///
    /// The worker exits once every `PrintQueue` clone has been dropped.
    pub fn spawn<B: Backend>(
        conn: PrinterConnection<B>,
        capacity: usize,
        timeout: Duration,
    ) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        thread::Builder::new()
            .name("printer-worker".into())
            .spawn(move || run_worker(conn, rx))?;
        Ok(Self { tx, timeout })
    }

    /// Health-check the printer and print `job`.
    pub async fn print(&self, job: FaxJob) -> Result<(), SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.enqueue(Task::Print {
            job: Box::new(job),
            reply,
        })?;
        self.wait(rx).await
    }

    /// Health-check the printer and read its live status.
    pub async fn status(&self) -> Result<PrinterStatus, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.enqueue(Task::Status { reply })?;
        self.wait(rx).await
    }

    fn enqueue(&self, task: Task) -> Result<(), SubmitError> {
        debug!(?task, "queueing printer task");
        self.tx.try_send(task).map_err(|e| match e {
            TrySendError::Full(task) => {
                warn!(?task, "print queue full");
                SubmitError::QueueFull
            }
            TrySendError::Closed(_) => {
                error!("printer worker is gone");
                SubmitError::WorkerGone
            }
        })
    }

    async fn wait<T>(&self, rx: oneshot::Receiver<Result<T, SubmitError>>) -> Result<T, SubmitError> {
        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SubmitError::WorkerGone),
            Err(_) => {
                warn!(timeout = ?self.timeout, "gave up waiting for the printer");
                Err(SubmitError::Timeout)
            }
        }
    }
}

fn run_worker<B: Backend>(mut conn: PrinterConnection<B>, mut rx: mpsc::Receiver<Task>) {
    info!(device = %conn.ident(), backend = conn.backend().name(), "printer worker started");

    while let Some(task) = rx.blocking_recv() {
        match task {
            Task::Print { job, reply } => {
                let result = print_job(&mut conn, &job);
                if reply.send(result).is_err() {
                    warn!(job = %job.id(), "submitter stopped waiting, outcome dropped");
                }
            }
            Task::Status { reply } => {
                let result = conn.status().map_err(SubmitError::PrinterFault);
                let _ = reply.send(result);
            }
        }
    }

    info!("printer worker stopped");
}

/// Health check and transmit, atomically with respect to other tasks.
fn print_job<B: Backend>(
    conn: &mut PrinterConnection<B>,
    job: &FaxJob,
) -> Result<(), SubmitError> {
    let health = conn.ensure_ready().map_err(|e| {
        error!(job = %job.id(), error = %e, "health check failed");
        SubmitError::PrinterFault(e)
    })?;
    if !health.is_ready() {
        warn!(job = %job.id(), %health, "printer not ready, job rejected");
        return Err(SubmitError::PrinterNotReady(health));
    }

    let program = job.render();
    conn.print(&program).map_err(SubmitError::PrinterTransmit)?;

    info!(job = %job.id(), ops = program.len(), "fax printed");
    Ok(())
}

#[cfg(test)]
impl PrintQueue {
    /// Queue without a worker; the caller drives the receiving end.
    fn detached(capacity: usize, timeout: Duration) -> (Self, mpsc::Receiver<Task>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, timeout }, rx)
    }
}
