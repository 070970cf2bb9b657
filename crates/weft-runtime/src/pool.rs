#![forbid(unsafe_code)]

//! Worker threads for background handler execution.
//!
//! Jobs go through one `mpsc` queue shared by all workers. A panicking job is
//! caught and logged; the worker keeps serving. [`HandlerPool::shutdown`]
//! closes the queue, lets queued jobs finish and joins every worker.

use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, error};

use crate::handlers::panic_message;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
    #[error("handler pool is shut down")]
    ShutDown,
}

pub struct HandlerPool {
    sender: Option<mpsc::Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl std::fmt::Debug for HandlerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerPool")
            .field("workers", &self.workers.len())
            .field("open", &self.sender.is_some())
            .finish()
    }
}

impl HandlerPool {
    /// Start `workers` threads (at least one).
    pub fn new(workers: usize) -> Result<Self, PoolError> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let count = workers.max(1);
        let mut handles = Vec::with_capacity(count);
        for index in 0..count {
            let receiver = Arc::clone(&receiver);
            let handle = thread::Builder::new()
                .name(format!("weft-handler-{index}"))
                .spawn(move || worker_loop(&receiver))?;
            handles.push(handle);
        }
        debug!(workers = count, "handler pool started");
        Ok(Self {
            sender: Some(sender),
            workers: handles,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    pub fn is_running(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue a job.
    pub fn execute<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(PoolError::ShutDown)?;
        sender.send(Box::new(job)).map_err(|_| PoolError::ShutDown)
    }

    /// Finish queued jobs and join the workers. Idempotent.
    pub fn shutdown(&mut self) {
        if self.sender.take().is_none() && self.workers.is_empty() {
            return;
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("handler worker exited abnormally");
            }
        }
        debug!("handler pool stopped");
    }
}

impl Drop for HandlerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(receiver: &Mutex<mpsc::Receiver<Job>>) {
    loop {
        let job = {
            let Ok(queue) = receiver.lock() else {
                return;
            };
            match queue.recv() {
                Ok(job) => job,
                Err(_) => return,
            }
        };
        if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
            error!(panic = %panic_message(payload.as_ref()), "background job panicked");
        }
    }
}
