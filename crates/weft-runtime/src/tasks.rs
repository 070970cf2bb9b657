#![forbid(unsafe_code)]

//! Tracked fire-and-forget tasks.
//!
//! Background work (for example state listeners in background mode) is
//! spawned onto its own thread and its handle kept here, so the session can
//! [`flush`](TaskSet::flush) everything before shutdown instead of leaving
//! detached threads behind.

use std::io;
use std::thread;

use tracing::{debug, error, warn};

use crate::handlers::panic_message;

/// Counts from a [`TaskSet::flush`] or [`TaskSet::reap_finished`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskReport {
    pub completed: usize,
    pub panicked: usize,
}

#[derive(Debug, Default)]
pub struct TaskSet {
    pending: Vec<(String, thread::JoinHandle<()>)>,
    spawned: u64,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `task` on a new thread and track it.
    pub fn spawn<F>(&mut self, name: impl Into<String>, task: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let name = name.into();
        self.spawned += 1;
        let handle = thread::Builder::new()
            .name(format!("weft-task-{}", self.spawned))
            .spawn(task)?;
        self.pending.push((name, handle));
        Ok(())
    }

    /// Tasks not yet joined.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Join tasks that have already finished, without blocking.
    pub fn reap_finished(&mut self) -> TaskReport {
        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(_, handle)| handle.is_finished());
        self.pending = running;
        join(finished)
    }

    /// Block until every tracked task has finished.
    pub fn flush(&mut self) -> TaskReport {
        let report = join(std::mem::take(&mut self.pending));
        debug!(
            completed = report.completed,
            panicked = report.panicked,
            "tasks flushed"
        );
        report
    }

    /// Consume the set, joining everything.
    pub fn join_all(mut self) -> TaskReport {
        self.flush()
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            warn!(pending = self.pending.len(), "task set dropped with running tasks");
        }
    }
}

fn join(tasks: Vec<(String, thread::JoinHandle<()>)>) -> TaskReport {
    let mut report = TaskReport::default();
    for (name, handle) in tasks {
        match handle.join() {
            Ok(()) => report.completed += 1,
            Err(payload) => {
                report.panicked += 1;
                error!(task = %name, panic = %panic_message(payload.as_ref()), "task panicked");
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn flush_waits_for_everything() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut tasks = TaskSet::new();
        for i in 0..5 {
            let counter = Arc::clone(&counter);
            tasks
                .spawn(format!("t{i}"), move || {
                    thread::sleep(Duration::from_millis(5));
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .expect("spawned");
        }
        assert_eq!(tasks.pending(), 5);
        let report = tasks.flush();
        assert_eq!(report.completed, 5);
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert!(tasks.is_empty());
    }

    #[test]
    fn panics_are_counted_not_propagated() {
        let mut tasks = TaskSet::new();
        tasks.spawn("bad", || panic!("task blew up")).expect("spawned");
        tasks.spawn("good", || {}).expect("spawned");
        let report = tasks.join_all();
        assert_eq!(report, TaskReport { completed: 1, panicked: 1 });
    }

    #[test]
    fn reap_leaves_running_tasks() {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let mut tasks = TaskSet::new();
        tasks
            .spawn("blocked", move || {
                let _ = rx.recv();
            })
            .expect("spawned");
        assert_eq!(tasks.reap_finished().completed, 0);
        assert_eq!(tasks.pending(), 1);
        drop(tx);
        assert_eq!(tasks.flush().completed, 1);
    }
}
