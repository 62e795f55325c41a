//! A fixed-size pool of worker units.
//!
//! See [`WorkerPool`].
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError};

use tracing::{debug, info, warn};

use crate::queue::WorkQueue;
use crate::sync::{mpsc, Mutex};
use crate::unit::{self, panic_message, Unit};
use crate::{Error, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// The lifecycle of a [`WorkerPool`].
///
/// `Idle -> Running -> Draining -> Stopped`. A pool that never received a
/// batch goes straight from `Idle` to `Draining`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolState {
    /// Workers are up, no batch has been submitted yet.
    Idle,
    /// At least one batch has been submitted.
    Running,
    /// Shutting down: no new batches, queued and in-flight tasks still run.
    Draining,
    /// Every worker has terminated.
    Stopped,
}

/// Settings of a [`WorkerPool`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    workers: usize,
    name: String,
}

impl PoolConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// Sets the number of worker units.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the name of the pool, which prefixes the names of its workers.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig(
                "a pool needs at least one worker".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    /// One worker per available core.
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            name: "pool".to_owned(),
        }
    }
}

/// The outcome of one task, tagged with its position in the batch.
type TaskResult<R> = (usize, Result<R>);

/// A batch of tasks submitted to a [`WorkerPool`].
///
/// A batch owns the link its results come back on, so it stays tied to the
/// pool that ran it. Call [`collect`](Batch::collect) on it, or pass it to
/// [`WorkerPool::collect`], to wait for its results.
#[must_use = "a batch does nothing unless its results are collected"]
pub struct Batch<R> {
    len: usize,
    results: mpsc::Receiver<TaskResult<R>>,
}

impl<R> Batch<R> {
    /// Returns the number of tasks in the batch.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Blocks until every task has finished and returns their results in
    /// submission order.
    pub fn collect(self) -> Vec<Result<R>> {
        let mut slots: Vec<Option<Result<R>>> = (0..self.len).map(|_| None).collect();
        for _ in 0..self.len {
            match self.results.recv() {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                // Every task holds a sender, so this only happens if tasks
                // were dropped without running.
                Err(_) => break,
            }
        }
        slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Err(Error::ChannelBroken)))
            .collect()
    }
}

/// A fixed number of long-lived worker units executing tasks from a shared
/// [`WorkQueue`].
///
/// A batch applies one function to many arguments. Workers pick tasks off the
/// queue independently and may finish them in any order, but
/// [`collect`](WorkerPool::collect) always returns results in the order the
/// arguments were submitted. Each worker runs one task at a time, so no more
/// than [`workers`](WorkerPool::workers) tasks ever execute at once.
///
/// A task that panics does not take its worker, its siblings, or the pool down
/// with it: its result slot holds [`Error::TaskFailure`] instead.
///
/// Dropping the pool shuts it down, waiting for queued tasks to finish.
///
/// # Examples
///
/// ```
/// use procsync::WorkerPool;
///
/// let pool = WorkerPool::new(3).unwrap();
/// let squares = pool.map(|x: u64| x * x, vec![1, 2, 3, 4]).unwrap();
/// assert_eq!(squares, vec![1, 4, 9, 16]);
/// ```
pub struct WorkerPool {
    config: PoolConfig,
    queue: WorkQueue<Job>,
    workers: Vec<Unit<()>>,
    state: Mutex<PoolState>,
}

impl WorkerPool {
    /// Starts a pool with `workers` worker units.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `workers` is zero.
    pub fn new(workers: usize) -> Result<Self> {
        Self::with_config(PoolConfig::new(workers))
    }

    /// Starts a pool from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration has no workers.
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        let queue: WorkQueue<Job> = WorkQueue::new();
        let workers = (0..config.workers)
            .map(|i| {
                let name = format!("{}-worker-{i}", config.name);
                let queue = queue.clone();
                let worker_name = name.clone();
                unit::spawn(name, move || work(&worker_name, &queue))
            })
            .collect();
        debug!(pool = %config.name, workers = config.workers, "started pool");
        Ok(Self {
            config,
            queue,
            workers,
            state: Mutex::new(PoolState::Idle),
        })
    }

    /// Returns the number of worker units.
    pub fn workers(&self) -> usize {
        self.config.workers
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn state(&self) -> PoolState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues one task per argument, each applying `f` to its argument.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] if the pool is shutting down or stopped.
    pub fn submit<F, A, R>(&self, f: F, args: impl IntoIterator<Item = A>) -> Result<Batch<R>>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        A: Send + 'static,
        R: Send + 'static,
    {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match *state {
                PoolState::Draining | PoolState::Stopped => return Err(Error::QueueClosed),
                PoolState::Idle | PoolState::Running => *state = PoolState::Running,
            }
        }

        let f = Arc::new(f);
        let (results, receiver) = mpsc::channel();
        let mut len = 0;
        for (index, arg) in args.into_iter().enumerate() {
            let f = Arc::clone(&f);
            let results = results.clone();
            self.queue.enqueue(Box::new(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(arg))).map_err(|payload| {
                    let message = panic_message(payload.as_ref());
                    warn!(task = index, %message, "task panicked");
                    Error::TaskFailure { index, message }
                });
                // The batch may have been dropped without being collected.
                let _ = results.send((index, outcome));
            }))?;
            len += 1;
        }
        debug!(pool = %self.config.name, tasks = len, "submitted batch");
        Ok(Batch {
            len,
            results: receiver,
        })
    }

    /// Blocks until every task of `batch` has finished, and returns the results
    /// in the order the arguments were submitted.
    ///
    /// The results always come from the pool that `batch` was submitted to.
    /// This is the same as [`Batch::collect`].
    pub fn collect<R>(&self, batch: Batch<R>) -> Vec<Result<R>> {
        batch.collect()
    }

    /// Applies `f` to every argument on the pool and returns the results in
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] if the pool is shutting down, or the
    /// first [`Error::TaskFailure`] in submission order if any task panicked.
    pub fn map<F, A, R>(&self, f: F, args: impl IntoIterator<Item = A>) -> Result<Vec<R>>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        A: Send + 'static,
        R: Send + 'static,
    {
        let batch = self.submit(f, args)?;
        self.collect(batch).into_iter().collect()
    }

    /// Stops accepting batches, lets queued and in-flight tasks finish, and
    /// waits for every worker to terminate.
    ///
    /// Calling this on a stopped pool has no effect.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == PoolState::Stopped {
                return;
            }
            *state = PoolState::Draining;
        }
        self.queue.close();
        for worker in self.workers.drain(..) {
            if let Err(err) = worker.join() {
                warn!(pool = %self.config.name, %err, "worker terminated abnormally");
            }
        }
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = PoolState::Stopped;
        info!(pool = %self.config.name, "pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs jobs one at a time until the queue is closed and drained.
fn work(name: &str, queue: &WorkQueue<Job>) {
    debug!(worker = name, "worker started");
    while let Ok(job) = queue.dequeue_blocking() {
        job();
    }
    debug!(worker = name, "worker stopped");
}
