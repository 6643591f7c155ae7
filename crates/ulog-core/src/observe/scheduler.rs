//! Turn-based task scheduling for notification delivery and async work
//!
//! Everything in the observation layer is single-threaded. A [`Scheduler`]
//! decides when "the next turn" happens: [`LocalScheduler`] hands work to the
//! tokio `LocalSet` the caller runs inside, [`ManualScheduler`] queues it until
//! the owner explicitly drives it, which keeps tests deterministic.

use std::cell::RefCell;
use std::future::Future;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use futures_util::future::LocalBoxFuture;
use tracing::warn;

/// A unit of deferred synchronous work
pub type Task = Box<dyn FnOnce()>;

/// Runs work on a later turn of a single-threaded event loop.
pub trait Scheduler {
    /// Run `future` to completion on the event loop.
    fn spawn(&self, future: LocalBoxFuture<'static, ()>);

    /// Run `task` on the next turn.
    fn schedule(&self, task: Task) {
        self.spawn(Box::pin(async move { task() }));
    }
}

/// Scheduler backed by `tokio::task::spawn_local`.
///
/// Must be used from inside a `tokio::task::LocalSet`; spawning outside one
/// panics.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalScheduler;

impl Scheduler for LocalScheduler {
    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        tokio::task::spawn_local(future);
    }
}

/// Scheduler that only runs when told to.
///
/// Work accumulates in a local pool until [`run_until_stalled`] is called,
/// which runs every ready task, including tasks spawned along the way, until
/// nothing can make progress.
///
/// [`run_until_stalled`]: ManualScheduler::run_until_stalled
pub struct ManualScheduler {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool: RefCell::new(pool),
            spawner,
        }
    }

    /// Run queued work until every task is finished or waiting.
    ///
    /// Must not be called from inside a task of this scheduler.
    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Drive the pool until `future` completes and return its output.
    pub fn run_until<F: Future>(&self, future: F) -> F::Output {
        self.pool.borrow_mut().run_until(future)
    }
}

impl Scheduler for ManualScheduler {
    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        if let Err(e) = self.spawner.spawn_local(future) {
            warn!("Failed to spawn task on manual scheduler: {}", e);
        }
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler").finish_non_exhaustive()
    }
}
