//! Bounded worker pool
//!
//! Every task spawned into the pool must take one of `size` semaphore
//! permits before it starts, so at most `size` tasks run at once no matter
//! how many are queued.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// Fixed-size pool of async tasks
pub struct WorkerPool<T> {
    semaphore: Arc<Semaphore>,
    size: usize,
    tasks: JoinSet<T>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Creates a pool that runs at most `size` tasks concurrently
    pub fn new(size: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(size)),
            size,
            tasks: JoinSet::new(),
        }
    }

    /// Maximum number of tasks running at once
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of tasks spawned and not yet joined
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Queues a task; it starts once a slot is free
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        self.tasks.spawn(async move {
            // The semaphore is never closed, so this only errs once the pool is gone
            let _permit = semaphore.acquire_owned().await;
            task.await
        });
    }

    /// Waits for the next task to finish, in completion order
    pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
        self.tasks.join_next().await
    }
}
