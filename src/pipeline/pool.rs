use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::error;

/// Fixed-size pool of async workers. `run` is a barrier: it returns only
/// once every submitted task has finished.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    size: usize,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            permits: Arc::new(Semaphore::new(size)),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `task` over every item with at most `size` in flight.
    ///
    /// Returns one entry per item, in input order. A task that panics is
    /// logged and reported as `Err` in its slot.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, task: F) -> Vec<Result<R, JoinError>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let total = items.len();
        let task = Arc::new(task);
        let mut set = JoinSet::new();
        let mut slot_of = HashMap::with_capacity(total);

        for (index, item) in items.into_iter().enumerate() {
            let permits = Arc::clone(&self.permits);
            let task = Arc::clone(&task);
            let handle = set.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail
                let _permit = permits.acquire_owned().await.ok();
                task(item).await
            });
            slot_of.insert(handle.id(), index);
        }

        let mut slots: Vec<Option<Result<R, JoinError>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = set.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, value)) => (id, Ok(value)),
                Err(err) => {
                    error!("Worker task failed: {}", err);
                    (err.id(), Err(err))
                }
            };
            if let Some(&index) = slot_of.get(&id) {
                slots[index] = Some(result);
            }
        }

        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_size_is_at_least_one() {
        assert_eq!(WorkerPool::new(0).size(), 1);
        assert_eq!(WorkerPool::new(5).size(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (active_c, peak_c) = (Arc::clone(&active), Arc::clone(&peak));
        let results = pool
            .run((0..10).collect(), move |n: u32| {
                let active = Arc::clone(&active_c);
                let peak = Arc::clone(&peak_c);
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    n * 2
                }
            })
            .await;

        let results: Vec<u32> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(results, (0..10).map(|n| n * 2).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let pool = WorkerPool::new(3);
        let results = pool
            .run(vec![30u64, 10, 20], |delay| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                delay
            })
            .await;
        let results: Vec<u64> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(results, vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn test_panicking_task_keeps_its_slot() {
        let pool = WorkerPool::new(2);
        let results = pool
            .run(vec![1, 2, 3], |n: i32| async move {
                if n == 2 {
                    panic!("boom");
                }
                n
            })
            .await;
        assert_eq!(results.len(), 3);
        assert_eq!(*results[0].as_ref().unwrap(), 1);
        assert!(results[1].as_ref().unwrap_err().is_panic());
        assert_eq!(*results[2].as_ref().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let pool = WorkerPool::new(4);
        let results = pool.run(Vec::<i32>::new(), |n| async move { n }).await;
        assert!(results.is_empty());
    }
}
