//! A serial queue: one named thread that owns some state and runs jobs
//! against it in submission order.
//!
//! The state is built on the worker itself, so it may hold values that are
//! not `Send` (script contexts are typically bound to their thread).

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Parsers and tree walkers recurse per nesting level of their input
const WORKER_STACK_SIZE: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("queue `{0}` has shut down")]
    Closed(String),
    #[error("job on queue `{queue}` panicked: {message}")]
    Panicked { queue: String, message: String },
    #[error("could not spawn queue thread: {0}")]
    Spawn(String),
}

pub struct SerialQueue<S> {
    name: String,
    jobs: mpsc::UnboundedSender<Job<S>>,
}

impl<S: 'static> SerialQueue<S> {
    /// Spawn the worker and build its state there with `init`
    pub fn spawn<F>(name: impl Into<String>, init: F) -> Result<Self, QueueError>
    where
        F: FnOnce() -> S + Send + 'static,
    {
        let name = name.into();
        let (jobs, mut receiver) = mpsc::unbounded_channel::<Job<S>>();

        let worker_name = name.clone();
        thread::Builder::new()
            .name(name.clone())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || {
                let mut state = init();
                debug!(queue = %worker_name, "serial queue started");
                while let Some(job) = receiver.blocking_recv() {
                    job(&mut state);
                }
                debug!(queue = %worker_name, "serial queue stopped");
            })
            .map_err(|err| QueueError::Spawn(err.to_string()))?;

        Ok(Self { name, jobs })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `job` on the worker and wait for its result.
    ///
    /// A panicking job is reported as [`QueueError::Panicked`]; the worker
    /// and its state survive.
    pub async fn run<T, F>(&self, job: F) -> Result<T, QueueError>
    where
        T: Send + 'static,
        F: FnOnce(&mut S) -> T + Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        let queue = self.name.clone();

        let boxed: Job<S> = Box::new(move |state: &mut S| {
            let result = catch_unwind(AssertUnwindSafe(|| job(state))).map_err(|payload| {
                let message = panic_message(payload.as_ref());
                warn!(queue = %queue, %message, "job panicked");
                QueueError::Panicked { queue, message }
            });
            // The caller may have stopped waiting
            let _ = reply.send(result);
        });

        self.jobs
            .send(boxed)
            .map_err(|_| QueueError::Closed(self.name.clone()))?;

        response
            .await
            .map_err(|_| QueueError::Closed(self.name.clone()))?
    }
}

impl<S> std::fmt::Debug for SerialQueue<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue").field("name", &self.name).finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_jobs_run_in_order_on_one_thread() {
        let queue = SerialQueue::spawn("test-order", Vec::<usize>::new).unwrap();

        // All sixteen jobs are queued before the first one finishes
        let results = futures::future::join_all((0..16).map(|i| {
            queue.run(move |log| {
                thread::sleep(Duration::from_millis(1));
                log.push(i);
                log.len()
            })
        }))
        .await;
        let positions: Vec<usize> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(positions, (1..=16).collect::<Vec<_>>());

        let log = queue.run(|log| log.clone()).await.unwrap();
        assert_eq!(log, (0..16).collect::<Vec<_>>());

        let thread_name = queue
            .run(|_| thread::current().name().map(str::to_string))
            .await
            .unwrap();
        assert_eq!(thread_name.as_deref(), Some("test-order"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_are_serialized() {
        let queue = Arc::new(SerialQueue::spawn("test-serial", || (false, 0usize)).unwrap());

        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move {
                    queue
                        .run(|(busy, count)| {
                            assert!(!*busy, "two jobs ran at once");
                            *busy = true;
                            thread::sleep(Duration::from_micros(200));
                            *count += 1;
                            *busy = false;
                            *count
                        })
                        .await
                })
            })
            .collect();

        let mut positions = Vec::new();
        for task in tasks {
            positions.push(task.await.unwrap().unwrap());
        }
        positions.sort_unstable();
        assert_eq!(positions, (1..=64).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_worker_stack_fits_deep_recursion() {
        fn descend(n: usize) -> usize {
            let frame = [n as u8; 1024];
            std::hint::black_box(&frame);
            if n == 0 {
                0
            } else {
                1 + descend(n - 1)
            }
        }

        let queue = SerialQueue::spawn("test-stack", || ()).unwrap();
        assert_eq!(queue.run(|_| descend(6_000)).await.unwrap(), 6_000);
    }

    #[tokio::test]
    async fn test_state_need_not_be_send() {
        let queue = SerialQueue::spawn("test-rc", || Rc::new(5)).unwrap();
        assert_eq!(queue.run(|rc| **rc + 1).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let queue = SerialQueue::spawn("test-panic", || 0u32).unwrap();
        let err = queue
            .run(|_: &mut u32| -> u32 { panic!("boom") })
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Panicked { ref message, .. } if message == "boom"));

        queue.run(|n| *n += 1).await.unwrap();
        assert_eq!(queue.run(|n| *n).await.unwrap(), 1);
    }
}
