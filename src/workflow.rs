//! Worker-pool scheduler.
//!
//! A [`Workflow`] decouples submitting work from executing it: items go
//! into a bounded input queue, a fixed pool of workers drains it, and
//! completed items come back out of a bounded output queue in whatever
//! order they finish. The scheduler knows nothing about probing; it runs
//! any [`WorkItem`].
//!
//! Pacing is per worker: each worker owns its own recurring timer, so with
//! `W` workers the aggregate start rate approaches `W x max_rate`. The rate
//! knob means "starts per second per worker", not a pool-wide budget.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, trace};

use crate::error::WorkflowError;

/// A unit of schedulable work.
///
/// Items carry their own identity and result slot; the only thing the
/// scheduler asks of them is to run and then report themselves, completed,
/// onto the output sink they are handed. Items move across the queue
/// boundary, so consumers correlate completions by identity, not by
/// position or shared memory.
#[async_trait]
pub trait WorkItem: Send + Sized + 'static {
    /// Run the item's body, then hand the completed item to `output`.
    async fn execute(self, output: &mpsc::Sender<Self>);
}

/// Final counters reported when a workflow is destroyed.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowStats {
    /// Items executed to completion.
    pub completed: usize,
    /// Items that started without waiting on their worker's pacing timer.
    pub unthrottled: usize,
}

/// A bounded worker pool with input and output queues of equal capacity.
///
/// Capacity is a caller contract: it must cover every item that will ever
/// be outstanding, because `enqueue` applies backpressure rather than
/// erroring once the input queue is full. Not reusable after `destroy`.
pub struct Workflow<T: WorkItem> {
    input_tx: mpsc::Sender<T>,
    output_rx: mpsc::Receiver<T>,
    capacity: usize,
    drained: usize,
    completed: Arc<AtomicUsize>,
    unthrottled: Arc<AtomicUsize>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: WorkItem> Workflow<T> {
    /// Create a workflow and start its workers immediately.
    ///
    /// `max_rate` of 0 disables pacing; otherwise each worker starts at
    /// most `max_rate` items per second.
    pub fn new(capacity: usize, workers: usize, max_rate: u32) -> Result<Self, WorkflowError> {
        if capacity == 0 {
            return Err(WorkflowError::ZeroCapacity);
        }
        if workers == 0 {
            return Err(WorkflowError::ZeroWorkers);
        }

        let pace = (max_rate > 0).then(|| Duration::from_secs(1) / max_rate);
        let (input_tx, input_rx) = mpsc::channel(capacity);
        let (output_tx, output_rx) = mpsc::channel(capacity);
        let input_rx = Arc::new(Mutex::new(input_rx));
        let completed = Arc::new(AtomicUsize::new(0));
        let unthrottled = Arc::new(AtomicUsize::new(0));

        let workers = (0..workers)
            .map(|worker| {
                tokio::spawn(worker_loop(
                    worker,
                    Arc::clone(&input_rx),
                    output_tx.clone(),
                    pace,
                    Arc::clone(&completed),
                    Arc::clone(&unthrottled),
                ))
            })
            .collect();

        Ok(Self {
            input_tx,
            output_rx,
            capacity,
            drained: 0,
            completed,
            unthrottled,
            workers,
        })
    }

    /// Submit an item, suspending while the input queue is at capacity.
    pub async fn enqueue(&self, item: T) {
        self.input_tx
            .send(item)
            .await
            .unwrap_or_else(|_| panic!("workflow input queue closed while accepting work"));
    }

    /// Retrieve the next completed item, in completion order.
    ///
    /// Suspends while the output queue is empty; returns `None` once the
    /// workflow has shut down and the queue is drained.
    pub async fn dequeue(&mut self) -> Option<T> {
        let item = self.output_rx.recv().await;
        if item.is_some() {
            self.drained += 1;
        }
        item
    }

    /// Suspend until every item the workflow was sized for has completed,
    /// dequeuing and discarding anything not already retrieved.
    pub async fn wait(&mut self) {
        while self.drained < self.capacity {
            if self.dequeue().await.is_none() {
                return;
            }
        }
    }

    /// Shut down: close the input queue, let the workers drain it and
    /// exit, and report the final counters.
    ///
    /// A worker that panicked executing an item resurfaces that failure
    /// here. Callers must not race `enqueue`/`dequeue` with destruction;
    /// consuming `self` enforces that for a single owner.
    pub async fn destroy(mut self) -> WorkflowStats {
        drop(self.input_tx);
        for worker in self.workers.drain(..) {
            worker.await.expect("workflow worker panicked");
        }
        self.output_rx.close();

        let stats = WorkflowStats {
            completed: self.completed.load(Ordering::Acquire),
            unthrottled: self.unthrottled.load(Ordering::Acquire),
        };
        info!(
            completed = stats.completed,
            unthrottled = stats.unthrottled,
            "workflow destroyed"
        );
        stats
    }
}

/// One worker: pace, pull, execute, count, until the input closes.
async fn worker_loop<T: WorkItem>(
    worker: usize,
    input: Arc<Mutex<mpsc::Receiver<T>>>,
    output: mpsc::Sender<T>,
    pace: Option<Duration>,
    completed: Arc<AtomicUsize>,
    unthrottled: Arc<AtomicUsize>,
) {
    let mut timer = pace.map(|period| {
        let mut timer = time::interval_at(time::Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        timer
    });

    loop {
        // A tick that already elapsed means this start was not throttled.
        let throttled = match timer.as_mut() {
            Some(timer) => match timer.tick().now_or_never() {
                Some(_) => false,
                None => {
                    timer.tick().await;
                    true
                }
            },
            None => false,
        };

        let Some(item) = input.lock().await.recv().await else {
            trace!(worker, "input queue closed, exiting");
            return;
        };

        item.execute(&output).await;

        completed.fetch_add(1, Ordering::AcqRel);
        if !throttled {
            unthrottled.fetch_add(1, Ordering::AcqRel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    struct SquareJob {
        id: usize,
        input: u64,
        result: Option<u64>,
    }

    impl SquareJob {
        fn new(id: usize) -> Self {
            Self {
                id,
                input: id as u64 + 1,
                result: None,
            }
        }
    }

    #[async_trait]
    impl WorkItem for SquareJob {
        async fn execute(mut self, output: &mpsc::Sender<Self>) {
            self.result = Some(self.input * self.input);
            let _ = output.send(self).await;
        }
    }

    #[tokio::test]
    async fn zero_workers_is_rejected_eagerly() {
        let err = Workflow::<SquareJob>::new(4, 0, 0).err().unwrap();
        assert_eq!(err, WorkflowError::ZeroWorkers);
    }

    #[tokio::test]
    async fn zero_capacity_is_rejected_eagerly() {
        let err = Workflow::<SquareJob>::new(0, 1, 0).err().unwrap();
        assert_eq!(err, WorkflowError::ZeroCapacity);
    }

    #[tokio::test]
    async fn single_worker_completes_everything_in_submission_order() {
        let mut workflow = Workflow::new(8, 1, 0).unwrap();
        for id in 0..8 {
            workflow.enqueue(SquareJob::new(id)).await;
        }

        let mut order = Vec::new();
        for _ in 0..8 {
            let job = workflow.dequeue().await.expect("output closed early");
            assert_eq!(job.result, Some(job.input * job.input));
            order.push(job.id);
        }
        assert_eq!(order, (0..8).collect::<Vec<_>>());

        let stats = workflow.destroy().await;
        assert_eq!(stats.completed, 8);
        assert_eq!(stats.unthrottled, 8);
    }

    #[tokio::test]
    async fn worker_pool_completes_every_item() {
        let mut workflow = Workflow::new(32, 4, 0).unwrap();
        for id in 0..32 {
            workflow.enqueue(SquareJob::new(id)).await;
        }

        // Completion order is not defined across a pool, so assert set
        // equality only.
        let mut seen = BTreeSet::new();
        for _ in 0..32 {
            let job = workflow.dequeue().await.expect("output closed early");
            assert!(job.result.is_some());
            seen.insert(job.id);
        }
        assert_eq!(seen, (0..32).collect::<BTreeSet<_>>());

        let stats = workflow.destroy().await;
        assert_eq!(stats.completed, 32);
    }

    #[tokio::test]
    async fn wait_drains_to_capacity() {
        let mut workflow = Workflow::new(16, 3, 0).unwrap();
        for id in 0..16 {
            workflow.enqueue(SquareJob::new(id)).await;
        }

        workflow.wait().await;

        let stats = workflow.destroy().await;
        assert_eq!(stats.completed, 16);
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_bounds_the_drain_rate() {
        let started = time::Instant::now();

        // One worker at 2 items/second: four items cannot drain in under
        // (4 - 1) / 2 = 1.5 seconds.
        let mut workflow = Workflow::new(4, 1, 2).unwrap();
        for id in 0..4 {
            workflow.enqueue(SquareJob::new(id)).await;
        }
        workflow.wait().await;

        assert!(started.elapsed() >= Duration::from_millis(1500));

        let stats = workflow.destroy().await;
        assert_eq!(stats.completed, 4);
    }
}
