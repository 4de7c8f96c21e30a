use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain_batch::{
    exception::{BatchException, BatchResult},
    model::{
        entity::TaskState,
        vo::{CompletionEvent, FailurePolicy, PollPolicy, WaitOutcome, WaitRequest},
    },
    service::{CompletionMonitorService, ComputeService},
};
use futures::stream::{self, BoxStream, StreamExt};
use rand::Rng;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Stand-in deadline for timeouts too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(typed_builder::TypedBuilder)]
pub struct CompletionMonitorServiceImpl {
    compute: Arc<dyn ComputeService>,
    #[builder(default)]
    poll_policy: PollPolicy,
    #[builder(default)]
    failure_policy: FailurePolicy,
}

#[async_trait]
impl CompletionMonitorService for CompletionMonitorServiceImpl {
    async fn wait_all(
        &self,
        request: WaitRequest,
        cancel: CancellationToken,
    ) -> BatchResult<WaitOutcome> {
        info!(
            "Monitoring all tasks for '{}' state, timeout in {:?}...",
            request.target, request.timeout
        );
        let target = request.target;
        let started = Instant::now();
        let mut events = self.completion_events(request, cancel);
        let mut completed = vec![];
        while let Some(event) = events.next().await {
            completed.push(event?.task_id);
        }
        info!("All tasks reached state {target}.");
        Ok(WaitOutcome {
            completed,
            elapsed: started.elapsed(),
        })
    }

    fn completion_events(
        &self,
        request: WaitRequest,
        cancel: CancellationToken,
    ) -> BoxStream<'static, BatchResult<CompletionEvent>> {
        let watch = TaskWatch::new(
            self.compute.clone(),
            request,
            self.poll_policy.clone(),
            self.failure_policy,
            cancel,
        );
        stream::unfold(watch, |mut watch| async move {
            watch.next_event().await.map(|item| (item, watch))
        })
        .boxed()
    }
}

/// Polling state behind one completion stream.
struct TaskWatch {
    compute: Arc<dyn ComputeService>,
    job_id: String,
    target: TaskState,
    timeout: Duration,
    deadline: Instant,
    /// Submission order, used for error messages.
    order: Vec<String>,
    pending: HashSet<String>,
    ready: VecDeque<CompletionEvent>,
    delay: Duration,
    poll_policy: PollPolicy,
    failure_policy: FailurePolicy,
    cancel: CancellationToken,
    polled: bool,
    finished: bool,
    /// Ends the stream once the events found before it are handed out.
    failure: Option<BatchException>,
}

impl TaskWatch {
    fn new(
        compute: Arc<dyn ComputeService>,
        request: WaitRequest,
        poll_policy: PollPolicy,
        failure_policy: FailurePolicy,
        cancel: CancellationToken,
    ) -> Self {
        let mut order = request.task_ids;
        let mut seen = HashSet::new();
        order.retain(|id| seen.insert(id.clone()));
        Self {
            compute,
            job_id: request.job_id,
            target: request.target,
            timeout: request.timeout,
            deadline: deadline_after(request.timeout),
            pending: seen,
            order,
            ready: VecDeque::new(),
            delay: poll_policy.initial_delay,
            poll_policy,
            failure_policy,
            cancel,
            polled: false,
            finished: false,
            failure: None,
        }
    }

    async fn next_event(&mut self) -> Option<BatchResult<CompletionEvent>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return self.failure.take().map(Err);
            }
            if self.pending.is_empty() {
                self.finished = true;
                return None;
            }
            if let Err(e) = self.step().await {
                self.finished = true;
                self.failure = Some(e);
            }
        }
    }

    /// Sleeps unless this is the first poll, then polls once. A sleep cut short by the
    /// deadline still ends in a poll, so tasks finishing after the last regular poll count.
    async fn step(&mut self) -> BatchResult<()> {
        if self.cancel.is_cancelled() {
            return Err(self.cancelled());
        }
        if self.polled {
            if Instant::now() >= self.deadline {
                return Err(self.timed_out());
            }
            self.pause().await?;
        }
        self.polled = true;
        self.poll().await
    }

    async fn pause(&mut self) -> BatchResult<()> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        let nap = self.jittered(self.delay).min(remaining);
        self.delay = self.poll_policy.next_delay(self.delay);

        let cancel = self.cancel.clone();
        let cancelled = tokio::select! {
            biased;
            _ = cancel.cancelled() => true,
            _ = sleep(nap) => false,
        };
        if cancelled {
            return Err(self.cancelled());
        }
        Ok(())
    }

    async fn poll(&mut self) -> BatchResult<()> {
        let tasks = self.compute.list_tasks(&self.job_id).await?;
        for task in tasks {
            if !self.pending.contains(&task.id) {
                continue;
            }
            if task.state == self.target {
                let node_id = task.node_id().map(str::to_owned);
                self.pending.remove(&task.id);
                self.ready.push_back(CompletionEvent {
                    task_id: task.id,
                    state: task.state,
                    node_id,
                });
            } else if task.state.is_terminal()
                && self.failure_policy == FailurePolicy::ShortCircuit
            {
                warn!(
                    job_id = %self.job_id,
                    task_id = %task.id,
                    "Task ended in state {} while waiting for {}",
                    task.state,
                    self.target
                );
                return Err(BatchException::TaskFailed {
                    job_id: self.job_id.clone(),
                    task_id: task.id,
                    state: task.state,
                    target: self.target,
                });
            }
        }
        debug!(
            job_id = %self.job_id,
            pending = self.pending.len(),
            ready = self.ready.len(),
            "Polled task states"
        );
        Ok(())
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if !self.poll_policy.jitter {
            return delay;
        }
        let factor = rand::thread_rng().gen_range(0.5..1.5);
        Duration::from_secs_f64(delay.as_secs_f64() * factor)
    }

    fn timed_out(&self) -> BatchException {
        let pending: Vec<String> = self
            .order
            .iter()
            .filter(|id| self.pending.contains(*id))
            .cloned()
            .collect();
        warn!(
            job_id = %self.job_id,
            pending = pending.len(),
            "Timed out after {:?} waiting for state {}",
            self.timeout,
            self.target
        );
        BatchException::MonitorTimeout {
            job_id: self.job_id.clone(),
            target: self.target,
            timeout: self.timeout,
            pending,
        }
    }

    fn cancelled(&self) -> BatchException {
        BatchException::Cancelled {
            job_id: self.job_id.clone(),
        }
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}
