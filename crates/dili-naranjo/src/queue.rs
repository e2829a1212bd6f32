//! Serial request queue in front of a [`ReasoningService`].
//!
//! Requests run one at a time in submission order on a dedicated thread,
//! with a pause between them. Queued requests can be cancelled; a running
//! request cannot.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::assessment::NaranjoAssessment;
use crate::context::NaranjoContext;
use crate::parse::parse_reasoning;
use crate::service::{ReasoningService, ServiceError};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueOptions {
    /// How long [`PendingReasoning::wait`] blocks before giving up.
    pub request_timeout: Duration,
    pub health_timeout: Duration,
    /// Pause after each request before the next one starts.
    pub request_delay: Duration,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }
}

impl QueueOptions {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }
}

pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    /// `position` is 1-based among requests still waiting.
    Queued { id: RequestId, position: usize },
    Started { id: RequestId },
    Completed { id: RequestId },
    Failed { id: RequestId, error: String },
    Cancelled { id: RequestId },
}

#[derive(Debug)]
pub enum ReasoningOutcome {
    Completed {
        assessment: NaranjoAssessment,
        raw: String,
    },
    Failed(ServiceError),
    Cancelled,
    TimedOut,
}

struct Job {
    id: RequestId,
    context: NaranjoContext,
    reply: Sender<ReasoningOutcome>,
}

#[derive(Default)]
struct QueueState {
    jobs: VecDeque<Job>,
    next_id: RequestId,
    shutdown: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    ready: Condvar,
    events: Sender<QueueEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: QueueEvent) {
        // nobody listening is fine
        let _ = self.events.send(event);
    }
}

/// Reply handle for one submitted request.
#[derive(Debug)]
pub struct PendingReasoning {
    id: RequestId,
    reply: Receiver<ReasoningOutcome>,
    deadline: Instant,
}

impl PendingReasoning {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Blocks until the request finishes, is cancelled, or the timeout
    /// elapses. The timeout counts from submission, so time spent queued
    /// behind other requests is included.
    pub fn wait(self) -> ReasoningOutcome {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        match self.reply.recv_timeout(remaining) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                warn!(id = self.id, "reasoning request timed out");
                ReasoningOutcome::TimedOut
            }
            Err(RecvTimeoutError::Disconnected) => {
                ReasoningOutcome::Failed(ServiceError::Disconnected)
            }
        }
    }
}

pub struct ReasoningQueue<S: ReasoningService> {
    service: Arc<S>,
    shared: Arc<Shared>,
    events: Receiver<QueueEvent>,
    options: QueueOptions,
    handle: Option<JoinHandle<()>>,
}

impl<S: ReasoningService> ReasoningQueue<S> {
    pub fn spawn(service: S, options: QueueOptions) -> Self {
        let service = Arc::new(service);
        let (event_tx, event_rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState::default()),
            ready: Condvar::new(),
            events: event_tx,
        });

        let handle = {
            let service = Arc::clone(&service);
            let shared = Arc::clone(&shared);
            thread::spawn(move || run(service.as_ref(), &shared, options.request_delay))
        };

        Self {
            service,
            shared,
            events: event_rx,
            options,
            handle: Some(handle),
        }
    }

    /// Queues a request behind any already waiting.
    pub fn submit(&self, context: NaranjoContext) -> PendingReasoning {
        let deadline = Instant::now() + self.options.request_timeout;
        let (reply_tx, reply_rx) = mpsc::channel();
        let (id, position) = {
            let mut state = self.shared.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.jobs.push_back(Job {
                id,
                context,
                reply: reply_tx,
            });
            (id, state.jobs.len())
        };
        self.shared.ready.notify_one();
        self.shared.emit(QueueEvent::Queued { id, position });
        debug!(id, position, "reasoning request queued");

        PendingReasoning {
            id,
            reply: reply_rx,
            deadline,
        }
    }

    /// Removes a request that has not started yet. Returns false when the
    /// request is running, finished, or unknown.
    pub fn cancel(&self, id: RequestId) -> bool {
        let job = {
            let mut state = self.shared.lock();
            let Some(index) = state.jobs.iter().position(|job| job.id == id) else {
                return false;
            };
            state.jobs.remove(index)
        };
        let Some(job) = job else {
            return false;
        };
        let _ = job.reply.send(ReasoningOutcome::Cancelled);
        self.shared.emit(QueueEvent::Cancelled { id });
        debug!(id, "reasoning request cancelled");
        true
    }

    /// Requests waiting to start.
    pub fn queued(&self) -> usize {
        self.shared.lock().jobs.len()
    }

    pub fn events(&self) -> &Receiver<QueueEvent> {
        &self.events
    }

    /// Asks the service whether it is reachable. A check that outlives the
    /// health timeout counts as unavailable.
    pub fn check_health(&self) -> bool {
        let (tx, rx) = mpsc::channel();
        let service = Arc::clone(&self.service);
        thread::spawn(move || {
            let _ = tx.send(service.check_health());
        });
        match rx.recv_timeout(self.options.health_timeout) {
            Ok(healthy) => healthy,
            Err(_) => {
                warn!("reasoning service health check timed out");
                false
            }
        }
    }

    /// Cancels everything still queued and waits for the running request.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let drained: Vec<Job> = {
            let mut state = self.shared.lock();
            state.shutdown = true;
            state.jobs.drain(..).collect()
        };
        self.shared.ready.notify_all();
        for job in drained {
            let _ = job.reply.send(ReasoningOutcome::Cancelled);
            self.shared.emit(QueueEvent::Cancelled { id: job.id });
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl<S: ReasoningService> Drop for ReasoningQueue<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<S: ReasoningService>(service: &S, shared: &Shared, delay: Duration) {
    loop {
        let job = {
            let mut state = shared.lock();
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(job) = state.jobs.pop_front() {
                    break job;
                }
                state = shared
                    .ready
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        shared.emit(QueueEvent::Started { id: job.id });
        info!(id = job.id, "reasoning request started");
        let outcome = match service.reason(&job.context) {
            Ok(raw) if raw.trim().is_empty() => {
                ReasoningOutcome::Failed(ServiceError::EmptyResponse)
            }
            Ok(raw) => {
                let parsed = parse_reasoning(&raw);
                ReasoningOutcome::Completed {
                    assessment: NaranjoAssessment::merge(&parsed),
                    raw,
                }
            }
            Err(error) => ReasoningOutcome::Failed(error),
        };
        match &outcome {
            ReasoningOutcome::Failed(error) => {
                warn!(id = job.id, %error, "reasoning request failed");
                shared.emit(QueueEvent::Failed {
                    id: job.id,
                    error: error.to_string(),
                });
            }
            _ => shared.emit(QueueEvent::Completed { id: job.id }),
        }
        // the caller may have stopped waiting
        let _ = job.reply.send(outcome);

        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const REPLY: &str = r#"{"answers":[
        {"question":3,"answer":"No","reasoning":"grade unchanged","confidence":"Medium"},
        {"question":4,"answer":"Unknown","reasoning":"no rechallenge","confidence":"Low"},
        {"question":5,"answer":"No","reasoning":"no toxic drugs","confidence":"High"}
    ]}"#;

    struct Scripted {
        calls: AtomicUsize,
        delay: Duration,
        healthy: bool,
    }

    impl Scripted {
        fn new(delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                healthy: true,
            }
        }
    }

    impl ReasoningService for Scripted {
        fn check_health(&self) -> bool {
            thread::sleep(self.delay);
            self.healthy
        }

        fn reason(&self, context: &NaranjoContext) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            if context.total_days < 0 {
                return Err(ServiceError::Request {
                    message: "bad context".to_string(),
                });
            }
            Ok(REPLY.to_string())
        }
    }

    fn fast_options() -> QueueOptions {
        QueueOptions::default()
            .with_request_delay(Duration::ZERO)
            .with_request_timeout(Duration::from_secs(5))
            .with_health_timeout(Duration::from_secs(5))
    }

    fn context(total_days: i64) -> NaranjoContext {
        NaranjoContext {
            total_days,
            ..NaranjoContext::default()
        }
    }

    #[test]
    fn completes_with_merged_assessment() {
        let queue = ReasoningQueue::spawn(Scripted::new(Duration::ZERO), fast_options());
        let ReasoningOutcome::Completed { assessment, .. } = queue.submit(context(10)).wait()
        else {
            panic!("expected completion");
        };
        // 4 fixed + 0 + 0 + 2
        assert_eq!(assessment.score, 6);
        assert!(assessment.is_complete());
    }

    #[test]
    fn service_errors_are_reported() {
        let queue = ReasoningQueue::spawn(Scripted::new(Duration::ZERO), fast_options());
        let outcome = queue.submit(context(-1)).wait();
        assert!(matches!(
            outcome,
            ReasoningOutcome::Failed(ServiceError::Request { .. })
        ));
    }

    #[test]
    fn wait_times_out_without_error() {
        let options = fast_options().with_request_timeout(Duration::from_millis(20));
        let queue = ReasoningQueue::spawn(Scripted::new(Duration::from_millis(300)), options);
        assert!(matches!(
            queue.submit(context(1)).wait(),
            ReasoningOutcome::TimedOut
        ));
    }

    #[test]
    fn timeout_counts_from_submission() {
        let options = fast_options().with_request_timeout(Duration::from_millis(300));
        let queue = ReasoningQueue::spawn(Scripted::new(Duration::from_millis(200)), options);
        let first = queue.submit(context(1));
        let second = queue.submit(context(2));

        assert!(matches!(first.wait(), ReasoningOutcome::Completed { .. }));
        // queued for ~200ms, then needs another ~200ms to run
        assert!(matches!(second.wait(), ReasoningOutcome::TimedOut));
    }

    #[test]
    fn only_queued_requests_can_be_cancelled() {
        let queue = ReasoningQueue::spawn(Scripted::new(Duration::from_millis(200)), fast_options());
        let first = queue.submit(context(1));
        // wait until the worker has picked up the first request
        loop {
            match queue.events().recv_timeout(Duration::from_secs(5)) {
                Ok(QueueEvent::Started { id }) if id == first.id() => break,
                Ok(_) => continue,
                Err(_) => panic!("request never started"),
            }
        }
        let second = queue.submit(context(2));

        assert!(!queue.cancel(first.id()));
        assert!(queue.cancel(second.id()));
        assert!(!queue.cancel(second.id()));
        assert!(matches!(second.wait(), ReasoningOutcome::Cancelled));
        assert!(matches!(first.wait(), ReasoningOutcome::Completed { .. }));
    }

    #[test]
    fn requests_run_in_submission_order() {
        let queue = ReasoningQueue::spawn(Scripted::new(Duration::from_millis(5)), fast_options());
        let pending: Vec<_> = (0..3).map(|days| queue.submit(context(days))).collect();
        let ids: Vec<_> = pending.iter().map(PendingReasoning::id).collect();
        for request in pending {
            assert!(matches!(request.wait(), ReasoningOutcome::Completed { .. }));
        }

        let started: Vec<RequestId> = queue
            .events()
            .try_iter()
            .filter_map(|event| match event {
                QueueEvent::Started { id } => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(started, ids);
    }

    #[test]
    fn slow_health_check_counts_as_down() {
        let options = fast_options().with_health_timeout(Duration::from_millis(20));
        let queue = ReasoningQueue::spawn(Scripted::new(Duration::from_millis(300)), options);
        assert!(!queue.check_health());

        let queue = ReasoningQueue::spawn(Scripted::new(Duration::ZERO), fast_options());
        assert!(queue.check_health());
    }
}
