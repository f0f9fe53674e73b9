//! Refresh scheduling: a pure state machine ([`Scheduler`]) that decides when
//! to fetch, and a task driver ([`Refresher`]) that carries those decisions
//! out with tokio timers and background fetches.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::action::Action;
use crate::error::{ErrorKind, FetchError};
use crate::jira::BoardSource;

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);
pub const BACKOFF_INITIAL: Duration = Duration::from_secs(2);
pub const BACKOFF_MAX: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub interval: Duration,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            interval: REFRESH_INTERVAL,
            backoff_initial: BACKOFF_INITIAL,
            backoff_max: BACKOFF_MAX,
        }
    }
}

impl RefreshPolicy {
    /// Delay before retry number `attempt` (1-based): doubles each time, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_initial
            .saturating_mul(1 << exponent)
            .min(self.backoff_max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Fetching,
    Backoff,
}

/// What the driver should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Cancel any pending timer and start a fetch now.
    Fetch,
    /// Arm the timer; fetch when it fires.
    Wait(Duration),
    /// Cancel any pending timer and wait for a manual refresh.
    Hold,
    /// Leave everything as it is.
    Nothing,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    state: SchedulerState,
    policy: RefreshPolicy,
    attempt: u32,
}

impl Scheduler {
    pub fn new(policy: RefreshPolicy) -> Self {
        Self {
            state: SchedulerState::Idle,
            policy,
            attempt: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Consecutive retryable failures since the last success
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn start(&mut self) -> Directive {
        self.begin_fetch()
    }

    /// A user-requested refresh. Coalesced while a fetch is in flight.
    pub fn refresh_now(&mut self) -> Directive {
        self.begin_fetch()
    }

    /// The armed timer fired.
    pub fn timer_elapsed(&mut self) -> Directive {
        self.begin_fetch()
    }

    pub fn fetch_completed(&mut self, outcome: Result<(), &FetchError>) -> Directive {
        match outcome {
            Ok(()) => {
                self.state = SchedulerState::Idle;
                self.attempt = 0;
                Directive::Wait(self.policy.interval)
            }
            Err(err) if err.kind.is_retryable() => {
                self.state = SchedulerState::Backoff;
                self.attempt = self.attempt.saturating_add(1);
                Directive::Wait(self.policy.backoff(self.attempt))
            }
            Err(_) => {
                self.state = SchedulerState::Idle;
                self.attempt = 0;
                Directive::Hold
            }
        }
    }

    fn begin_fetch(&mut self) -> Directive {
        if self.state == SchedulerState::Fetching {
            return Directive::Nothing;
        }
        self.state = SchedulerState::Fetching;
        Directive::Fetch
    }
}

/// Owns the background fetch and timer tasks. Results come back to the event
/// loop as [`Action`]s tagged with an id so late deliveries can be told apart.
#[derive(Debug)]
pub struct Refresher {
    source: Arc<dyn BoardSource>,
    board_id: String,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
    next_id: u64,
    in_flight: Option<(u64, JoinHandle<()>)>,
    timer: Option<(u64, JoinHandle<()>)>,
}

impl Refresher {
    pub fn new(
        source: Arc<dyn BoardSource>,
        board_id: String,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            source,
            board_id,
            action_tx,
            cancel: CancellationToken::new(),
            next_id: 0,
            in_flight: None,
            timer: None,
        }
    }

    pub fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Fetch => {
                self.cancel_timer();
                self.spawn_fetch();
            }
            Directive::Wait(delay) => self.arm_timer(delay),
            Directive::Hold => self.cancel_timer(),
            Directive::Nothing => {}
        }
    }

    /// Claim a finished fetch. Returns false for results of fetches that are
    /// no longer current.
    pub fn take_fetch(&mut self, fetch_id: u64) -> bool {
        match &self.in_flight {
            Some((id, _)) if *id == fetch_id => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Claim a timer expiry. Returns false for timers that were re-armed or cancelled.
    pub fn take_timer(&mut self, timer_id: u64) -> bool {
        match &self.timer {
            Some((id, _)) if *id == timer_id => {
                self.timer = None;
                true
            }
            _ => false,
        }
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Cancel every task. Anything they would have delivered is dropped.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.cancel_timer();
        if let Some((id, task)) = self.in_flight.take() {
            debug!(fetch_id = id, "cancelling in-flight board fetch");
            task.abort();
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn spawn_fetch(&mut self) {
        let fetch_id = self.next_id();
        let tx = self.action_tx.clone();
        let source = Arc::clone(&self.source);
        let board_id = self.board_id.clone();
        let cancel = self.cancel.clone();

        debug!(fetch_id, board_id = %self.board_id, "starting board fetch");
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = source.fetch_board(&board_id) => {
                    match &result {
                        Ok(board) => info!(fetch_id, issues = board.issue_count(), "board fetched"),
                        Err(err) if err.kind.is_fatal() => error!(fetch_id, %err, "board fetch failed"),
                        Err(err) if err.kind == ErrorKind::Unexpected => {
                            error!(fetch_id, %err, "board fetch returned an unexpected response")
                        }
                        Err(err) => warn!(fetch_id, %err, "board fetch failed, will retry"),
                    }
                    tx.send(Action::BoardFetched { fetch_id, result: Box::new(result) }).ok();
                }
            }
        });

        if let Some((_, previous)) = self.in_flight.replace((fetch_id, task)) {
            previous.abort();
        }
    }

    fn arm_timer(&mut self, delay: Duration) {
        self.cancel_timer();
        let timer_id = self.next_id();
        let tx = self.action_tx.clone();
        let cancel = self.cancel.clone();

        debug!(timer_id, ?delay, "arming refresh timer");
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    tx.send(Action::TimerElapsed(timer_id)).ok();
                }
            }
        });
        self.timer = Some((timer_id, task));
    }

    fn cancel_timer(&mut self) {
        if let Some((_, task)) = self.timer.take() {
            task.abort();
        }
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
