use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::action::{route, Action, Command};
use crate::board::{apply_refresh, move_cursor};
use crate::config::Config;
use crate::error::FetchError;
use crate::jira::{BoardSource, Jira};
use crate::scheduler::{Directive, RefreshPolicy, Refresher, Scheduler, SchedulerState};
use crate::tui::{self, EventHandler, Screen};
use crate::types::{BoardSnapshot, RefreshResult};
use crate::ui;

/// Keeps the data-age label current between refreshes.
const TICK_RATE: Duration = Duration::from_secs(1);

/// How the displayed data relates to the server right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus<'a> {
    /// First fetch still running
    Loading,
    Fresh,
    Refreshing,
    Retrying {
        at: DateTime<Utc>,
        attempt: u32,
        error: &'a FetchError,
    },
    /// Fatal error, waiting for a manual refresh
    Failed(&'a FetchError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::SUCCESS,
            ExitStatus::Failure => ExitCode::FAILURE,
        }
    }
}

pub struct App {
    board_id: String,
    board: Option<BoardSnapshot>,
    failure: Option<FetchError>,
    retry_at: Option<DateTime<Utc>>,
    pub should_quit: bool,
    scheduler: Scheduler,
    refresher: Refresher,
}

impl App {
    pub fn new(
        source: Arc<dyn BoardSource>,
        board_id: String,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self::with_policy(source, board_id, action_tx, RefreshPolicy::default())
    }

    pub fn with_policy(
        source: Arc<dyn BoardSource>,
        board_id: String,
        action_tx: mpsc::UnboundedSender<Action>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            refresher: Refresher::new(source, board_id.clone(), action_tx),
            board_id,
            board: None,
            failure: None,
            retry_at: None,
            should_quit: false,
            scheduler: Scheduler::new(policy),
        }
    }

    /// Kick off the first fetch.
    pub fn start(&mut self) {
        let directive = self.scheduler.start();
        self.refresher.apply(directive);
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    /// The last successfully fetched board, with the current cursor
    pub fn board(&self) -> Option<&BoardSnapshot> {
        self.board.as_ref()
    }

    /// The error to show instead of the board, if any
    pub fn fatal_error(&self) -> Option<&FetchError> {
        self.failure.as_ref().filter(|err| err.kind.is_fatal())
    }

    pub fn is_fetching(&self) -> bool {
        self.scheduler.state() == SchedulerState::Fetching
    }

    pub fn sync_status(&self) -> SyncStatus<'_> {
        match (self.scheduler.state(), &self.failure, self.retry_at) {
            (SchedulerState::Fetching, None, _) if self.board.is_none() => SyncStatus::Loading,
            (SchedulerState::Fetching, _, _) => SyncStatus::Refreshing,
            (SchedulerState::Backoff, Some(error), Some(at)) => SyncStatus::Retrying {
                at,
                attempt: self.scheduler.attempt(),
                error,
            },
            (_, Some(error), _) => SyncStatus::Failed(error),
            (_, None, _) if self.board.is_none() => SyncStatus::Loading,
            _ => SyncStatus::Fresh,
        }
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.board.is_none() && self.fatal_error().is_some() {
            ExitStatus::Failure
        } else {
            ExitStatus::Success
        }
    }

    pub fn update(&mut self, action: Action) {
        match action {
            Action::Input(event) => self.handle_command(route(event)),
            Action::TimerElapsed(timer_id) => {
                if self.refresher.take_timer(timer_id) {
                    let directive = self.scheduler.timer_elapsed();
                    self.refresher.apply(directive);
                } else {
                    debug!(timer_id, "ignoring stale refresh timer");
                }
            }
            Action::BoardFetched { fetch_id, result } => {
                if self.refresher.take_fetch(fetch_id) {
                    self.fetch_completed(*result);
                } else {
                    debug!(fetch_id, "discarding result of superseded fetch");
                }
            }
            Action::Tick | Action::Resize => {}
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Navigate(direction) => {
                if let Some(board) = &self.board {
                    self.board = Some(move_cursor(board, direction));
                }
            }
            Command::RefreshNow => {
                let directive = self.scheduler.refresh_now();
                if directive == Directive::Nothing {
                    debug!("refresh already in flight");
                }
                self.refresher.apply(directive);
            }
            Command::Quit => {
                self.should_quit = true;
                self.refresher.shutdown();
            }
            Command::Ignore => {}
        }
    }

    fn fetch_completed(&mut self, result: RefreshResult) {
        let directive = match result {
            Ok(snapshot) => {
                self.board = Some(match self.board.take() {
                    Some(old) => apply_refresh(&old, snapshot),
                    None => snapshot,
                });
                self.failure = None;
                self.retry_at = None;
                self.scheduler.fetch_completed(Ok(()))
            }
            Err(err) => {
                let directive = self.scheduler.fetch_completed(Err(&err));
                self.retry_at = match directive {
                    Directive::Wait(delay) if self.scheduler.state() == SchedulerState::Backoff => {
                        let delay = chrono::Duration::from_std(delay)
                            .unwrap_or_else(|_| chrono::Duration::zero());
                        Some(Utc::now() + delay)
                    }
                    _ => None,
                };
                self.failure = Some(err);
                directive
            }
        };
        self.refresher.apply(directive);
    }
}

/// Run the board until the user quits.
pub async fn run(config: Config) -> ExitStatus {
    info!(host = %config.host, board_id = %config.board_id, "starting");

    let jira = match Jira::new(config.host, config.user, config.token) {
        Ok(jira) => jira,
        Err(err) => {
            error!(%err, "failed to build HTTP client");
            eprintln!("canoa: {err}");
            return ExitStatus::Failure;
        }
    };

    let mut screen = match tui::init() {
        Ok(screen) => screen,
        Err(err) => {
            let _ = tui::restore();
            error!(%err, "failed to set up terminal");
            eprintln!("canoa: {err}");
            return ExitStatus::Failure;
        }
    };

    let result = event_loop(&mut screen, Arc::new(jira), config.board_id).await;

    if let Err(err) = tui::restore() {
        error!(%err, "failed to restore terminal");
        return ExitStatus::Failure;
    }

    match result {
        Ok(status) => {
            info!(?status, "exiting");
            status
        }
        Err(err) => {
            error!(%err, "terminal error");
            eprintln!("canoa: {err}");
            ExitStatus::Failure
        }
    }
}

async fn event_loop(
    screen: &mut Screen,
    source: Arc<dyn BoardSource>,
    board_id: String,
) -> io::Result<ExitStatus> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let mut app = App::new(source, board_id, action_tx.clone());
    let _events = EventHandler::new(TICK_RATE, action_tx);

    app.start();
    draw(screen, &app)?;

    while let Some(action) = action_rx.recv().await {
        if matches!(action, Action::Resize) {
            screen.invalidate()?;
        }

        app.update(action);
        if app.should_quit {
            break;
        }

        draw(screen, &app)?;
    }

    Ok(app.exit_status())
}

fn draw(screen: &mut Screen, app: &App) -> io::Result<()> {
    let (width, height) = screen.size()?;
    screen.present(ui::render(app, Utc::now(), width, height))
}
