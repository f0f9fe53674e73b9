use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event as CrosstermEvent, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::backend::{Backend, CrosstermBackend};
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::event::InputEvent;
use crate::ui::Frame;

pub fn init() -> io::Result<Screen> {
    execute!(io::stdout(), EnterAlternateScreen)?;
    enable_raw_mode()?;
    let mut backend = CrosstermBackend::new(io::stdout());
    backend.clear()?;
    backend.hide_cursor()?;
    Ok(Screen {
        backend,
        previous: None,
    })
}

pub fn restore() -> io::Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show)?;
    disable_raw_mode()
}

/// Terminal writer that only emits the cells that changed since the last frame.
pub struct Screen {
    backend: CrosstermBackend<Stdout>,
    previous: Option<Frame>,
}

impl Screen {
    pub fn size(&self) -> io::Result<(u16, u16)> {
        let size = self.backend.size()?;
        Ok((size.width, size.height))
    }

    /// Forget what is on screen and clear it; the next frame is drawn in full.
    pub fn invalidate(&mut self) -> io::Result<()> {
        self.previous = None;
        self.backend.clear()
    }

    pub fn present(&mut self, frame: Frame) -> io::Result<()> {
        {
            let updates = frame.diff(self.previous.as_ref());
            self.backend.draw(updates.into_iter())?;
        }

        if frame.cursor_visible() {
            self.backend.show_cursor()?;
        } else {
            self.backend.hide_cursor()?;
        }
        Backend::flush(&mut self.backend)?;

        self.previous = Some(frame);
        Ok(())
    }
}

/// Pumps terminal input and ticks into the event loop's action channel.
pub struct EventHandler {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration, tx: mpsc::UnboundedSender<Action>) -> Self {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut tick_interval = interval(tick_rate);

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = tick_interval.tick() => {
                        tx.send(Action::Tick).ok();
                    }
                    Some(Ok(evt)) = reader.next() => {
                        match evt {
                            CrosstermEvent::Key(key) if key.kind == event::KeyEventKind::Press => {
                                tx.send(Action::Input(InputEvent::from(key))).ok();
                            }
                            CrosstermEvent::Resize(..) => {
                                tx.send(Action::Resize).ok();
                            }
                            _ => {}
                        }
                    }
                }
            }
        });

        Self { cancel, task }
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.task.abort();
    }
}
