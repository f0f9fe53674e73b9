use crate::board::Direction;
use crate::event::InputEvent;
use crate::types::RefreshResult;

/// Messages consumed by the event loop, one at a time, in arrival order.
#[derive(Debug)]
pub enum Action {
    Input(InputEvent),
    /// A refresh timer fired
    TimerElapsed(u64),
    BoardFetched {
        fetch_id: u64,
        result: Box<RefreshResult>,
    },
    Tick,
    Resize,
}

/// What an input event asks the event loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Navigate(Direction),
    RefreshNow,
    Quit,
    Ignore,
}

/// Map a decoded input event to exactly one command.
pub fn route(event: InputEvent) -> Command {
    match event {
        InputEvent::ArrowUp => Command::Navigate(Direction::Up),
        InputEvent::ArrowDown => Command::Navigate(Direction::Down),
        InputEvent::ArrowLeft => Command::Navigate(Direction::Left),
        InputEvent::ArrowRight => Command::Navigate(Direction::Right),
        InputEvent::Refresh => Command::RefreshNow,
        InputEvent::Quit => Command::Quit,
        InputEvent::Enter | InputEvent::Other => Command::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_navigate() {
        assert_eq!(route(InputEvent::ArrowUp), Command::Navigate(Direction::Up));
        assert_eq!(route(InputEvent::ArrowDown), Command::Navigate(Direction::Down));
        assert_eq!(route(InputEvent::ArrowLeft), Command::Navigate(Direction::Left));
        assert_eq!(route(InputEvent::ArrowRight), Command::Navigate(Direction::Right));
    }

    #[test]
    fn control_events_map_to_control_commands() {
        assert_eq!(route(InputEvent::Refresh), Command::RefreshNow);
        assert_eq!(route(InputEvent::Quit), Command::Quit);
    }

    #[test]
    fn unmapped_events_are_ignored() {
        assert_eq!(route(InputEvent::Enter), Command::Ignore);
        assert_eq!(route(InputEvent::Other), Command::Ignore);
    }
}
