use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Decoded key input, independent of the terminal backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Refresh,
    Quit,
    Other,
}

impl From<KeyEvent> for InputEvent {
    fn from(key: KeyEvent) -> Self {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => InputEvent::Quit,
                _ => InputEvent::Other,
            };
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => InputEvent::ArrowUp,
            KeyCode::Down | KeyCode::Char('j') => InputEvent::ArrowDown,
            KeyCode::Left | KeyCode::Char('h') => InputEvent::ArrowLeft,
            KeyCode::Right | KeyCode::Char('l') => InputEvent::ArrowRight,
            KeyCode::Enter => InputEvent::Enter,
            KeyCode::Char('r') | KeyCode::F(5) => InputEvent::Refresh,
            KeyCode::Char('q') | KeyCode::Esc => InputEvent::Quit,
            _ => InputEvent::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_and_vim_keys_decode_to_arrows() {
        assert_eq!(InputEvent::from(key(KeyCode::Up)), InputEvent::ArrowUp);
        assert_eq!(InputEvent::from(key(KeyCode::Char('k'))), InputEvent::ArrowUp);
        assert_eq!(InputEvent::from(key(KeyCode::Down)), InputEvent::ArrowDown);
        assert_eq!(InputEvent::from(key(KeyCode::Char('j'))), InputEvent::ArrowDown);
        assert_eq!(InputEvent::from(key(KeyCode::Left)), InputEvent::ArrowLeft);
        assert_eq!(InputEvent::from(key(KeyCode::Char('h'))), InputEvent::ArrowLeft);
        assert_eq!(InputEvent::from(key(KeyCode::Right)), InputEvent::ArrowRight);
        assert_eq!(InputEvent::from(key(KeyCode::Char('l'))), InputEvent::ArrowRight);
    }

    #[test]
    fn control_keys_decode() {
        assert_eq!(InputEvent::from(key(KeyCode::Enter)), InputEvent::Enter);
        assert_eq!(InputEvent::from(key(KeyCode::Char('r'))), InputEvent::Refresh);
        assert_eq!(InputEvent::from(key(KeyCode::F(5))), InputEvent::Refresh);
        assert_eq!(InputEvent::from(key(KeyCode::Char('q'))), InputEvent::Quit);
        assert_eq!(InputEvent::from(key(KeyCode::Esc)), InputEvent::Quit);
        assert_eq!(
            InputEvent::from(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            InputEvent::Quit
        );
    }

    #[test]
    fn everything_else_is_other() {
        assert_eq!(InputEvent::from(key(KeyCode::Char('x'))), InputEvent::Other);
        assert_eq!(InputEvent::from(key(KeyCode::Tab)), InputEvent::Other);
        assert_eq!(
            InputEvent::from(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            InputEvent::Other
        );
    }
}
