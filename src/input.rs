use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    FocusNext,
    FocusPrev,
    SelectUp,
    SelectDown,
    JumpTop,
    JumpBottom,
    Confirm,
    Back,
    Yes,
    No,
    Unmount,          // u: unmount selected mount
    Kill,             // x: kill selected holder
    RestartAutomount, // R: restart the automount daemon
    Refresh,          // r: drop the cache and re-read now
    CycleTheme,
    ShowHelp,
    None,
}

pub fn handle_key(key: KeyEvent) -> Action {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _)
        | (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,

        (KeyCode::Tab, _)     => Action::FocusNext,
        (KeyCode::BackTab, _) => Action::FocusPrev,

        // arrow keys and vim jk
        (KeyCode::Up,   _) | (KeyCode::Char('k'), _) => Action::SelectUp,
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Action::SelectDown,
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Action::JumpTop,
        (KeyCode::Char('G'), _) | (KeyCode::End,  _) => Action::JumpBottom,

        (KeyCode::Enter, _)     => Action::Confirm,
        (KeyCode::Char('l'), _) => Action::Confirm,
        (KeyCode::Esc, _)       => Action::Back,
        (KeyCode::Char('h'), _) => Action::Back,

        (KeyCode::Char('y'), _) | (KeyCode::Char('Y'), _) => Action::Yes,
        (KeyCode::Char('n'), _) | (KeyCode::Char('N'), _) => Action::No,

        (KeyCode::Char('u'), _) => Action::Unmount,
        (KeyCode::Char('x'), _) => Action::Kill,
        (KeyCode::Char('R'), _) => Action::RestartAutomount,
        (KeyCode::Char('r'), _)
        | (KeyCode::F(5), _)    => Action::Refresh,

        (KeyCode::Char('t'), _) => Action::CycleTheme,
        (KeyCode::Char('?'), _)
        | (KeyCode::F(1), _)    => Action::ShowHelp,

        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn mutation_keys() {
        assert_eq!(handle_key(key(KeyCode::Char('u'))), Action::Unmount);
        assert_eq!(handle_key(key(KeyCode::Char('x'))), Action::Kill);
        assert_eq!(handle_key(key(KeyCode::Char('R'))), Action::RestartAutomount);
        assert_eq!(handle_key(key(KeyCode::Char('r'))), Action::Refresh);
    }

    #[test]
    fn confirm_and_quit_keys() {
        assert_eq!(handle_key(key(KeyCode::Char('y'))), Action::Yes);
        assert_eq!(handle_key(key(KeyCode::Char('N'))), Action::No);
        assert_eq!(handle_key(key(KeyCode::Esc)), Action::Back);
        assert_eq!(handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)), Action::Quit);
        assert_eq!(handle_key(key(KeyCode::Char('z'))), Action::None);
    }
}
