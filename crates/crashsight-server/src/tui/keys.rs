use crossterm::event::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TuiAction {
    Quit,
    Back,
    Up,
    Down,
    Left,
    Right,
    Confirm,
    Toggle,
    NextPane,
    Search,
    OpenVersions,
    OpenTime,
    CloseIssue,
    AddNote,
    ToggleNotes,
    Export,
    ToggleHelp,
    Clear,
    Apply,
    MarkStart,
    MarkEnd,
    Input(char),
    Backspace,
}

/// How keystrokes are read: as commands, or as text for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Text,
}

pub fn key_to_action(key: KeyCode, mode: InputMode) -> Option<TuiAction> {
    match mode {
        InputMode::Text => match key {
            KeyCode::Char(c) => Some(TuiAction::Input(c)),
            KeyCode::Backspace => Some(TuiAction::Backspace),
            KeyCode::Enter => Some(TuiAction::Confirm),
            KeyCode::Esc => Some(TuiAction::Back),
            _ => None,
        },
        InputMode::Normal => match key {
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(TuiAction::Quit),
            KeyCode::Esc | KeyCode::Backspace => Some(TuiAction::Back),
            KeyCode::Up | KeyCode::Char('k') => Some(TuiAction::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(TuiAction::Down),
            KeyCode::Left | KeyCode::Char('h') => Some(TuiAction::Left),
            KeyCode::Right | KeyCode::Char('l') => Some(TuiAction::Right),
            KeyCode::Enter => Some(TuiAction::Confirm),
            KeyCode::Char(' ') => Some(TuiAction::Toggle),
            KeyCode::Tab => Some(TuiAction::NextPane),
            KeyCode::Char('/') => Some(TuiAction::Search),
            KeyCode::Char('v') | KeyCode::Char('V') => Some(TuiAction::OpenVersions),
            KeyCode::Char('t') | KeyCode::Char('T') => Some(TuiAction::OpenTime),
            KeyCode::Char('c') | KeyCode::Char('C') => Some(TuiAction::CloseIssue),
            KeyCode::Char('n') | KeyCode::Char('N') => Some(TuiAction::AddNote),
            KeyCode::Char('o') | KeyCode::Char('O') => Some(TuiAction::ToggleNotes),
            KeyCode::Char('e') | KeyCode::Char('E') => Some(TuiAction::Export),
            KeyCode::Char('?') => Some(TuiAction::ToggleHelp),
            KeyCode::Char('x') | KeyCode::Char('X') => Some(TuiAction::Clear),
            KeyCode::Char('a') | KeyCode::Char('A') => Some(TuiAction::Apply),
            KeyCode::Char('[') => Some(TuiAction::MarkStart),
            KeyCode::Char(']') => Some(TuiAction::MarkEnd),
            _ => None,
        },
    }
}
