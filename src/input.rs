use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
    Left,
    Right,
    ToggleHelp,
    ToggleFocus,
    NextTab,
    SwitchTab(u8),
    StartFilter,
    ToggleSelect,
    ToggleSelectAll,
    Pause,
    Unpause,
    Start,
    Stop,
    Remove,
    ShowLogs,
    OpenShell,
    PullImage,
    CreateContainer,
    Refresh,
    SubmitInput,
    CancelInput,
    Backspace,
    InputChar(char),
    NextField,
    PrevField,
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    if is_hard_quit(key) {
        return Some(Action::Quit);
    }
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::Filter => map_filter_mode_key(key),
        InputMode::Dialog => map_dialog_key(key),
        InputMode::Form => map_form_key(key),
        InputMode::Logs => map_logs_key(key),
    }
}

fn is_hard_quit(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d'))
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char(c @ '1'..='4') if key.modifiers.is_empty() => {
            Some(Action::SwitchTab(c.to_digit(10).unwrap_or(1) as u8))
        }
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::Top),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::Refresh)
        }
        KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::ToggleSelectAll)
        }
        KeyCode::Char(' ') => Some(Action::ToggleSelect),
        KeyCode::Char('/') => Some(Action::StartFilter),
        KeyCode::Char('p') => Some(Action::Pause),
        KeyCode::Char('P') => Some(Action::Unpause),
        KeyCode::Char('s') => Some(Action::Start),
        KeyCode::Char('S') => Some(Action::Stop),
        KeyCode::Char('r') => Some(Action::Remove),
        KeyCode::Char('l') => Some(Action::ShowLogs),
        KeyCode::Char('e') => Some(Action::OpenShell),
        KeyCode::Char('i') => Some(Action::PullImage),
        KeyCode::Char('c') => Some(Action::CreateContainer),
        KeyCode::BackTab => Some(Action::NextTab),
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => Some(Action::NextTab),
        KeyCode::Tab => Some(Action::ToggleFocus),
        KeyCode::Esc => Some(Action::CancelInput),
        _ => None,
    }
}

fn map_filter_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Tab => Some(Action::ToggleFocus),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

fn map_dialog_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Left | KeyCode::Char('h') => Some(Action::Left),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::Right),
        KeyCode::BackTab => Some(Action::PrevField),
        KeyCode::Tab => Some(Action::NextField),
        _ => None,
    }
}

fn map_form_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::BackTab => Some(Action::PrevField),
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => Some(Action::PrevField),
        KeyCode::Tab => Some(Action::NextField),
        KeyCode::Up => Some(Action::PrevField),
        KeyCode::Down => Some(Action::NextField),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

fn map_logs_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('l') => Some(Action::CancelInput),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::Top),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, map_key};
    use crate::app::InputMode;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn normal_mode_maps_quit() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Quit));
    }

    #[test]
    fn ctrl_c_and_ctrl_d_quit_from_every_mode() {
        let modes = [
            InputMode::Normal,
            InputMode::Filter,
            InputMode::Dialog,
            InputMode::Form,
            InputMode::Logs,
        ];
        for mode in modes {
            for code in [KeyCode::Char('c'), KeyCode::Char('d')] {
                let key = KeyEvent::new(code, KeyModifiers::CONTROL);
                assert_eq!(map_key(mode, key), Some(Action::Quit), "{mode:?}");
            }
        }
    }

    #[test]
    fn form_mode_types_q_instead_of_quitting() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Form, key), Some(Action::InputChar('q')));
        assert_eq!(map_key(InputMode::Filter, key), Some(Action::InputChar('q')));
    }

    #[test]
    fn normal_mode_maps_lifecycle_verbs_by_case() {
        let cases = [
            (KeyCode::Char('p'), KeyModifiers::NONE, Action::Pause),
            (KeyCode::Char('P'), KeyModifiers::SHIFT, Action::Unpause),
            (KeyCode::Char('s'), KeyModifiers::NONE, Action::Start),
            (KeyCode::Char('S'), KeyModifiers::SHIFT, Action::Stop),
            (KeyCode::Char('r'), KeyModifiers::NONE, Action::Remove),
        ];
        for (code, modifiers, expected) in cases {
            let key = KeyEvent::new(code, modifiers);
            assert_eq!(map_key(InputMode::Normal, key), Some(expected));
        }
    }

    #[test]
    fn ctrl_r_refreshes_but_plain_r_removes() {
        let ctrl_r = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Normal, ctrl_r), Some(Action::Refresh));
        let f5 = KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, f5), Some(Action::Refresh));
    }

    #[test]
    fn selection_keys() {
        let space = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);
        let ctrl_a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Normal, space), Some(Action::ToggleSelect));
        assert_eq!(
            map_key(InputMode::Normal, ctrl_a),
            Some(Action::ToggleSelectAll)
        );
    }

    #[test]
    fn tab_toggles_focus_and_shift_tab_cycles_tabs() {
        let tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);
        let back_tab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(map_key(InputMode::Normal, tab), Some(Action::ToggleFocus));
        assert_eq!(map_key(InputMode::Normal, back_tab), Some(Action::NextTab));
    }

    #[test]
    fn digits_switch_tabs() {
        let key = KeyEvent::new(KeyCode::Char('3'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::SwitchTab(3)));
        let key = KeyEvent::new(KeyCode::Char('7'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), None);
    }

    #[test]
    fn dialog_mode_moves_between_buttons() {
        let right = KeyEvent::new(KeyCode::Right, KeyModifiers::NONE);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Dialog, right), Some(Action::Right));
        assert_eq!(map_key(InputMode::Dialog, enter), Some(Action::SubmitInput));
    }

    #[test]
    fn form_mode_cycles_fields() {
        let tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE);
        let back_tab = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(map_key(InputMode::Form, tab), Some(Action::NextField));
        assert_eq!(map_key(InputMode::Form, back_tab), Some(Action::PrevField));
    }

    #[test]
    fn logs_mode_closes_on_q() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Logs, key), Some(Action::CancelInput));
    }
}
