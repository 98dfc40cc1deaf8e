use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use chatpane_core::Mode;

use crate::app::{App, FocusPane, InputMode, LoginField, Popup};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Tick => app.tick(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if let Some(popup) = app.popup {
        match popup {
            Popup::Login => handle_login_popup(app, key),
            Popup::FilePicker => handle_file_picker(app, key),
            Popup::Port => handle_port_popup(app, key),
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Tab cycles focus: History -> Transcript -> Composer
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::History => FocusPane::Transcript,
                FocusPane::Transcript => FocusPane::Composer,
                FocusPane::Composer => FocusPane::History,
            };
        }
        KeyCode::Char('i') => {
            app.focus = FocusPane::Composer;
            app.input_mode = InputMode::Editing;
        }

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::History => app.history_nav_down(),
            FocusPane::Transcript => app.scroll_transcript_down(1),
            FocusPane::Composer => {}
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::History => app.history_nav_up(),
            FocusPane::Transcript => app.scroll_transcript_up(1),
            FocusPane::Composer => {}
        },
        KeyCode::Char('g') => match app.focus {
            FocusPane::History if !app.chat.history.is_empty() => {
                app.history_state.select(Some(0));
            }
            FocusPane::Transcript => app.transcript_scroll = 0,
            _ => {}
        },
        KeyCode::Char('G') => match app.focus {
            FocusPane::History if !app.chat.history.is_empty() => {
                app.history_state.select(Some(app.chat.history.len() - 1));
            }
            FocusPane::Transcript => app.scroll_transcript_to_bottom(),
            _ => {}
        },

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_transcript_down((app.transcript_height / 2).max(1));
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_transcript_up((app.transcript_height / 2).max(1));
        }

        KeyCode::Enter => match app.focus {
            FocusPane::History => app.select_history_entry(),
            _ => {
                app.focus = FocusPane::Composer;
                app.input_mode = InputMode::Editing;
            }
        },

        // Session settings
        KeyCode::Char('m') => app.cycle_model(),
        KeyCode::Char('v') => app.cycle_api_version(),
        KeyCode::Char('p') => app.open_popup(Popup::Port),
        KeyCode::Char('L') => app.toggle_admin(),

        // Attachment
        KeyCode::Char('a') => app.open_popup(Popup::FilePicker),
        KeyCode::Char('X') => app.composer.remove_attachment(),

        // Admin mode selector
        KeyCode::Char('1') if app.is_admin() => app.composer.select_mode(Mode::Query),
        KeyCode::Char('2') if app.is_admin() => app.composer.select_mode(Mode::Input),
        KeyCode::Char('3') if app.is_admin() => app.composer.select_mode(Mode::Data),
        KeyCode::Char('o') if app.is_admin() && app.composer.mode == Mode::Data => {
            let next = app.composer.operation.next();
            app.composer.select_operation(next);
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        // Shift+Enter or Alt+Enter adds a line; plain Enter sends
        KeyCode::Enter
            if key.modifiers.contains(KeyModifiers::SHIFT)
                || key.modifiers.contains(KeyModifiers::ALT) =>
        {
            app.composer.insert_newline();
        }
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.composer.backspace(),
        KeyCode::Delete => app.composer.delete(),
        KeyCode::Left => app.composer.move_left(),
        KeyCode::Right => app.composer.move_right(),
        KeyCode::Up => app.composer.move_up(),
        KeyCode::Down => app.composer.move_down(),
        KeyCode::Home => app.composer.move_home(),
        KeyCode::End => app.composer.move_end(),
        KeyCode::Char(c) => app.composer.insert_char(c),
        _ => {}
    }
    app.composer.scroll_to_cursor();
}

fn handle_login_popup(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_popup(),
        KeyCode::Tab | KeyCode::BackTab => app.login.toggle_field(),
        KeyCode::Enter => match app.login.field {
            LoginField::Username => app.login.field = LoginField::Password,
            LoginField::Password => app.submit_login(),
        },
        KeyCode::Backspace => {
            app.login.active_input().pop();
        }
        KeyCode::Char(c) => {
            app.login.active_input().push(c);
            app.login.error = None;
        }
        _ => {}
    }
}

fn handle_file_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_popup(),
        KeyCode::Enter => app.confirm_file_picker(),
        KeyCode::Backspace => {
            app.composer.picker_input.pop();
            app.picker_error = None;
        }
        KeyCode::Char(c) => {
            app.composer.picker_input.push(c);
            app.picker_error = None;
        }
        _ => {}
    }
}

fn handle_port_popup(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => app.close_popup(),
        KeyCode::Backspace => app.port_pop(),
        KeyCode::Char(c) => app.port_push(c),
        _ => {}
    }
}

/// Check if a point is inside a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Position-based scrolling
    let in_history = app.history_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_transcript = app.transcript_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_transcript {
                app.scroll_transcript_down(3);
            } else if in_history {
                app.history_nav_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_transcript {
                app.scroll_transcript_up(3);
            } else if in_history {
                app.history_nav_up();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chatpane_core::{ChatClient, ChatState, Dispatcher, MemoryPreferenceStore, StaticHost};
    use tokio::sync::mpsc;

    fn test_app() -> App {
        let host = StaticHost::parse("http://127.0.0.1:1").unwrap();
        let dispatcher = Dispatcher::new(ChatClient::new(), Arc::new(host));
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(
            ChatState::load(Box::new(MemoryPreferenceStore::new())),
            dispatcher,
            tx,
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn press_with(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, modifiers)));
    }

    #[test]
    fn test_ctrl_c_quits_from_any_mode() {
        let mut app = test_app();
        app.open_popup(Popup::Login);
        press_with(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[test]
    fn test_typing_goes_to_composer() {
        let mut app = test_app();
        assert_eq!(app.input_mode, InputMode::Editing);
        for c in "hi".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press_with(&mut app, KeyCode::Enter, KeyModifiers::SHIFT);
        press(&mut app, KeyCode::Char('!'));
        assert_eq!(app.composer.text, "hi\n!");
    }

    #[test]
    fn test_alt_enter_inserts_newline() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('a'));
        press_with(&mut app, KeyCode::Enter, KeyModifiers::ALT);
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.composer.text, "a\nb");
        assert!(app.chat.transcript.is_empty());
    }

    #[test]
    fn test_q_only_quits_in_normal_mode() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_mode_keys_need_admin() {
        let mut app = test_app();
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.composer.mode, Mode::Input);

        app.chat.session.is_admin = true;
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.composer.mode, Mode::Data);
        let before = app.composer.operation;
        press(&mut app, KeyCode::Char('o'));
        assert_eq!(app.composer.operation, before.next());
    }

    #[test]
    fn test_login_popup_keys() {
        let mut app = test_app();
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('L'));
        assert_eq!(app.popup, Some(Popup::Login));

        for c in "admin".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        for c in "admin".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        assert!(app.is_admin());
        assert_eq!(app.popup, None);
    }

    #[test]
    fn test_mouse_scroll_over_transcript() {
        let mut app = test_app();
        app.transcript_area = Some(Rect::new(10, 0, 40, 10));
        app.transcript_scroll = 5;
        let mouse = MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column: 20,
            row: 3,
            modifiers: KeyModifiers::NONE,
        };
        handle_event(&mut app, AppEvent::Mouse(mouse));
        assert_eq!(app.transcript_scroll, 2);
    }
}
