use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, InputMode, OutreachFocus, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Apply a cursor-editing key to a single-line text input
fn edit_text(text: &mut String, cursor: &mut usize, key: KeyEvent) {
    let char_count = text.chars().count();
    *cursor = (*cursor).min(char_count);

    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(char_count),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = char_count,
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

pub async fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick();
            app.poll_tasks().await;
        }
    }
}

pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    // Tool switching works from every screen
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('1') => return app.open(Screen::DealSense),
        KeyCode::Char('2') => return app.open(Screen::AskGtm),
        KeyCode::Char('3') => return app.open(Screen::Outreach),
        KeyCode::Esc if app.screen != Screen::Dashboard => {
            app.status = None;
            return app.open(Screen::Dashboard);
        }
        _ => {}
    }

    match app.screen {
        Screen::Dashboard => handle_dashboard(app, key),
        Screen::AskGtm => handle_ask_normal(app, key),
        Screen::DealSense => handle_deals_normal(app, key),
        Screen::Outreach => handle_outreach_normal(app, key),
    }
}

fn handle_dashboard(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.dashboard_down(),
        KeyCode::Char('k') | KeyCode::Up => app.dashboard_up(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
            let tool = app.selected_tool();
            app.open(tool);
        }
        _ => {}
    }
}

fn handle_ask_normal(app: &mut App, key: KeyEvent) {
    let showing_examples = app.chat.messages.is_empty() && !app.chat.loading;

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if showing_examples {
                app.example_down();
            } else {
                app.scroll_down(1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if showing_examples {
                app.example_up();
            } else {
                app.scroll_up(1);
            }
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(app.chat_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(app.chat_height / 2);
        }
        KeyCode::Enter => {
            if showing_examples {
                app.use_example();
            }
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('i') | KeyCode::Char('a') => app.input_mode = InputMode::Editing,
        KeyCode::Char('r') => app.reset_chat(),
        KeyCode::Char('s') => app.refresh_stats(),
        _ => {}
    }
}

fn handle_deals_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('i') | KeyCode::Char('/') => app.input_mode = InputMode::Editing,
        KeyCode::Enter => app.submit_upload(),
        KeyCode::Char('h') => {
            app.high_risk_only = !app.high_risk_only;
            app.deal_scroll = 0;
        }
        _ => {}
    }
}

fn handle_outreach_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => app.outreach_focus_down(),
        KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => app.outreach_focus_up(),
        KeyCode::Char('h') | KeyCode::Left if app.focused_row() == OutreachFocus::Channel => {
            app.prev_channel();
        }
        KeyCode::Char('l') | KeyCode::Right if app.focused_row() == OutreachFocus::Channel => {
            app.next_channel();
        }
        KeyCode::Enter => match app.focused_row() {
            OutreachFocus::Channel => app.next_channel(),
            OutreachFocus::Field(_) => app.input_mode = InputMode::Editing,
            OutreachFocus::Generate => app.submit_generate(),
        },
        KeyCode::Char('i') => {
            if app.focused_field().is_some() {
                app.input_mode = InputMode::Editing;
            }
        }
        KeyCode::Char('g') => app.submit_generate(),
        KeyCode::Char('c') => app.copy_outreach(),
        KeyCode::PageDown => app.scroll_down(5),
        KeyCode::PageUp => app.scroll_up(5),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::AskGtm => handle_ask_editing(app, key),
        Screen::DealSense => handle_deals_editing(app, key),
        Screen::Outreach => handle_outreach_editing(app, key),
        Screen::Dashboard => app.input_mode = InputMode::Normal,
    }
}

fn handle_ask_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            app.submit_question();
            if app.chat.loading {
                app.input_mode = InputMode::Normal;
            }
        }
        _ => {
            edit_text(&mut app.chat_input, &mut app.chat_cursor, key);
        }
    }
}

fn handle_deals_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            app.submit_upload();
        }
        _ => {
            edit_text(&mut app.deal_path_input, &mut app.deal_cursor, key);
        }
    }
}

fn handle_outreach_editing(app: &mut App, key: KeyEvent) {
    let Some(field) = app.focused_field() else {
        app.input_mode = InputMode::Normal;
        return;
    };

    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter | KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.outreach_focus_down();
        }
        _ => {
            let text = app.outreach.form.field_mut(field);
            edit_text(text, &mut app.field_cursor, key);
        }
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_scroll_area = app
        .scroll_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_scroll_area {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{app_with, settle, StubApi};
    use crossterm::event::KeyEvent;
    use std::sync::atomic::Ordering;

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_edit_text_is_utf8_safe() {
        let mut text = String::from("café");
        let mut cursor = 4;

        edit_text(&mut text, &mut cursor, KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(text, "caf");

        edit_text(&mut text, &mut cursor, KeyEvent::new(KeyCode::Home, KeyModifiers::NONE));
        edit_text(&mut text, &mut cursor, KeyEvent::new(KeyCode::Char('ü'), KeyModifiers::NONE));
        assert_eq!(text, "ücaf");
        assert_eq!(cursor, 1);

        edit_text(&mut text, &mut cursor, KeyEvent::new(KeyCode::Delete, KeyModifiers::NONE));
        assert_eq!(text, "üaf");
    }

    #[tokio::test]
    async fn test_example_question_is_sent() {
        let (mut app, _api) = app_with(StubApi::default());
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.screen, Screen::AskGtm);

        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Editing);
        assert_eq!(app.chat_input, gtm_core::state::EXAMPLE_QUESTIONS[1]);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Normal);
        settle(&mut app).await;
        assert_eq!(app.chat.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_question_keeps_editing() {
        let (mut app, api) = app_with(StubApi::default());
        app.open(Screen::AskGtm);
        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.input_mode, InputMode::Editing);
        assert!(app.chat.messages.is_empty());
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deal_enter_without_path_sends_nothing() {
        let (mut app, api) = app_with(StubApi::default());
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Enter);

        assert!(app.deal_task.is_none());
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_outreach_form_via_keys() {
        let (mut app, api) = app_with(StubApi::default());
        press(&mut app, KeyCode::Char('3'));

        // Channel row: cycle to LinkedIn
        press(&mut app, KeyCode::Right);
        assert_eq!(app.outreach.form.channel, gtm_core::Channel::Linkedin);

        for value in ["Acme Corp", "SaaS", "50-200", "manual processes, low conversion"] {
            press(&mut app, KeyCode::Down);
            press(&mut app, KeyCode::Enter);
            type_text(&mut app, value);
            press(&mut app, KeyCode::Esc);
        }
        assert!(app.outreach.form.is_valid());

        press(&mut app, KeyCode::Char('g'));
        settle(&mut app).await;

        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        let result = app.outreach.result.as_ref().unwrap();
        assert_eq!(result.subject, None);
        assert_eq!(app.outreach.copy_text().as_deref(), Some("Hi there"));
    }

    #[test]
    fn test_escape_returns_to_dashboard() {
        let (mut app, _api) = app_with(StubApi::default());

        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Dashboard);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
