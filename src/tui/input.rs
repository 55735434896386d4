//! Key binding dispatch for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{Focus, TuiApp};

/// Handle a key event, mutating app state.
pub fn handle_key(app: &mut TuiApp, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global bindings
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('n') if ctrl => {
            app.new_conversation();
            return;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.cycle_focus();
            return;
        }
        _ => {}
    }

    match app.focus {
        Focus::Sidebar => sidebar_key(app, key),
        Focus::Chat => chat_key(app, key),
        Focus::Input => input_key(app, key),
    }
}

fn sidebar_key(app: &mut TuiApp, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => app.sidebar_down(),
        KeyCode::Char('k') | KeyCode::Up => app.sidebar_up(),
        KeyCode::Char('n') => {
            app.new_conversation();
        }
        KeyCode::Enter => {
            app.select_highlighted();
        }
        _ => {}
    }
}

fn chat_key(app: &mut TuiApp, key: KeyEvent) {
    if app.showing_suggestions() {
        match key.code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Left | KeyCode::Up | KeyCode::Char('k') => app.suggestion_prev(),
            KeyCode::Right | KeyCode::Down | KeyCode::Char('j') => app.suggestion_next(),
            KeyCode::Enter => {
                app.choose_suggestion();
            }
            _ => {}
        }
        return;
    }
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.scroll_messages_up(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_messages_down(),
        KeyCode::PageUp => app.page_messages_up(),
        KeyCode::PageDown => app.page_messages_down(),
        KeyCode::End | KeyCode::Char('G') => app.follow_messages(),
        _ => {}
    }
}

fn input_key(app: &mut TuiApp, key: KeyEvent) {
    match key.code {
        KeyCode::PageUp => return app.page_messages_up(),
        KeyCode::PageDown => return app.page_messages_down(),
        _ => {}
    }
    if !app.input_enabled() {
        return;
    }
    match key.code {
        KeyCode::Enter
            if key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            app.input.insert_newline();
        }
        KeyCode::Enter => {
            app.submit_input();
        }
        KeyCode::Esc => app.input.clear(),
        _ => {
            app.input.handle_key(key);
        }
    }
}
