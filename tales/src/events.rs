//! Event handling for the story-card TUI.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Mode};
use crate::worker::Intent;

/// Result of handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
}

/// Handle a terminal event.
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) => handle_key_event(app, key),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    match app.mode {
        Mode::Browsing => handle_browsing(app, key),
        Mode::AddCard => handle_form(app, key),
    }
}

fn handle_browsing(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Char('q') => EventResult::Quit,
        KeyCode::Char('n') | KeyCode::Char(' ') | KeyCode::Right => {
            app.send(Intent::Advance);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('s') => {
            app.send(Intent::Shuffle);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('g') => {
            app.send(Intent::RequestStory);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('a') => {
            app.open_form();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

fn handle_form(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => {
            app.close_form();
            EventResult::NeedsRedraw
        }
        KeyCode::Tab | KeyCode::Down => {
            app.form_focus = app.form_focus.next();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => {
            app.submit_form();
            EventResult::NeedsRedraw
        }
        KeyCode::Backspace => {
            app.focused_field_mut().pop();
            EventResult::NeedsRedraw
        }
        KeyCode::Char(c) => {
            app.focused_field_mut().push(c);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}
