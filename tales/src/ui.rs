//! Rendering for the story-card TUI.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tales_core::{ImageState, Severity};

use crate::app::{App, FormField, Mode};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(4),
        ])
        .split(frame.area());

    render_header(frame, chunks[0]);
    render_card(frame, app, chunks[1]);
    render_story(frame, app, chunks[2]);
    render_status(frame, app, chunks[3]);

    if app.mode == Mode::AddCard {
        render_form(frame, app);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            " Spooky Tales ",
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" n: next  s: shuffle  g: story starter  a: add card  q: quit"),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, area);
}

fn render_card(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Card ");

    let Some(snapshot) = &app.snapshot else {
        let waiting = Paragraph::new("Summoning spooky tales...")
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(waiting, area);
        return;
    };

    let Some(card) = &snapshot.current_card else {
        let empty = Paragraph::new("No cards in the deck. Press 'a' to add one.")
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let generating_here = snapshot.generating_card_id.as_deref() == Some(card.id.as_str());
    let image_line = if generating_here {
        Line::from(Span::styled(
            format!(
                "{} conjuring an image of \"{}\"...",
                SPINNER[app.animation_frame as usize % SPINNER.len()],
                card.image_hint
            ),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        match &card.image {
            ImageState::Placeholder { .. } => Line::from(Span::styled(
                format!("[ placeholder: {} ]", card.image_hint),
                Style::default().fg(Color::DarkGray),
            )),
            ImageState::Generated { .. } => Line::from(Span::styled(
                format!("[ generated image: {} ]", card.image_hint),
                Style::default().fg(Color::LightGreen),
            )),
            ImageState::Uploaded { .. } => Line::from(Span::styled(
                format!("[ your image: {} ]", card.image_hint),
                Style::default().fg(Color::LightBlue),
            )),
        }
    };

    let lines = vec![
        Line::raw(""),
        image_line,
        Line::raw(""),
        Line::from(Span::styled(
            card.phrase.clone(),
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            format!("card {} of {}", snapshot.current_index + 1, snapshot.deck_len),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let card_widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(card_widget, area);
}

fn render_story(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Story Starter ");

    let text = match &app.snapshot {
        Some(s) if s.story_in_flight => format!(
            "{} conjuring...",
            SPINNER[app.animation_frame as usize % SPINNER.len()]
        ),
        Some(s) => match &s.story_starter {
            Some(story) => story.clone(),
            None => "Press 'g' to conjure a story starter for this card.".to_string(),
        },
        None => String::new(),
    };

    let story = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(story, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = app
        .notices
        .iter()
        .rev()
        .take(2)
        .map(|n| {
            let color = match n.severity {
                Severity::Info => Color::LightGreen,
                Severity::Error => Color::LightRed,
            };
            Line::from(vec![
                Span::styled(
                    format!("{}: ", n.title),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(n.description.clone()),
            ])
        })
        .collect();

    if let Some(status) = &app.status {
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }

    let status = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, area);
}

fn render_form(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 11, frame.area());
    frame.render_widget(Clear, area);

    let field = |label: &str, value: &str, focused: bool| {
        let marker = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(Color::LightMagenta)
        } else {
            Style::default()
        };
        Line::from(Span::styled(format!("{marker}{label}: {value}"), style))
    };

    let lines = vec![
        field("Phrase     ", &app.form_phrase, app.form_focus == FormField::Phrase),
        field("Image hint ", &app.form_hint, app.form_focus == FormField::Hint),
        field(
            "Image file ",
            &app.form_image_path,
            app.form_focus == FormField::ImagePath,
        ),
        Line::raw(""),
        Line::from(Span::styled(
            "Tab: next field  Enter: add card  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Create a New Spooky Card "),
    );
    frame.render_widget(form, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
