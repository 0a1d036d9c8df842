//! Main application state for the TUI.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::collections::VecDeque;
use std::path::Path;
use tales_core::{CardDraft, Notice, Snapshot};
use tokio::sync::mpsc;

use crate::worker::{Intent, Update};

/// How many past notices the status area keeps around.
const NOTICE_HISTORY: usize = 4;

/// Input modes of the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Browsing the deck (default).
    #[default]
    Browsing,
    /// Filling in the add-card form.
    AddCard,
}

/// Focusable fields of the add-card form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Phrase,
    Hint,
    ImagePath,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Phrase => FormField::Hint,
            FormField::Hint => FormField::ImagePath,
            FormField::ImagePath => FormField::Phrase,
        }
    }
}

/// Main application state.
pub struct App {
    intents: mpsc::Sender<Intent>,
    updates: mpsc::Receiver<Update>,

    /// Latest session snapshot for rendering.
    pub snapshot: Option<Snapshot>,

    /// Recent notices, newest last.
    pub notices: VecDeque<Notice>,

    pub mode: Mode,
    pub form_phrase: String,
    pub form_hint: String,
    pub form_image_path: String,
    pub form_focus: FormField,

    /// Transient message shown in the status line.
    pub status: Option<String>,

    pub should_quit: bool,
    pub animation_frame: u8,
}

impl App {
    pub fn new(intents: mpsc::Sender<Intent>, updates: mpsc::Receiver<Update>) -> Self {
        Self {
            intents,
            updates,
            snapshot: None,
            notices: VecDeque::with_capacity(NOTICE_HISTORY),
            mode: Mode::default(),
            form_phrase: String::new(),
            form_hint: String::new(),
            form_image_path: String::new(),
            form_focus: FormField::default(),
            status: None,
            should_quit: false,
            animation_frame: 0,
        }
    }

    /// Drain pending worker updates into the view state.
    pub fn pump_updates(&mut self) -> bool {
        let mut changed = false;
        while let Ok(update) = self.updates.try_recv() {
            self.snapshot = Some(update.snapshot);
            for notice in update.notices {
                if self.notices.len() == NOTICE_HISTORY {
                    self.notices.pop_front();
                }
                self.notices.push_back(notice);
            }
            changed = true;
        }
        changed
    }

    pub fn send(&mut self, intent: Intent) {
        if self.intents.try_send(intent).is_err() {
            self.status = Some("Still working on the last request...".to_string());
        }
    }

    /// Open the add-card form with cleared fields.
    pub fn open_form(&mut self) {
        self.mode = Mode::AddCard;
        self.form_phrase.clear();
        self.form_hint.clear();
        self.form_image_path.clear();
        self.form_focus = FormField::Phrase;
    }

    pub fn close_form(&mut self) {
        self.mode = Mode::Browsing;
    }

    /// Read the image file, inline it, and submit the draft. The core
    /// validates the rest; file problems surface in the status line.
    pub fn submit_form(&mut self) {
        let image_data_uri = match read_image_as_data_uri(&self.form_image_path) {
            Ok(uri) => uri,
            Err(message) => {
                self.status = Some(message);
                return;
            }
        };

        let draft = CardDraft {
            phrase: self.form_phrase.clone(),
            image_hint: self.form_hint.clone(),
            image_data_uri,
        };
        self.send(Intent::AddCard(draft));
        self.close_form();
    }

    pub fn focused_field_mut(&mut self) -> &mut String {
        match self.form_focus {
            FormField::Phrase => &mut self.form_phrase,
            FormField::Hint => &mut self.form_hint,
            FormField::ImagePath => &mut self.form_image_path,
        }
    }

    pub fn tick(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
    }
}

/// Inline a local image file as a data URI.
fn read_image_as_data_uri(path: &str) -> Result<String, String> {
    let path = path.trim();
    if path.is_empty() {
        return Err("Enter a path to an image file.".to_string());
    }

    let mime_type = match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => return Err("Supported image types: png, jpeg, webp, gif.".to_string()),
    };

    let bytes =
        std::fs::read(path).map_err(|e| format!("Could not read {path}: {e}"))?;
    Ok(format!("data:{mime_type};base64,{}", BASE64.encode(&bytes)))
}
