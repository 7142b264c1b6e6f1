use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::{BookingEvent, BookingRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    De,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::De];

    /// Maps a transport locale (`de-AT`, `german`, ...) onto a supported language.
    /// Anything unrecognised falls back to English.
    pub fn from_locale(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();
        if normalized == "de"
            || normalized.starts_with("de-")
            || normalized.starts_with("de_")
            || normalized == "german"
            || normalized == "deutsch"
        {
            Self::De
        } else {
            Self::En
        }
    }

    pub fn from_optional_str(value: Option<&str>) -> Self {
        value.map(Self::from_locale).unwrap_or_default()
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
        }
    }

    /// Picks the variant for this language.
    pub fn pick<'a>(self, en: &'a str, de: &'a str) -> &'a str {
        match self {
            Self::En => en,
            Self::De => de,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Text that exists in every supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Localized {
    pub en: &'static str,
    pub de: &'static str,
}

impl Localized {
    pub const fn new(en: &'static str, de: &'static str) -> Self {
        Self { en, de }
    }

    pub fn get(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.en,
            Language::De => self.de,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub user_id: String,
    pub language: Language,
    pub conversation_count: u64,
    pub updated_at: DateTime<Utc>,
}

impl ConversationContext {
    pub fn new(user_id: impl Into<String>, language: Language) -> Self {
        Self {
            user_id: user_id.into(),
            language,
            conversation_count: 0,
            updated_at: Utc::now(),
        }
    }

    /// Records one query in `language`. Returns the post-increment count.
    pub fn record_query(&mut self, language: Language) -> u64 {
        self.language = language;
        self.conversation_count += 1;
        self.updated_at = Utc::now();
        self.conversation_count
    }

    pub fn is_returning(&self) -> bool {
        self.conversation_count > 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub action: String,
}

impl Button {
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

/// Language-agnostic button layout; the transport renders it natively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    pub fn single_column(buttons: Vec<Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|button| vec![button]).collect(),
        }
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .map(|button| button.action.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrArtifact {
    pub handle: String,
    pub media_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConciergeReply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub language: Language,
    pub matched_topic: Option<String>,
    pub booking: Option<BookingRecord>,
    pub qr: Option<QrArtifact>,
}

impl ConciergeReply {
    pub fn text(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            language,
            matched_topic: None,
            booking: None,
            qr: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextInput {
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionInput {
    pub user_id: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInput {
    pub user_id: String,
    pub event: BookingEvent,
}

/// Output of the transcription collaborator, already resolved to text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptInput {
    pub user_id: String,
    pub text: String,
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartInput {
    pub user_id: String,
    pub locale: Option<String>,
}
