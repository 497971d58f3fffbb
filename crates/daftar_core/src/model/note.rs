//! Free-form note record.
//!
//! # Invariants
//! - `title` and `content` are never blank.
//! - Only the three known note types can be created; unknown persisted
//!   labels load as `NoteType::Unknown` and render with the default icon.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Note identifier: creation timestamp in epoch milliseconds.
pub type NoteId = i64;

/// Note classification. Serialized with the Arabic labels shown in the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteType {
    #[default]
    #[serde(rename = "فكرة تطويرية")]
    DevelopmentIdea,
    #[serde(rename = "تذكير")]
    Reminder,
    #[serde(rename = "فكرة مستقبلية")]
    FutureIdea,
    /// Any label written by an older or foreign revision.
    #[serde(other)]
    Unknown,
}

impl NoteType {
    /// Types a user may pick when creating or editing a note.
    pub const CREATABLE: [NoteType; 3] = [
        NoteType::DevelopmentIdea,
        NoteType::Reminder,
        NoteType::FutureIdea,
    ];

    /// Parses either the stable slug or the Arabic label.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "development-idea" | "فكرة تطويرية" => Some(Self::DevelopmentIdea),
            "reminder" | "تذكير" => Some(Self::Reminder),
            "future-idea" | "فكرة مستقبلية" => Some(Self::FutureIdea),
            _ => None,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::DevelopmentIdea => "development-idea",
            Self::Reminder => "reminder",
            Self::FutureIdea => "future-idea",
            Self::Unknown => "unknown",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DevelopmentIdea => "فكرة تطويرية",
            Self::Reminder => "تذكير",
            Self::FutureIdea => "فكرة مستقبلية",
            Self::Unknown => "غير معروف",
        }
    }

    /// Icon glyph; unknown types share the development-idea bulb.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Reminder => "🔔",
            Self::FutureIdea => "⭐",
            Self::DevelopmentIdea | Self::Unknown => "💡",
        }
    }
}

/// One recorded note or idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: NoteType,
    pub date: NaiveDate,
}

impl Note {
    /// Checks create/edit invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::MissingTitle);
        }
        if self.content.trim().is_empty() {
            return Err(NoteValidationError::MissingContent);
        }
        if self.kind == NoteType::Unknown {
            return Err(NoteValidationError::UnknownType);
        }
        Ok(())
    }
}

/// Input validation failures for note create/edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    MissingTitle,
    MissingContent,
    UnknownType,
}

impl NoteValidationError {
    /// Arabic message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingTitle | Self::MissingContent => "الرجاء إدخال العنوان والمحتوى",
            Self::UnknownType => "الرجاء اختيار نوع الملاحظة",
        }
    }
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "title is required"),
            Self::MissingContent => write!(f, "content is required"),
            Self::UnknownType => write!(f, "note type must be one of the known types"),
        }
    }
}

impl Error for NoteValidationError {}

#[cfg(test)]
mod tests {
    use super::{Note, NoteType, NoteValidationError};
    use chrono::NaiveDate;

    #[test]
    fn note_type_parses_slugs_and_labels() {
        assert_eq!(NoteType::parse("reminder"), Some(NoteType::Reminder));
        assert_eq!(NoteType::parse("فكرة مستقبلية"), Some(NoteType::FutureIdea));
        assert_eq!(NoteType::parse("todo"), None);
    }

    #[test]
    fn unknown_persisted_label_loads_with_default_icon() {
        let raw = r#"{"id":1,"title":"t","content":"c","type":"ملاحظة","date":"2024-01-02"}"#;
        let note: Note = serde_json::from_str(raw).unwrap();
        assert_eq!(note.kind, NoteType::Unknown);
        assert_eq!(note.kind.icon(), NoteType::DevelopmentIdea.icon());
        assert_eq!(note.validate(), Err(NoteValidationError::UnknownType));
    }

    #[test]
    fn serializes_type_with_arabic_label() {
        let note = Note {
            id: 7,
            title: "t".to_string(),
            content: "c".to_string(),
            kind: NoteType::Reminder,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["type"], "تذكير");
        assert_eq!(json["date"], "2024-05-01");
    }
}
