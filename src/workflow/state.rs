//! Session state and the values that flow through it.

use crate::document::{Document, DocumentId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Which of the two texts is displayed and exported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextVariant {
    /// Source-script text as read by OCR.
    Extracted,
    /// Target-script translation, shown first after every success.
    #[default]
    Translated,
}

impl TextVariant {
    pub fn as_tag(self) -> &'static str {
        match self {
            TextVariant::Extracted => "extracted",
            TextVariant::Translated => "translated",
        }
    }

    /// Parse a variant tag, case-insensitively. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "extracted" => Some(TextVariant::Extracted),
            "translated" => Some(TextVariant::Translated),
            _ => None,
        }
    }

    /// Heading shown above the text in the result panel.
    pub fn heading(self) -> &'static str {
        match self {
            TextVariant::Extracted => "Extracted Tamang Text",
            TextVariant::Translated => "Translated Nepali Text",
        }
    }
}

impl fmt::Display for TextVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for TextVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| {
            format!("unknown text variant '{s}' (expected 'extracted' or 'translated')")
        })
    }
}

/// Extracted and translated text returned by the processing service.
///
/// Both fields are always present; a response missing either never becomes a
/// `ProcessingResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub extracted_text: String,
    pub translated_text: String,
}

impl ProcessingResult {
    pub fn new(extracted_text: impl Into<String>, translated_text: impl Into<String>) -> Self {
        Self {
            extracted_text: extracted_text.into(),
            translated_text: translated_text.into(),
        }
    }

    pub fn text(&self, variant: TextVariant) -> &str {
        match variant {
            TextVariant::Extracted => &self.extracted_text,
            TextVariant::Translated => &self.translated_text,
        }
    }
}

/// Generation token attached to each submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionId(pub(crate) u64);

impl SubmissionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// The one network call a successful `submit()` asks the caller to make.
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub id: SubmissionId,
    pub document: Arc<Document>,
}

/// Read-only copy of what an export should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSnapshot {
    pub document_id: DocumentId,
    pub variant: TextVariant,
    pub text: String,
}

/// Outcome of delivering a completion to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The completion matched the in-flight submission and moved the state.
    Applied,
    /// The completion belonged to a superseded submission and was dropped.
    Stale,
}

/// Exactly one of these is active at any time.
#[derive(Debug, Clone)]
pub enum SessionState {
    Idle,
    Ready {
        document: Arc<Document>,
    },
    Processing {
        document: Arc<Document>,
        submission: SubmissionId,
    },
    Succeeded {
        document: Arc<Document>,
        result: ProcessingResult,
        variant: TextVariant,
    },
    Failed {
        document: Arc<Document>,
        message: String,
    },
}

impl SessionState {
    /// Short lowercase name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Ready { .. } => "ready",
            SessionState::Processing { .. } => "processing",
            SessionState::Succeeded { .. } => "succeeded",
            SessionState::Failed { .. } => "failed",
        }
    }

    pub fn document(&self) -> Option<&Arc<Document>> {
        match self {
            SessionState::Idle => None,
            SessionState::Ready { document }
            | SessionState::Processing { document, .. }
            | SessionState::Succeeded { document, .. }
            | SessionState::Failed { document, .. } => Some(document),
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, SessionState::Processing { .. })
    }

    /// The in-flight submission, if any.
    pub fn submission(&self) -> Option<SubmissionId> {
        match self {
            SessionState::Processing { submission, .. } => Some(*submission),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ProcessingResult> {
        match self {
            SessionState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn variant(&self) -> Option<TextVariant> {
        match self {
            SessionState::Succeeded { variant, .. } => Some(*variant),
            _ => None,
        }
    }

    /// Text of the displayed variant.
    pub fn active_text(&self) -> Option<&str> {
        match self {
            SessionState::Succeeded { result, variant, .. } => Some(result.text(*variant)),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.document() {
            Some(doc) => write!(f, "{} ({})", self.name(), doc.id()),
            None => f.write_str(self.name()),
        }
    }
}
