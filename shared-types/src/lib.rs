//! Shared types between frontend and backend
//!
//! These types are used by both:
//! - the studio backend (native Rust)
//! - the browser editor (via the generated TypeScript bindings)
//!
//! Serializable with serde for JSON over HTTP and for the persisted
//! key-value records (drafts, project list, citations, goals).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

// ============================================================================
// Storage keys
// ============================================================================

pub const KEY_PROJECTS: &str = "writing-projects";
pub const KEY_GOALS: &str = "writing-goals";
pub const KEY_SHOW_CITATION_MANAGER: &str = "show-citation-manager";
pub const KEY_SHOW_PDF_READER: &str = "show-pdf-reader";
pub const KEY_SELECTED_TEMPLATE: &str = "selected-template";
pub const KEY_ACTIVE_FEATURE: &str = "active-feature";

/// Storage key for the draft of a project.
pub fn draft_key(project_name: &str) -> String {
    format!("draft-{project_name}")
}

/// Storage key for the citation list of a project.
pub fn citations_key(project_name: &str) -> String {
    format!("citations-{project_name}")
}

/// Lower-case, hyphen-separated form of a title.
///
/// Runs of anything that is not alphanumeric collapse to one hyphen, and
/// leading/trailing hyphens are dropped: `"My   Section!"` -> `"my-section"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

// ============================================================================
// Documents
// ============================================================================

/// A named, ordered unit of document text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub struct Section {
    /// Opaque unique id (ULID). Never derived from the title.
    pub id: String,
    pub title: String,
    pub content: String,
    /// Display position. Older records without it load as 0.
    #[serde(default)]
    pub order: u32,
}

impl Section {
    pub fn new(title: impl Into<String>, order: u32) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            title: title.into(),
            content: String::new(),
            order,
        }
    }

    pub fn slug(&self) -> String {
        slugify(&self.title)
    }
}

/// Saved draft of one project, stored under `draft-<projectName>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub struct Draft {
    pub sections: Vec<Section>,
    pub last_saved: Option<DateTime<Utc>>,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Derived metrics for the active section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub struct EditorMetrics {
    pub word_count: u32,
    pub reading_time_minutes: u32,
}

/// Named document template: an ordered list of section titles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub struct DocumentTemplate {
    pub id: String,
    pub name: String,
    pub sections: Vec<String>,
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub last_edited: DateTime<Utc>,
    pub word_count: u32,
    pub collaborators: u32,
}

// ============================================================================
// UI State
// ============================================================================

/// Side panels of the editor. At most one is visible at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub enum Panel {
    Citations,
    PdfReader,
    PdfChat,
}

impl Panel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Panel::Citations => "citations",
            Panel::PdfReader => "pdf-reader",
            Panel::PdfChat => "pdf-chat",
        }
    }
}

impl FromStr for Panel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "citations" => Ok(Panel::Citations),
            "pdf-reader" => Ok(Panel::PdfReader),
            "pdf-chat" => Ok(Panel::PdfChat),
            other => Err(format!("unknown panel: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub enum NotificationSeverity {
    Info,
    Destructive,
}

/// User-facing notification (rendered as a toast by the frontend).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub struct Notification {
    pub severity: NotificationSeverity,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: NotificationSeverity::Info,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn destructive(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: NotificationSeverity::Destructive,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Export
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub enum ExportFormat {
    Txt,
    Md,
    Html,
    Pdf,
    Doc,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Md => "md",
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Doc => "doc",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "text/plain; charset=utf-8",
            ExportFormat::Md => "text/markdown; charset=utf-8",
            ExportFormat::Html => "text/html; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Doc => "application/msword",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" => Ok(ExportFormat::Txt),
            "md" => Ok(ExportFormat::Md),
            "html" => Ok(ExportFormat::Html),
            "pdf" => Ok(ExportFormat::Pdf),
            "doc" => Ok(ExportFormat::Doc),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Citations
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub enum CitationKind {
    Book,
    #[default]
    Journal,
    Website,
    Conference,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub enum CitationStyle {
    #[default]
    Apa,
    Mla,
    Chicago,
}

impl FromStr for CitationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apa" => Ok(CitationStyle::Apa),
            "mla" => Ok(CitationStyle::Mla),
            "chicago" => Ok(CitationStyle::Chicago),
            other => Err(format!("unknown citation style: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub struct Citation {
    /// Assigned by the server on add.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: CitationKind,
    /// Author names as "Given Family".
    pub authors: Vec<String>,
    pub title: String,
    pub year: Option<i32>,
    /// Journal, publisher, site or proceedings name.
    pub source: Option<String>,
    pub volume: Option<String>,
    pub pages: Option<String>,
    pub url: Option<String>,
    pub doi: Option<String>,
}

// ============================================================================
// Writing goals
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub struct WritingGoal {
    pub id: String,
    pub title: String,
    pub target_words: u32,
    pub current_words: u32,
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Assistant
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub struct WritingSuggestion {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub struct GrammarIssue {
    pub original: String,
    pub suggestion: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub enum DetectionVerdict {
    LikelyHuman,
    Mixed,
    LikelyAi,
}

impl DetectionVerdict {
    pub fn from_probability(ai_probability: u8) -> Self {
        match ai_probability {
            0..=29 => DetectionVerdict::LikelyHuman,
            30..=69 => DetectionVerdict::Mixed,
            _ => DetectionVerdict::LikelyAi,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../web/src/types/generated.ts")]
pub struct DetectionReport {
    pub ai_probability: u8,
    pub verdict: DetectionVerdict,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ts_rs::Config;

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("My Section"), "my-section");
        assert_eq!(slugify("my   section"), "my-section");
        assert_eq!(slugify("  Results & Discussion!  "), "results-discussion");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_section_ids_are_unique() {
        let a = Section::new("Abstract", 0);
        let b = Section::new("Abstract", 1);
        assert_ne!(a.id, b.id);
        assert_eq!(a.slug(), b.slug());
    }

    #[test]
    fn test_draft_uses_camel_case_last_saved() {
        let draft = Draft {
            sections: vec![Section::new("Abstract", 0)],
            last_saved: Some(Utc::now()),
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert!(json.get("lastSaved").is_some());
        assert_eq!(json["sections"][0]["title"], "Abstract");
    }

    #[test]
    fn test_section_without_order_defaults_to_zero() {
        let section: Section =
            serde_json::from_str(r#"{"id":"abstract","title":"Abstract","content":"x"}"#).unwrap();
        assert_eq!(section.order, 0);
    }

    #[test]
    fn test_panel_and_format_parsing() {
        assert_eq!("pdf-reader".parse::<Panel>(), Ok(Panel::PdfReader));
        assert!("sidebar".parse::<Panel>().is_err());
        assert_eq!("MD".parse::<ExportFormat>(), Ok(ExportFormat::Md));
        assert_eq!(
            serde_json::to_string(&Panel::PdfChat).unwrap(),
            "\"pdf-chat\""
        );
    }

    #[test]
    fn test_detection_verdict_thresholds() {
        assert_eq!(
            DetectionVerdict::from_probability(29),
            DetectionVerdict::LikelyHuman
        );
        assert_eq!(DetectionVerdict::from_probability(30), DetectionVerdict::Mixed);
        assert_eq!(DetectionVerdict::from_probability(70), DetectionVerdict::LikelyAi);
    }

    #[test]
    fn export_types() {
        // Export all types to TypeScript
        // The export_to attribute in each type's #[ts] macro specifies the output file
        let config = Config::default();
        Section::export(&config).unwrap();
        Draft::export(&config).unwrap();
        EditorMetrics::export(&config).unwrap();
        DocumentTemplate::export(&config).unwrap();
        Project::export(&config).unwrap();
        Panel::export(&config).unwrap();
        NotificationSeverity::export(&config).unwrap();
        Notification::export(&config).unwrap();
        ExportFormat::export(&config).unwrap();
        CitationKind::export(&config).unwrap();
        CitationStyle::export(&config).unwrap();
        Citation::export(&config).unwrap();
        WritingGoal::export(&config).unwrap();
        ChatRole::export(&config).unwrap();
        ChatMessage::export(&config).unwrap();
        WritingSuggestion::export(&config).unwrap();
        GrammarIssue::export(&config).unwrap();
        DetectionVerdict::export(&config).unwrap();
        DetectionReport::export(&config).unwrap();
    }
}
