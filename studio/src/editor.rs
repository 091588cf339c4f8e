//! Editor state: the ordered sections of one document and the active pointer.

use shared_types::{EditorMetrics, Section};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Words per minute used for the reading-time estimate.
pub const READING_WORDS_PER_MINUTE: u32 = 200;

pub type SharedEditor = Arc<Mutex<EditorState>>;

#[derive(Debug, Clone, Default)]
pub struct EditorState {
    sections: Vec<Section>,
    active_section_id: Option<String>,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from existing sections; the first one (by order) becomes active.
    pub fn from_sections(mut sections: Vec<Section>) -> Self {
        sections.sort_by_key(|section| section.order);
        let active_section_id = sections.first().map(|section| section.id.clone());
        Self {
            sections,
            active_section_id,
        }
    }

    pub fn into_shared(self) -> SharedEditor {
        Arc::new(Mutex::new(self))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == id)
    }

    pub fn active_section_id(&self) -> Option<&str> {
        self.active_section_id.as_deref()
    }

    pub fn active_section(&self) -> Option<&Section> {
        self.active_section_id
            .as_deref()
            .and_then(|id| self.section(id))
    }

    /// Point the editor at `id`. Unknown ids are accepted; metrics then read zero.
    pub fn set_active_section(&mut self, id: impl Into<String>) {
        self.active_section_id = Some(id.into());
    }

    /// Replace the active section's content. Returns false when nothing is active.
    pub fn update_active_section_content(&mut self, text: impl Into<String>) -> bool {
        let Some(active_id) = self.active_section_id.as_deref() else {
            return false;
        };
        match self
            .sections
            .iter_mut()
            .find(|section| section.id == active_id)
        {
            Some(section) => {
                section.content = text.into();
                true
            }
            None => false,
        }
    }

    /// Append an empty section after the current last one and make it active.
    pub fn create_section(&mut self, title: impl Into<String>) -> &Section {
        let order = self
            .sections
            .iter()
            .map(|section| section.order + 1)
            .max()
            .unwrap_or(0);
        let section = Section::new(title, order);
        self.active_section_id = Some(section.id.clone());
        self.sections.push(section);
        &self.sections[self.sections.len() - 1]
    }

    pub fn rename_section(&mut self, id: &str, title: impl Into<String>) -> bool {
        match self.sections.iter_mut().find(|section| section.id == id) {
            Some(section) => {
                section.title = title.into();
                true
            }
            None => false,
        }
    }

    /// Word count and reading time of the active section.
    pub fn metrics(&self) -> EditorMetrics {
        let word_count = self
            .active_section()
            .map(|section| word_count(&section.content))
            .unwrap_or(0);
        EditorMetrics {
            word_count,
            reading_time_minutes: reading_time_minutes(word_count),
        }
    }

    pub fn total_word_count(&self) -> u32 {
        self.sections
            .iter()
            .map(|section| word_count(&section.content))
            .sum()
    }
}

/// Whitespace-delimited tokens; empty and whitespace-only text count as 0.
pub fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

pub fn reading_time_minutes(word_count: u32) -> u32 {
    word_count.div_ceil(READING_WORDS_PER_MINUTE)
}
