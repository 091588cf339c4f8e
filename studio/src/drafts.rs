//! Draft store: whole-document snapshots keyed by project name.
//!
//! A save replaces the previous draft wholesale. There is no locking and no
//! versioning; the last writer wins.

use chrono::{DateTime, Utc};
use shared_types::{draft_key, Draft, Section};

use crate::storage::{SharedStorage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Clone)]
pub struct DraftStore {
    storage: SharedStorage,
}

impl DraftStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Persist `sections` for `project_name` and return the timestamp written.
    pub async fn save(
        &self,
        project_name: &str,
        sections: &[Section],
    ) -> Result<DateTime<Utc>, DraftError> {
        let now = Utc::now();
        let mut sections = sections.to_vec();
        sections.sort_by_key(|section| section.order);
        let draft = Draft {
            sections,
            last_saved: Some(now),
        };
        let bytes =
            serde_json::to_vec(&draft).map_err(|e| DraftError::Serialization(e.to_string()))?;
        self.storage.set(&draft_key(project_name), bytes).await?;
        tracing::debug!(
            project = %project_name,
            sections = draft.sections.len(),
            "Draft saved"
        );
        Ok(now)
    }

    /// Load the draft for `project_name`.
    ///
    /// A missing or malformed record yields an empty draft with no
    /// `last_saved`; malformed data is logged and otherwise discarded.
    pub async fn load(&self, project_name: &str) -> Result<Draft, DraftError> {
        let Some(bytes) = self.storage.get(&draft_key(project_name)).await? else {
            return Ok(Draft::default());
        };

        match serde_json::from_slice::<Draft>(&bytes) {
            Ok(mut draft) => {
                draft.sections.sort_by_key(|section| section.order);
                Ok(draft)
            }
            Err(e) => {
                tracing::warn!(
                    project = %project_name,
                    error = %e,
                    "Saved draft is malformed; starting from an empty draft"
                );
                Ok(Draft::default())
            }
        }
    }

    pub async fn remove(&self, project_name: &str) -> Result<(), DraftError> {
        self.storage.remove(&draft_key(project_name)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StoragePort};
    use std::sync::Arc;

    fn section(title: &str, content: &str, order: u32) -> Section {
        let mut section = Section::new(title, order);
        section.content = content.to_string();
        section
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips_sections() {
        let store = DraftStore::new(Arc::new(MemoryStorage::new()));
        let sections = vec![
            section("Abstract", "Short summary.", 0),
            section("Introduction", "", 1),
        ];

        let saved_at = store.save("Thesis Draft", &sections).await.unwrap();
        let draft = store.load("Thesis Draft").await.unwrap();

        assert_eq!(draft.sections, sections);
        assert_eq!(draft.last_saved, Some(saved_at));
    }

    #[tokio::test]
    async fn test_load_missing_draft_is_empty() {
        let store = DraftStore::new(Arc::new(MemoryStorage::new()));
        let draft = store.load("nothing here").await.unwrap();
        assert!(draft.sections.is_empty());
        assert_eq!(draft.last_saved, None);
    }

    #[tokio::test]
    async fn test_malformed_draft_loads_as_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set("draft-Broken", b"{\"sections\": 12".to_vec())
            .await
            .unwrap();
        let store = DraftStore::new(storage);

        let draft = store.load("Broken").await.unwrap();
        assert_eq!(draft, Draft::default());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_draft() {
        let store = DraftStore::new(Arc::new(MemoryStorage::new()));
        store
            .save("p", &[section("Old", "old text", 0)])
            .await
            .unwrap();
        store
            .save("p", &[section("New", "new text", 0)])
            .await
            .unwrap();

        let draft = store.load("p").await.unwrap();
        assert_eq!(draft.sections.len(), 1);
        assert_eq!(draft.sections[0].title, "New");
    }

    #[tokio::test]
    async fn test_load_orders_sections() {
        let store = DraftStore::new(Arc::new(MemoryStorage::new()));
        let later = section("Second", "", 5);
        let earlier = section("First", "", 1);
        store.save("p", &[later, earlier]).await.unwrap();

        let titles: Vec<_> = store
            .load("p")
            .await
            .unwrap()
            .sections
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }
}
