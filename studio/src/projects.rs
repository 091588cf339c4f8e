//! Project list persisted under `writing-projects`.

use chrono::Utc;
use shared_types::{Project, KEY_PROJECTS};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::drafts::DraftStore;
use crate::storage::{read_json, write_json, SharedStorage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("project not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Clones share one write lock, so list updates never interleave.
#[derive(Clone)]
pub struct ProjectStore {
    storage: SharedStorage,
    drafts: DraftStore,
    write_lock: Arc<Mutex<()>>,
}

impl ProjectStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            drafts: DraftStore::new(storage.clone()),
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn read_all(&self) -> Result<Vec<Project>, ProjectError> {
        Ok(read_json(self.storage.as_ref(), KEY_PROJECTS)
            .await?
            .unwrap_or_default())
    }

    async fn write_all(&self, projects: &[Project]) -> Result<(), ProjectError> {
        write_json(self.storage.as_ref(), KEY_PROJECTS, &projects).await?;
        Ok(())
    }

    /// Names are unique ignoring case; drafts are keyed by project name.
    pub async fn create(&self, name: &str, description: &str) -> Result<Project, ProjectError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProjectError::Validation(
                "project name cannot be empty".to_string(),
            ));
        }

        let project = Project {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.trim().to_string(),
            last_edited: Utc::now(),
            word_count: 0,
            collaborators: 1,
        };

        let _guard = self.write_lock.lock().await;
        let mut projects = self.read_all().await?;
        if projects
            .iter()
            .any(|existing| existing.name.to_lowercase() == name.to_lowercase())
        {
            return Err(ProjectError::Validation(format!(
                "a project named \"{name}\" already exists"
            )));
        }
        projects.push(project.clone());
        self.write_all(&projects).await?;
        tracing::info!(project_id = %project.id, name = %project.name, "Project created");
        Ok(project)
    }

    /// All projects, most recently edited first.
    pub async fn list(&self) -> Result<Vec<Project>, ProjectError> {
        let mut projects = self.read_all().await?;
        projects.sort_by(|a, b| b.last_edited.cmp(&a.last_edited));
        Ok(projects)
    }

    /// Case-insensitive substring match on name or description.
    pub async fn search(&self, query: &str) -> Result<Vec<Project>, ProjectError> {
        let needle = query.trim().to_lowercase();
        let projects = self.list().await?;
        if needle.is_empty() {
            return Ok(projects);
        }
        Ok(projects
            .into_iter()
            .filter(|project| {
                project.name.to_lowercase().contains(&needle)
                    || project.description.to_lowercase().contains(&needle)
            })
            .collect())
    }

    pub async fn get(&self, id: &str) -> Result<Project, ProjectError> {
        self.read_all()
            .await?
            .into_iter()
            .find(|project| project.id == id)
            .ok_or_else(|| ProjectError::NotFound(id.to_string()))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Project>, ProjectError> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .find(|project| project.name == name))
    }

    /// Stamp `lastEdited` and the document word count on the named project.
    pub async fn record_activity(
        &self,
        name: &str,
        word_count: u32,
    ) -> Result<Option<Project>, ProjectError> {
        let _guard = self.write_lock.lock().await;
        let mut projects = self.read_all().await?;
        let Some(project) = projects.iter_mut().find(|project| project.name == name) else {
            return Ok(None);
        };
        project.word_count = word_count;
        project.last_edited = Utc::now();
        let updated = project.clone();
        self.write_all(&projects).await?;
        Ok(Some(updated))
    }

    /// Remove the project; its draft is removed best-effort.
    pub async fn delete(&self, id: &str) -> Result<Project, ProjectError> {
        let removed = {
            let _guard = self.write_lock.lock().await;
            let mut projects = self.read_all().await?;
            let Some(index) = projects.iter().position(|project| project.id == id) else {
                return Err(ProjectError::NotFound(id.to_string()));
            };
            let removed = projects.remove(index);
            self.write_all(&projects).await?;
            removed
        };

        if let Err(e) = self.drafts.remove(&removed.name).await {
            tracing::warn!(
                project = %removed.name,
                error = %e,
                "Project deleted but its draft could not be removed"
            );
        }
        tracing::info!(project_id = %removed.id, name = %removed.name, "Project deleted");
        Ok(removed)
    }
}
