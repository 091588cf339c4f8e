//! Writing goals: word targets with optional deadlines.

use chrono::{NaiveDate, Utc};
use shared_types::{WritingGoal, KEY_GOALS};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::{read_json, write_json, SharedStorage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum GoalError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("goal not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub fn progress_percent(goal: &WritingGoal) -> u8 {
    if goal.target_words == 0 {
        return 100;
    }
    let pct = (u64::from(goal.current_words) * 100) / u64::from(goal.target_words);
    pct.min(100) as u8
}

pub fn is_complete(goal: &WritingGoal) -> bool {
    goal.current_words >= goal.target_words
}

/// Days until the deadline; negative once it has passed.
pub fn days_remaining(goal: &WritingGoal, today: NaiveDate) -> Option<i64> {
    goal.deadline
        .map(|deadline| deadline.signed_duration_since(today).num_days())
}

/// Words per day needed to hit the target by the deadline (the deadline day counts).
pub fn words_per_day_needed(goal: &WritingGoal, today: NaiveDate) -> Option<u32> {
    let remaining_words = goal.target_words.saturating_sub(goal.current_words);
    let days = days_remaining(goal, today)?;
    if remaining_words == 0 {
        return Some(0);
    }
    let days = (days + 1).max(1) as u32;
    Some(remaining_words.div_ceil(days))
}

#[derive(Clone)]
pub struct GoalStore {
    storage: SharedStorage,
    write_lock: Arc<Mutex<()>>,
}

impl GoalStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> Result<Vec<WritingGoal>, GoalError> {
        Ok(read_json(self.storage.as_ref(), KEY_GOALS)
            .await?
            .unwrap_or_default())
    }

    async fn write_all(&self, goals: &[WritingGoal]) -> Result<(), GoalError> {
        write_json(self.storage.as_ref(), KEY_GOALS, &goals).await?;
        Ok(())
    }

    pub async fn create(
        &self,
        title: &str,
        target_words: u32,
        deadline: Option<NaiveDate>,
    ) -> Result<WritingGoal, GoalError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(GoalError::Validation("goal title cannot be empty".to_string()));
        }
        if target_words == 0 {
            return Err(GoalError::Validation(
                "target word count must be positive".to_string(),
            ));
        }
        let goal = WritingGoal {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            target_words,
            current_words: 0,
            deadline,
            created_at: Utc::now(),
        };
        let _guard = self.write_lock.lock().await;
        let mut goals = self.list().await?;
        goals.push(goal.clone());
        self.write_all(&goals).await?;
        Ok(goal)
    }

    pub async fn update_progress(
        &self,
        id: &str,
        current_words: u32,
    ) -> Result<WritingGoal, GoalError> {
        let _guard = self.write_lock.lock().await;
        let mut goals = self.list().await?;
        let goal = goals
            .iter_mut()
            .find(|goal| goal.id == id)
            .ok_or_else(|| GoalError::NotFound(id.to_string()))?;
        goal.current_words = current_words;
        let updated = goal.clone();
        self.write_all(&goals).await?;
        if is_complete(&updated) {
            tracing::info!(goal_id = %updated.id, "Writing goal reached");
        }
        Ok(updated)
    }

    pub async fn remove(&self, id: &str) -> Result<(), GoalError> {
        let _guard = self.write_lock.lock().await;
        let mut goals = self.list().await?;
        let before = goals.len();
        goals.retain(|goal| goal.id != id);
        if goals.len() == before {
            return Err(GoalError::NotFound(id.to_string()));
        }
        self.write_all(&goals).await
    }
}
