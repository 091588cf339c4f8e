//! One-shot hand-off flags passed between views (dashboard -> editor).

use shared_types::{
    KEY_ACTIVE_FEATURE, KEY_SELECTED_TEMPLATE, KEY_SHOW_CITATION_MANAGER, KEY_SHOW_PDF_READER,
};
use std::str::FromStr;

use crate::storage::{SharedStorage, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffFlag {
    ShowCitationManager,
    ShowPdfReader,
    SelectedTemplate,
    ActiveFeature,
}

impl HandoffFlag {
    pub fn key(&self) -> &'static str {
        match self {
            HandoffFlag::ShowCitationManager => KEY_SHOW_CITATION_MANAGER,
            HandoffFlag::ShowPdfReader => KEY_SHOW_PDF_READER,
            HandoffFlag::SelectedTemplate => KEY_SELECTED_TEMPLATE,
            HandoffFlag::ActiveFeature => KEY_ACTIVE_FEATURE,
        }
    }
}

/// Parses the storage key, e.g. `selected-template`.
impl FromStr for HandoffFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            KEY_SHOW_CITATION_MANAGER => Ok(HandoffFlag::ShowCitationManager),
            KEY_SHOW_PDF_READER => Ok(HandoffFlag::ShowPdfReader),
            KEY_SELECTED_TEMPLATE => Ok(HandoffFlag::SelectedTemplate),
            KEY_ACTIVE_FEATURE => Ok(HandoffFlag::ActiveFeature),
            other => Err(format!("unknown hand-off flag: {other}")),
        }
    }
}

#[derive(Clone)]
pub struct Handoff {
    storage: SharedStorage,
}

impl Handoff {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub async fn set(&self, flag: HandoffFlag, value: &str) -> Result<(), StorageError> {
        self.storage
            .set(flag.key(), value.as_bytes().to_vec())
            .await
    }

    pub async fn peek(&self, flag: HandoffFlag) -> Result<Option<String>, StorageError> {
        Ok(self
            .storage
            .get(flag.key())
            .await?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Read the flag and clear it.
    pub async fn take(&self, flag: HandoffFlag) -> Result<Option<String>, StorageError> {
        let value = self.peek(flag).await?;
        if value.is_some() {
            self.storage.remove(flag.key()).await?;
        }
        Ok(value)
    }

    /// Consume a boolean flag; anything but "true"/"1" reads as false.
    pub async fn take_bool(&self, flag: HandoffFlag) -> Result<bool, StorageError> {
        Ok(self
            .take(flag)
            .await?
            .map(|v| matches!(v.trim(), "true" | "1"))
            .unwrap_or(false))
    }
}
