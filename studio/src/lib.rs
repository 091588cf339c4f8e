//! Studio - academic writing workspace backend
//!
//! Sectioned documents with drafts persisted through an injected storage
//! port, an autosave actor per open document, projects, citations, writing
//! goals, document export, and completion-backed writing assistance served
//! over an axum REST API.

pub mod api;
pub mod app_state;
pub mod assistant;
pub mod autosave;
pub mod citations;
pub mod completion;
pub mod config;
pub mod drafts;
pub mod editor;
pub mod export;
pub mod goals;
pub mod handoff;
pub mod markdown;
pub mod panels;
pub mod projects;
pub mod session;
pub mod storage;
pub mod templates;
