//! Per-project citation lists and bibliography formatting (APA, MLA, Chicago).

use shared_types::{citations_key, Citation, CitationKind, CitationStyle};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::{read_json, write_json, SharedStorage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum CitationError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("citation not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Clone)]
pub struct CitationStore {
    storage: SharedStorage,
    write_lock: Arc<Mutex<()>>,
}

impl CitationStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self, project_name: &str) -> Result<Vec<Citation>, CitationError> {
        Ok(read_json(self.storage.as_ref(), &citations_key(project_name))
            .await?
            .unwrap_or_default())
    }

    /// Validate and append; a fresh id replaces whatever the caller sent.
    pub async fn add(
        &self,
        project_name: &str,
        mut citation: Citation,
    ) -> Result<Citation, CitationError> {
        citation.title = citation.title.trim().to_string();
        citation.authors = citation
            .authors
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if citation.title.is_empty() {
            return Err(CitationError::Validation("title is required".to_string()));
        }
        if citation.authors.is_empty() {
            return Err(CitationError::Validation(
                "at least one author is required".to_string(),
            ));
        }
        citation.id = uuid::Uuid::new_v4().to_string();

        let _guard = self.write_lock.lock().await;
        let mut citations = self.list(project_name).await?;
        citations.push(citation.clone());
        write_json(
            self.storage.as_ref(),
            &citations_key(project_name),
            &citations,
        )
        .await?;
        Ok(citation)
    }

    pub async fn remove(&self, project_name: &str, id: &str) -> Result<(), CitationError> {
        let _guard = self.write_lock.lock().await;
        let mut citations = self.list(project_name).await?;
        let before = citations.len();
        citations.retain(|c| c.id != id);
        if citations.len() == before {
            return Err(CitationError::NotFound(id.to_string()));
        }
        write_json(
            self.storage.as_ref(),
            &citations_key(project_name),
            &citations,
        )
        .await?;
        Ok(())
    }

    /// Formatted entries sorted by the first author's family name.
    pub async fn bibliography(
        &self,
        project_name: &str,
        style: CitationStyle,
    ) -> Result<Vec<String>, CitationError> {
        let mut citations = self.list(project_name).await?;
        citations.sort_by_key(|c| {
            c.authors
                .first()
                .map(|a| split_name(a).0.to_lowercase())
                .unwrap_or_default()
        });
        Ok(citations
            .iter()
            .map(|c| format_citation(c, style))
            .collect())
    }
}

/// ("Family", "Given Names") from "Given Names Family".
fn split_name(full: &str) -> (String, String) {
    let parts: Vec<&str> = full.split_whitespace().collect();
    match parts.split_last() {
        Some((family, given)) => ((*family).to_string(), given.join(" ")),
        None => (String::new(), String::new()),
    }
}

fn initials(given: &str) -> String {
    given
        .split_whitespace()
        .filter_map(|part| part.chars().next())
        .map(|c| format!("{}.", c.to_uppercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn family_comma_given(full: &str) -> String {
    let (family, given) = split_name(full);
    if given.is_empty() {
        family
    } else {
        format!("{family}, {given}")
    }
}

fn apa_authors(authors: &[String]) -> String {
    let names: Vec<String> = authors
        .iter()
        .map(|author| {
            let (family, given) = split_name(author);
            let initials = initials(&given);
            if initials.is_empty() {
                family
            } else {
                format!("{family}, {initials}")
            }
        })
        .collect();
    match names.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{}, & {}", init.join(", "), last),
    }
}

fn mla_authors(authors: &[String]) -> String {
    match authors {
        [] => String::new(),
        [one] => family_comma_given(one),
        [first, second] => format!("{}, and {}", family_comma_given(first), second),
        [first, ..] => format!("{}, et al.", family_comma_given(first)),
    }
}

fn chicago_authors(authors: &[String]) -> String {
    match authors {
        [] => String::new(),
        [one] => family_comma_given(one),
        [first, middle @ .., last] => {
            let mut names = vec![family_comma_given(first)];
            names.extend(middle.iter().cloned());
            format!("{}, and {}", names.join(", "), last)
        }
    }
}

fn ensure_period(text: &str) -> String {
    if text.ends_with('.') || text.ends_with('?') || text.ends_with('!') {
        text.to_string()
    } else {
        format!("{text}.")
    }
}

pub fn format_citation(citation: &Citation, style: CitationStyle) -> String {
    let year = citation
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "n.d.".to_string());
    let source = citation.source.as_deref().unwrap_or_default();
    let link = citation
        .doi
        .as_deref()
        .map(|doi| format!("https://doi.org/{doi}"))
        .or_else(|| citation.url.clone());

    let mut out = match style {
        CitationStyle::Apa => {
            let mut s = format!(
                "{} ({}). {}",
                apa_authors(&citation.authors),
                year,
                ensure_period(&citation.title)
            );
            if !source.is_empty() {
                s.push(' ');
                s.push_str(source);
                if let Some(volume) = &citation.volume {
                    s.push_str(&format!(", {volume}"));
                }
                if let Some(pages) = &citation.pages {
                    s.push_str(&format!(", {pages}"));
                }
                s.push('.');
            }
            s
        }
        CitationStyle::Mla => {
            let title = match citation.kind {
                CitationKind::Book => citation.title.clone(),
                _ => format!("\"{}\"", ensure_period(&citation.title)),
            };
            let mut s = format!("{} {}", ensure_period(&mla_authors(&citation.authors)), title);
            if citation.kind == CitationKind::Book {
                s.push('.');
            }
            if !source.is_empty() {
                s.push_str(&format!(" {source}"));
                if let Some(volume) = &citation.volume {
                    s.push_str(&format!(", vol. {volume}"));
                }
                s.push(',');
            }
            s.push_str(&format!(" {year}"));
            if let Some(pages) = &citation.pages {
                s.push_str(&format!(", pp. {pages}"));
            }
            s.push('.');
            s
        }
        CitationStyle::Chicago => {
            let title = match citation.kind {
                CitationKind::Book => ensure_period(&citation.title),
                _ => format!("\"{}\"", ensure_period(&citation.title)),
            };
            let mut s = format!(
                "{} {}",
                ensure_period(&chicago_authors(&citation.authors)),
                title
            );
            if !source.is_empty() {
                s.push_str(&format!(" {source}"));
                if let Some(volume) = &citation.volume {
                    s.push_str(&format!(" {volume}"));
                }
            }
            s.push_str(&format!(" ({year})"));
            if let Some(pages) = &citation.pages {
                s.push_str(&format!(": {pages}"));
            }
            s.push('.');
            s
        }
    };

    if let Some(link) = link {
        out.push(' ');
        out.push_str(&link);
    }
    out
}
