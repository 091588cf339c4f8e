//! Writing assistant features built on a `CompletionClient`.
//!
//! Suggestions, grammar checking, AI-text detection, humanizing rewrites and
//! chat over an extracted PDF. Each feature validates its input, sends one
//! completion request, and parses the reply into typed results.

mod panel;

pub use panel::{AssistantPanel, AssistantPanels, PanelUpdate, RequestSequencer, RequestTicket};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use shared_types::{
    ChatMessage, DetectionReport, DetectionVerdict, GrammarIssue, WritingSuggestion,
};

use crate::completion::{CompletionError, SharedCompletionClient};

/// Minimum input length for grammar, detection and humanize requests.
pub const MIN_ANALYSIS_CHARS: usize = 50;
pub const MAX_SUGGESTIONS: usize = 5;
/// Document text beyond this is cut from the PDF chat system prompt.
pub const MAX_DOCUMENT_CHARS: usize = 12_000;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("could not parse assistant reply: {0}")]
    Parse(String),
}

/// A bulleted (`-`, `*`, `•`) or numbered (`1.`, `1)`) line.
static BULLET_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+?)\s*$").expect("bullet pattern is valid")
});

static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}").expect("integer pattern is valid"));

const SUGGESTIONS_PROMPT: &str = "You are an academic writing assistant. Suggest up to five concrete improvements to the following text. Reply with one suggestion per line as a bulleted list and nothing else.";

const GRAMMAR_PROMPT: &str = "You are a careful copy editor. Find grammar, spelling and punctuation problems in the following text. Reply with only a JSON array of objects with the fields \"original\", \"suggestion\" and \"explanation\". Reply with [] if there are none.";

const DETECT_PROMPT: &str = "Estimate how likely it is that the following text was written by an AI model. Reply with only a JSON object of the form {\"aiProbability\": N} where N is an integer from 0 to 100.";

const HUMANIZE_PROMPT: &str = "Rewrite the following text so it reads naturally, as if written by a thoughtful human academic. Keep the meaning and citations intact. Reply with only the rewritten text.";

#[derive(Clone)]
pub struct Assistant {
    client: SharedCompletionClient,
}

impl Assistant {
    pub fn new(client: SharedCompletionClient) -> Self {
        Self { client }
    }

    pub async fn suggestions(&self, text: &str) -> Result<Vec<WritingSuggestion>, AssistantError> {
        let text = require_text(text, 1)?;
        let reply = self.ask(SUGGESTIONS_PROMPT, text).await?;
        parse_suggestions(&reply)
    }

    pub async fn grammar(&self, text: &str) -> Result<Vec<GrammarIssue>, AssistantError> {
        let text = require_text(text, MIN_ANALYSIS_CHARS)?;
        let reply = self.ask(GRAMMAR_PROMPT, text).await?;
        parse_grammar(&reply)
    }

    pub async fn detect(&self, text: &str) -> Result<DetectionReport, AssistantError> {
        let text = require_text(text, MIN_ANALYSIS_CHARS)?;
        let reply = self.ask(DETECT_PROMPT, text).await?;
        let ai_probability = parse_probability(&reply)?;
        Ok(DetectionReport {
            ai_probability,
            verdict: DetectionVerdict::from_probability(ai_probability),
        })
    }

    pub async fn humanize(&self, text: &str) -> Result<String, AssistantError> {
        let text = require_text(text, MIN_ANALYSIS_CHARS)?;
        let reply = self.ask(HUMANIZE_PROMPT, text).await?;
        let rewritten = reply.trim();
        if rewritten.is_empty() {
            return Err(AssistantError::Parse("empty rewrite".to_string()));
        }
        Ok(rewritten.to_string())
    }

    /// Answer a question about a document whose text the caller already extracted.
    pub async fn pdf_chat(
        &self,
        document_text: &str,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<String, AssistantError> {
        let document_text = require_text(document_text, 1)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::Validation("question cannot be empty".to_string()));
        }

        let excerpt: String = document_text.chars().take(MAX_DOCUMENT_CHARS).collect();
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(format!(
            "You answer questions about the document below. Quote it where helpful and say so when the answer is not in it.\n\n---\n{excerpt}\n---"
        )));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(question));

        let reply = self.client.complete(&messages).await?;
        Ok(reply.trim().to_string())
    }

    async fn ask(&self, instructions: &str, text: &str) -> Result<String, AssistantError> {
        let messages = [ChatMessage::system(instructions), ChatMessage::user(text)];
        Ok(self.client.complete(&messages).await?)
    }
}

fn require_text(text: &str, min_chars: usize) -> Result<&str, AssistantError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AssistantError::Validation("text cannot be empty".to_string()));
    }
    if trimmed.chars().count() < min_chars {
        return Err(AssistantError::Validation(format!(
            "text must be at least {min_chars} characters"
        )));
    }
    Ok(trimmed)
}

fn parse_suggestions(reply: &str) -> Result<Vec<WritingSuggestion>, AssistantError> {
    Ok(reply
        .lines()
        .filter_map(|line| BULLET_LINE.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| WritingSuggestion {
            text: m.as_str().to_string(),
        })
        .take(MAX_SUGGESTIONS)
        .collect())
}

/// Strip a surrounding ``` fence (with or without a language tag).
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().trim_end_matches("```").trim()
}

fn parse_grammar(reply: &str) -> Result<Vec<GrammarIssue>, AssistantError> {
    let body = strip_code_fence(reply);
    let json = match (body.find('['), body.rfind(']')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => return Err(AssistantError::Parse("no JSON array in reply".to_string())),
    };
    serde_json::from_str(json).map_err(|e| AssistantError::Parse(e.to_string()))
}

fn parse_probability(reply: &str) -> Result<u8, AssistantError> {
    let body = strip_code_fence(reply);
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let number = value
            .get("aiProbability")
            .or_else(|| value.get("ai_probability"))
            .or_else(|| value.get("probability"))
            .unwrap_or(&value)
            .as_f64();
        if let Some(number) = number {
            return Ok(number.round().clamp(0.0, 100.0) as u8);
        }
    }

    INTEGER
        .find(body)
        .and_then(|m| m.as_str().parse::<u16>().ok())
        .map(|n| n.min(100) as u8)
        .ok_or_else(|| AssistantError::Parse("no probability in reply".to_string()))
}
