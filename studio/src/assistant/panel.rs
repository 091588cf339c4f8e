//! Latest-wins result panels for assistant requests.
//!
//! Each request takes a ticket from the panel's sequencer. Only the result
//! carrying the newest ticket is applied; anything older that completes
//! afterwards is discarded.

use shared_types::{DetectionReport, GrammarIssue, Notification, WritingSuggestion};

use super::AssistantError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> RequestTicket {
        self.latest += 1;
        RequestTicket(self.latest)
    }

    pub fn is_latest(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelUpdate {
    Applied,
    /// A newer request was issued; this result was dropped.
    Stale,
    /// The latest request failed; items are untouched.
    Failed(Notification),
}

#[derive(Debug)]
pub struct AssistantPanel<T> {
    label: String,
    items: Vec<T>,
    loading: bool,
    sequencer: RequestSequencer,
}

impl<T> AssistantPanel<T> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            items: Vec::new(),
            loading: false,
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn begin(&mut self) -> RequestTicket {
        self.loading = true;
        self.sequencer.next()
    }

    pub fn finish(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<T>, AssistantError>,
    ) -> PanelUpdate {
        if !self.sequencer.is_latest(ticket) {
            tracing::debug!(panel = %self.label, "Discarding stale assistant result");
            return PanelUpdate::Stale;
        }
        self.loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                PanelUpdate::Applied
            }
            Err(e) => {
                tracing::warn!(panel = %self.label, error = %e, "Assistant request failed");
                PanelUpdate::Failed(Notification::destructive(
                    format!("{} failed", self.label),
                    e.to_string(),
                ))
            }
        }
    }
}

/// The assistant panels one document session keeps.
#[derive(Debug)]
pub struct AssistantPanels {
    pub suggestions: AssistantPanel<WritingSuggestion>,
    pub grammar: AssistantPanel<GrammarIssue>,
    /// At most one report.
    pub detection: AssistantPanel<DetectionReport>,
    /// At most one rewrite.
    pub humanize: AssistantPanel<String>,
}

impl Default for AssistantPanels {
    fn default() -> Self {
        Self {
            suggestions: AssistantPanel::new("Writing suggestions"),
            grammar: AssistantPanel::new("Grammar check"),
            detection: AssistantPanel::new("AI detection"),
            humanize: AssistantPanel::new("Humanize"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::NotificationSeverity;

    #[test]
    fn test_latest_result_wins() {
        let mut panel: AssistantPanel<&str> = AssistantPanel::new("Suggestions");
        let first = panel.begin();
        let second = panel.begin();
        assert!(panel.is_loading());

        assert_eq!(panel.finish(second, Ok(vec!["B"])), PanelUpdate::Applied);
        assert!(!panel.is_loading());
        assert_eq!(panel.finish(first, Ok(vec!["A"])), PanelUpdate::Stale);
        assert_eq!(panel.items(), &["B"]);
    }

    #[test]
    fn test_stale_completion_keeps_loading_for_latest() {
        let mut panel: AssistantPanel<u8> = AssistantPanel::new("Grammar");
        let first = panel.begin();
        let _second = panel.begin();
        assert_eq!(panel.finish(first, Ok(vec![1])), PanelUpdate::Stale);
        assert!(panel.is_loading());
        assert!(panel.items().is_empty());
    }

    #[test]
    fn test_failure_leaves_items_and_notifies() {
        let mut panel: AssistantPanel<&str> = AssistantPanel::new("Suggestions");
        let ticket = panel.begin();
        panel.finish(ticket, Ok(vec!["keep me"]));

        let ticket = panel.begin();
        let update = panel.finish(
            ticket,
            Err(AssistantError::Validation("too short".to_string())),
        );
        match update {
            PanelUpdate::Failed(notification) => {
                assert_eq!(notification.severity, NotificationSeverity::Destructive);
                assert_eq!(notification.title, "Suggestions failed");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(panel.items(), &["keep me"]);
        assert!(!panel.is_loading());
    }
}
