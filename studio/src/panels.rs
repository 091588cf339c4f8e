//! Side-panel visibility: citations, PDF reader and PDF chat are mutually exclusive.

use shared_types::Panel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelVisibility {
    visible: Option<Panel>,
}

impl PanelVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `panel` (hiding any other), or hide it if it is already showing.
    pub fn toggle(&mut self, panel: Panel) -> Option<Panel> {
        self.visible = if self.visible == Some(panel) {
            None
        } else {
            Some(panel)
        };
        self.visible
    }

    pub fn show(&mut self, panel: Panel) {
        self.visible = Some(panel);
    }

    pub fn hide_all(&mut self) {
        self.visible = None;
    }

    pub fn visible(&self) -> Option<Panel> {
        self.visible
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        self.visible == Some(panel)
    }
}
