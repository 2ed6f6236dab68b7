//! Status Bar Widget - key hints and transient notifications
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Tab focus │ ↑↓ move │ Enter select │ r run       │ c clear │ q quit │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use std::time::{Duration, Instant};

use crate::tui::theme::{current_theme, Theme};

/// How long a notification stays up
const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// One key hint
#[derive(Debug, Clone)]
pub struct StatusItem {
    pub key: String,
    pub description: String,
}

impl StatusItem {
    pub fn new(key: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: desc.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
}

/// Which hint set to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintMode {
    Features,
    Options,
    Editing,
    Tasks,
}

#[derive(Debug, Clone)]
pub struct StatusBarState {
    pub left_items: Vec<StatusItem>,
    pub right_items: Vec<StatusItem>,
    pub notification: Option<(String, NotificationType)>,
    notification_timeout: Option<Instant>,
}

impl StatusBarState {
    pub fn new() -> Self {
        Self {
            left_items: Self::items_for(HintMode::Features),
            right_items: vec![StatusItem::new("c", "clear"), StatusItem::new("q", "quit")],
            notification: None,
            notification_timeout: None,
        }
    }

    fn items_for(mode: HintMode) -> Vec<StatusItem> {
        match mode {
            HintMode::Features => vec![
                StatusItem::new("Tab", "focus"),
                StatusItem::new("↑↓", "move"),
                StatusItem::new("Enter", "select"),
                StatusItem::new("r", "run"),
            ],
            HintMode::Options => vec![
                StatusItem::new("Tab", "focus"),
                StatusItem::new("↑↓", "field"),
                StatusItem::new("Enter", "edit"),
                StatusItem::new("r", "run"),
            ],
            HintMode::Editing => vec![
                StatusItem::new("Enter", "done"),
                StatusItem::new("Esc", "done"),
                StatusItem::new("Backspace", "delete"),
            ],
            HintMode::Tasks => vec![
                StatusItem::new("Tab", "focus"),
                StatusItem::new("↑↓", "select"),
                StatusItem::new("s", "stop"),
                StatusItem::new("x", "dismiss"),
            ],
        }
    }

    pub fn set_mode(&mut self, mode: HintMode) {
        self.left_items = Self::items_for(mode);
    }

    pub fn notify(&mut self, message: impl Into<String>, notification_type: NotificationType) {
        self.notification = Some((message.into(), notification_type));
        self.notification_timeout = Some(Instant::now() + NOTIFICATION_TTL);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationType::Info);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationType::Success);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationType::Warning);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationType::Error);
    }

    pub fn clear_notification(&mut self) {
        self.notification = None;
        self.notification_timeout = None;
    }

    /// Drop an expired notification
    pub fn check_timeout(&mut self) {
        if self
            .notification_timeout
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            self.clear_notification();
        }
    }
}

impl Default for StatusBarState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StatusBar<'a> {
    state: &'a StatusBarState,
    theme: Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a StatusBarState) -> Self {
        Self {
            state,
            theme: current_theme(),
        }
    }

    fn render_items(&self, items: &[StatusItem]) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" │ ", self.theme.text_muted()));
            }
            spans.push(Span::styled(item.key.clone(), self.theme.keybind()));
            spans.push(Span::raw(" "));
            spans.push(Span::styled(item.description.clone(), self.theme.keybind_desc()));
        }
        spans
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border());
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 10 || inner.height < 1 {
            return;
        }

        if let Some((message, notification_type)) = &self.state.notification {
            let (icon, style) = match notification_type {
                NotificationType::Info => ("ℹ", self.theme.info()),
                NotificationType::Success => ("✓", self.theme.success()),
                NotificationType::Warning => ("⚠", self.theme.warning()),
                NotificationType::Error => ("✗", self.theme.error()),
            };
            Paragraph::new(Line::styled(format!("{} {}", icon, message), style))
                .alignment(Alignment::Center)
                .render(inner, buf);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
            .split(inner);

        let mut left = vec![Span::raw(" ")];
        left.extend(self.render_items(&self.state.left_items));
        Paragraph::new(Line::from(left))
            .alignment(Alignment::Left)
            .render(chunks[0], buf);

        let mut right = self.render_items(&self.state.right_items);
        right.push(Span::raw(" "));
        Paragraph::new(Line::from(right))
            .alignment(Alignment::Right)
            .render(chunks[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification() {
        let mut state = StatusBarState::new();
        assert!(state.notification.is_none());

        state.error("Cannot start Slow Task");
        assert_eq!(
            state.notification.as_ref().map(|(_, t)| *t),
            Some(NotificationType::Error)
        );

        // not expired yet
        state.check_timeout();
        assert!(state.notification.is_some());

        state.clear_notification();
        assert!(state.notification.is_none());
    }

    #[test]
    fn test_mode_switching() {
        let mut state = StatusBarState::new();
        state.set_mode(HintMode::Tasks);
        assert!(state.left_items.iter().any(|i| i.description == "stop"));

        state.set_mode(HintMode::Editing);
        assert!(state.left_items.iter().all(|i| i.key != "r"));
    }
}
