//! Feature List Widget - the left-hand feature picker
//!
//! ```text
//! ┌ Features ──────────────┐
//! │ → 💬 Hello World       │
//! │   ⏱ Slow Task          │
//! │   ☕ Keep Awake         │
//! └────────────────────────┘
//! ```

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::tui::theme::{current_theme, icon_glyph, icons, Theme};

/// One row of the list
#[derive(Debug, Clone)]
pub struct FeatureItem {
    pub name: String,
    pub icon: String,
}

/// Highlight and active-feature state
#[derive(Debug, Clone, Default)]
pub struct FeatureListState {
    pub highlighted: usize,
    pub len: usize,
}

impl FeatureListState {
    pub fn new(len: usize) -> Self {
        Self { highlighted: 0, len }
    }

    pub fn next(&mut self) {
        if self.len > 0 {
            self.highlighted = (self.highlighted + 1) % self.len;
        }
    }

    pub fn previous(&mut self) {
        if self.len > 0 {
            self.highlighted = (self.highlighted + self.len - 1) % self.len;
        }
    }
}

pub struct FeatureList<'a> {
    items: &'a [FeatureItem],
    state: &'a FeatureListState,
    active: Option<&'a str>,
    focused: bool,
    theme: Theme,
}

impl<'a> FeatureList<'a> {
    pub fn new(items: &'a [FeatureItem], state: &'a FeatureListState) -> Self {
        Self {
            items,
            state,
            active: None,
            focused: false,
            theme: current_theme(),
        }
    }

    /// Name of the feature whose form is shown
    pub fn active(mut self, name: Option<&'a str>) -> Self {
        self.active = name;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for FeatureList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            self.theme.border_focused()
        } else {
            self.theme.border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(" Features ", self.theme.header()));

        if self.items.is_empty() {
            Paragraph::new(Line::styled(" No features loaded", self.theme.text_muted()))
                .block(block)
                .render(area, buf);
            return;
        }

        let lines: Vec<Line> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let marker = if self.active == Some(item.name.as_str()) {
                    icons::ARROW_RIGHT
                } else {
                    " "
                };
                let style = if i == self.state.highlighted && self.focused {
                    self.theme.selected()
                } else if i == self.state.highlighted {
                    self.theme.text_bold()
                } else {
                    self.theme.text()
                };
                Line::from(vec![
                    Span::styled(format!(" {} ", marker), self.theme.header()),
                    Span::styled(format!("{} {}", icon_glyph(&item.icon), item.name), style),
                ])
            })
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_wraps() {
        let mut state = FeatureListState::new(3);
        state.previous();
        assert_eq!(state.highlighted, 2);
        state.next();
        assert_eq!(state.highlighted, 0);

        let mut empty = FeatureListState::new(0);
        empty.next();
        empty.previous();
        assert_eq!(empty.highlighted, 0);
    }
}
