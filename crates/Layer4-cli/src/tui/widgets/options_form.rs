//! Options Form Widget - editable fields of the selected feature
//!
//! ```text
//! ┌ Slow Task ─────────────────────────┐
//! │ Iterations       60                │
//! │ Delay (seconds)  0.5▏              │
//! │                                    │
//! │ r run · Enter edit                 │
//! └────────────────────────────────────┘
//! ```

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use twirtee_core::FormWidget;

use crate::tui::theme::{current_theme, icons, Theme};

/// Field cursor and edit mode
#[derive(Debug, Clone, Default)]
pub struct OptionsFormState {
    pub selected: usize,
    pub editing: bool,
}

impl OptionsFormState {
    pub fn reset(&mut self) {
        self.selected = 0;
        self.editing = false;
    }

    pub fn next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

pub struct OptionsFormView<'a> {
    title: &'a str,
    form: Option<&'a FormWidget>,
    state: &'a OptionsFormState,
    focused: bool,
    theme: Theme,
}

impl<'a> OptionsFormView<'a> {
    pub fn new(title: &'a str, form: Option<&'a FormWidget>, state: &'a OptionsFormState) -> Self {
        Self {
            title,
            form,
            state,
            focused: false,
            theme: current_theme(),
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for OptionsFormView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            self.theme.border_focused()
        } else {
            self.theme.border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(format!(" {} ", self.title), self.theme.header()));

        let Some(form) = self.form else {
            Paragraph::new(Line::styled(
                " Select a feature and press Enter",
                self.theme.text_muted(),
            ))
            .block(block)
            .render(area, buf);
            return;
        };

        let label_width = form
            .fields()
            .iter()
            .map(|f| f.label.chars().count())
            .max()
            .unwrap_or(0);

        let mut lines: Vec<Line> = Vec::new();
        if form.is_empty() {
            lines.push(Line::styled(" No options", self.theme.text_muted()));
        }
        for (i, field) in form.fields().iter().enumerate() {
            let value = form.input(i).unwrap_or_default();
            let selected = self.focused && i == self.state.selected;
            let value_style = if selected {
                self.theme.selected()
            } else {
                self.theme.text()
            };
            let mut spans = vec![
                Span::styled(
                    format!(" {:<width$}  ", field.label, width = label_width),
                    self.theme.text_muted(),
                ),
                Span::styled(value, value_style),
            ];
            if selected && self.state.editing {
                spans.push(Span::styled(icons::CURSOR, self.theme.header()));
            }
            lines.push(Line::from(spans));
        }

        if !form.notes().is_empty() {
            lines.push(Line::raw(""));
            for note in form.notes() {
                lines.push(Line::styled(format!(" {}", note), self.theme.text_muted()));
            }
        }

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
