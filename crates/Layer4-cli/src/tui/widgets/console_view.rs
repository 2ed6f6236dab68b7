//! Console View Widget - tail of the output channel

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use twirtee_task::ConsoleBuffer;

use crate::tui::theme::{current_theme, Theme};

pub struct ConsoleView<'a> {
    buffer: &'a ConsoleBuffer,
    theme: Theme,
}

impl<'a> ConsoleView<'a> {
    pub fn new(buffer: &'a ConsoleBuffer) -> Self {
        Self {
            buffer,
            theme: current_theme(),
        }
    }

    /// Rendered lines for a given height, newest last
    fn visible_lines(&self, height: usize) -> Vec<String> {
        // pushed text may itself contain newlines
        let mut lines: Vec<String> = self
            .buffer
            .tail(height)
            .into_iter()
            .flat_map(|entry| entry.lines().map(str::to_string).collect::<Vec<_>>())
            .collect();
        if lines.len() > height {
            lines.drain(..lines.len() - height);
        }
        lines
    }
}

impl Widget for ConsoleView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .title(Span::styled(" Console ", self.theme.header()));

        let height = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .visible_lines(height)
            .into_iter()
            .map(|text| Line::styled(text, self.theme.text()))
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
