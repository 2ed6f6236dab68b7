//! Task Board Widget - one row per task with a colored status badge
//!
//! ```text
//! ┌ Tasks (1 active) ──────────────────────────┐
//! │ Task 1: Slow Task      ⟳ Running     14:02 │
//! │ Task 2: Hello World    ✓ Completed   14:03 │
//! └────────────────────────────────────────────┘
//! ```

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use twirtee_task::{TaskEvent, TaskId, TaskInfo, TaskStatus};

use crate::tui::theme::{current_theme, icons, Theme};

/// Board rows, kept in sync by applying supervisor events
#[derive(Debug, Clone, Default)]
pub struct TaskBoardState {
    rows: Vec<TaskInfo>,
    selected: usize,
}

impl TaskBoardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::Started(info) => {
                self.rows.push(info);
                self.rows.sort_by_key(|r| r.id);
            }
            TaskEvent::Stopping(id) => {
                if let Some(row) = self.row_mut(id) {
                    row.status = TaskStatus::Stopping;
                }
            }
            TaskEvent::Finished { id, status, error } => {
                if let Some(row) = self.row_mut(id) {
                    row.status = status;
                    row.error = error;
                    row.overdue = false;
                }
            }
            TaskEvent::Overdue(id) => {
                if let Some(row) = self.row_mut(id) {
                    row.overdue = true;
                }
            }
            TaskEvent::Dismissed(id) => {
                self.rows.retain(|r| r.id != id);
                self.clamp();
            }
        }
    }

    fn row_mut(&mut self, id: TaskId) -> Option<&mut TaskInfo> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    fn clamp(&mut self) {
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }

    pub fn rows(&self) -> &[TaskInfo] {
        &self.rows
    }

    pub fn selected(&self) -> Option<&TaskInfo> {
        self.rows.get(self.selected)
    }

    pub fn selected_id(&self) -> Option<TaskId> {
        self.selected().map(|r| r.id)
    }

    pub fn next(&mut self) {
        if !self.rows.is_empty() {
            self.selected = (self.selected + 1).min(self.rows.len() - 1);
        }
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn active_count(&self) -> usize {
        self.rows.iter().filter(|r| r.status.is_active()).count()
    }
}

pub struct TaskBoard<'a> {
    state: &'a TaskBoardState,
    focused: bool,
    theme: Theme,
}

impl<'a> TaskBoard<'a> {
    pub fn new(state: &'a TaskBoardState) -> Self {
        Self {
            state,
            focused: false,
            theme: current_theme(),
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn row_line(&self, index: usize, row: &TaskInfo) -> Line<'static> {
        let label_style = if self.focused && index == self.state.selected {
            self.theme.selected()
        } else {
            self.theme.text()
        };
        let mut spans = vec![
            Span::styled(format!(" {:<28}", row.label()), label_style),
            Span::styled(
                format!(" {} {:<10}", row.status.symbol(), row.status.display_name()),
                self.theme.status_badge(row.status),
            ),
            Span::styled(
                row.started_at.format("%H:%M:%S").to_string(),
                self.theme.text_muted(),
            ),
        ];
        if row.overdue {
            spans.push(Span::styled(
                format!("  {} not responding", icons::WARNING),
                self.theme.warning(),
            ));
        }
        if let Some(error) = &row.error {
            spans.push(Span::styled(format!("  {}", error), self.theme.error()));
        }
        Line::from(spans)
    }
}

impl Widget for TaskBoard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            self.theme.border_focused()
        } else {
            self.theme.border()
        };
        let title = format!(" Tasks ({} active) ", self.state.active_count());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(title, self.theme.header()));

        let lines: Vec<Line> = if self.state.rows.is_empty() {
            vec![Line::styled(" No tasks yet, press r to run", self.theme.text_muted())]
        } else {
            self.state
                .rows
                .iter()
                .enumerate()
                .map(|(i, row)| self.row_line(i, row))
                .collect()
        };

        // keep the selected row visible
        let visible = area.height.saturating_sub(2) as usize;
        let skip = (self.state.selected + 1).saturating_sub(visible);
        Paragraph::new(lines)
            .block(block)
            .scroll((skip as u16, 0))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(id: u64, name: &str) -> TaskEvent {
        TaskEvent::Started(TaskInfo::new(TaskId(id), name))
    }

    #[test]
    fn test_apply_lifecycle() {
        let mut board = TaskBoardState::new();
        board.apply(started(1, "Slow Task"));
        board.apply(started(2, "Hello World"));
        assert_eq!(board.active_count(), 2);

        board.apply(TaskEvent::Stopping(TaskId(1)));
        board.apply(TaskEvent::Overdue(TaskId(1)));
        assert_eq!(board.rows()[0].status, TaskStatus::Stopping);
        assert!(board.rows()[0].overdue);

        board.apply(TaskEvent::Finished {
            id: TaskId(1),
            status: TaskStatus::Stopped,
            error: None,
        });
        board.apply(TaskEvent::Finished {
            id: TaskId(2),
            status: TaskStatus::Error,
            error: Some("boom".into()),
        });
        assert_eq!(board.active_count(), 0);
        assert!(!board.rows()[0].overdue);
        assert_eq!(board.rows()[1].error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_dismiss_keeps_selection_in_range() {
        let mut board = TaskBoardState::new();
        board.apply(started(1, "A"));
        board.apply(started(2, "B"));
        board.next();
        assert_eq!(board.selected_id(), Some(TaskId(2)));

        board.apply(TaskEvent::Dismissed(TaskId(2)));
        assert_eq!(board.selected_id(), Some(TaskId(1)));
        board.apply(TaskEvent::Dismissed(TaskId(1)));
        assert_eq!(board.selected_id(), None);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut board = TaskBoardState::new();
        board.apply(TaskEvent::Stopping(TaskId(9)));
        board.apply(TaskEvent::Dismissed(TaskId(9)));
        assert!(board.rows().is_empty());
    }
}
