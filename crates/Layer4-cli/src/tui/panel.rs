//! Panel - interactive state for the control panel
//!
//! ```text
//! TwirTee v0.1.0  DEV                                    1 active
//! ┌ Features ─────┐┌ Slow Task ─────────┐┌ Tasks (1 active) ──────┐
//! │ → ⏱ Slow Task ││ Iterations  60     ││ Task 1: Slow Task  ⟳   │
//! └───────────────┘└────────────────────┘└────────────────────────┘
//! ┌ Console ────────────────────────────────────────────────────────┐
//! │ [14:02:11] Started task 1: Slow Task                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use twirtee_core::{Feature, FeatureRegistry, OptionsForm};
use twirtee_foundation::{Phase, PanelConfig};
use twirtee_task::{ConsoleBuffer, OutputChannel, TaskSupervisor};

use crate::tui::theme::current_theme;
use crate::tui::widgets::{
    ConsoleView, FeatureItem, FeatureList, FeatureListState, HintMode, OptionsFormState,
    OptionsFormView, StatusBar, StatusBarState, TaskBoard, TaskBoardState,
};

/// Focused pane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Features,
    Options,
    Tasks,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Features => Focus::Options,
            Focus::Options => Focus::Tasks,
            Focus::Tasks => Focus::Features,
        }
    }

    fn previous(self) -> Self {
        match self {
            Focus::Features => Focus::Tasks,
            Focus::Options => Focus::Features,
            Focus::Tasks => Focus::Options,
        }
    }
}

/// Actions the event loop has to carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    Quit,
}

pub struct Panel {
    title: String,
    phase: Phase,

    registry: FeatureRegistry,
    supervisor: TaskSupervisor,
    channel: Arc<OutputChannel>,
    console: Arc<ConsoleBuffer>,

    items: Vec<FeatureItem>,
    focus: Focus,
    features: FeatureListState,
    /// Forms keep their edits while the user switches features
    forms: HashMap<String, OptionsForm>,
    active: Option<String>,
    form_state: OptionsFormState,
    board: TaskBoardState,
    status_bar: StatusBarState,
}

impl Panel {
    pub fn new(
        config: &PanelConfig,
        registry: FeatureRegistry,
        supervisor: TaskSupervisor,
        channel: Arc<OutputChannel>,
        console: Arc<ConsoleBuffer>,
    ) -> Self {
        let items: Vec<FeatureItem> = registry
            .iter()
            .map(|f| FeatureItem {
                name: f.name().to_string(),
                icon: f.icon().to_string(),
            })
            .collect();

        let mut status_bar = StatusBarState::new();
        let failed = registry.report().errors.len();
        if failed > 0 {
            status_bar.warning(format!("{} feature(s) failed to load, see console", failed));
        }

        Self {
            title: config.title(),
            phase: config.phase,
            features: FeatureListState::new(items.len()),
            items,
            registry,
            supervisor,
            channel,
            console,
            focus: Focus::Features,
            forms: HashMap::new(),
            active: None,
            form_state: OptionsFormState::default(),
            board: TaskBoardState::new(),
            status_bar,
        }
    }

    // ========================================================================
    // Input
    // ========================================================================

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PanelAction> {
        if self.form_state.editing {
            self.handle_edit_key(key);
            self.refresh_hints();
            return None;
        }

        match key.code {
            KeyCode::Char('q') => return Some(PanelAction::Quit),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Up => self.move_up(),
            KeyCode::Down => self.move_down(),
            KeyCode::Enter => self.activate(),
            KeyCode::Char('r') => self.run_active(),
            KeyCode::Char('s') => self.stop_selected(),
            KeyCode::Char('x') => self.dismiss_selected(),
            KeyCode::Char('c') => self.channel.clear(),
            _ => {}
        }
        self.refresh_hints();
        None
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let Some(form) = self.active_form() else {
            self.form_state.editing = false;
            return;
        };
        let widget = form.widget().clone();
        let index = self.form_state.selected;
        match key.code {
            KeyCode::Enter | KeyCode::Esc => self.form_state.editing = false,
            KeyCode::Backspace => widget.edit_input(index, |text| {
                text.pop();
            }),
            KeyCode::Char(c) => widget.edit_input(index, |text| text.push(c)),
            _ => {}
        }
    }

    fn move_up(&mut self) {
        match self.focus {
            Focus::Features => self.features.previous(),
            Focus::Options => self.form_state.previous(),
            Focus::Tasks => self.board.previous(),
        }
    }

    fn move_down(&mut self) {
        match self.focus {
            Focus::Features => self.features.next(),
            Focus::Options => {
                let len = self.active_form().map_or(0, |f| f.widget().fields().len());
                self.form_state.next(len);
            }
            Focus::Tasks => self.board.next(),
        }
    }

    fn activate(&mut self) {
        match self.focus {
            Focus::Features => {
                if let Some(item) = self.items.get(self.features.highlighted) {
                    let name = item.name.clone();
                    self.select_feature(&name);
                }
            }
            Focus::Options => {
                if self.active_form().is_some_and(|f| !f.widget().is_empty()) {
                    self.form_state.editing = true;
                }
            }
            Focus::Tasks => {}
        }
    }

    fn refresh_hints(&mut self) {
        let mode = match (self.focus, self.form_state.editing) {
            (_, true) => HintMode::Editing,
            (Focus::Features, _) => HintMode::Features,
            (Focus::Options, _) => HintMode::Options,
            (Focus::Tasks, _) => HintMode::Tasks,
        };
        self.status_bar.set_mode(mode);
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Show `name`'s option form
    pub fn select_feature(&mut self, name: &str) {
        let Some(feature) = self.registry.get(name) else {
            return;
        };
        self.forms
            .entry(name.to_string())
            .or_insert_with(|| feature.options());
        self.active = Some(name.to_string());
        self.form_state.reset();
        self.focus = Focus::Options;
        debug!("Selected feature {}", name);
    }

    fn active_feature(&self) -> Option<Arc<dyn Feature>> {
        self.active.as_deref().and_then(|name| self.registry.get(name))
    }

    fn active_form(&self) -> Option<&OptionsForm> {
        self.active.as_deref().and_then(|name| self.forms.get(name))
    }

    /// Start the active feature with its form
    pub fn run_active(&mut self) {
        let Some(feature) = self.active_feature() else {
            self.status_bar.info("Select a feature first");
            return;
        };
        let name = feature.name().to_string();
        let Some(result) = self
            .active_form()
            .map(|form| self.supervisor.start_form(feature, form))
        else {
            return;
        };
        match result {
            Ok(id) => self.status_bar.success(format!("Started task {}: {}", id, name)),
            Err(e) => self.status_bar.error(format!("Cannot start {}: {}", name, e)),
        }
    }

    fn stop_selected(&mut self) {
        let Some(id) = self.board.selected_id() else {
            return;
        };
        if !self.supervisor.stop(id) {
            self.status_bar.info(format!("Task {} is not running", id));
        }
    }

    fn dismiss_selected(&mut self) {
        let Some(id) = self.board.selected_id() else {
            return;
        };
        if let Err(e) = self.supervisor.dismiss(id) {
            self.status_bar.warning(e.to_string());
        }
    }

    /// Apply worker completions to the board
    pub fn tick(&mut self) {
        for event in self.supervisor.reconcile() {
            self.board.apply(event);
        }
        self.status_bar.check_timeout();
    }

    /// Stop tasks, retire features and close the console
    pub fn shutdown(&self, grace: Duration) {
        let active = self.supervisor.active_count();
        if active > 0 {
            warn!("Shutting down with {} active task(s)", active);
        }
        self.supervisor.shutdown(grace);
        self.registry.exit_all();
        self.channel.stop();
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    pub fn render(&self, frame: &mut Frame) {
        let theme = current_theme();
        frame.render_widget(
            Block::default().style(Style::default().bg(theme.bg).fg(theme.fg)),
            frame.area(),
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Percentage(45),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(35),
                Constraint::Percentage(40),
            ])
            .split(chunks[1]);

        frame.render_widget(
            FeatureList::new(&self.items, &self.features)
                .active(self.active.as_deref())
                .focused(self.focus == Focus::Features),
            top[0],
        );
        frame.render_widget(
            OptionsFormView::new(
                self.active.as_deref().unwrap_or("Options"),
                self.active_form().map(|f| f.widget()),
                &self.form_state,
            )
            .focused(self.focus == Focus::Options),
            top[1],
        );
        frame.render_widget(
            TaskBoard::new(&self.board).focused(self.focus == Focus::Tasks),
            top[2],
        );
        frame.render_widget(ConsoleView::new(&self.console), chunks[2]);
        frame.render_widget(StatusBar::new(&self.status_bar), chunks[3]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let theme = current_theme();
        let line = Line::from(vec![
            Span::styled(format!(" {} ", self.title), theme.header()),
            Span::styled(format!(" {} ", self.phase), theme.selected()),
            Span::styled(
                format!("  {} active", self.board.active_count()),
                theme.text_muted(),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}
