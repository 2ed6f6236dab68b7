//! Theme System - panel colors, styles and icon glyphs

use ratatui::style::{Color, Modifier, Style};
use twirtee_foundation::ThemeName;
use twirtee_task::TaskStatus;

/// Panel theme
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    /// Secondary text
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,

    // Status badges
    pub running: Color,
    pub stopping: Color,
    pub stopped: Color,
    pub completed: Color,
    pub error: Color,
}

impl Theme {
    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(22, 22, 26),            // #16161a
            fg: Color::Rgb(220, 220, 224),         // #dcdce0
            muted: Color::Rgb(128, 128, 140),      // #80808c
            accent: Color::Rgb(120, 180, 255),     // #78b4ff
            border: Color::Rgb(60, 60, 70),        // #3c3c46
            selection_bg: Color::Rgb(50, 80, 120), // #325078
            selection_fg: Color::Rgb(255, 255, 255),
            running: Color::Rgb(255, 200, 80),     // yellow
            stopping: Color::Rgb(255, 140, 0),     // orange
            stopped: Color::Rgb(128, 128, 128),    // gray
            completed: Color::Rgb(80, 200, 120),   // green
            error: Color::Rgb(255, 100, 100),      // red
        }
    }

    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(250, 250, 252),
            fg: Color::Rgb(30, 30, 40),
            muted: Color::Rgb(120, 120, 130),
            accent: Color::Rgb(0, 100, 200),
            border: Color::Rgb(220, 220, 225),
            selection_bg: Color::Rgb(200, 220, 250),
            selection_fg: Color::Rgb(0, 0, 0),
            running: Color::Rgb(200, 150, 0),
            stopping: Color::Rgb(220, 110, 0),
            stopped: Color::Rgb(120, 120, 120),
            completed: Color::Rgb(30, 150, 80),
            error: Color::Rgb(200, 60, 60),
        }
    }

    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }

    // === Style helpers ===

    pub fn text(&self) -> Style {
        Style::default().fg(self.fg)
    }

    pub fn text_muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn text_bold(&self) -> Style {
        Style::default().fg(self.fg).add_modifier(Modifier::BOLD)
    }

    pub fn header(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.selection_bg)
            .fg(self.selection_fg)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn success(&self) -> Style {
        Style::default().fg(self.completed)
    }

    pub fn warning(&self) -> Style {
        Style::default().fg(self.running)
    }

    pub fn info(&self) -> Style {
        Style::default().fg(self.accent)
    }

    /// Badge color for a task status
    pub fn status_color(&self, status: TaskStatus) -> Color {
        match status {
            TaskStatus::Running => self.running,
            TaskStatus::Stopping => self.stopping,
            TaskStatus::Stopped => self.stopped,
            TaskStatus::Completed => self.completed,
            TaskStatus::Error => self.error,
        }
    }

    pub fn status_badge(&self, status: TaskStatus) -> Style {
        Style::default()
            .fg(self.status_color(status))
            .add_modifier(Modifier::BOLD)
    }

    pub fn keybind(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn keybind_desc(&self) -> Style {
        Style::default().fg(self.muted)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

thread_local! {
    static CURRENT_THEME: std::cell::RefCell<Theme> = std::cell::RefCell::new(Theme::dark());
}

pub fn current_theme() -> Theme {
    CURRENT_THEME.with(|t| *t.borrow())
}

pub fn set_theme(theme: Theme) {
    CURRENT_THEME.with(|t| *t.borrow_mut() = theme);
}

// === Icons ===

pub mod icons {
    pub const DEFAULT: &str = "•";
    pub const CURSOR: &str = "▏";
    pub const ARROW_RIGHT: &str = "→";
    pub const WARNING: &str = "⚠";
}

/// Glyph for a feature icon identifier
///
/// Accepts bare names (`camera`) and prefixed ones (`fas.camera`).
pub fn icon_glyph(icon: &str) -> &'static str {
    let name = icon.rsplit('.').next().unwrap_or(icon);
    match name {
        "chat-bubble" | "chat" | "comment" => "💬",
        "time" | "clock" => "⏱",
        "coffee" => "☕",
        "camera" => "📷",
        "terminal" => "⌨",
        "folder" => "📁",
        "file" => "📄",
        _ => icons::DEFAULT,
    }
}
