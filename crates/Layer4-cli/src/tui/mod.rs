//! TUI (Terminal User Interface) module

mod app;
mod event;
mod panel;
mod theme;
mod widgets;

pub use app::run;
