//! Main TUI application

use crate::logging;
use crate::tui::event::{EventHandler, TuiEvent};
use crate::tui::panel::{Panel, PanelAction};
use crate::tui::theme::{set_theme, Theme};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use tracing::{error, info};
use twirtee_core::{builtin, FeatureEnv, FeatureRegistry};
use twirtee_foundation::{OutputSink, PanelConfig};
use twirtee_task::{ChannelSink, ConsoleBuffer, OutputChannel, TaskSupervisor};

type PanelTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Run the TUI application
pub async fn run(config: PanelConfig) -> anyhow::Result<()> {
    // Console first, so discovery errors and logs land in it
    let console = Arc::new(ConsoleBuffer::new(config.console.max_lines));
    let channel = OutputChannel::start(console.clone(), &config.console)?;
    let sink: Arc<dyn OutputSink> = Arc::new(ChannelSink::new(channel.clone()));
    logging::init_console(config.debug, sink.clone());

    let registry = FeatureRegistry::discover(&builtin::units(), &FeatureEnv::from(&config.features));
    info!(
        "{} ({}) loaded {} feature(s)",
        config.title(),
        config.phase,
        registry.len()
    );
    let supervisor = TaskSupervisor::new(sink, config.tasks.clone());
    set_theme(Theme::from_name(config.theme));

    let mut panel = Panel::new(&config, registry, supervisor, channel, console);

    let mut terminal = match setup_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            error!("Terminal setup failed: {}", e);
            panel.shutdown(config.tasks.shutdown_grace());
            return Err(e.into());
        }
    };

    let result = event_loop(&mut terminal, &mut panel, &config).await;

    // Restore the terminal even if the loop failed
    let restored = restore_terminal(&mut terminal);
    panel.shutdown(config.tasks.shutdown_grace());

    result?;
    restored?;
    Ok(())
}

fn setup_terminal() -> io::Result<PanelTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut PanelTerminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

async fn event_loop(
    terminal: &mut PanelTerminal,
    panel: &mut Panel,
    config: &PanelConfig,
) -> anyhow::Result<()> {
    let mut events = EventHandler::start(config.console.poll_interval())?;

    loop {
        terminal.draw(|frame| panel.render(frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        match event {
            TuiEvent::Quit => break,
            TuiEvent::Key(key) => {
                if let Some(PanelAction::Quit) = panel.handle_key(key) {
                    break;
                }
            }
            TuiEvent::Resize(_, _) => {
                // Terminal will handle resize automatically
            }
            TuiEvent::Tick => panel.tick(),
        }
    }

    info!("Leaving panel");
    Ok(())
}
