//! Demo binary — renders the sample document and fades elements on demand.
//!
//! Run it, move the selection with `j`/`k`, then `i`/`o` to fade the
//! selected element in or out, Space to fade the popup, `q` to quit.

use std::io::{self, stdout};
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

use veil::app::{
    demo,
    event::{spawn_event_reader, AppEvent},
    handler,
    state::AppState,
};
use veil::config::AppConfig;
use veil::core::events::{Event, EventKind};
use veil::ui::{doc_widget::DocWidget, layout::AppLayout, theme::Theme};
use veil::FadeDirection;

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Element-tree fade demo")]
struct Cli {
    /// Fade duration in milliseconds (overrides the config file).
    #[arg(long)]
    fade_ms: Option<u64>,

    /// Frame tick in milliseconds (overrides the config file).
    #[arg(long)]
    tick_ms: Option<u64>,
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing (only when RUST_LOG is set).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr) // never pollute the alternate screen
        .init();

    let cli = Cli::parse();

    // ── build state ───────────────────────────────────────────
    let mut config = AppConfig::load();
    if let Some(ms) = cli.fade_ms {
        config.fade_duration_ms = ms.clamp(50, 10_000);
    }
    if let Some(ms) = cli.tick_ms {
        config.tick_ms = ms.clamp(8, 250);
    }

    let mut registry = veil::EventRegistry::new();
    let (doc, _popup) = demo::build(&mut registry)?;
    let mut state = AppState::new(doc, config);
    state.registry = registry;

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    // ── event loop ────────────────────────────────────────────
    let mut events = spawn_event_reader(state.config.tick_rate());

    loop {
        terminal.draw(|frame| {
            let layout = AppLayout::from_area(frame.area());

            let doc_block = Block::default()
                .title(" document ")
                .title_style(Theme::title_style())
                .borders(Borders::ALL)
                .border_style(Theme::border_style());

            let widget = DocWidget::new(&state.doc)
                .animator(&state.animator)
                .block(doc_block);
            frame.render_stateful_widget(widget, layout.doc_area, &mut state.doc_state);

            let hint = state.config.status_bar_hint();
            let status_text = state.status_message.as_deref().unwrap_or(&hint);
            let status = Paragraph::new(status_text).style(Theme::status_bar_style());
            frame.render_widget(status, layout.status_area);
        })?;

        match events.recv().await {
            Some(AppEvent::Key(key)) => handler::handle_key(&mut state, key),
            Some(AppEvent::Mouse(mouse)) => handler::handle_mouse(&mut state, mouse),
            Some(AppEvent::Resize(..)) => {}
            Some(AppEvent::Tick) => {
                // Advance every active ramp; completed fades become events
                // on the document's listener registry.
                let completed = state.animator.tick(&mut state.doc, Instant::now());
                for done in completed {
                    let detail = match done.direction {
                        FadeDirection::In => "in",
                        FadeDirection::Out => "out",
                    };
                    let ev = Event::new(EventKind::Custom("fade-done".into()), done.node)
                        .with_detail(detail);
                    state.registry.dispatch(&state.doc, ev);
                    state.status_message = Some(format!("node {} faded {detail}", done.node));
                }
            }
            None => break, // event reader gone
        }

        if state.should_quit {
            break;
        }
    }

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = state.config.save() {
        tracing::warn!(%err, "failed to persist config");
    }

    Ok(())
}
