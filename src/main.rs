mod app;
mod ui;

use std::io::{self, Stdout};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use app::App;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use minecasino::config::Config;
use minecasino::schedule::TickSource;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt};

use crate::ui::draw;

const TICK_RATE: Duration = Duration::from_millis(200);

enum Event<I> {
    Input(I),
    Tick(Duration),
}

fn main() -> Result<()> {
    let config = Config::from_env().context("reading configuration")?;
    let _guard = init_tracing(&config)?;
    info!(data_dir = %config.data_dir.display(), "starting");

    let mut app = App::new(&config)?;
    let mut terminal = setup_terminal()?;
    let res = run_app(&mut terminal, &mut app);
    app.shutdown();
    restore_terminal(&mut terminal)?;
    res
}

/// Logs go to a daily file under the data directory; stdout belongs to the
/// dashboard.
fn init_tracing(config: &Config) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating {}", config.data_dir.display()))?;
    let appender = rolling::daily(&config.data_dir, "minecasino.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let (tx, rx) = mpsc::channel();

    let input_tx = tx.clone();
    thread::spawn(move || {
        loop {
            if !event::poll(Duration::from_millis(250)).unwrap_or(false) {
                continue;
            }
            match event::read() {
                Ok(CEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    if input_tx.send(Event::Input(key)).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => {}
            }
        }
    });

    let mut ticks = TickSource::spawn(TICK_RATE, tx, Event::Tick);

    loop {
        terminal.draw(|f| draw(f, app))?;

        match rx.recv()? {
            Event::Input(key) => {
                app.on_key(key);
            }
            Event::Tick(dt) => {
                app.on_tick(dt);
            }
        }

        if app.should_quit {
            break;
        }
    }

    ticks.stop();
    Ok(())
}
