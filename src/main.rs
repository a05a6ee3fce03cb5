use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    fs::OpenOptions,
    io,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

use credit_request::{app::App, config::Config, ui, AppContext};

const TICK: Duration = Duration::from_millis(100);

/// Fill in and submit a credit request from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "CREDIT_REQUEST_CONFIG", default_value = "credit-request.toml")]
    config: PathBuf,

    /// File that receives log output
    #[arg(long, env = "CREDIT_REQUEST_LOG", default_value = "credit-request.log")]
    log_file: PathBuf,

    /// Keep requests in memory, ignoring the configured store
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load_or_default(&args.config)?;
    if args.in_memory {
        config.store = Default::default();
    }

    init_logging(&args.log_file, &config.log.filter)?;
    tracing::info!(store = config.store.name(), "starting credit request form");

    let app = App::new(config.store.build(), AppContext::new());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "terminal loop failed");
        println!("{:?}", err)
    }

    Ok(())
}

/// Log to a file; the terminal is owned by the UI.
fn init_logging(path: &Path, default_filter: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        app.poll_background();
        terminal.draw(|f| ui::draw(f, &mut app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key)? {
                    tracing::info!("exiting");
                    return Ok(());
                }
            }
        }
    }
}
