mod app;
mod cache;
mod config;
mod error;
mod github;
mod loader;
mod logging;
mod models;
mod navigation;
mod network;
mod page;
mod reveal;
mod sections;
mod theme;
mod ui;
mod utils;

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tracing::{info, warn};

use crate::app::App;
use crate::cache::{FileStore, SystemClock, TimeBoxedCache};
use crate::config::{Environment, Settings};
use crate::github::RepoStatsClient;
use crate::loader::{ContentLoader, ContentSource};
use crate::network::{HttpTransport, ReqwestTransport};

/// Poll timeout while nothing moves on screen.
const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Where content comes from: the published site or a local directory
    #[arg(long, value_enum)]
    env: Option<Environment>,

    /// Local content directory, implies development mode
    #[arg(long)]
    data_dir: Option<String>,

    /// Empty the content cache before starting
    #[arg(long)]
    clear_cache: bool,

    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// More log detail (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Raw mode, alternate screen and mouse capture for as long as it lives.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture);
        let _ = self.terminal.show_cursor();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::new().context("loading configuration")?;
    if let Some(env) = cli.env {
        settings.environment = env;
    }
    if let Some(dir) = cli.data_dir {
        settings.environment = Environment::Development;
        settings.local_path = dir;
    }
    let log_path = cli.log_file.unwrap_or_else(|| settings.log_file());
    logging::init_logging(&log_path, cli.verbose)?;

    let store = FileStore::new(settings.cache_dir());
    if cli.clear_cache {
        let removed = store.clear().context("clearing the content cache")?;
        info!(removed, "cache cleared");
    }

    let runtime = tokio::runtime::Runtime::new().context("starting the async runtime")?;
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());
    let source = ContentSource::select(&settings);
    info!(source = %source.describe(), "content source");
    let loader = ContentLoader::new(
        source,
        transport.clone(),
        TimeBoxedCache::new(Arc::new(store), Arc::new(SystemClock)),
    );
    let stats_client = RepoStatsClient::new(transport, settings.github_api_url.clone());
    let tick_rate = Duration::from_millis(settings.tick_rate_ms.max(1));

    let mut app = App::new(
        settings,
        Arc::new(loader),
        Arc::new(stats_client),
        runtime.handle().clone(),
        Instant::now(),
    );
    app.start();

    let result = run(&mut app, tick_rate);
    app.shutdown();

    if let Err(e) = config::save_sidebar_collapsed(app.nav.state().sidebar_collapsed) {
        warn!(error = %e, "could not remember sidebar state");
    }
    runtime.shutdown_timeout(Duration::from_millis(200));
    result
}

fn run(app: &mut App, tick_rate: Duration) -> anyhow::Result<()> {
    let mut session = TerminalSession::enter().context("setting up the terminal")?;
    let size = session.terminal.size()?;
    app.resize(Rect::new(0, 0, size.width, size.height));

    while !app.should_quit {
        let now = Instant::now();
        app.tick(now);
        session.terminal.draw(|f| ui::draw(f, app, now))?;

        let timeout = if app.is_animating(now) { tick_rate } else { IDLE_POLL.max(tick_rate) };
        if event::poll(timeout)? {
            let now = Instant::now();
            match event::read()? {
                Event::Key(key) => app.handle_key(key, now),
                Event::Mouse(mouse) => app.handle_mouse(mouse, now),
                Event::Resize(width, height) => app.resize(Rect::new(0, 0, width, height)),
                _ => {}
            }
        }
    }
    info!("quitting");
    Ok(())
}
