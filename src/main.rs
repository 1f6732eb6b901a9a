// dcvfix - DCV remote recovery TUI
// Main entry point

use anyhow::Result;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dcvfix::app::App;
use dcvfix::config::Config;
use dcvfix::error::DcvfixError;
use dcvfix::events::{spawn_input_handler, spawn_ticker, AppEvent};
use dcvfix::remote::validate_host;
use dcvfix::version::build_info;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use tokio::sync::mpsc;

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

#[derive(Parser, Debug)]
#[command(name = "dcvfix")]
#[command(author, about, long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Prefill the login form with this host (IPv4)
    #[arg(long)]
    host: Option<String>,

    /// Show version information
    #[arg(short = 'V', long)]
    version: bool,

    /// Show detailed build information
    #[arg(long)]
    build_info: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", build_info().format_display());
        return Ok(());
    }

    if cli.build_info {
        println!("{}", build_info().format_detailed());
        println!("\n{}", build_info().format_build_info());
        return Ok(());
    }

    if let Some(host) = &cli.host {
        validate_host(host).map_err(|e| DcvfixError::Config(e.to_string()))?;
    }

    let config = Config::load(cli.config)
        .map_err(|e| DcvfixError::Config(e.to_string()))?;

    // Initialize logging to file
    let log_file = std::fs::File::create(&config.log_file)?;
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false) // Disable ANSI colors in log file
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(
        "{} starting, logging to {}",
        build_info().format_detailed(),
        config.log_file.display()
    );

    run_tui(config, cli.host).await?;

    Ok(())
}

async fn run_tui(config: Config, host: Option<String>) -> Result<()> {
    enable_raw_mode().map_err(|e| DcvfixError::Terminal(e.to_string()))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|e| DcvfixError::Terminal(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel::<AppEvent>(100);
    spawn_input_handler(tx.clone()).await;
    spawn_ticker(tx.clone(), config.tick_interval()).await;

    let app = App::new(tx, config, host);
    let result = event_loop(&mut terminal, app, rx).await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!("dcvfix exited with error: {}", e);
    }
    result?;

    println!("dcvfix exited. Goodbye!");

    Ok(())
}

async fn event_loop(terminal: &mut Tui, mut app: App, mut rx: mpsc::Receiver<AppEvent>) -> Result<()> {
    loop {
        if app.needs_full_redraw {
            terminal.clear()?;
            app.needs_full_redraw = false;
        }

        terminal.draw(|f| app.render(f))?;

        match rx.recv().await {
            Some(event) => {
                app.handle_event(event).await?;
                if app.should_quit {
                    tracing::info!("Quit requested");
                    return Ok(());
                }
            }
            None => return Ok(()),
        }
    }
}
