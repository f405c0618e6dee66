/// Hush - ambient sound mixer for the terminal
use clap::Parser;
use hush_cli::{commands, AppConfig, Command, Flow};
use hush_core::{Catalog, FileStore};
use hush_playback::{Interaction, PlaybackSession, SimulatedBackend, SystemClock};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hush")]
#[command(about = "Mix ambient sounds with crossfaded loops and a sleep timer", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for saved settings
    #[arg(long, env = "HUSH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Session poll interval in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Length of each simulated sound in seconds
    #[arg(long)]
    track_length_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }
    if let Some(ms) = cli.poll_interval_ms {
        config.driver.poll_interval_ms = ms;
    }
    if let Some(secs) = cli.track_length_secs {
        config.driver.track_length_secs = secs;
    }
    config.validate()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let catalog = match &config.catalog.path {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::builtin(),
    };
    tracing::info!(
        sounds = catalog.sounds().len(),
        data_dir = %config.storage.data_dir.display(),
        "starting hush"
    );

    let clock = Arc::new(SystemClock::new());
    let backend = SimulatedBackend::new(clock.clone());
    backend.set_default_length(Duration::from_secs(config.driver.track_length_secs));

    let mut session = PlaybackSession::builder()
        .config(config.playback.clone())
        .catalog(catalog)
        .store(FileStore::new(config.storage.data_dir.clone()))
        .clock(clock)
        .start(backend);

    println!("{}", commands::render_status(session.state()));
    println!("type 'help' for commands");

    run(&mut session, Duration::from_millis(config.driver.poll_interval_ms)).await?;

    session.teardown();
    Ok(())
}

async fn run(session: &mut PlaybackSession, poll_interval: Duration) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.poll();
                for notice in session.drain_notices() {
                    println!("> {notice}");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                session.notify_user_interaction(Interaction::Pointer);

                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{e}");
                        continue;
                    }
                };
                match commands::execute(session, command) {
                    Ok(Flow::Continue(reply)) => println!("{reply}"),
                    Ok(Flow::Quit) => break,
                    Err(e) => eprintln!("{e}"),
                }
                for notice in session.drain_notices() {
                    println!("> {notice}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }
    Ok(())
}
