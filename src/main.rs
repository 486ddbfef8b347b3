use color_eyre::{eyre::eyre, Result};
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use padstream::config;
use padstream::tracker::{EventKind, GilrsSource, InputStateTracker, TrackerHandle};

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let settings = config::load_or_default();
    info!("Tracker settings: {:?}", settings);

    let source =
        GilrsSource::new().map_err(|e| eyre!("Failed to open gamepad backend: {}", e))?;
    let mut tracker = InputStateTracker::create(Box::new(source), Some(settings));

    // Print every event the tracker emits.
    for kind in EventKind::ALL {
        tracker.on(kind, |event| info!("{:?}", event));
    }

    let handle =
        TrackerHandle::spawn(tracker).map_err(|e| eyre!("Failed to start polling: {}", e))?;

    info!("Polling for gamepad input, press Ctrl-C to stop");
    signal::ctrl_c().await?;

    info!("Shutting down with {} device(s) attached", handle.num_devices());
    handle.stop();
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
