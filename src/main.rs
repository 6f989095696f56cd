//! Command-line shell around the NVS reset core.
//!
//! Presentation only: wires a console notification sink into the protocol
//! engine and waits for the session to finish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use modi_nvs_reset::{NotificationSink, ResetEvent, ResetManager};

#[derive(Parser)]
#[command(
    name = "modi-nvs-reset",
    version,
    about = "Reset the persisted network configuration of a MODI+ network module"
)]
struct Cli {
    /// Serial port to use instead of auto-discovery
    #[arg(long)]
    port: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Sink that prints events to the console and remembers failures for the
/// exit code.
#[derive(Default)]
struct ConsoleSink {
    failed: AtomicBool,
}

impl NotificationSink for ConsoleSink {
    fn notify(&self, event: ResetEvent) {
        if event.is_failure() {
            self.failed.store(true, Ordering::SeqCst);
            eprintln!("{}", event.message());
        } else {
            println!("{}", event.message());
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let sink = Arc::new(ConsoleSink::default());
    let mut manager = ResetManager::new(sink.clone());

    let session = match cli.port.as_deref() {
        Some(port) => manager.start_session_on_port(port),
        None => manager.start_session(),
    };

    let handle = match session {
        Ok(handle) => handle,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    while handle.is_active() {
        thread::sleep(Duration::from_millis(100));
    }

    if sink.failed.load(Ordering::SeqCst) {
        std::process::exit(1);
    }
}
