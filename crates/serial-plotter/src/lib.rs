//! Serial Plotter
//!
//! Streams fixed-size binary samples from a serial device on a
//! background thread and renders the most recent ones as a live
//! scrolling line chart.

mod app;
mod config;
mod session;

pub use app::PlotterApp;
pub use config::{AppConfig, Cli, DisconnectPolicy, ENV_PREFIX};
pub use session::{Session, SessionError};

use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging, as JSON lines when `json` is set
pub fn init_logging(level: Level, json: bool) -> Result<(), SetGlobalDefaultError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}
