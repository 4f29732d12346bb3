//! Application configuration
//!
//! Layered, lowest precedence first: built-in defaults, an optional TOML
//! file, `SERIAL_PLOTTER_*` environment variables, command line flags.
//! Nested keys use a double underscore in the environment, e.g.
//! `SERIAL_PLOTTER_LINK__BAUD_RATE=57600`.

use clap::Parser;
use config::{Config, ConfigError, Environment, File, Map};
use plot_driver::{ByteOrder, ChartConfig, SampleFormat};
use serde::{Deserialize, Serialize};
use serial_link::ConnectionConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SERIAL_PLOTTER";

/// What the display does once the device disconnects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectPolicy {
    /// Keep the window open and show the last plot with a warning
    #[default]
    Hold,
    /// Close the window
    Exit,
}

/// Full application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serial connection
    pub link: ConnectionConfig,
    /// Sample encoding
    pub sample: SampleFormat,
    /// Points kept on the plot
    pub history_length: usize,
    /// Chart appearance
    pub chart: ChartConfig,
    /// Bound on the wait for the first record (milliseconds)
    pub ready_timeout_ms: u64,
    /// Disconnect handling
    pub on_disconnect: DisconnectPolicy,
    /// Max log level: trace, debug, info, warn or error
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            link: ConnectionConfig::default(),
            sample: SampleFormat::default(),
            history_length: rolling_history::DEFAULT_LENGTH,
            chart: ChartConfig::default(),
            ready_timeout_ms: 10_000,
            on_disconnect: DisconnectPolicy::Hold,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// Command line flags
#[derive(Debug, Default, Parser)]
#[command(
    name = "serial-plotter",
    version,
    about = "Live scrolling plot of binary samples read from a serial port"
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Serial port (e.g. /dev/ttyUSB0 or COM3)
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Number of points on the plot
    #[arg(short = 'n', long)]
    pub length: Option<usize>,

    /// Bytes per sample (sets both record size and sample width)
    #[arg(long)]
    pub bytes: Option<usize>,

    /// Samples are big-endian
    #[arg(long)]
    pub big_endian: bool,

    /// List serial ports and exit
    #[arg(long)]
    pub list_ports: bool,
}

impl AppConfig {
    /// Build the configuration from every source
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::load_with_env(cli, None)
    }

    /// Build the configuration, reading `SERIAL_PLOTTER_*` variables from
    /// `env` instead of the process environment when given
    fn load_with_env(cli: &Cli, env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::from(path.as_path()));
        }

        let mut config: AppConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        config.apply_cli(cli);
        Ok(config)
    }

    /// Override loaded values with explicit flags
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(port) = &cli.port {
            self.link.port = port.clone();
        }
        if let Some(baud) = cli.baud {
            self.link.baud_rate = baud;
        }
        if let Some(length) = cli.length {
            self.history_length = length;
        }
        if let Some(bytes) = cli.bytes {
            self.link.record_size = bytes;
            self.sample.width = bytes;
        }
        if cli.big_endian {
            self.sample.byte_order = ByteOrder::Big;
        }
    }

    /// Readiness wait bound
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// Parsed log level
    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse::<Level>()
            .map_err(|e| ConfigError::Message(format!("log_level {:?}: {}", self.log_level, e)))
    }
}
