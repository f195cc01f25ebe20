use std::path::PathBuf;

use clap::Parser;
use wallbot_core::config::SessionConfig;

/// Replays command files on the cable-suspended wall robot
#[derive(Parser, Debug)]
#[command(name = "wallbot", version, about = "wallbot - serial command replay")]
pub struct Args {
    /// Path to a JSON config file
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Serial port (e.g. COM3 or /dev/ttyACM0)
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Directory holding the command files
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// List serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity_level: u8,
}

impl Args {
    /// Apply command line overrides on top of the loaded config
    pub fn apply(&self, config: &mut SessionConfig) {
        if let Some(port) = &self.port {
            config.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(dir) = &self.dir {
            config.commands_dir = dir.clone();
        }
    }

    /// Default log filter for the chosen verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbosity_level {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
