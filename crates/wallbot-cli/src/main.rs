mod cli;
mod interrupt;
mod menu;

use anyhow::Context;
use clap::Parser;
use std::io;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wallbot_core::config::SessionConfig;
use wallbot_core::protocol::{list_ports, CancelToken};
use wallbot_core::session::Session;

use crate::cli::Args;
use crate::interrupt::Interrupt;
use crate::menu::Menu;

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(args) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if args.list_ports {
        for port in list_ports() {
            match port.product {
                Some(product) => println!("{}\t{}", port.name, product),
                None => println!("{}", port.name),
            }
        }
        return Ok(());
    }

    let mut config =
        SessionConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut config);
    info!(
        "using {} at {} baud, command files in {}",
        config.port,
        config.baud_rate,
        config.commands_dir.display()
    );

    let cancel = CancelToken::new();
    let interrupt = Interrupt::new(cancel.clone());
    interrupt
        .install()
        .context("failed to install Ctrl+C handler")?;

    let port = config.port.clone();
    let mut session = Session::open(config, cancel)
        .with_context(|| format!("could not connect to the robot on {port}"))?;

    {
        let _busy = interrupt.busy();
        session
            .handshake()
            .context("robot did not finish its setup")?;
    }

    let stdin = io::stdin();
    Menu::new(&mut session, interrupt, stdin.lock(), io::stdout()).run()
}
