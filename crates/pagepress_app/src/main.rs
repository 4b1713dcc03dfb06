mod app;
mod cli;
mod config;
mod render;
mod runner;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use press_logging::LogDestination;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let destination = if args.verbose {
        LogDestination::Both(args.log_file.clone())
    } else {
        LogDestination::File(args.log_file.clone())
    };
    press_logging::initialize(destination, LevelFilter::Info);

    let mut config = config::load(args.config.as_deref())?;
    if let Some(transport) = args.transport {
        config.service.transport = transport;
    }
    if let Some(server) = &args.server {
        config.service.base_url = server.clone();
    }
    if let Some(out) = &args.out {
        config.output_dir = out.clone();
    }

    app::run_app(args, config)
}
