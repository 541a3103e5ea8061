mod config;
mod error;
mod session;

use clap::Parser as ClapParser;
use config::{Cli, Config};
use session::Session;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config: Config = Cli::parse().into();
    init_logging(&config);

    let mut session = Session::new(config);
    if let Err(err) = session.run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
