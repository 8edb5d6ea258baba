use anyhow::Result;
use clap::Parser;
use log::info;

mod cli;

use cli::{Cli, Commands};
use wikit::{api, config, tui};

#[tokio::main]
async fn main() -> Result<()> {
    // the TUI owns the terminal, so logs go to a file (truncated on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("wikit.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    info!("Starting wikit");

    let instance = cli.instance.as_deref();
    match cli.command {
        Some(Commands::Instances(args)) => cli::commands::instances_command(args).await?,
        Some(Commands::Pages(args)) => cli::commands::pages_command(args, instance).await?,
        Some(Commands::Tui) | None => cli::commands::tui_command(instance).await?,
    }

    Ok(())
}
