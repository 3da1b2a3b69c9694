mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Run => commands::run::run(config),
        Commands::Once => commands::once::run(config),
        Commands::Status => commands::status::run(),
        Commands::Evict { days } => commands::evict::run(config, days),
        Commands::History { stats, limit } => commands::history::run(stats, limit),
        Commands::CheckConfig => commands::check_config::run(config),
        Commands::Init { force } => commands::init::run(config, force),
        Commands::Version => commands::version::run(),
    }
}
