use clap::Parser;
use tracing_subscriber::EnvFilter;
use unset_refs::cli::commands::{
    cmd_ack, cmd_ack_all, cmd_assign, cmd_categories, cmd_reset, cmd_resolve, cmd_scan,
};
use unset_refs::cli::config::{Cli, Commands, load_config, log_level, resolve_paths};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    // Resolve file locations: CLI > config > defaults
    let config = load_config(cli.config.as_deref());
    let paths = resolve_paths(&cli, &config);

    match &cli.command {
        Commands::Scan {
            format,
            all,
            output,
        } => {
            cmd_scan(&paths, format, *all, output.as_deref())?;
        }
        Commands::Ack { id, path } => cmd_ack(&paths, id, path)?,
        Commands::AckAll { mode } => cmd_ack_all(&paths, mode)?,
        Commands::Reset => cmd_reset(&paths)?,
        Commands::Assign { id, path, value } => {
            cmd_assign(&paths, id, path, value.as_deref())?;
        }
        Commands::Resolve { id } => cmd_resolve(&paths, id)?,
        Commands::Categories { action } => cmd_categories(&paths, action)?,
    }

    Ok(())
}
