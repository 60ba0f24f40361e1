//! SMA Tuner - Main Entry Point

use clap::Parser;
use sma_tuner::cli::{cmd_info, cmd_optimize, cmd_serve, Cli, Commands, OptimizeArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sma_tuner=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Optimize { data, target, drop, epoch, pop_size, seed, minmax, config, output, save } => {
            let args = OptimizeArgs {
                data,
                target,
                drop,
                epoch,
                pop_size,
                seed,
                minmax,
                config,
                output: Some(output),
                save,
            };
            // The search is CPU-bound; keep it off the async workers
            tokio::task::spawn_blocking(move || cmd_optimize(&args)).await??;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
        Commands::Serve { port, host } => {
            cmd_serve(&host, port).await?;
        }
    }

    Ok(())
}
