mod cli;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use skyfetch_core::{App, AppError, Config};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    skyfetch_core::init()?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let app = App::new(config)?;

    tracing::info!("Skyfetch started");

    let outcome = run(&app, cli).await;
    app.shutdown();

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::debug!("Command failed: {}", e);
            eprintln!("error: {}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(app: &App, cli: Cli) -> Result<(), AppError> {
    let api_key = cli.api_key.as_deref();

    match cli.command {
        Command::Weather { cities, mode } => {
            let sdk = app.sdk(api_key, mode)?;
            for city in &cities {
                println!("{}", sdk.retrieve_json(city).await?);
            }
        }
        Command::Geocode { city } => {
            let sdk = app.sdk(api_key, None)?;
            println!("{}", sdk.geocoding_info_json(&city).await?);
        }
    }

    Ok(())
}
