use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rental_yield::api::{self, Cli, Command, FieldNames};
use rental_yield::config::AppConfig;
use rental_yield::core::ProjectionAssumptions;
use rental_yield::error::CalculateError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Calculate { args, format } => {
            let defaults = ProjectionAssumptions::default();
            let output = api::build_request(&args, defaults, &FieldNames::CLI)
                .map_err(CalculateError::from)
                .and_then(|request| api::render_calculation(&request, format));
            match output {
                Ok(text) => print!("{text}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Serve { port, host, config } => {
            let mut app_config = match config {
                Some(path) => match AppConfig::from_file(&path) {
                    Ok(loaded) => {
                        info!("Loaded configuration from {}", path.display());
                        loaded
                    }
                    Err(e) => {
                        eprintln!("Config error: {e}");
                        std::process::exit(1);
                    }
                },
                None => AppConfig::default(),
            };
            if let Some(port) = port {
                app_config.port = port;
            }
            if let Some(host) = host {
                app_config.host = host;
            }

            if let Err(e) = api::run_http_server(app_config).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
    }
}
