mod browser;
mod cli;
mod config;
mod convert;
mod docs;
mod handlers;
mod lifecycle;
mod models;
mod routes;
mod server;

use clap::Parser;
use cli::{Cli, Mode};
use config::Config;
use convert::CliError;
use std::panic;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    let cli = Cli::parse();
    let mode = match cli.mode() {
        Ok(mode) => mode,
        Err(e) => return fail(e),
    };

    init_tracing(&mode);

    match mode {
        Mode::Convert { input, output } => match convert::convert_file(&input, output.as_deref()) {
            Ok(Some(yaml)) => {
                print!("{yaml}");
                ExitCode::SUCCESS
            }
            Ok(None) => {
                if let Some(output) = output {
                    eprintln!("Successfully converted {} to {}", input.display(), output.display());
                }
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        },
        Mode::Web { port } => run_web(port).await,
    }
}

fn init_tracing(mode: &Mode) {
    // Logs go to stderr; stdout carries converted YAML.
    let default_filter = match mode {
        Mode::Web { .. } => "json2yaml=debug,tower_http=debug,axum::rejection=trace,info",
        Mode::Convert { .. } => "warn",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();
}

async fn run_web(port: Option<u16>) -> ExitCode {
    println!("json2yaml - Web Mode");
    println!("Starting web interface...");

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });
    if let Some(port) = port {
        config.port = port;
    }

    match server::run(&config).await {
        Ok(reason) => {
            info!(%reason, "Goodbye");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn fail(e: CliError) -> ExitCode {
    eprintln!("Error: {e}");
    ExitCode::FAILURE
}
