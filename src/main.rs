use clap::Parser;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

mod api;
mod commands;
mod models;
mod services;
mod utils;

#[derive(Debug, Parser)]
#[command(name = "portfoliohut-web", version, about = "PortfolioHut returns chart and fragment loader")]
struct Args {
    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    let mut filter = EnvFilter::from_default_env();
    for directive in ["portfoliohut_web=debug", "reqwest=warn", "hyper=warn"] {
        if let Ok(directive) = directive.parse::<tracing_subscriber::filter::Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let settings = match utils::Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load settings: {}", e);
            std::process::exit(2);
        }
    };
    info!("Using PortfolioHut at {}", settings.base_url);

    if !commands::handle_command(args.command, &settings).await {
        std::process::exit(1);
    }
}
