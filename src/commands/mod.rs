pub mod chart;
pub mod graph;
pub mod returns;

use clap::Subcommand;
use tracing::error;

use crate::utils::Settings;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the returns chart from the returns CSV
    Chart {
        /// CSV with DATE and Returns columns (defaults to RETURNS_CSV_PATH)
        #[arg(long)]
        csv: Option<String>,
        /// Output file (defaults to returns-chart.<format>)
        #[arg(long)]
        out: Option<String>,
        /// svg or png
        #[arg(long, default_value = "svg")]
        format: String,
    },
    /// Fetch a profile's returns table and print the resulting HTML
    ProfileReturns {
        username: String,
        /// Query string appended verbatim, e.g. "?year=2021"
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Fetch the returns graph figure and write it as SVG
    ReturnsGraph {
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, default_value = "returns-graph.svg")]
        out: String,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Chart { .. } => "chart",
            Command::ProfileReturns { .. } => "profile-returns",
            Command::ReturnsGraph { .. } => "returns-graph",
        }
    }
}

/// Run one command; returns false when it failed
pub async fn handle_command(command: Command, settings: &Settings) -> bool {
    let name = command.name();

    let result = match command {
        Command::Chart { csv, out, format } => {
            chart::execute(settings, csv.as_deref(), out.as_deref(), &format)
        }
        Command::ProfileReturns { username, query } => {
            returns::execute(settings, &username, &query).await
        }
        Command::ReturnsGraph { query, out } => graph::execute(settings, &query, &out).await,
    };

    if let Err(e) = result {
        error!("❌ Error executing command {}: {}", name, e);
        return false;
    }
    true
}
