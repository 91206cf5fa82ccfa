use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

#[derive(Parser)]
#[command(name = "niftydash")]
#[command(about = "News and NIFTY 50 market dashboard", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 5000)]
        port: u16,
    },
    /// Run the candle analysis over the universe and export it as CSV
    Analyze {
        /// First day of the analysis window (YYYY-MM-DD)
        #[arg(short, long)]
        start: Option<String>,

        /// Write the CSV here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the live index snapshot and ticker tape once
    Snapshot,
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            commands::serve::run(port).await;
        }
        Commands::Analyze { start, output } => {
            commands::analyze::run(start, output).await;
        }
        Commands::Snapshot => {
            commands::snapshot::run().await;
        }
    }
}
