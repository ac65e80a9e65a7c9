use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use massey_prep::cli::{self, RunArgs};
use massey_prep::config;

#[derive(Parser)]
#[command(name = "massey-prep")]
#[command(about = "Builds sparse least-squares systems for team ratings from game results")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch schedules and report the shape of the linear system
    Summary {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Fetch schedules and write the linear system as CSV files
    Export {
        #[command(flatten)]
        run: RunArgs,
        #[arg(short, long, default_value = "out")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let settings = config::Settings::from_env()?;

    match cli.command {
        Some(Commands::Summary { run }) => {
            let options = cli::RunOptions::resolve(&run, &settings)?;
            tracing::info!("Preparing {} system from {}", options.model, options.host);
            cli::summary(&options).await?;
        }
        Some(Commands::Export { run, out_dir }) => {
            let options = cli::RunOptions::resolve(&run, &settings)?;
            tracing::info!("Exporting {} system to {}", options.model, out_dir.display());
            cli::export(&options, &out_dir).await?;
        }
        None => {
            // Default to a summary with environment settings
            let options = cli::RunOptions::resolve(&RunArgs::default(), &settings)?;
            cli::summary(&options).await?;
        }
    }

    Ok(())
}
