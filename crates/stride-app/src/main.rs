//! Stride - next-edit prediction for editors
//!
//! After a rename, insert or delete, stride finds the other places in the
//! file where the same edit applies and offers them one at a time.

mod predict;
mod protocol;
mod server;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use predict::PredictArgs;
use stride_adapters::config::Config;
use stride_adapters::logging;

#[derive(Parser, Debug)]
#[command(
    name = "stride",
    about = "Next-edit prediction engine for editors",
    long_about = "Tracks edits to a buffer, finds structurally similar places where\n\
                  the same edit applies, and offers them for acceptance one by one.",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Speak the JSON-lines protocol on stdin/stdout
    Serve,
    /// Rename once in a file and list the suggestions it implies
    Predict(PredictArgs),
    /// Show the effective configuration and where it lives
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Save the effective configuration, overrides included, to the config file
    #[arg(long)]
    write: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();
    let config = Config::load();

    match cli.command {
        Commands::Serve => server::serve(&config).await,
        Commands::Predict(args) => predict::run(&args, &config),
        Commands::Config(args) => {
            if args.write {
                config.save().map_err(anyhow::Error::msg)?;
                eprintln!("  + wrote {}", Config::config_location());
            }
            println!("  Config file: {}", Config::config_location());
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
