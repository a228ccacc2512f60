// ABOUTME: Entry point for the adapt command-line tool
// ABOUTME: Parses subcommands and dispatches to generate, validate, render, or serve

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process;

mod cli;

use cli::generate::GenerateOptions;

#[derive(Parser)]
#[command(name = "adapt")]
#[command(about = "Adapt - generate, validate, render, and repair UI components")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a component and repair it until it renders
    Generate {
        /// What the component should do
        prompt: String,
        #[arg(long, help = "Mood hint as label:score, e.g. calm:7")]
        mood: Option<String>,
        #[arg(long, help = "Extra context for the generator (repeatable)")]
        context: Vec<String>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10))]
        max_attempts: Option<u32>,
    },
    /// Validate a component module and print the result as JSON
    Validate {
        file: PathBuf,
        #[arg(long, help = "Only run the local heuristics")]
        offline: bool,
    },
    /// Render a component module once inside the sandbox guest
    Render {
        file: PathBuf,
        #[arg(long, help = "Props as a JSON object")]
        props: Option<String>,
    },
    /// Start the HTTP API server
    Serve {
        #[arg(long, help = "Port to listen on (default: ADAPT_API_PORT or 4010)")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    adapt_cli::init_tracing();

    let cli = Cli::parse();

    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Generate {
            prompt,
            mood,
            context,
            max_attempts,
        } => {
            cli::generate::run(GenerateOptions {
                prompt,
                mood,
                context,
                max_attempts,
            })
            .await
        }
        Commands::Validate { file, offline } => cli::validate::run(&file, offline).await,
        Commands::Render { file, props } => cli::render::run(&file, props.as_deref()).await,
        Commands::Serve { port } => cli::serve::run(port).await,
    }
}
