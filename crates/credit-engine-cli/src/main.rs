mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::engine::{AnalyzeArgs, MpbfArgs, ParseArgs, RatiosArgs};

/// Deterministic credit underwriting over extracted CMA financials
#[derive(Parser)]
#[command(
    name = "cde",
    version,
    about = "Deterministic credit underwriting over extracted CMA financials",
    long_about = "Runs the rule-based credit decision engine over extracted CMA \
                  financial data: liquidity/leverage/DSCR ratios, the RBI MPBF \
                  working-capital ceiling, and the loan-scheme eligibility \
                  waterfall with a full decision trail."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full credit analysis (ratios + MPBF + scheme waterfall)
    Analyze(AnalyzeArgs),
    /// Compute liquidity, leverage, and DSCR ratios only
    Ratios(RatiosArgs),
    /// Compute the MPBF working-capital ceiling only
    Mpbf(MpbfArgs),
    /// Normalize a raw extraction payload into the CMA model
    Parse(ParseArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::engine::run_analyze(args),
        Commands::Ratios(args) => commands::engine::run_ratios(args),
        Commands::Mpbf(args) => commands::engine::run_mpbf(args),
        Commands::Parse(args) => commands::engine::run_parse(args),
        Commands::Version => {
            println!("cde {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
