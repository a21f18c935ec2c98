// ABOUTME: CLI argument definitions for the partlens application
// ABOUTME: Defines the command-line interface structure using clap derive macros

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::check_temperature;
use crate::conversation::FormField;
use crate::validator::parse_field;

#[derive(Parser, Debug)]
#[command(name = "partlens")]
#[command(about = "Identify printing machine parts from photos", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output for debugging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Extra config file, applied over the standard locations
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the model to identify a part from photos and a short description
    Ask(AskArgs),
    /// Encode and compress images without calling the API
    Prepare(PrepareArgs),
}

#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Photo of the part (repeatable; JPEG, PNG, WebP or GIF)
    #[arg(long = "image", short = 'i', value_name = "PATH")]
    pub images: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Information about the part as Label=Value (repeatable)
    #[arg(long = "field", short = 'f', value_name = "LABEL=VALUE", value_parser = parse_field)]
    pub fields: Vec<FormField>,

    #[command(flatten)]
    pub images: ImageArgs,

    /// Model identifier (default: gpt-5)
    #[arg(long, short)]
    pub model: Option<String>,

    /// Sampling temperature between 0 and 2; ignored by reasoning models
    #[arg(long, value_parser = parse_temperature)]
    pub temperature: Option<f64>,

    /// Upper bound on generated tokens
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_tokens: Option<u32>,

    /// OpenAI API key (defaults to OPENAI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Chat-completions endpoint override
    #[arg(long)]
    pub api_url: Option<String>,

    /// Print the request payload instead of calling the API
    #[arg(long)]
    pub debug: bool,

    /// Keep asking follow-up questions after the first answer
    #[arg(long)]
    pub interactive: bool,

    /// Output as JSON
    #[arg(long, conflicts_with = "interactive")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub images: ImageArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Pretty print JSON output
    #[arg(long, requires = "json")]
    pub pretty: bool,
}

fn parse_temperature(raw: &str) -> Result<f64, String> {
    let temperature: f64 = raw
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    check_temperature(temperature)?;
    Ok(temperature)
}
