use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Discover and extract country statistics from factbook field pages", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Discover the field schema of one category page
    Discover(DiscoverArgs),
    /// Extract one category page into a dataset
    Extract(ExtractArgs),
    /// Extract every category listed on the index page
    Scrape(ScrapeArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Args, Default)]
pub struct CommonArgs {
    /// Pipeline configuration YAML (threshold, special parsers, overrides)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Minimum number of countries a subfield must exceed to be kept
    #[arg(long)]
    pub threshold: Option<usize>,
    /// Character encoding of the source pages (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Category field page (HTML)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Category name used for field naming
    #[arg(short = 'c', long = "category")]
    pub category: String,
    /// Destination schema YAML (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Category field page (HTML)
    #[arg(short = 'i', long = "input", required_unless_present = "alternate")]
    pub input: Option<PathBuf>,
    /// Category name used for field naming and parser dispatch
    #[arg(short = 'c', long = "category")]
    pub category: String,
    /// Previously discovered schema to extract with instead of rediscovering
    #[arg(short = 's', long = "schema", conflicts_with = "alternate")]
    pub schema: Option<PathBuf>,
    /// Plain-text alternate source keyed by country name
    #[arg(long = "alternate")]
    pub alternate: Option<PathBuf>,
    /// Country name to code table (CSV with `name,code` header)
    #[arg(long = "country-codes")]
    pub country_codes: Option<PathBuf>,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// Index page listing every category (notesanddefs.html)
    #[arg(long = "index")]
    pub index: PathBuf,
    /// Restrict the run to these categories (repeatable)
    #[arg(long = "only", action = clap::ArgAction::Append)]
    pub only: Vec<String>,
    /// Directory holding `<Category>.txt` alternate sources
    #[arg(long = "alternate-dir")]
    pub alternate_dir: Option<PathBuf>,
    /// Country name to code table (CSV with `name,code` header)
    #[arg(long = "country-codes")]
    pub country_codes: Option<PathBuf>,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
    /// Exit with an error when any category fails
    #[arg(long)]
    pub strict: bool,
    #[command(flatten)]
    pub common: CommonArgs,
}
