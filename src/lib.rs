pub mod alternate;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod countries;
pub mod data;
pub mod discovery;
pub mod document;
pub mod error;
pub mod extract;
pub mod io_utils;
pub mod markup;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod special;

use std::{env, io::Write, path::Path, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, CommonArgs, DiscoverArgs, ExtractArgs, OutputFormat, ScrapeArgs},
    config::PipelineConfig,
    countries::CountryCodes,
    data::Dataset,
    document::Document,
    pipeline::PipelineContext,
    schema::Schema,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("factbook_extract", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Discover(args) => handle_discover(&args),
        Commands::Extract(args) => handle_extract(&args),
        Commands::Scrape(args) => handle_scrape(&args),
    }
}

fn load_config(common: &CommonArgs) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load_or_default(common.config.as_deref())?;
    if let Some(threshold) = common.threshold {
        config.threshold = threshold;
    }
    debug!("Discovery threshold: {}", config.threshold);
    Ok(config)
}

fn load_codes(path: Option<&Path>) -> Result<Option<CountryCodes>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let codes = CountryCodes::load(path)?;
    if codes.is_empty() {
        warn!("Country code table {path:?} has no usable rows");
    } else {
        info!("Loaded {} country code(s) from {path:?}", codes.len());
    }
    Ok(Some(codes))
}

fn write_dataset(dataset: &Dataset, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    let mut writer = io_utils::open_output(output)?;
    match format {
        OutputFormat::Json => {
            dataset.write_json(&mut writer)?;
            writeln!(writer)?;
        }
        OutputFormat::Csv => dataset.write_csv(&mut writer)?,
    }
    writer.flush().context("Flushing dataset output")
}

fn handle_discover(args: &DiscoverArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let encoding = io_utils::resolve_encoding(args.common.input_encoding.as_deref())?;
    info!(
        "Discovering fields of '{}' in {:?}",
        args.category, args.input
    );
    let document = Document::load(&args.input, encoding)?;
    let options = config.discovery_options(&args.category);
    let schema = discovery::discover(&document, &args.category, &options)
        .with_context(|| format!("Discovering schema from {:?}", args.input))?;
    match args.output.as_deref() {
        Some(path) if !io_utils::is_dash(path) => {
            schema.save(path)?;
            info!(
                "Schema with {} field(s) written to {path:?}",
                schema.fields.len()
            );
        }
        _ => print!("{}", schema.to_yaml_string()?),
    }
    Ok(())
}

fn handle_extract(args: &ExtractArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let encoding = io_utils::resolve_encoding(args.common.input_encoding.as_deref())?;
    let codes = load_codes(args.country_codes.as_deref())?;
    let context = PipelineContext {
        config: &config,
        codes: codes.as_ref(),
        alternate_dir: None,
        encoding,
    };

    let dataset = if let Some(alternate) = &args.alternate {
        pipeline::process_alternate(&args.category, alternate, &context)?
    } else {
        let input = args
            .input
            .as_deref()
            .context("An input page is required unless --alternate is given")?;
        extract_page(args, input, &context)?
    };

    info!(
        "Extracted {} value(s) across {} field(s) for '{}'",
        dataset.value_count(),
        dataset.field_count(),
        args.category
    );
    write_dataset(&dataset, args.output.as_deref(), args.format)
}

fn extract_page(args: &ExtractArgs, input: &Path, context: &PipelineContext<'_>) -> Result<Dataset> {
    let Some(schema_path) = &args.schema else {
        return pipeline::process_category(&args.category, input, context);
    };
    let schema = Schema::load(schema_path)?;
    if schema.category != args.category {
        warn!(
            "Schema {schema_path:?} was discovered for '{}', not '{}'",
            schema.category, args.category
        );
    }
    let document = Document::load(input, context.encoding)?;
    Ok(extract::extract(&document, &schema))
}

fn handle_scrape(args: &ScrapeArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let encoding = io_utils::resolve_encoding(args.common.input_encoding.as_deref())?;
    let codes = load_codes(args.country_codes.as_deref())?;

    let mut links = catalog::read_catalog(&args.index, encoding)?;
    if !args.only.is_empty() {
        for wanted in &args.only {
            if !links.iter().any(|link| &link.name == wanted) {
                warn!("Category '{wanted}' is not listed in {:?}", args.index);
            }
        }
        links.retain(|link| args.only.contains(&link.name));
    }
    info!("Scraping {} categor(ies) from {:?}", links.len(), args.index);

    let context = PipelineContext {
        config: &config,
        codes: codes.as_ref(),
        alternate_dir: args.alternate_dir.as_deref(),
        encoding,
    };
    let report = pipeline::scrape_catalog(&links, &context);
    write_dataset(&report.dataset, args.output.as_deref(), args.format)?;
    info!(
        "{} categor(ies) succeeded, {} failed",
        report.succeeded.len(),
        report.failed.len()
    );

    if args.strict && !report.is_complete() {
        let names = report
            .failed
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        bail!("Failed categories: {names}");
    }
    Ok(())
}
