use std::path::{Path, PathBuf};

use anyhow::{Context, Error, Result};
use encoding_rs::Encoding;
use log::{error, info};

use crate::{
    alternate,
    catalog::CategoryLink,
    config::PipelineConfig,
    countries::CountryCodes,
    data::Dataset,
    document::Document,
    special,
};

/// Everything one category needs besides its own page.
pub struct PipelineContext<'a> {
    pub config: &'a PipelineConfig,
    pub codes: Option<&'a CountryCodes>,
    pub alternate_dir: Option<&'a Path>,
    pub encoding: &'static Encoding,
}

impl PipelineContext<'_> {
    fn alternate_source(&self, category: &str) -> Option<PathBuf> {
        let dir = self.alternate_dir?;
        let path = dir.join(format!(
            "{category}.{}",
            self.config.alternate.extension
        ));
        path.is_file().then_some(path)
    }
}

#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub dataset: Dataset,
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, Error)>,
}

impl ScrapeReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Parses a category from a plain-text alternate source.
pub fn process_alternate(
    category: &str,
    path: &Path,
    context: &PipelineContext<'_>,
) -> Result<Dataset> {
    let codes = context.codes.with_context(|| {
        format!("Alternate source {path:?} for '{category}' needs a country code table")
    })?;
    let alternate = &context.config.alternate;
    alternate::load_alternate(
        category,
        path,
        alternate.delimiter,
        alternate.kind_for(category),
        codes,
    )
}

/// Parses one category, preferring an alternate source when one exists,
/// then a registered special parser, then discovery and extraction.
pub fn process_category(
    category: &str,
    source: &Path,
    context: &PipelineContext<'_>,
) -> Result<Dataset> {
    if let Some(path) = context.alternate_source(category) {
        info!("Reading '{category}' from alternate source {path:?}");
        return process_alternate(category, &path, context);
    }
    let document = Document::load(source, context.encoding)?;
    special::parser_for(context.config, category)
        .parse(category, &document)
        .with_context(|| format!("Processing category '{category}' from {source:?}"))
}

/// Runs every category in turn. A failing category is logged and recorded;
/// the remaining categories still run.
pub fn scrape_catalog(links: &[CategoryLink], context: &PipelineContext<'_>) -> ScrapeReport {
    let mut report = ScrapeReport::default();
    for link in links {
        match process_category(&link.name, &link.source, context) {
            Ok(dataset) => {
                info!(
                    "Category '{}': {} field(s), {} value(s)",
                    link.name,
                    dataset.field_count(),
                    dataset.value_count()
                );
                report.dataset.merge(dataset);
                report.succeeded.push(link.name.clone());
            }
            Err(err) => {
                error!("Category '{}' failed: {err:#}", link.name);
                report.failed.push((link.name.clone(), err));
            }
        }
    }
    report
}
