//! Per-category parsing strategies.
//!
//! Most categories go through [`GeneralParser`] (discovery, then extraction).
//! Categories whose pages do not fit that shape are routed by name, through
//! [`PipelineConfig::parsers`](crate::config::PipelineConfig), to one of the
//! bespoke parsers here.

use anyhow::Result;
use log::debug;

use crate::{
    config::{ExchangeConfig, ParserKind, PipelineConfig},
    data::{Dataset, Value},
    discovery::{self, DiscoveryOptions},
    document::Document,
    extract,
    normalize::{clean_name, coerce_numeric, coerce_text, is_missing_sentinel},
};

pub const CURRENCY_FIELD: &str = "Currency";
pub const EXCHANGE_RATE_FIELD: &str = "Exchange rate";

pub trait CategoryParser {
    fn parse(&self, category: &str, document: &Document) -> Result<Dataset>;
}

pub fn parser_for<'a>(config: &'a PipelineConfig, category: &str) -> Box<dyn CategoryParser + 'a> {
    match config.parser_for(category) {
        Some(ParserKind::GroupedPercent) => Box::new(GroupedPercentParser),
        Some(ParserKind::ExchangeRate) => Box::new(ExchangeRateParser::new(&config.exchange)),
        None => Box::new(GeneralParser::new(config.discovery_options(category))),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralParser {
    options: DiscoveryOptions,
}

impl GeneralParser {
    pub fn new(options: DiscoveryOptions) -> Self {
        Self { options }
    }
}

impl CategoryParser for GeneralParser {
    fn parse(&self, category: &str, document: &Document) -> Result<Dataset> {
        let schema = discovery::discover(document, category, &self.options)?;
        debug!(
            "Schema for '{category}': {:?}",
            schema
                .fields
                .iter()
                .map(|f| format!("{} ({})", f.name, f.kind))
                .collect::<Vec<_>>()
        );
        Ok(extract::extract(document, &schema))
    }
}

/// Two-level tables: a group label (e.g. "improved") carries forward across
/// the row's cells and each sub-label (e.g. "urban") becomes its own field,
/// `"<Category> <group> (<sub-label>)"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupedPercentParser;

impl CategoryParser for GroupedPercentParser {
    fn parse(&self, category: &str, document: &Document) -> Result<Dataset> {
        let mut dataset = Dataset::new();
        for (country, row) in document.identified_rows() {
            let mut group: Option<String> = None;
            for cell in &row.cells {
                if let Some(label) = cell.group.as_deref() {
                    group = Some(clean_name(label));
                }
                let (Some(name), Some(raw)) = (cell.name.as_deref(), cell.number.as_deref())
                else {
                    continue;
                };
                let field = match group.as_deref() {
                    Some(group) => format!("{category} {group} ({})", clean_name(name)),
                    None => format!("{category} ({})", clean_name(name)),
                };
                let number = coerce_numeric(raw);
                let value = if number.is_nan() && !is_missing_sentinel(raw) {
                    Value::Text(coerce_text(raw))
                } else {
                    Value::Number(number)
                };
                dataset.insert(&field, country, value);
            }
        }
        Ok(dataset)
    }
}

/// Currency name plus rate per US dollar, with manual overrides for
/// countries whose pages describe the currency only in prose.
#[derive(Debug, Clone)]
pub struct ExchangeRateParser<'a> {
    config: &'a ExchangeConfig,
}

impl<'a> ExchangeRateParser<'a> {
    pub fn new(config: &'a ExchangeConfig) -> Self {
        Self { config }
    }

    fn currency_name(raw: &str) -> String {
        let text = coerce_text(raw).replace("note: ", "");
        let text = if let Some(pos) = text.find("per US dollar") {
            text[..pos].to_string()
        } else if text.contains("uses the euro") {
            "euros (EUR)".to_string()
        } else {
            text
        };
        text.trim().to_string()
    }

    fn fallback_rate(&self, currency: &str) -> f64 {
        if currency.contains("US dollar") {
            1.0
        } else if currency.contains("euros") {
            self.config.euro_rate
        } else {
            f64::NAN
        }
    }
}

impl CategoryParser for ExchangeRateParser<'_> {
    fn parse(&self, _category: &str, document: &Document) -> Result<Dataset> {
        let mut dataset = Dataset::new();
        for (country, row) in document.identified_rows() {
            let Some(first) = row.cells.first() else {
                debug!("Row '{country}' has no currency cell");
                continue;
            };
            let label = first.name.as_deref().unwrap_or_default();
            let currency = Self::currency_name(&format!("{label} {}", first.text));
            let rate = row
                .cells
                .iter()
                .find_map(|cell| cell.number.as_deref())
                .map_or_else(|| self.fallback_rate(&currency), coerce_numeric);
            dataset.insert(CURRENCY_FIELD, country, Value::Text(currency));
            dataset.insert(EXCHANGE_RATE_FIELD, country, Value::Number(rate));
        }
        for (country, manual) in &self.config.overrides {
            dataset.set(CURRENCY_FIELD, country, Value::Text(manual.currency.clone()));
            dataset.set(EXCHANGE_RATE_FIELD, country, Value::Number(manual.rate));
        }
        Ok(dataset)
    }
}
