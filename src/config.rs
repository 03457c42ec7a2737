//! Pipeline configuration: discovery threshold, special-parser dispatch,
//! per-category name normalization, and exchange-rate overrides.
//!
//! Loaded from YAML; every section is optional and falls back to the
//! built-in defaults below.

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    discovery::{DEFAULT_THRESHOLD, DiscoveryOptions, NameNormalization},
    schema::ValueKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParserKind {
    GroupedPercent,
    ExchangeRate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyOverride {
    pub currency: String,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub euro_rate: f64,
    pub overrides: BTreeMap<String, CurrencyOverride>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        let euro_rate = 0.82771;
        let override_with = |currency: &str, rate: f64| CurrencyOverride {
            currency: currency.to_string(),
            rate,
        };
        let overrides = BTreeMap::from([
            ("US".to_string(), override_with("the US dollar is used", 1.0)),
            ("EC".to_string(), override_with("the US dollar is used", 1.0)),
            ("TB".to_string(), override_with("euros (EUR)", euro_rate)),
            ("GZ".to_string(), override_with("new Israeli shekels (ILS)", 3.606)),
        ]);
        Self {
            euro_rate,
            overrides,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternateConfig {
    pub delimiter: char,
    pub extension: String,
    pub kinds: BTreeMap<String, ValueKind>,
}

impl Default for AlternateConfig {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            extension: "txt".to_string(),
            kinds: BTreeMap::new(),
        }
    }
}

impl AlternateConfig {
    pub fn kind_for(&self, category: &str) -> ValueKind {
        self.kinds
            .get(category)
            .copied()
            .unwrap_or(ValueKind::Numeric)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub threshold: usize,
    pub parsers: BTreeMap<String, ParserKind>,
    pub normalization: BTreeMap<String, NameNormalization>,
    pub exchange: ExchangeConfig,
    pub alternate: AlternateConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let parsers = BTreeMap::from([
            (
                "Sanitation facility access".to_string(),
                ParserKind::GroupedPercent,
            ),
            ("Drinking water source".to_string(), ParserKind::GroupedPercent),
            ("Exchange rates".to_string(), ParserKind::ExchangeRate),
        ]);
        Self {
            threshold: DEFAULT_THRESHOLD,
            parsers,
            normalization: BTreeMap::new(),
            exchange: ExchangeConfig::default(),
            alternate: AlternateConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config file {path:?}"))
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn parser_for(&self, category: &str) -> Option<ParserKind> {
        self.parsers.get(category).copied()
    }

    pub fn discovery_options(&self, category: &str) -> DiscoveryOptions {
        DiscoveryOptions {
            threshold: self.threshold,
            normalization: self
                .normalization
                .get(category)
                .copied()
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_sections() {
        let yaml = "threshold: 10\nnormalization:\n  Capital: verbatim\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.threshold, 10);
        assert_eq!(config.parser_for("Exchange rates"), Some(ParserKind::ExchangeRate));
        assert_eq!(
            config.discovery_options("Capital").normalization,
            NameNormalization::Verbatim
        );
        assert_eq!(
            config.discovery_options("Area").normalization,
            NameNormalization::TruncateAtParenthesis
        );
        assert_eq!(config.exchange.overrides["GZ"].rate, 3.606);
    }

    #[test]
    fn explicit_parsers_replace_the_default_table() {
        let yaml = "parsers:\n  Currency: exchange-rate\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.parser_for("Currency"), Some(ParserKind::ExchangeRate));
        assert_eq!(config.parser_for("Exchange rates"), None);
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn alternate_kinds_default_to_numeric() {
        let config = PipelineConfig::default();
        assert_eq!(config.alternate.kind_for("GDP"), ValueKind::Numeric);
        assert_eq!(config.alternate.delimiter, '\t');
    }
}
