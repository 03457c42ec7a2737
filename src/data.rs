use std::{collections::BTreeMap, fmt, io::Write};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Number(n) if n.is_nan() => "NaN".to_string(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{n:.0}")
                } else {
                    n.to_string()
                }
            }
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Field name -> (country code -> value).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Dataset {
    fields: BTreeMap<String, BTreeMap<String, Value>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a value unless the field already holds one for this country.
    /// Returns whether the value was stored.
    pub fn insert(&mut self, field: &str, country: &str, value: Value) -> bool {
        let entries = self.fields.entry(field.to_string()).or_default();
        if entries.contains_key(country) {
            return false;
        }
        entries.insert(country.to_string(), value);
        true
    }

    /// Records a value, replacing whatever the field held for this country.
    pub fn set(&mut self, field: &str, country: &str, value: Value) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .insert(country.to_string(), value);
    }

    pub fn contains(&self, field: &str, country: &str) -> bool {
        self.get(field, country).is_some()
    }

    pub fn get(&self, field: &str, country: &str) -> Option<&Value> {
        self.fields.get(field).and_then(|values| values.get(country))
    }

    pub fn field(&self, field: &str) -> Option<&BTreeMap<String, Value>> {
        self.fields.get(field)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn value_count(&self) -> usize {
        self.fields.values().map(BTreeMap::len).sum()
    }

    /// Folds `other` into `self`; values already present are kept.
    pub fn merge(&mut self, other: Dataset) {
        for (field, values) in other.fields {
            for (country, value) in values {
                if !self.insert(&field, &country, value) {
                    debug!("Keeping existing value for '{field}' / {country} during merge");
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.fields.iter().flat_map(|(field, values)| {
            values
                .iter()
                .map(move |(country, value)| (field.as_str(), country.as_str(), value))
        })
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).context("Writing dataset JSON")
    }

    /// Long format: one `field,country,value` record per entry.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
        csv_writer.write_record(["field", "country", "value"])?;
        for (field, country, value) in self.iter() {
            csv_writer.write_record([field, country, value.as_display().as_str()])?;
        }
        csv_writer.flush().context("Flushing dataset CSV")?;
        Ok(())
    }
}
