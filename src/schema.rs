//! Discovered field schema for one category and the value kinds it declares.

use std::{
    fmt,
    fs::File,
    io::{BufReader, Write},
    path::Path,
    str::FromStr,
};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::{
    data::Value,
    discovery::NameNormalization,
    document::Cell,
    normalize::{coerce_numeric, coerce_text},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Numeric,
    Text,
}

impl ValueKind {
    /// Converts a cell into the typed value this kind declares.
    ///
    /// A numeric cell without a value holder yields NaN without scanning.
    pub fn coerce(self, cell: &Cell) -> Value {
        match self {
            ValueKind::Numeric => {
                Value::Number(cell.number.as_deref().map_or(f64::NAN, coerce_numeric))
            }
            ValueKind::Text => Value::Text(coerce_text(&cell.text)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Numeric => "numeric",
            ValueKind::Text => "text",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "numeric" | "number" => Ok(ValueKind::Numeric),
            "text" | "string" => Ok(ValueKind::Text),
            other => Err(anyhow!("Unknown value kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    pub kind: ValueKind,
    /// Normalized declared name the field was discovered from. Absent when
    /// the category collapsed to a single field named after itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subfield: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub category: String,
    #[serde(default)]
    pub normalization: NameNormalization,
    pub fields: Vec<FieldMeta>,
}

impl Schema {
    pub fn single(category: &str, kind: ValueKind) -> Self {
        Self {
            category: category.to_string(),
            normalization: NameNormalization::default(),
            fields: vec![FieldMeta {
                name: category.to_string(),
                kind,
                subfield: None,
            }],
        }
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing schema YAML")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml_string()?;
        let mut file =
            File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Writing schema file {path:?}"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let schema: Schema = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing schema file {path:?}"))?;
        if schema.fields.is_empty() {
            return Err(anyhow!("Schema file {path:?} declares no fields"));
        }
        Ok(schema)
    }
}
