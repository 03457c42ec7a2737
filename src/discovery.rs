//! Schema discovery: which subfields does a category page really have?
//!
//! Every cell in an identified row is counted under its normalized declared
//! name, separately per kind hint. Names seen in more than `threshold` rows
//! survive. A page whose surviving names span both kinds is rejected, and a
//! page with a single surviving name collapses to one field named after the
//! category.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    document::Document,
    error::ExtractError,
    normalize::clean_name,
    schema::{FieldMeta, Schema, ValueKind},
};

pub const DEFAULT_THRESHOLD: usize = 50;
pub const UNNAMED_FIELD: &str = "unnamed";

/// Maps a declared subfield name to the name it is counted and matched under.
pub trait NameNormalizer {
    fn normalize(&self, declared: &str) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameNormalization {
    /// `"Area (sq km):"` counts as `"Area"`.
    #[default]
    TruncateAtParenthesis,
    /// Only colons and surrounding whitespace are removed.
    Verbatim,
}

impl NameNormalizer for NameNormalization {
    fn normalize(&self, declared: &str) -> String {
        match self {
            NameNormalization::TruncateAtParenthesis => {
                let head = declared
                    .split_once('(')
                    .map_or(declared, |(head, _)| head);
                clean_name(head)
            }
            NameNormalization::Verbatim => clean_name(declared),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
    pub threshold: usize,
    pub normalization: NameNormalization,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            normalization: NameNormalization::default(),
        }
    }
}

/// Occurrence counts per name, in first-seen order.
#[derive(Debug, Default)]
struct NameTally {
    counts: Vec<(String, usize)>,
}

impl NameTally {
    fn record(&mut self, name: String) {
        match self.counts.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((name, 1)),
        }
    }

    fn discard_unnamed_if_named(&mut self) {
        if self.counts.iter().any(|(name, _)| name != UNNAMED_FIELD) {
            self.counts.retain(|(name, _)| name != UNNAMED_FIELD);
        }
    }

    fn above(&self, threshold: usize) -> Vec<String> {
        self.counts
            .iter()
            .filter(|(_, count)| *count > threshold)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

pub fn discover(
    document: &Document,
    category: &str,
    options: &DiscoveryOptions,
) -> Result<Schema, ExtractError> {
    let mut schema = discover_with(document, category, options.threshold, &options.normalization)?;
    schema.normalization = options.normalization;
    Ok(schema)
}

/// Discovery with a caller-supplied normalizer.
pub fn discover_with(
    document: &Document,
    category: &str,
    threshold: usize,
    normalizer: &dyn NameNormalizer,
) -> Result<Schema, ExtractError> {
    let mut numeric = NameTally::default();
    let mut text = NameTally::default();

    for (_, row) in document.identified_rows() {
        for cell in &row.cells {
            let tally = match cell.kind {
                Some(ValueKind::Numeric) => &mut numeric,
                Some(ValueKind::Text) => &mut text,
                None => continue,
            };
            let name = match cell.name.as_deref() {
                Some(declared) => normalizer.normalize(declared),
                None => UNNAMED_FIELD.to_string(),
            };
            tally.record(name);
        }
    }

    numeric.discard_unnamed_if_named();
    text.discard_unnamed_if_named();
    debug!(
        "Category '{category}' counts: numeric {:?}, text {:?}",
        numeric.counts, text.counts
    );

    let numeric_names = numeric.above(threshold);
    let text_names = text.above(threshold);

    let (kind, names) = match (numeric_names.is_empty(), text_names.is_empty()) {
        (false, false) => {
            return Err(ExtractError::MixedKindSchema {
                category: category.to_string(),
                numeric: numeric_names,
                text: text_names,
            });
        }
        (true, true) => {
            return Err(ExtractError::EmptySchema {
                category: category.to_string(),
                threshold,
            });
        }
        (false, true) => (ValueKind::Numeric, numeric_names),
        (true, false) => (ValueKind::Text, text_names),
    };

    if names.len() == 1 {
        return Ok(Schema::single(category, kind));
    }

    let fields = names
        .into_iter()
        .map(|name| FieldMeta {
            name: format!("{category} ({name})"),
            kind,
            subfield: Some(name),
        })
        .collect();
    Ok(Schema {
        category: category.to_string(),
        normalization: NameNormalization::default(),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Cell, Row};

    fn rows_with(count: usize, offset: usize, cells: impl Fn() -> Vec<Cell>) -> Vec<Row> {
        (0..count)
            .map(|i| {
                let id = format!("C{}", i + offset);
                Row::new(Some(&id), cells())
            })
            .collect()
    }

    #[test]
    fn truncation_collapses_parenthetical_variants() {
        let normalizer = NameNormalization::TruncateAtParenthesis;
        assert_eq!(normalizer.normalize("total (2019 est.):"), "total");
        assert_eq!(normalizer.normalize("total:"), "total");
        assert_eq!(
            NameNormalization::Verbatim.normalize("total (2019 est.):"),
            "total (2019 est.)"
        );
    }

    #[test]
    fn threshold_is_strict() {
        let doc = Document::new(rows_with(3, 0, || vec![Cell::numeric(Some("total:"), "1")]));
        let err = discover_with(&doc, "Area", 3, &NameNormalization::default()).unwrap_err();
        assert!(matches!(err, ExtractError::EmptySchema { threshold: 3, .. }));
        assert!(discover_with(&doc, "Area", 2, &NameNormalization::default()).is_ok());
    }

    #[test]
    fn unnamed_counts_are_dropped_once_a_name_exists() {
        let mut rows = rows_with(5, 0, || vec![Cell::numeric(None, "1")]);
        rows.extend(rows_with(3, 100, || vec![Cell::numeric(Some("land:"), "1")]));
        let doc = Document::new(rows);
        let schema = discover_with(&doc, "Area", 2, &NameNormalization::default()).unwrap();
        assert_eq!(schema, Schema::single("Area", ValueKind::Numeric));
    }

    #[test]
    fn rows_without_identifier_are_not_counted() {
        let mut rows = rows_with(2, 0, || vec![Cell::text(Some("name:"), "x")]);
        rows.push(Row::new(None, vec![Cell::text(Some("name:"), "x")]));
        let doc = Document::new(rows);
        assert!(discover_with(&doc, "Capital", 2, &NameNormalization::default()).is_err());
    }

    #[test]
    fn cells_without_kind_hint_are_ignored() {
        let doc = Document::new(rows_with(3, 0, || {
            vec![Cell {
                name: Some("total:".into()),
                ..Cell::default()
            }]
        }));
        let err = discover_with(&doc, "Area", 1, &NameNormalization::default()).unwrap_err();
        assert!(matches!(err, ExtractError::EmptySchema { .. }));
    }
}
