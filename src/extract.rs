use log::{debug, warn};

use crate::{
    data::Dataset,
    discovery::NameNormalizer,
    document::{Document, Row},
    error::ExtractError,
    schema::{FieldMeta, Schema},
};

/// Extracts every identified row's values under the fields of `schema`.
pub fn extract(document: &Document, schema: &Schema) -> Dataset {
    extract_with(document, schema, &schema.normalization)
}

pub fn extract_with(
    document: &Document,
    schema: &Schema,
    normalizer: &dyn NameNormalizer,
) -> Dataset {
    let mut dataset = Dataset::new();
    for (country, row) in document.identified_rows() {
        if let [field] = schema.fields.as_slice() {
            extract_single(&mut dataset, field, country, row);
        } else {
            extract_multiple(&mut dataset, schema, normalizer, country, row);
        }
    }
    debug!(
        "Extracted {} value(s) across {} field(s) for '{}'",
        dataset.value_count(),
        dataset.field_count(),
        schema.category
    );
    dataset
}

fn extract_single(dataset: &mut Dataset, field: &FieldMeta, country: &str, row: &Row) {
    let compatible = row
        .cells
        .iter()
        .find(|cell| cell.kind.is_none_or(|kind| kind == field.kind));
    match compatible {
        Some(cell) => {
            dataset.insert(&field.name, country, field.kind.coerce(cell));
        }
        None => debug!("Row '{country}' has no {} cell for '{}'", field.kind, field.name),
    }
}

fn extract_multiple(
    dataset: &mut Dataset,
    schema: &Schema,
    normalizer: &dyn NameNormalizer,
    country: &str,
    row: &Row,
) {
    for cell in &row.cells {
        let Some(declared) = cell.name.as_deref() else {
            let err = ExtractError::MalformedCell {
                row: country.to_string(),
                reason: format!("no readable name in a {}-field schema", schema.fields.len()),
            };
            warn!("{err}");
            continue;
        };
        let name = normalizer.normalize(declared);
        if name.is_empty() {
            continue;
        }

        // Exact subfield first, then the first field whose key contains the name.
        let target = schema
            .fields
            .iter()
            .find(|field| field.subfield.as_deref() == Some(name.as_str()))
            .or_else(|| {
                schema
                    .fields
                    .iter()
                    .find(|field| field.name.contains(&name))
            });
        let Some(field) = target else {
            debug!("Row '{country}': subfield '{name}' matches no schema field");
            continue;
        };
        if !dataset.contains(&field.name, country) {
            dataset.insert(&field.name, country, field.kind.coerce(cell));
        }
    }
}
