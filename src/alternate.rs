//! Plain-text alternate sources: `country name <delimiter> value` lines,
//! keyed by display name instead of country code.

use std::{fs::File, io::Read, path::Path};

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};

use crate::{
    countries::CountryCodes, data::Dataset, document::Cell, error::ExtractError,
    schema::ValueKind,
};

pub fn parse_alternate<R: Read>(
    category: &str,
    reader: R,
    delimiter: char,
    kind: ValueKind,
    codes: &CountryCodes,
) -> Result<Dataset> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| anyhow!("Alternate source delimiter must be ASCII, got {delimiter:?}"))?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut dataset = Dataset::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Reading alternate source for '{category}'"))?;
        let (Some(name), Some(raw)) = (record.get(0), record.get(1)) else {
            debug!("Skipping line {} of '{category}' alternate source", line + 1);
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let Some(code) = codes.lookup(name) else {
            let err = ExtractError::UnreadableCountryName {
                category: category.to_string(),
                name: name.to_string(),
            };
            warn!("{err}; dropping row");
            continue;
        };
        let cell = match kind {
            ValueKind::Numeric => Cell::numeric(None, raw),
            ValueKind::Text => Cell::text(None, raw),
        };
        dataset.insert(category, code, kind.coerce(&cell));
    }
    Ok(dataset)
}

pub fn load_alternate(
    category: &str,
    path: &Path,
    delimiter: char,
    kind: ValueKind,
    codes: &CountryCodes,
) -> Result<Dataset> {
    let file =
        File::open(path).with_context(|| format!("Opening alternate source {path:?}"))?;
    parse_alternate(category, file, delimiter, kind, codes)
        .with_context(|| format!("Parsing alternate source {path:?}"))
}
