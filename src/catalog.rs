//! The notes-and-definitions index page: one `div.category` per field page.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::{io_utils, markup};

pub const CATEGORY_CLASS: &str = "category";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    pub name: String,
    pub source: PathBuf,
}

/// Category entries with a link, hrefs resolved against `base_dir`.
pub fn parse_catalog(source: &str, base_dir: &Path) -> Result<Vec<CategoryLink>> {
    let root = markup::parse_markup(source)?;
    let links = root
        .find_all(|n| n.has_class(CATEGORY_CLASS))
        .into_iter()
        .filter_map(|entry| {
            let href = entry.find(|n| n.is("a"))?.attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            let name = entry.text().split_whitespace().collect::<Vec<_>>().join(" ");
            Some(CategoryLink {
                name,
                source: base_dir.join(href),
            })
        })
        .collect();
    Ok(links)
}

pub fn read_catalog(path: &Path, encoding: &'static Encoding) -> Result<Vec<CategoryLink>> {
    let bytes = fs::read(path).with_context(|| format!("Reading index page {path:?}"))?;
    let source = io_utils::decode_bytes(&bytes, encoding)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_catalog(&source, base_dir).with_context(|| format!("Parsing index page {path:?}"))
}
