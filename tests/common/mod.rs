#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Markup for one `div.subfield` cell.
pub fn numeric_cell(name: Option<&str>, number: &str) -> String {
    let label = name
        .map(|n| format!(r#"<span class="subfield-name">{n}:</span> "#))
        .unwrap_or_default();
    format!(
        r#"<div class="subfield numeric">{label}<span class="subfield-number">{number}</span></div>"#
    )
}

pub fn text_cell(name: Option<&str>, text: &str) -> String {
    let label = name
        .map(|n| format!(r#"<span class="subfield-name">{n}:</span> "#))
        .unwrap_or_default();
    format!(r#"<div class="subfield text">{label}{text}</div>"#)
}

/// Two-letter style identifier for the `i`-th synthetic country.
pub fn country_code(i: usize) -> String {
    let first = (b'A' + (i / 26) as u8) as char;
    let second = (b'A' + (i % 26) as u8) as char;
    format!("{first}{second}")
}

/// A field page with one `<tr id=..>` per entry, wrapped the way factbook
/// pages wrap them (header row, country name cell, field area div).
pub fn field_page(rows: &[(String, Vec<String>)]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Field</title>\
         <script>var x = 1 < 2;</script></head><body><table>\n\
         <tr><th>Country</th><th>Value</th></tr>\n",
    );
    for (id, cells) in rows {
        html.push_str(&format!(
            "<tr id=\"{id}\"><td>Country {id}</td><td><div id=\"field-data\" class=\"category_data\">{}</div></td></tr>\n",
            cells.join("\n")
        ));
    }
    html.push_str("</table></body></html>\n");
    html
}

/// `count` rows, starting at country index `offset`, each holding `cells`.
pub fn uniform_rows(count: usize, offset: usize, cells: &[String]) -> Vec<(String, Vec<String>)> {
    (offset..offset + count)
        .map(|i| (country_code(i), cells.to_vec()))
        .collect()
}
