//! Country rows and their subfield cells, lifted out of a field page's markup.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::{
    io_utils,
    markup::{self, Node},
    schema::ValueKind,
};

pub const SUBFIELD_CLASS: &str = "subfield";
pub const NAME_CLASS: &str = "subfield-name";
pub const GROUP_CLASS: &str = "subfield-group";
pub const NUMBER_CLASS: &str = "subfield-number";
pub const NOTE_CLASS: &str = "subfield-note";

/// One reported value holder within a country row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub name: Option<String>,
    pub group: Option<String>,
    pub kind: Option<ValueKind>,
    /// Text of the numeric value holder, when the cell has one.
    pub number: Option<String>,
    /// Cell text with name and group labels removed.
    pub text: String,
}

impl Cell {
    pub fn from_node(node: &Node) -> Self {
        let kind = if node.has_class("numeric") {
            Some(ValueKind::Numeric)
        } else if node.has_class("text") {
            Some(ValueKind::Text)
        } else {
            None
        };
        let name = node.find(|n| n.has_class(NAME_CLASS)).map(Node::text);
        let group = node.find(|n| n.has_class(GROUP_CLASS)).map(Node::text);
        // Some pages put the figure in the note span instead of the number span.
        let number = node
            .find(|n| n.has_class(NUMBER_CLASS))
            .or_else(|| node.find(|n| n.has_class(NOTE_CLASS)))
            .map(Node::text);
        let text = node
            .without(|n| n.has_class(NAME_CLASS) || n.has_class(GROUP_CLASS))
            .text();
        Self {
            name,
            group,
            kind,
            number,
            text,
        }
    }

    pub fn numeric(name: Option<&str>, number: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            kind: Some(ValueKind::Numeric),
            number: Some(number.to_string()),
            text: number.to_string(),
            ..Self::default()
        }
    }

    pub fn text(name: Option<&str>, text: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            kind: Some(ValueKind::Text),
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub id: Option<String>,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(id: Option<&str>, cells: Vec<Cell>) -> Self {
        Self {
            id: id.map(str::to_string),
            cells,
        }
    }

    fn from_node(node: &Node) -> Self {
        let id = node
            .attr("id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let cells = node
            .find_all(|n| n.is("div") && n.has_class(SUBFIELD_CLASS))
            .into_iter()
            .map(Cell::from_node)
            .collect();
        Self { id, cells }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub rows: Vec<Row>,
}

impl Document {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn from_tree(root: &Node) -> Self {
        let rows = root
            .find_all(|n| n.is("tr"))
            .into_iter()
            .map(Row::from_node)
            .collect();
        Self { rows }
    }

    pub fn from_markup(source: &str) -> Result<Self> {
        let root = markup::parse_markup(source)?;
        Ok(Self::from_tree(&root))
    }

    pub fn load(path: &Path, encoding: &'static Encoding) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Reading field page {path:?}"))?;
        let source = io_utils::decode_bytes(&bytes, encoding)
            .with_context(|| format!("Decoding field page {path:?}"))?;
        Self::from_markup(&source).with_context(|| format!("Parsing field page {path:?}"))
    }

    /// Rows carrying a country identifier, paired with that identifier.
    pub fn identified_rows(&self) -> impl Iterator<Item = (&str, &Row)> {
        self.rows
            .iter()
            .filter_map(|row| row.id.as_deref().map(|id| (id, row)))
    }
}
