//! Lenient HTML-to-tree builder.
//!
//! Field pages are HTML, not XML: void elements are never closed, attribute
//! values are sometimes unquoted, and entities such as `&nbsp;` are not part
//! of the XML predefined set. The builder drives `quick-xml` with end-name
//! checking disabled and repairs the element stack itself, so a page always
//! yields a tree rooted at a synthetic [`ROOT_TAG`] node.

use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use log::debug;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use regex::Regex;

pub const ROOT_TAG: &str = "#root";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Element(Node),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Child>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.with_attr("class", class)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::Text(text.into()));
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(Child::Element(child));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Direct element children, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|child| match child {
            Child::Element(node) => Some(node),
            Child::Text(_) => None,
        })
    }

    /// Concatenated text of every descendant text node.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Child::Text(text) => out.push_str(text),
                Child::Element(node) => node.collect_text(out),
            }
        }
    }

    /// First descendant (pre-order, excluding `self`) matching `pred`.
    pub fn find<F>(&self, pred: F) -> Option<&Node>
    where
        F: Fn(&Node) -> bool,
    {
        self.find_inner(&pred)
    }

    fn find_inner<F>(&self, pred: &F) -> Option<&Node>
    where
        F: Fn(&Node) -> bool,
    {
        for node in self.elements() {
            if pred(node) {
                return Some(node);
            }
            if let Some(found) = node.find_inner(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant (pre-order, excluding `self`) matching `pred`.
    pub fn find_all<F>(&self, pred: F) -> Vec<&Node>
    where
        F: Fn(&Node) -> bool,
    {
        let mut found = Vec::new();
        self.find_all_inner(&pred, &mut found);
        found
    }

    fn find_all_inner<'a, F>(&'a self, pred: &F, found: &mut Vec<&'a Node>)
    where
        F: Fn(&Node) -> bool,
    {
        for node in self.elements() {
            if pred(node) {
                found.push(node);
            }
            node.find_all_inner(pred, found);
        }
    }

    /// Copy of this node with every descendant element matching `pred` removed.
    pub fn without<F>(&self, pred: F) -> Node
    where
        F: Fn(&Node) -> bool,
    {
        self.without_inner(&pred)
    }

    fn without_inner<F>(&self, pred: &F) -> Node
    where
        F: Fn(&Node) -> bool,
    {
        let children = self
            .children
            .iter()
            .filter_map(|child| match child {
                Child::Element(node) if pred(node) => None,
                Child::Element(node) => Some(Child::Element(node.without_inner(pred))),
                Child::Text(text) => Some(Child::Text(text.clone())),
            })
            .collect();
        Node {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            children,
        }
    }
}

fn raw_text_blocks() -> Result<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>"))
        .as_ref()
        .map_err(|err| anyhow!("Invalid raw text block pattern: {err}"))
}

/// A `<` that cannot open a tag, as in `<1%`.
fn bare_angle_brackets() -> Result<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"<([^A-Za-z/!?])"))
        .as_ref()
        .map_err(|err| anyhow!("Invalid bare bracket pattern: {err}"))
}

fn resolve_html_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "nbsp" => Some("\u{a0}"),
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "lsquo" => Some("\u{2018}"),
        "rsquo" => Some("\u{2019}"),
        "ldquo" => Some("\u{201c}"),
        "rdquo" => Some("\u{201d}"),
        "deg" => Some("\u{b0}"),
        "euro" => Some("\u{20ac}"),
        "pound" => Some("\u{a3}"),
        "yen" => Some("\u{a5}"),
        _ => None,
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Node> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let mut node = Node::new(tag);
    let mut attrs = start.html_attributes();
    attrs.with_checks(false);
    for attr in attrs {
        let attr = match attr {
            Ok(attr) => attr,
            Err(err) => {
                debug!("Skipping unreadable attribute of <{}>: {err}", node.tag);
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        node.attrs.push((key, value));
    }
    Ok(node)
}

fn attach(stack: &mut [Node], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Child::Element(node));
    }
}

fn push_text(stack: &mut [Node], text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Child::Text(text));
    }
}

/// Pops up to and including the innermost open element named `tag`.
/// Stray end tags with no open counterpart are ignored.
fn close_element(stack: &mut Vec<Node>, tag: &str) {
    let Some(position) = stack.iter().skip(1).rposition(|node| node.tag == tag) else {
        return;
    };
    let target = position + 1;
    while stack.len() > target {
        if let Some(node) = stack.pop() {
            attach(stack, node);
        }
    }
}

pub fn parse_markup(source: &str) -> Result<Node> {
    let cleaned = raw_text_blocks()?.replace_all(source, "");
    let cleaned = bare_angle_brackets()?.replace_all(&cleaned, "&lt;$1");
    let mut reader = Reader::from_str(&cleaned);
    reader.check_end_names(false);

    let mut stack = vec![Node::new(ROOT_TAG)];
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let node = element_from_start(&start)?;
                if VOID_ELEMENTS.contains(&node.tag.as_str()) {
                    attach(&mut stack, node);
                } else {
                    stack.push(node);
                }
            }
            Ok(Event::Empty(start)) => {
                let node = element_from_start(&start)?;
                attach(&mut stack, node);
            }
            Ok(Event::End(end)) => {
                let tag = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                close_element(&mut stack, &tag);
            }
            Ok(Event::Text(text)) => {
                let value = match text.unescape_with(resolve_html_entity) {
                    Ok(value) => value.into_owned(),
                    Err(_) => String::from_utf8_lossy(&text).into_owned(),
                };
                push_text(&mut stack, value);
            }
            Ok(Event::CData(data)) => {
                push_text(&mut stack, String::from_utf8_lossy(&data).into_owned());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(anyhow!(
                    "Malformed markup near byte {}: {err}",
                    reader.buffer_position()
                ));
            }
        }
    }

    while stack.len() > 1 {
        if let Some(node) = stack.pop() {
            attach(&mut stack, node);
        }
    }
    stack
        .pop()
        .ok_or_else(|| anyhow!("Markup tree lost its root element"))
}
