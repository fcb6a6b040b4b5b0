//! Run metadata written by the sequencing instrument (`runParameters.xml`).
//!
//! The XML document is converted into a generic JSON tree:
//!
//! - an element with only text becomes a string
//! - an empty element becomes `null`
//! - attributes become `@name` keys, mixed text becomes `#text`
//! - repeated child elements are grouped into an array
//!
//! Lookups then walk that tree by element name, which keeps the
//! instrument-specific paths declarative.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File names tried in order; the first one that exists wins.
pub const RUN_PARAMETERS_FILE_NAMES: [&str; 2] = ["runParameters.xml", "RunParameters.xml"];

/// Parsed run metadata. Read fresh for every query, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParameters {
    tree: Value,
}

impl RunParameters {
    /// Parse an XML document.
    pub fn parse(xml: &str) -> Result<Self, roxmltree::Error> {
        let xml = xml.trim_start_matches('\u{feff}');
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc.root_element();

        let mut tree = Map::new();
        tree.insert(root.tag_name().name().to_string(), element_to_value(root));
        Ok(Self {
            tree: Value::Object(tree),
        })
    }

    /// Wrap an already-built tree.
    pub fn from_value(tree: Value) -> Self {
        Self { tree }
    }

    pub fn as_value(&self) -> &Value {
        &self.tree
    }

    /// Walk the tree by element names. Returns `Some(Value::Null)` for an
    /// element that is present but empty.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(&self.tree, |node, key| node.get(*key))
    }

    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Locate the run parameters file of a runfolder.
    pub fn find_file(runfolder: &Path) -> Option<PathBuf> {
        RUN_PARAMETERS_FILE_NAMES
            .iter()
            .map(|name| runfolder.join(name))
            .find(|path| path.is_file())
    }

    /// Read the run parameters of a runfolder.
    ///
    /// A missing file means "no metadata". A file that cannot be read or
    /// parsed is logged and treated the same way.
    pub fn load(runfolder: &Path) -> Option<Self> {
        let path = Self::find_file(runfolder)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read run parameters");
                return None;
            }
        };
        match Self::parse(&content) {
            Ok(parsed) => {
                debug!(path = %path.display(), "Loaded run parameters");
                Some(parsed)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed run parameters");
                None
            }
        }
    }
}

fn element_to_value(node: roxmltree::Node<'_, '_>) -> Value {
    let mut obj = Map::new();

    for attr in node.attributes() {
        obj.insert(format!("@{}", attr.name()), Value::String(attr.value().to_string()));
    }

    let mut text = String::new();
    for child in node.children() {
        match child.node_type() {
            roxmltree::NodeType::Element => {
                let tag = child.tag_name().name().to_string();
                let value = element_to_value(child);
                // element values are never arrays, so an array here is a group
                match obj.get_mut(&tag) {
                    Some(Value::Array(items)) => items.push(value),
                    Some(existing) => {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, value]);
                    }
                    None => {
                        obj.insert(tag, value);
                    }
                }
            }
            roxmltree::NodeType::Text => {
                if let Some(t) = child.text() {
                    text.push_str(t.trim());
                }
            }
            _ => {}
        }
    }

    if obj.is_empty() {
        if text.is_empty() {
            Value::Null
        } else {
            Value::String(text)
        }
    } else {
        if !text.is_empty() {
            obj.insert("#text".to_string(), Value::String(text));
        }
        Value::Object(obj)
    }
}
