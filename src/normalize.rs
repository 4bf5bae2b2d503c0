//! XML to nested-mapping normalization.
//!
//! Converts a SimaticML document into a [`serde_json::Value`] tree following
//! the usual XML-to-dict convention:
//!
//! - attributes become `@Name` keys,
//! - text of an element with attributes or children becomes `#text`,
//! - an element with only text becomes a plain string, an empty one `null`,
//! - repeated child elements collapse into an array,
//! - namespaced elements are keyed `ns{i}:Local`, where `ns{i}` is assigned
//!   per distinct namespace URI in order of first use, and every binding is
//!   recorded on the root mapping as `@xmlns:ns{i}`.

use anyhow::{Context, Result, anyhow};
use camino::Utf8Path;
use indexmap::IndexSet;
use roxmltree::{Document, Node};
use serde_json::{Map, Value};

/// Parse and normalize an XML file.
pub fn parse_file(path: &Utf8Path) -> Result<Value> {
    let text = std::fs::read_to_string(path.as_std_path())
        .with_context(|| format!("Failed to read {}", path))?;
    parse_str(&text).with_context(|| format!("Failed to parse XML {}", path))
}

/// Parse and normalize XML text. The result has a single key: the root
/// element's name.
pub fn parse_str(text: &str) -> Result<Value> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();

    let mut namespaces: IndexSet<String> = IndexSet::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        if let Some(uri) = node.tag_name().namespace() {
            namespaces.insert(uri.to_string());
        }
        for attr in node.attributes() {
            if let Some(uri) = attr.namespace() {
                namespaces.insert(uri.to_string());
            }
        }
    }

    let mut root_map = Map::new();
    for (idx, uri) in namespaces.iter().enumerate() {
        root_map.insert(format!("@xmlns:ns{}", idx), Value::String(uri.clone()));
    }
    match element_value(root, &namespaces) {
        Value::Object(map) => root_map.extend(map),
        Value::String(text) => {
            root_map.insert("#text".to_string(), Value::String(text));
        }
        _ => {}
    }

    let mut top = Map::new();
    top.insert(qualified_name(root, &namespaces), Value::Object(root_map));
    Ok(Value::Object(top))
}

fn prefixed(namespace: Option<&str>, local: &str, namespaces: &IndexSet<String>) -> String {
    match namespace.and_then(|uri| namespaces.get_index_of(uri)) {
        Some(idx) => format!("ns{}:{}", idx, local),
        None => local.to_string(),
    }
}

fn qualified_name(node: Node, namespaces: &IndexSet<String>) -> String {
    let tag = node.tag_name();
    prefixed(tag.namespace(), tag.name(), namespaces)
}

fn element_value(node: Node, namespaces: &IndexSet<String>) -> Value {
    let mut map = Map::new();
    for attr in node.attributes() {
        let key = format!("@{}", prefixed(attr.namespace(), attr.name(), namespaces));
        map.insert(key, Value::String(attr.value().to_string()));
    }
    for child in node.children().filter(|c| c.is_element()) {
        let key = qualified_name(child, namespaces);
        push_child(&mut map, key, element_value(child, namespaces));
    }

    let text: String = node
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect();
    let text = text.trim();

    if map.is_empty() {
        if text.is_empty() {
            Value::Null
        } else {
            Value::String(text.to_string())
        }
    } else {
        if !text.is_empty() {
            map.insert("#text".to_string(), Value::String(text.to_string()));
        }
        Value::Object(map)
    }
}

fn push_child(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(key, value);
        }
    }
}

/// View a mapping value as a list: arrays as-is, `null`/missing as empty,
/// anything else as a one-element list.
pub fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    }
}

/// Text content of a normalized element (plain string or `#text`).
pub fn text_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("#text").and_then(Value::as_str),
        _ => None,
    }
}

/// Attribute value of a normalized element.
pub fn attr<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value.get(format!("@{}", name)).and_then(Value::as_str)
}

/// The single root element of a normalized document.
pub fn root_element(doc: &Value) -> Result<(&str, &Value)> {
    let map = doc
        .as_object()
        .ok_or_else(|| anyhow!("Normalized document is not a mapping"))?;
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some((name, value)), None) => Ok((name.as_str(), value)),
        _ => Err(anyhow!("Normalized document must have exactly one root element")),
    }
}
