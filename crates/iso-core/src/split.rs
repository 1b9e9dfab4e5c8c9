//! Splitting combined query documents into a root query and a fragment.
//!
//! A combined document declares a root field and its selections in one
//! tree. The decorator layer wants the root field alone (to route the
//! query) plus the selections as a standalone fragment; this module pulls
//! the two apart.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Map, Value};

use crate::error::EngineError;

static NEXT_FRAGMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Output of [`split_query`].
#[derive(Debug, Clone, PartialEq)]
pub struct SplitQuery {
    /// The document reduced to its generated/requisite children.
    pub route_query: Value,
    /// A fragment carrying every child of the document.
    pub fragment: Value,
}

/// Split a combined query document into a root query and a fragment.
///
/// The root query keeps only children marked `isGenerated` or
/// `isRequisite`, all re-marked generated; the fragment carries every
/// child, a synthetic id, and the parent's `isAbstract` flag when present.
pub fn split_query(query: &Value, name: &str) -> Result<SplitQuery, EngineError> {
    let document = query
        .as_object()
        .ok_or_else(|| EngineError::Document("query document is not an object".to_string()))?;
    let children = document
        .get("children")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::Document("query document has no children".to_string()))?;

    let route_children: Vec<Value> = children
        .iter()
        .filter(|child| {
            metadata_of(child)
                .map(|metadata| flag(metadata, "isGenerated") || flag(metadata, "isRequisite"))
                .unwrap_or(false)
        })
        .map(|child| {
            let mut child = child.as_object().cloned().unwrap_or_default();
            let mut metadata = child
                .get("metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            metadata.insert("isGenerated".to_string(), Value::Bool(true));
            child.insert("metadata".to_string(), Value::Object(metadata));
            Value::Object(child)
        })
        .collect();

    let mut route_query = document.clone();
    route_query.insert("name".to_string(), Value::String(name.to_string()));
    route_query.insert("children".to_string(), Value::Array(route_children));

    let mut fragment_metadata = Map::new();
    if metadata_of(query).is_some_and(|metadata| flag(metadata, "isAbstract")) {
        fragment_metadata.insert("isAbstract".to_string(), Value::Bool(true));
    }

    let fragment = json!({
        "id": format!("{}::iso-fragment", NEXT_FRAGMENT_ID.fetch_add(1, Ordering::Relaxed)),
        "kind": "Fragment",
        "type": document.get("type").cloned().unwrap_or(Value::Null),
        "metadata": Value::Object(fragment_metadata),
        "name": format!("{name}_Fragment"),
        "children": Value::Array(children.clone()),
    });

    Ok(SplitQuery {
        route_query: Value::Object(route_query),
        fragment,
    })
}

fn metadata_of(value: &Value) -> Option<&Map<String, Value>> {
    value.get("metadata").and_then(Value::as_object)
}

fn flag(metadata: &Map<String, Value>, name: &str) -> bool {
    metadata.get(name).and_then(Value::as_bool).unwrap_or(false)
}
