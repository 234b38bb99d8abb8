//! Conversion between JSON document nodes and settings trees.
//!
//! Every node is a single-key object, the key being the node id:
//!
//! ```json
//! { "Port": { "type": "Int", "desc": "listen port", "value": 8080 } }
//! { "Server": { "type": "Group", "contents": [ ... ] } }
//! ```
//!
//! Checks run in a fixed order so malformed input always reports the same
//! error: id, `type` present, `type` matches, payload present, payload kind.

use generational_arena::Index;
use serde_json::{Map, Value};
use tracing::{instrument, trace};

use crate::domain::arena::{NodeArena, NodeKind};
use crate::domain::entry::Entry;
use crate::domain::entry_type::{EntryType, EntryValue};
use crate::domain::error::{json_kind, SettingsError, SettingsResult};
use crate::domain::group::Group;
use crate::domain::identifier;
use crate::domain::node::{Node, NodeRef};

pub const ID_KEY: &str = "id";
pub const TYPE_KEY: &str = "type";
pub const DESC_KEY: &str = "desc";
pub const VALUE_KEY: &str = "value";
pub const CONTENTS_KEY: &str = "contents";
pub const METADATA_KEY: &str = "metadata";
pub const DATA_KEY: &str = "data";

const UNNAMED: &str = "<unnamed>";

/// Split a node into its id and body, validating the id first.
fn split_node(value: &Value) -> SettingsResult<(&str, &Map<String, Value>)> {
    let object = value
        .as_object()
        .ok_or_else(|| SettingsError::missing_key(ID_KEY, UNNAMED))?;
    let (id, body) = object
        .iter()
        .next()
        .ok_or_else(|| SettingsError::missing_key(ID_KEY, UNNAMED))?;
    identifier::validate(id)?;
    if object.len() > 1 {
        return Err(SettingsError::ValueTypeMismatch {
            key: id.clone(),
            expected: "single-key object".to_string(),
            actual: format!("object with {} keys", object.len()),
        });
    }
    let body = body
        .as_object()
        .ok_or_else(|| SettingsError::value_kind(id, "object", body))?;
    Ok((id.as_str(), body))
}

/// The node's declared type; unknown tags are unsupported.
fn declared_type(id: &str, body: &Map<String, Value>) -> SettingsResult<EntryType> {
    let tag = body
        .get(TYPE_KEY)
        .ok_or_else(|| SettingsError::missing_key(TYPE_KEY, id))?;
    let Some(tag) = tag.as_str() else {
        return Err(SettingsError::UnsupportedType(format!(
            "type of '{}' is a {}, not a tag",
            id,
            json_kind(tag)
        )));
    };
    EntryType::from_tag(tag)
        .ok_or_else(|| SettingsError::UnsupportedType(format!("'{}' in node '{}'", tag, id)))
}

fn expect_type(id: &str, body: &Map<String, Value>, expected: EntryType) -> SettingsResult<()> {
    let actual = declared_type(id, body)?;
    if actual != expected {
        return Err(SettingsError::TypeMismatch { expected, actual });
    }
    Ok(())
}

fn description(body: &Map<String, Value>) -> SettingsResult<Option<String>> {
    match body.get(DESC_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(SettingsError::value_kind(DESC_KEY, "string or null", other)),
    }
}

/// Parse a scalar entry node that must be of type `expected`.
#[instrument(level = "trace", skip(value))]
pub(crate) fn entry_from_document(value: &Value, expected: EntryType) -> SettingsResult<Entry> {
    if !expected.is_scalar() {
        return Err(SettingsError::UnsupportedType(format!(
            "{} is not a scalar type; accepted are String, Int and Bool",
            expected
        )));
    }
    let (id, body) = split_node(value)?;
    expect_type(id, body, expected)?;
    let payload = body
        .get(VALUE_KEY)
        .ok_or_else(|| SettingsError::missing_key(VALUE_KEY, id))?;
    let value = EntryValue::from_json(expected, payload, VALUE_KEY)?;
    let description = description(body)?;
    Ok(Entry::from_parts(id.to_string(), description, value))
}

/// Parse a group node and its whole subtree into a fresh arena.
#[instrument(level = "trace", skip(value))]
pub(crate) fn group_from_document(value: &Value, is_root: bool) -> SettingsResult<Group> {
    let mut arena = NodeArena::new();
    let top = parse_group_into(&mut arena, value, None, is_root)?;
    Ok(Group::from_parts(arena, top))
}

/// Parse any node, dispatching on its declared type.
pub(crate) fn node_from_document(value: &Value) -> SettingsResult<Node> {
    let (id, body) = split_node(value)?;
    match declared_type(id, body)? {
        EntryType::Group => group_from_document(value, false).map(Node::Group),
        scalar => entry_from_document(value, scalar).map(Node::Entry),
    }
}

fn parse_group_into(
    arena: &mut NodeArena,
    value: &Value,
    parent: Option<Index>,
    is_root: bool,
) -> SettingsResult<Index> {
    let (id, body) = split_node(value)?;
    expect_type(id, body, EntryType::Group)?;
    let contents = match body.get(CONTENTS_KEY) {
        None => return Err(SettingsError::missing_key(CONTENTS_KEY, id)),
        Some(Value::Null) => &[][..],
        Some(Value::Array(items)) => items.as_slice(),
        Some(other) => {
            return Err(SettingsError::value_kind(
                CONTENTS_KEY,
                "array or null",
                other,
            ))
        }
    };
    let description = description(body)?;

    let idx = arena.insert_node(
        id.to_string(),
        description,
        NodeKind::Group {
            children: Vec::with_capacity(contents.len()),
            is_root,
        },
        parent,
    );
    for child in contents {
        parse_child_into(arena, child, idx)?;
    }
    trace!("parsed group {} with {} children", id, contents.len());
    Ok(idx)
}

fn parse_child_into(arena: &mut NodeArena, value: &Value, parent: Index) -> SettingsResult<()> {
    let (id, body) = split_node(value)?;
    let entry_type = declared_type(id, body)?;
    if arena.find_child(parent, id).is_some() {
        return Err(SettingsError::AlreadyExists(format!(
            "{}.{}",
            arena.path(parent),
            id
        )));
    }
    match entry_type {
        EntryType::Group => {
            parse_group_into(arena, value, Some(parent), false)?;
        }
        scalar => {
            let entry = entry_from_document(value, scalar)?;
            arena.attach(Node::Entry(entry), parent);
        }
    }
    Ok(())
}

fn wrap(id: &str, body: Map<String, Value>) -> Value {
    let mut node = Map::new();
    node.insert(id.to_string(), Value::Object(body));
    Value::Object(node)
}

fn body(entry_type: EntryType, description: Option<&str>) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert(TYPE_KEY.to_string(), Value::from(entry_type.as_str()));
    if let Some(desc) = description {
        body.insert(DESC_KEY.to_string(), Value::from(desc));
    }
    body
}

pub(crate) fn entry_to_document(entry: &Entry) -> Value {
    let mut body = body(entry.entry_type(), entry.description());
    body.insert(VALUE_KEY.to_string(), entry.value().to_json());
    wrap(entry.id(), body)
}

pub(crate) fn node_to_document(node: NodeRef<'_>) -> Value {
    let mut body = body(node.entry_type(), node.description());
    match node.value() {
        Some(value) => {
            body.insert(VALUE_KEY.to_string(), value.to_json());
        }
        None => {
            let contents = node.children().map(node_to_document).collect();
            body.insert(CONTENTS_KEY.to_string(), Value::Array(contents));
        }
    }
    wrap(node.id(), body)
}
