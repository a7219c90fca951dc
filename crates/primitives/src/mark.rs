//! Marks: inline annotations such as emphasis or links.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::DocError;
use crate::node::Attrs;
use crate::schema::Schema;

/// A mark instance attached to inline content.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
	kind: Arc<str>,
	attrs: Attrs,
}

impl Mark {
	pub(crate) fn new(kind: Arc<str>, attrs: Attrs) -> Self {
		Self { kind, attrs }
	}

	/// Mark type name.
	pub fn kind(&self) -> &str {
		&self.kind
	}

	/// Attribute values.
	pub fn attrs(&self) -> &Attrs {
		&self.attrs
	}

	/// Returns true if `set` contains a mark of this type with equal attributes.
	pub fn is_in_set(&self, set: &[Mark]) -> bool {
		set.iter().any(|m| m == self)
	}

	/// Returns `set` without marks of type `kind`.
	pub fn remove_from_set(set: &[Mark], kind: &str) -> Vec<Mark> {
		set.iter().filter(|m| m.kind() != kind).cloned().collect()
	}

	/// Serializes the mark to its JSON form.
	pub fn to_json(&self) -> Value {
		let mut obj = Map::new();
		obj.insert("type".into(), Value::String(self.kind.to_string()));
		if !self.attrs.is_empty() {
			obj.insert(
				"attrs".into(),
				Value::Object(self.attrs.clone().into_iter().collect()),
			);
		}
		Value::Object(obj)
	}

	/// Parses a mark from its JSON form.
	pub fn from_json(schema: &Schema, json: &Value) -> Result<Mark, DocError> {
		let kind = json
			.get("type")
			.and_then(Value::as_str)
			.ok_or_else(|| DocError::InvalidJson("mark without a type".into()))?;
		let attrs = crate::node::attrs_from_json(json.get("attrs"))?;
		schema.mark(kind, attrs)
	}
}
