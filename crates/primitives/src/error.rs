//! Error types for schema construction and document operations.

/// Errors raised while compiling a [`crate::SchemaSpec`] into a [`crate::Schema`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
	/// The configured top node type is not declared.
	#[error("top node type {0:?} is not declared")]
	MissingTopNode(String),
	/// Every schema needs a `text` node type.
	#[error("schema is missing the `text` node type")]
	MissingText,
	/// A node or mark name was declared twice.
	#[error("{kind} type {name:?} is declared more than once")]
	DuplicateType { kind: &'static str, name: String },
	/// A content expression could not be parsed.
	#[error("invalid content expression {expr:?} on {node:?}: {reason}")]
	InvalidContent {
		node: String,
		expr: String,
		reason: String,
	},
	/// A content expression or mark set names something that does not exist.
	#[error("{owner:?} references unknown node, mark or group {name:?}")]
	UnknownReference { owner: String, name: String },
}

/// Errors raised while building or editing documents.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocError {
	/// A node type name is not part of the schema.
	#[error("unknown node type {0:?}")]
	UnknownNodeType(String),
	/// A mark type name is not part of the schema.
	#[error("unknown mark type {0:?}")]
	UnknownMarkType(String),
	/// An attribute without a default was not supplied.
	#[error("missing required attribute {attr:?} on {owner:?}")]
	MissingAttribute { owner: String, attr: String },
	/// Node content does not satisfy the parent's content expression.
	#[error("invalid content for {node:?}: [{content}]")]
	InvalidContent { node: String, content: String },
	/// A mark is not allowed inside the given parent.
	#[error("mark {mark:?} is not allowed in {parent:?}")]
	MarkNotAllowed { mark: String, parent: String },
	/// A position lies outside the document.
	#[error("position {pos} is out of range (document size {size})")]
	PositionOutOfRange { pos: usize, size: usize },
	/// A replacement spans different parents or depths.
	#[error("cannot replace {from}..{to}: {reason}")]
	InvalidReplace {
		from: usize,
		to: usize,
		reason: &'static str,
	},
	/// No node exists at the given position.
	#[error("no node at position {0}")]
	NoNodeAt(usize),
	/// Malformed JSON document.
	#[error("invalid document JSON: {0}")]
	InvalidJson(String),
	/// The transaction was started from a state other than the one it is applied to.
	#[error("transaction does not start from the current document")]
	StaleTransaction,
}
