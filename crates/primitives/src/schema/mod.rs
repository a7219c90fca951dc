//! Document schema: node and mark types compiled from declarative specs.

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocError, SchemaError};
use crate::mark::Mark;
use crate::node::{Attrs, Node, NodeFlags};

pub mod content;


pub use content::ContentExpr;

/// Declared attribute of a node or mark type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
	/// Default value; `None` makes the attribute required.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default: Option<Value>,
}

impl AttributeSpec {
	/// Attribute with the given default.
	pub fn with_default(default: impl Into<Value>) -> Self {
		Self {
			default: Some(default.into()),
		}
	}

	/// Attribute that must always be supplied.
	pub fn required() -> Self {
		Self { default: None }
	}
}

/// Declarative description of a node type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
	/// Content expression; `None` declares a leaf.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
	/// Space separated group names.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub group: Option<String>,
	/// Whether this is an inline node.
	#[serde(default)]
	pub inline: bool,
	/// Whether the node is treated as a single unit.
	#[serde(default)]
	pub atom: bool,
	/// Allowed marks: `None` allows all marks in text blocks, `""` none, otherwise names or groups.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub marks: Option<String>,
	/// Declared attributes, in a stable order.
	#[serde(default)]
	pub attrs: BTreeMap<String, AttributeSpec>,
	/// Whether the node keeps its type when content is replaced.
	#[serde(default)]
	pub defining: bool,
}

impl NodeSpec {
	/// Block node with the given content expression and group.
	pub fn block(content: Option<&str>, group: &str) -> Self {
		Self {
			content: content.map(str::to_string),
			group: Some(group.to_string()),
			..Self::default()
		}
	}

	/// Adds or replaces an attribute.
	pub fn attr(mut self, name: impl Into<String>, spec: AttributeSpec) -> Self {
		self.attrs.insert(name.into(), spec);
		self
	}

	fn groups(&self) -> impl Iterator<Item = &str> {
		self.group.iter().flat_map(|g| g.split_whitespace())
	}
}

/// Declarative description of a mark type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkSpec {
	/// Declared attributes, in a stable order.
	#[serde(default)]
	pub attrs: BTreeMap<String, AttributeSpec>,
	/// Whether text typed at the end of the mark inherits it.
	#[serde(default = "default_true")]
	pub inclusive: bool,
	/// Marks excluded by this one: `None` excludes only itself, `"_"` everything.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub excludes: Option<String>,
	/// Space separated group names.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub group: Option<String>,
}

fn default_true() -> bool {
	true
}

impl Default for MarkSpec {
	fn default() -> Self {
		Self {
			attrs: BTreeMap::new(),
			inclusive: true,
			excludes: None,
			group: None,
		}
	}
}

impl MarkSpec {
	/// Adds or replaces an attribute.
	pub fn attr(mut self, name: impl Into<String>, spec: AttributeSpec) -> Self {
		self.attrs.insert(name.into(), spec);
		self
	}
}

/// Full schema description, ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSpec {
	/// Name of the document root type.
	pub top_node: String,
	/// Node types; earlier types win "first in group" lookups.
	pub nodes: Vec<(String, NodeSpec)>,
	/// Mark types; order determines mark rank.
	pub marks: Vec<(String, MarkSpec)>,
}

/// A compiled node type.
#[derive(Debug, Clone)]
pub struct NodeType {
	name: Arc<str>,
	spec: NodeSpec,
	content: ContentExpr,
	/// `None` allows every mark.
	allowed_marks: Option<Vec<String>>,
	inline_content: bool,
}

impl NodeType {
	/// Type name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The `NodeSpec` this type was compiled from.
	pub fn spec(&self) -> &NodeSpec {
		&self.spec
	}

	/// Compiled content expression.
	pub fn content_expr(&self) -> &ContentExpr {
		&self.content
	}

	/// Whether this type is inline.
	pub fn is_inline(&self) -> bool {
		self.spec.inline
	}

	/// Whether this type is a block holding inline content.
	pub fn is_textblock(&self) -> bool {
		!self.spec.inline && self.inline_content
	}

	/// Whether this type accepts no content.
	pub fn is_leaf(&self) -> bool {
		self.content.is_leaf()
	}

	/// Whether this type belongs to the given group.
	pub fn in_group(&self, group: &str) -> bool {
		self.spec.groups().any(|g| g == group)
	}

	/// Whether marks of the given type may appear inside this node.
	pub fn allows_mark(&self, mark: &str) -> bool {
		match &self.allowed_marks {
			None => true,
			Some(list) => list.iter().any(|m| m == mark),
		}
	}

	fn flags(&self) -> NodeFlags {
		NodeFlags {
			inline: self.spec.inline,
			leaf: self.content.is_leaf(),
			textblock: self.is_textblock(),
		}
	}

	fn has_required_attrs(&self) -> bool {
		self.spec.attrs.values().any(|a| a.default.is_none())
	}
}

/// A compiled mark type.
#[derive(Debug, Clone)]
pub struct MarkType {
	name: Arc<str>,
	spec: MarkSpec,
	rank: usize,
	excluded: Vec<String>,
}

impl MarkType {
	/// Type name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The `MarkSpec` this type was compiled from.
	pub fn spec(&self) -> &MarkSpec {
		&self.spec
	}

	/// Position in the schema; marks on a node are kept sorted by rank.
	pub fn rank(&self) -> usize {
		self.rank
	}

	/// Whether this mark type excludes `other`.
	pub fn excludes(&self, other: &str) -> bool {
		self.excluded.iter().any(|m| m == other)
	}
}

/// A compiled document schema.
#[derive(Debug)]
pub struct Schema {
	spec: SchemaSpec,
	nodes: IndexMap<String, NodeType>,
	marks: IndexMap<String, MarkType>,
}

impl Schema {
	/// Compiles a schema from its spec.
	pub fn new(spec: SchemaSpec) -> Result<Self, SchemaError> {
		let mut node_specs: IndexMap<String, NodeSpec> = IndexMap::new();
		for (name, node) in &spec.nodes {
			if node_specs.insert(name.clone(), node.clone()).is_some() {
				return Err(SchemaError::DuplicateType {
					kind: "node",
					name: name.clone(),
				});
			}
		}
		let mut mark_specs: IndexMap<String, MarkSpec> = IndexMap::new();
		for (name, mark) in &spec.marks {
			if mark_specs.insert(name.clone(), mark.clone()).is_some() {
				return Err(SchemaError::DuplicateType {
					kind: "mark",
					name: name.clone(),
				});
			}
		}
		if !node_specs.contains_key(&spec.top_node) {
			return Err(SchemaError::MissingTopNode(spec.top_node.clone()));
		}
		if !node_specs.contains_key("text") {
			return Err(SchemaError::MissingText);
		}

		let marks = compile_marks(&mark_specs)?;

		// First pass: raw content terms, resolved against node names and groups.
		let mut nodes: IndexMap<String, NodeType> = IndexMap::new();
		for (name, node) in &node_specs {
			let raw = match &node.content {
				Some(expr) => content::parse(name, expr)?,
				None => Vec::new(),
			};
			let mut terms = Vec::with_capacity(raw.len());
			for term in raw {
				let mut choices = Vec::new();
				for ref_name in &term.names {
					let resolved = resolve_node_ref(&node_specs, ref_name);
					if resolved.is_empty() {
						return Err(SchemaError::UnknownReference {
							owner: name.clone(),
							name: ref_name.clone(),
						});
					}
					for r in resolved {
						if !choices.contains(&r) {
							choices.push(r);
						}
					}
				}
				terms.push(content::Term {
					choices,
					min: term.min,
					max: term.max,
					default: None,
				});
			}
			let inline_content = terms.iter().any(|t| {
				t.choices
					.iter()
					.any(|c| node_specs.get(c).is_some_and(|s| s.inline))
			});
			let allowed_marks = match node.marks.as_deref() {
				None if inline_content => None,
				None => Some(Vec::new()),
				Some("_") => None,
				Some(list) => Some(resolve_mark_refs(&marks, name, list)?),
			};
			nodes.insert(
				name.clone(),
				NodeType {
					name: Arc::from(name.as_str()),
					spec: node.clone(),
					content: ContentExpr { terms },
					allowed_marks,
					inline_content,
				},
			);
		}

		// Second pass: pick fill defaults now that every type is known.
		let creatable: Vec<String> = nodes
			.values()
			.filter(|t| t.name() != "text" && !t.has_required_attrs())
			.map(|t| t.name().to_string())
			.collect();
		for node in nodes.values_mut() {
			for term in &mut node.content.terms {
				term.default = term
					.choices
					.iter()
					.find(|c| creatable.contains(c))
					.cloned();
			}
		}

		Ok(Self { spec, nodes, marks })
	}

	/// The `SchemaSpec` this schema was compiled from.
	pub fn spec(&self) -> &SchemaSpec {
		&self.spec
	}

	/// Name of the root node type.
	pub fn top_node(&self) -> &str {
		&self.spec.top_node
	}

	/// Looks up a node type.
	pub fn node_type(&self, name: &str) -> Option<&NodeType> {
		self.nodes.get(name)
	}

	/// Looks up a mark type.
	pub fn mark_type(&self, name: &str) -> Option<&MarkType> {
		self.marks.get(name)
	}

	/// Node types in schema order.
	pub fn node_types(&self) -> impl Iterator<Item = &NodeType> {
		self.nodes.values()
	}

	/// Mark types in rank order.
	pub fn mark_types(&self) -> impl Iterator<Item = &MarkType> {
		self.marks.values()
	}

	pub(crate) fn require_node(&self, name: &str) -> Result<&NodeType, DocError> {
		self.nodes
			.get(name)
			.ok_or_else(|| DocError::UnknownNodeType(name.to_string()))
	}

	pub(crate) fn require_mark(&self, name: &str) -> Result<&MarkType, DocError> {
		self.marks
			.get(name)
			.ok_or_else(|| DocError::UnknownMarkType(name.to_string()))
	}

	/// Creates a validated node.
	pub fn node(
		&self,
		name: &str,
		attrs: Option<Attrs>,
		content: Vec<Node>,
		marks: Vec<Mark>,
	) -> Result<Node, DocError> {
		let ty = self.require_node(name)?;
		if name == "text" {
			return Err(DocError::InvalidContent {
				node: name.to_string(),
				content: "use Schema::text".to_string(),
			});
		}
		let attrs = compute_attrs(name, &ty.spec.attrs, attrs)?;
		let marks = self.normalize_marks(marks)?;
		let content = Node::join_text(content);
		self.check_content(ty, &content)?;
		Ok(Node::new_branch(
			Arc::clone(&ty.name),
			attrs,
			content,
			marks,
			ty.flags(),
		))
	}

	/// Creates a text node. Text must not be empty.
	pub fn text(&self, text: impl Into<String>, marks: Vec<Mark>) -> Result<Node, DocError> {
		let text = text.into();
		if text.is_empty() {
			return Err(DocError::InvalidContent {
				node: "text".to_string(),
				content: "empty text".to_string(),
			});
		}
		let ty = self.require_node("text")?;
		let marks = self.normalize_marks(marks)?;
		Ok(Node::new_text(Arc::clone(&ty.name), text, marks))
	}

	/// Creates a mark with defaults filled in.
	pub fn mark(&self, name: &str, attrs: Option<Attrs>) -> Result<Mark, DocError> {
		let ty = self.require_mark(name)?;
		let attrs = compute_attrs(name, &ty.spec.attrs, attrs)?;
		Ok(Mark::new(Arc::clone(&ty.name), attrs))
	}

	/// Creates a node, filling in required content with default children.
	pub fn create_and_fill(&self, name: &str, attrs: Option<Attrs>) -> Result<Node, DocError> {
		let ty = self.require_node(name)?;
		let fill = ty.content.fill().ok_or_else(|| DocError::InvalidContent {
			node: name.to_string(),
			content: "no creatable default content".to_string(),
		})?;
		let mut content = Vec::with_capacity(fill.len());
		for child in fill {
			content.push(self.create_and_fill(&child, None)?);
		}
		self.node(name, attrs, content, Vec::new())
	}

	/// Validates `content` against the content expression and mark set of `ty`.
	pub(crate) fn check_content(&self, ty: &NodeType, content: &[Node]) -> Result<(), DocError> {
		let kinds: Vec<&str> = content.iter().map(Node::kind).collect();
		if !ty.content.matches(&kinds) {
			return Err(DocError::InvalidContent {
				node: ty.name().to_string(),
				content: kinds.join(", "),
			});
		}
		for child in content {
			for mark in child.marks() {
				if !ty.allows_mark(mark.kind()) {
					return Err(DocError::MarkNotAllowed {
						mark: mark.kind().to_string(),
						parent: ty.name().to_string(),
					});
				}
			}
		}
		Ok(())
	}

	/// Sorts marks by rank and applies exclusion rules; later marks replace excluded earlier ones.
	pub fn normalize_marks(&self, marks: Vec<Mark>) -> Result<Vec<Mark>, DocError> {
		let mut set: Vec<Mark> = Vec::with_capacity(marks.len());
		for mark in marks {
			set = self.add_mark_to_set(&set, mark)?;
		}
		Ok(set)
	}

	/// Returns `set` with `mark` added, replacing any marks it excludes.
	pub fn add_mark_to_set(&self, set: &[Mark], mark: Mark) -> Result<Vec<Mark>, DocError> {
		let ty = self.require_mark(mark.kind())?;
		let mut out: Vec<Mark> = set
			.iter()
			.filter(|m| m.kind() != mark.kind() && !ty.excludes(m.kind()))
			.cloned()
			.collect();
		let pos = out
			.iter()
			.position(|m| self.marks.get(m.kind()).is_some_and(|t| t.rank > ty.rank))
			.unwrap_or(out.len());
		out.insert(pos, mark);
		Ok(out)
	}
}

fn compile_marks(specs: &IndexMap<String, MarkSpec>) -> Result<IndexMap<String, MarkType>, SchemaError> {
	let mut marks = IndexMap::new();
	for (rank, (name, spec)) in specs.iter().enumerate() {
		let excluded = match spec.excludes.as_deref() {
			None => vec![name.clone()],
			Some("_") => specs.keys().cloned().collect(),
			Some(list) => {
				let mut out = Vec::new();
				for item in list.split_whitespace() {
					let resolved: Vec<String> = specs
						.iter()
						.filter(|(n, s)| {
							n.as_str() == item
								|| s.group
									.as_deref()
									.is_some_and(|g| g.split_whitespace().any(|g| g == item))
						})
						.map(|(n, _)| n.clone())
						.collect();
					if resolved.is_empty() {
						return Err(SchemaError::UnknownReference {
							owner: name.clone(),
							name: item.to_string(),
						});
					}
					out.extend(resolved);
				}
				out
			}
		};
		marks.insert(
			name.clone(),
			MarkType {
				name: Arc::from(name.as_str()),
				spec: spec.clone(),
				rank,
				excluded,
			},
		);
	}
	Ok(marks)
}

fn resolve_node_ref(specs: &IndexMap<String, NodeSpec>, name: &str) -> Vec<String> {
	if specs.contains_key(name) {
		return vec![name.to_string()];
	}
	specs
		.iter()
		.filter(|(_, s)| s.groups().any(|g| g == name))
		.map(|(n, _)| n.clone())
		.collect()
}

fn resolve_mark_refs(
	marks: &IndexMap<String, MarkType>,
	owner: &str,
	list: &str,
) -> Result<Vec<String>, SchemaError> {
	let mut out = Vec::new();
	for item in list.split_whitespace() {
		let resolved: Vec<String> = marks
			.values()
			.filter(|m| {
				m.name() == item
					|| m.spec
						.group
						.as_deref()
						.is_some_and(|g| g.split_whitespace().any(|g| g == item))
			})
			.map(|m| m.name().to_string())
			.collect();
		if resolved.is_empty() {
			return Err(SchemaError::UnknownReference {
				owner: owner.to_string(),
				name: item.to_string(),
			});
		}
		out.extend(resolved);
	}
	Ok(out)
}

/// Fills declared attributes from `given`, falling back to defaults.
pub(crate) fn compute_attrs(
	owner: &str,
	declared: &BTreeMap<String, AttributeSpec>,
	given: Option<Attrs>,
) -> Result<Attrs, DocError> {
	let mut given = given.unwrap_or_default();
	let mut out = Attrs::new();
	for (name, spec) in declared {
		let value = match given.remove(name) {
			Some(v) => v,
			None => spec.default.clone().ok_or_else(|| DocError::MissingAttribute {
				owner: owner.to_string(),
				attr: name.clone(),
			})?,
		};
		out.insert(name.clone(), value);
	}
	Ok(out)
}
