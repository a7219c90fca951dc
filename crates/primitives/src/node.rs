//! Immutable document nodes and position arithmetic.
//!
//! Positions count tokens: a text node contributes one token per character, a
//! leaf node contributes one token, and every other node contributes its
//! content plus an opening and a closing token.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::DocError;
use crate::mark::Mark;
use crate::schema::{NodeType, Schema};

/// Attribute values of a node or mark, ordered by name.
pub type Attrs = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NodeFlags {
	pub inline: bool,
	pub leaf: bool,
	pub textblock: bool,
}

#[derive(Debug, PartialEq)]
struct NodeData {
	kind: Arc<str>,
	attrs: Attrs,
	content: Vec<Node>,
	text: Option<String>,
	marks: Vec<Mark>,
	flags: NodeFlags,
	size: usize,
}

/// A shared, immutable document node.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl PartialEq for Node {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
	}
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(text) = &self.0.text {
			let marks: Vec<&str> = self.0.marks.iter().map(Mark::kind).collect();
			if marks.is_empty() {
				return write!(f, "{text:?}");
			}
			return write!(f, "{}({text:?})", marks.join("+"));
		}
		write!(f, "{}", self.0.kind)?;
		if !self.0.content.is_empty() {
			f.debug_list().entries(self.0.content.iter()).finish()?;
		}
		Ok(())
	}
}

impl Node {
	pub(crate) fn new_branch(
		kind: Arc<str>,
		attrs: Attrs,
		content: Vec<Node>,
		marks: Vec<Mark>,
		flags: NodeFlags,
	) -> Self {
		let size = if flags.leaf {
			1
		} else {
			content.iter().map(Node::node_size).sum::<usize>() + 2
		};
		Self(Arc::new(NodeData {
			kind,
			attrs,
			content,
			text: None,
			marks,
			flags,
			size,
		}))
	}

	pub(crate) fn new_text(kind: Arc<str>, text: String, marks: Vec<Mark>) -> Self {
		let size = text.chars().count();
		Self(Arc::new(NodeData {
			kind,
			attrs: Attrs::new(),
			content: Vec::new(),
			text: Some(text),
			marks,
			flags: NodeFlags {
				inline: true,
				leaf: true,
				textblock: false,
			},
			size,
		}))
	}

	/// Node type name.
	pub fn kind(&self) -> &str {
		&self.0.kind
	}

	/// Attribute values.
	pub fn attrs(&self) -> &Attrs {
		&self.0.attrs
	}

	/// Single attribute value.
	pub fn attr(&self, name: &str) -> Option<&Value> {
		self.0.attrs.get(name)
	}

	/// Child nodes.
	pub fn content(&self) -> &[Node] {
		&self.0.content
	}

	/// Child at `index`.
	pub fn child(&self, index: usize) -> Option<&Node> {
		self.0.content.get(index)
	}

	/// Number of children.
	pub fn child_count(&self) -> usize {
		self.0.content.len()
	}

	/// Text of a text node.
	pub fn text(&self) -> Option<&str> {
		self.0.text.as_deref()
	}

	/// Marks applied to this node.
	pub fn marks(&self) -> &[Mark] {
		&self.0.marks
	}

	/// Whether this is a text node.
	pub fn is_text(&self) -> bool {
		self.0.text.is_some()
	}

	/// Whether this node has no content.
	pub fn is_leaf(&self) -> bool {
		self.0.flags.leaf
	}

	/// Whether this is an inline node.
	pub fn is_inline(&self) -> bool {
		self.0.flags.inline
	}

	/// Whether this is a block node.
	pub fn is_block(&self) -> bool {
		!self.0.flags.inline
	}

	/// Whether this is a block holding inline content.
	pub fn is_textblock(&self) -> bool {
		self.0.flags.textblock
	}

	/// Size of the node in position tokens.
	pub fn node_size(&self) -> usize {
		self.0.size
	}

	/// Size of the node's content.
	pub fn content_size(&self) -> usize {
		if self.0.flags.leaf { 0 } else { self.0.size - 2 }
	}

	/// Whether a mark of the given type is applied to this node.
	pub fn has_mark(&self, kind: &str) -> bool {
		self.0.marks.iter().any(|m| m.kind() == kind)
	}

	/// Concatenated text of all descendant text nodes.
	pub fn text_content(&self) -> String {
		if let Some(text) = &self.0.text {
			return text.clone();
		}
		self.0.content.iter().map(Node::text_content).collect()
	}

	fn rebuilt(&self, attrs: Attrs, content: Vec<Node>, marks: Vec<Mark>) -> Node {
		if let Some(text) = &self.0.text {
			return Node::new_text(Arc::clone(&self.0.kind), text.clone(), marks);
		}
		Node::new_branch(Arc::clone(&self.0.kind), attrs, content, marks, self.0.flags)
	}

	pub(crate) fn with_content(&self, content: Vec<Node>) -> Node {
		self.rebuilt(self.0.attrs.clone(), content, self.0.marks.clone())
	}

	pub(crate) fn with_marks(&self, marks: Vec<Mark>) -> Node {
		self.rebuilt(self.0.attrs.clone(), self.0.content.clone(), marks)
	}

	pub(crate) fn with_attrs(&self, attrs: Attrs) -> Node {
		self.rebuilt(attrs, self.0.content.clone(), self.0.marks.clone())
	}

	pub(crate) fn with_type(&self, ty: &NodeType, attrs: Attrs) -> Node {
		Node::new_branch(
			Arc::from(ty.name()),
			attrs,
			self.0.content.clone(),
			self.0.marks.clone(),
			NodeFlags {
				inline: ty.is_inline(),
				leaf: ty.is_leaf(),
				textblock: ty.is_textblock(),
			},
		)
	}

	pub(crate) fn with_child(&self, index: usize, child: Node) -> Node {
		let mut content = self.0.content.clone();
		content[index] = child;
		self.with_content(content)
	}

	/// Slices a text node by character offsets.
	pub(crate) fn cut_text(&self, from: usize, to: usize) -> Node {
		let text = self.0.text.as_deref().unwrap_or_default();
		let sliced: String = text.chars().skip(from).take(to - from).collect();
		Node::new_text(Arc::clone(&self.0.kind), sliced, self.0.marks.clone())
	}

	/// Merges adjacent text nodes that carry the same marks.
	pub(crate) fn join_text(content: Vec<Node>) -> Vec<Node> {
		let mut out: Vec<Node> = Vec::with_capacity(content.len());
		for node in content {
			if node.is_text() && node.node_size() == 0 {
				continue;
			}
			if let Some(last) = out.last_mut()
				&& last.is_text()
				&& node.is_text()
				&& last.marks() == node.marks()
			{
				let mut text = last.text().unwrap_or_default().to_string();
				text.push_str(node.text().unwrap_or_default());
				*last = Node::new_text(Arc::clone(&last.0.kind), text, last.0.marks.clone());
				continue;
			}
			out.push(node);
		}
		out
	}

	/// Children covering the content range `from..to`, with text nodes cut at the edges.
	pub(crate) fn cut_content(&self, from: usize, to: usize) -> Vec<Node> {
		let mut out = Vec::new();
		let mut pos = 0;
		for child in &self.0.content {
			let end = pos + child.node_size();
			if end > from && pos < to {
				if child.is_text() {
					let start = from.max(pos) - pos;
					let stop = to.min(end) - pos;
					out.push(child.cut_text(start, stop));
				} else {
					out.push(child.clone());
				}
			}
			pos = end;
		}
		out
	}

	/// Finds the child index at a content offset, returning `(index, child_start)`.
	///
	/// An offset sitting exactly on a child boundary yields the index after it.
	pub fn find_index(&self, offset: usize) -> (usize, usize) {
		if offset == 0 {
			return (0, 0);
		}
		let mut pos = 0;
		for (i, child) in self.0.content.iter().enumerate() {
			let end = pos + child.node_size();
			if end >= offset {
				if end == offset {
					return (i + 1, end);
				}
				return (i, pos);
			}
			pos = end;
		}
		(self.0.content.len(), pos)
	}

	/// Resolves an absolute position into its ancestor path.
	pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, DocError> {
		if pos > self.content_size() {
			return Err(DocError::PositionOutOfRange {
				pos,
				size: self.content_size(),
			});
		}
		let mut levels = Vec::new();
		let mut node = self.clone();
		let mut start = 0;
		let mut offset = pos;
		loop {
			let (index, child_start) = node.find_index(offset);
			let rem = offset - child_start;
			levels.push(Level {
				node: node.clone(),
				start,
				index,
			});
			if rem == 0 {
				break;
			}
			let Some(child) = node.child(index).cloned() else {
				break;
			};
			if child.is_text() || child.is_leaf() {
				break;
			}
			start += child_start + 1;
			offset = rem - 1;
			node = child;
		}
		let parent_offset = pos - levels.last().map_or(0, |l| l.start);
		Ok(ResolvedPos {
			pos,
			levels,
			parent_offset,
		})
	}

	/// Returns the node starting at `pos`, if any.
	pub fn node_at(&self, pos: usize) -> Option<Node> {
		let rp = self.resolve(pos).ok()?;
		if rp.text_offset() != 0 {
			return None;
		}
		rp.parent().child(rp.index(rp.depth())).cloned()
	}

	/// Visits every descendant overlapping `from..to` with its absolute start position.
	///
	/// Returning `false` from the callback skips that node's children.
	pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F)
	where
		F: FnMut(&Node, usize) -> bool,
	{
		self.nodes_between_at(from, to, 0, f);
	}

	fn nodes_between_at<F>(&self, from: usize, to: usize, content_start: usize, f: &mut F)
	where
		F: FnMut(&Node, usize) -> bool,
	{
		let mut pos = content_start;
		for child in &self.0.content {
			if pos > to {
				break;
			}
			let end = pos + child.node_size();
			let overlaps = (pos < to && end > from) || (from == to && pos <= from && end >= from);
			if overlaps && f(child, pos) && !child.is_leaf() {
				child.nodes_between_at(from, to, pos + 1, f);
			}
			pos = end;
		}
	}

	/// Text between two positions, separating blocks with `block_separator`.
	pub fn text_between(&self, from: usize, to: usize, block_separator: &str) -> String {
		let mut out = String::new();
		let mut separated = true;
		self.nodes_between(from, to, &mut |node, pos| {
			if let Some(text) = node.text() {
				let start = from.saturating_sub(pos);
				let end = (to - pos).min(node.node_size());
				if start < end {
					out.extend(text.chars().skip(start).take(end - start));
				}
				separated = false;
			} else if node.is_block() && !separated {
				out.push_str(block_separator);
				separated = true;
			}
			true
		});
		out
	}

	/// Whether any inline content in `from..to` carries a mark of type `kind`.
	pub fn range_has_mark(&self, from: usize, to: usize, kind: &str) -> bool {
		let mut found = false;
		self.nodes_between(from, to, &mut |node, _| {
			if node.is_inline() && node.has_mark(kind) {
				found = true;
			}
			!found
		});
		found
	}

	/// Whether every text character in `from..to` carries a mark of type `kind`.
	///
	/// Returns `false` for ranges without text.
	pub fn range_fully_marked(&self, from: usize, to: usize, kind: &str) -> bool {
		let mut any = false;
		let mut all = true;
		self.nodes_between(from, to, &mut |node, _| {
			if node.is_text() {
				any = true;
				all &= node.has_mark(kind);
			}
			all
		});
		any && all
	}

	/// Serializes the node to its JSON form.
	pub fn to_json(&self) -> Value {
		let mut obj = Map::new();
		obj.insert("type".into(), Value::String(self.kind().to_string()));
		if !self.0.attrs.is_empty() {
			obj.insert(
				"attrs".into(),
				Value::Object(self.0.attrs.clone().into_iter().collect()),
			);
		}
		if let Some(text) = &self.0.text {
			obj.insert("text".into(), Value::String(text.clone()));
		}
		if !self.0.content.is_empty() {
			obj.insert(
				"content".into(),
				Value::Array(self.0.content.iter().map(Node::to_json).collect()),
			);
		}
		if !self.0.marks.is_empty() {
			obj.insert(
				"marks".into(),
				Value::Array(self.0.marks.iter().map(Mark::to_json).collect()),
			);
		}
		Value::Object(obj)
	}

	/// Parses a node from its JSON form.
	pub fn from_json(schema: &Schema, json: &Value) -> Result<Node, DocError> {
		Self::parse_json(schema, json, false)
	}

	/// Parses a node, dropping marks the schema does not know.
	pub fn from_json_lenient(schema: &Schema, json: &Value) -> Result<Node, DocError> {
		Self::parse_json(schema, json, true)
	}

	fn parse_json(schema: &Schema, json: &Value, lenient: bool) -> Result<Node, DocError> {
		let kind = json
			.get("type")
			.and_then(Value::as_str)
			.ok_or_else(|| DocError::InvalidJson("node without a type".into()))?;
		let mut marks = Vec::new();
		if let Some(list) = json.get("marks") {
			let list = list
				.as_array()
				.ok_or_else(|| DocError::InvalidJson("marks must be an array".into()))?;
			for m in list {
				match Mark::from_json(schema, m) {
					Ok(mark) => marks.push(mark),
					Err(DocError::UnknownMarkType(name)) if lenient => {
						tracing::debug!(mark = %name, "dropping mark unknown to schema");
					}
					Err(e) => return Err(e),
				}
			}
		}
		if kind == "text" {
			let text = json
				.get("text")
				.and_then(Value::as_str)
				.ok_or_else(|| DocError::InvalidJson("text node without text".into()))?;
			return schema.text(text, marks);
		}
		let attrs = attrs_from_json(json.get("attrs"))?;
		let mut content = Vec::new();
		if let Some(list) = json.get("content") {
			let list = list
				.as_array()
				.ok_or_else(|| DocError::InvalidJson("content must be an array".into()))?;
			for child in list {
				content.push(Self::parse_json(schema, child, lenient)?);
			}
		}
		schema.node(kind, attrs, content, marks)
	}
}

pub(crate) fn attrs_from_json(json: Option<&Value>) -> Result<Option<Attrs>, DocError> {
	match json {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Object(map)) => Ok(Some(
			map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
		)),
		Some(_) => Err(DocError::InvalidJson("attrs must be an object".into())),
	}
}

#[derive(Debug, Clone)]
struct Level {
	node: Node,
	/// Absolute position of the node's content start.
	start: usize,
	/// Child index the position points at.
	index: usize,
}

/// A position resolved against a document.
#[derive(Debug, Clone)]
pub struct ResolvedPos {
	pos: usize,
	levels: Vec<Level>,
	parent_offset: usize,
}

impl ResolvedPos {
	/// The absolute position.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Depth of the innermost parent (the document is depth 0).
	pub fn depth(&self) -> usize {
		self.levels.len() - 1
	}

	/// Innermost parent node.
	pub fn parent(&self) -> &Node {
		&self.levels[self.depth()].node
	}

	/// Ancestor at `depth`.
	pub fn node(&self, depth: usize) -> &Node {
		&self.levels[depth].node
	}

	/// Content start of the ancestor at `depth`.
	pub fn start(&self, depth: usize) -> usize {
		self.levels[depth].start
	}

	/// Content end of the ancestor at `depth`.
	pub fn end(&self, depth: usize) -> usize {
		self.start(depth) + self.node(depth).content_size()
	}

	/// Position directly before the ancestor at `depth`; `None` for the document.
	pub fn before(&self, depth: usize) -> Option<usize> {
		(depth > 0).then(|| self.start(depth) - 1)
	}

	/// Position directly after the ancestor at `depth`; `None` for the document.
	pub fn after(&self, depth: usize) -> Option<usize> {
		(depth > 0).then(|| self.end(depth) + 1)
	}

	/// Child index the position points at inside the ancestor at `depth`.
	pub fn index(&self, depth: usize) -> usize {
		self.levels[depth].index
	}

	/// Offset of the position inside its parent's content.
	pub fn parent_offset(&self) -> usize {
		self.parent_offset
	}

	/// Offset into the text node the position falls inside, or 0 at a boundary.
	pub fn text_offset(&self) -> usize {
		let parent = self.parent();
		let (_, child_start) = parent.find_index(self.parent_offset);
		self.parent_offset - child_start
	}

	/// Marks that text inserted at this position would receive.
	pub fn marks(&self, schema: &Schema) -> Vec<Mark> {
		let parent = self.parent();
		let index = self.index(self.depth());
		if parent.content_size() == 0 {
			return Vec::new();
		}
		if self.text_offset() > 0 {
			return parent
				.child(index)
				.map(|n| n.marks().to_vec())
				.unwrap_or_default();
		}
		let before = index.checked_sub(1).and_then(|i| parent.child(i));
		let after = parent.child(index);
		let (main, other) = match before {
			Some(b) => (b, after),
			None => match after {
				Some(a) => (a, None),
				None => return Vec::new(),
			},
		};
		main.marks()
			.iter()
			.filter(|m| {
				let inclusive = schema
					.mark_type(m.kind())
					.is_none_or(|t| t.spec().inclusive);
				inclusive || other.is_some_and(|o| m.is_in_set(o.marks()))
			})
			.cloned()
			.collect()
	}

	/// Rebuilds the document with the innermost parent replaced by `parent`.
	pub(crate) fn replace_parent(&self, parent: Node) -> Node {
		self.replace_at_depth(self.depth(), parent)
	}

	/// Rebuilds the document with the ancestor at `depth` replaced by `node`.
	pub(crate) fn replace_at_depth(&self, depth: usize, node: Node) -> Node {
		let mut node = node;
		for d in (0..depth).rev() {
			let level = &self.levels[d];
			node = level.node.with_child(level.index, node);
		}
		node
	}
}
