//! Transactions: ordered steps plus selection, stored marks and metadata.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::DocError;
use crate::mark::Mark;
use crate::node::{Attrs, Node};
use crate::schema::Schema;
use crate::selection::Selection;
use crate::state::EditorState;

mod step;


pub use step::{Bias, MapResult, Mapping, Step, StepMap};

/// A pending change to an [`EditorState`].
///
/// Created with [`EditorState::tr`]; the document is updated as each step is
/// added, so later steps address the already changed document.
#[derive(Debug, Clone)]
pub struct Transaction {
	schema: Arc<Schema>,
	before: Node,
	doc: Node,
	steps: Vec<Step>,
	mapping: Mapping,
	selection: Selection,
	selection_set: bool,
	stored_marks: Option<Vec<Mark>>,
	stored_marks_set: bool,
	meta: IndexMap<String, Value>,
}

impl Transaction {
	pub(crate) fn new(state: &EditorState) -> Self {
		Self {
			schema: Arc::clone(state.schema()),
			before: state.doc().clone(),
			doc: state.doc().clone(),
			steps: Vec::new(),
			mapping: Mapping::default(),
			selection: *state.selection(),
			selection_set: false,
			stored_marks: state.stored_marks().map(<[Mark]>::to_vec),
			stored_marks_set: false,
			meta: IndexMap::new(),
		}
	}

	/// Schema of the document being edited.
	pub fn schema(&self) -> &Arc<Schema> {
		&self.schema
	}

	/// Document the transaction started from.
	pub fn before(&self) -> &Node {
		&self.before
	}

	/// Current document.
	pub fn doc(&self) -> &Node {
		&self.doc
	}

	/// Steps applied so far.
	pub fn steps(&self) -> &[Step] {
		&self.steps
	}

	/// Position mapping from the starting document to the current one.
	pub fn mapping(&self) -> &Mapping {
		&self.mapping
	}

	/// Whether any step changed the document.
	pub fn doc_changed(&self) -> bool {
		!self.steps.is_empty()
	}

	/// Current selection, mapped through the steps unless explicitly set.
	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Whether the selection was explicitly set.
	pub fn selection_set(&self) -> bool {
		self.selection_set
	}

	/// Marks applied to the next typed text, if any.
	pub fn stored_marks(&self) -> Option<&[Mark]> {
		self.stored_marks.as_deref()
	}

	/// Whether stored marks were explicitly changed.
	pub fn stored_marks_set(&self) -> bool {
		self.stored_marks_set
	}

	/// Applies a step, updating the document and the mapped selection.
	pub fn step(&mut self, step: Step) -> Result<&mut Self, DocError> {
		let doc = step.apply(&self.schema, &self.doc)?;
		let map = step.map();
		let mut single = Mapping::default();
		single.push(map.clone());
		self.mapping.push(map);
		self.doc = doc;
		if !self.selection_set {
			self.selection = self.selection.map(&single, &self.doc);
		}
		self.steps.push(step);
		self.stored_marks = None;
		self.stored_marks_set = false;
		Ok(self)
	}

	/// Replaces `from..to` with `content`.
	pub fn replace(&mut self, from: usize, to: usize, content: Vec<Node>) -> Result<&mut Self, DocError> {
		if from == to && content.is_empty() {
			return Ok(self);
		}
		self.step(Step::Replace { from, to, content })
	}

	/// Replaces `from..to` with a single node.
	pub fn replace_with(&mut self, from: usize, to: usize, node: Node) -> Result<&mut Self, DocError> {
		self.replace(from, to, vec![node])
	}

	/// Inserts nodes at `pos`.
	pub fn insert(&mut self, pos: usize, content: Vec<Node>) -> Result<&mut Self, DocError> {
		self.replace(pos, pos, content)
	}

	/// Deletes `from..to`.
	pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self, DocError> {
		self.replace(from, to, Vec::new())
	}

	/// Replaces `from..to` with `node`, placing block nodes at a valid block position.
	///
	/// Inline nodes are inserted as-is. A block node replaces an empty
	/// textblock, lands before a textblock when the range starts at its
	/// beginning, after it when at its end, and otherwise splits it.
	pub fn replace_range_with(&mut self, from: usize, to: usize, node: Node) -> Result<&mut Self, DocError> {
		if node.is_inline() {
			return self.replace_with(from, to, node);
		}
		self.delete(from, to)?;
		let pos = from;
		let rp = self.doc.resolve(pos)?;
		let depth = rp.depth();
		let parent = rp.parent().clone();
		let (Some(before), Some(after)) = (rp.before(depth), rp.after(depth)) else {
			return self.insert(pos, vec![node]);
		};
		if !parent.is_textblock() {
			return self.insert(pos, vec![node]);
		}
		let offset = rp.parent_offset();
		if parent.content_size() == 0 {
			self.replace(before, after, vec![node])
		} else if offset == 0 {
			self.insert(before, vec![node])
		} else if offset == parent.content_size() {
			self.insert(after, vec![node])
		} else {
			let head = parent.with_content(parent.cut_content(0, offset));
			let tail = parent.with_content(parent.cut_content(offset, parent.content_size()));
			self.replace(before, after, vec![head, node, tail])
		}
	}

	/// Replaces the selection with `node`.
	pub fn replace_selection_with(&mut self, node: Node) -> Result<&mut Self, DocError> {
		let (from, to) = self.selection.range(&self.doc);
		self.replace_range_with(from, to, node)
	}

	/// Deletes the selected content.
	pub fn delete_selection(&mut self) -> Result<&mut Self, DocError> {
		let (from, to) = self.selection.range(&self.doc);
		self.delete(from, to)
	}

	/// Inserts text at `from..to` with the marks active there.
	///
	/// Empty text deletes the range.
	pub fn insert_text(&mut self, text: &str, from: usize, to: usize) -> Result<&mut Self, DocError> {
		if text.is_empty() {
			return self.delete(from, to);
		}
		let rp = self.doc.resolve(from)?;
		let marks = match &self.stored_marks {
			Some(marks) => marks.clone(),
			None if from == to => rp.marks(&self.schema),
			None => self.doc.resolve(from + 1).map(|r| r.marks(&self.schema)).unwrap_or_default(),
		};
		let parent_type = self.schema.require_node(rp.parent().kind())?;
		let marks = marks
			.into_iter()
			.filter(|m| parent_type.allows_mark(m.kind()))
			.collect();
		let node = self.schema.text(text, marks)?;
		self.replace_with(from, to, node)
	}

	/// Adds a mark to the inline content in `from..to`.
	pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> Result<&mut Self, DocError> {
		if from >= to {
			return Ok(self);
		}
		self.step(Step::AddMark { from, to, mark })
	}

	/// Removes marks of type `kind` from the inline content in `from..to`.
	pub fn remove_mark(&mut self, from: usize, to: usize, kind: &str) -> Result<&mut Self, DocError> {
		if from >= to {
			return Ok(self);
		}
		self.step(Step::RemoveMark {
			from,
			to,
			kind: kind.to_string(),
		})
	}

	/// Changes the textblocks overlapping `from..to` to `kind`.
	pub fn set_block_type(
		&mut self,
		from: usize,
		to: usize,
		kind: &str,
		attrs: Option<Attrs>,
	) -> Result<&mut Self, DocError> {
		self.step(Step::SetBlockType {
			from,
			to,
			kind: kind.to_string(),
			attrs: attrs.unwrap_or_default(),
		})
	}

	/// Merges `attrs` into the node starting at `pos`.
	pub fn set_node_attrs(&mut self, pos: usize, attrs: Attrs) -> Result<&mut Self, DocError> {
		self.step(Step::SetAttrs { pos, attrs })
	}

	/// Sets the selection explicitly.
	pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
		self.selection = selection;
		self.selection_set = true;
		self
	}

	/// Sets the marks applied to the next typed text.
	pub fn set_stored_marks(&mut self, marks: Option<Vec<Mark>>) -> &mut Self {
		self.stored_marks = marks;
		self.stored_marks_set = true;
		self
	}

	/// Adds a mark to the stored marks, starting from the marks at the cursor.
	pub fn add_stored_mark(&mut self, mark: Mark) -> Result<&mut Self, DocError> {
		let current = self.current_marks()?;
		let marks = self.schema.add_mark_to_set(&current, mark)?;
		Ok(self.set_stored_marks(Some(marks)))
	}

	/// Removes marks of type `kind` from the stored marks.
	pub fn remove_stored_mark(&mut self, kind: &str) -> Result<&mut Self, DocError> {
		let current = self.current_marks()?;
		Ok(self.set_stored_marks(Some(Mark::remove_from_set(&current, kind))))
	}

	/// Marks that text typed at the selection head would receive.
	pub fn current_marks(&self) -> Result<Vec<Mark>, DocError> {
		if let Some(marks) = &self.stored_marks {
			return Ok(marks.clone());
		}
		let head = self.selection.head(&self.doc);
		Ok(self.doc.resolve(head)?.marks(&self.schema))
	}

	/// Attaches metadata.
	pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
		self.meta.insert(key.into(), value.into());
		self
	}

	/// Reads metadata.
	pub fn get_meta(&self, key: &str) -> Option<&Value> {
		self.meta.get(key)
	}
}
