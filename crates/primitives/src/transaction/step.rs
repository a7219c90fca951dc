//! Atomic document steps and position mapping.

use crate::error::DocError;
use crate::mark::Mark;
use crate::node::{Attrs, Node};
use crate::schema::{Schema, compute_attrs};

/// Bias determines how positions at change boundaries are mapped.
///
/// When mapping a position through an insertion at that exact position, bias
/// decides whether the position stays before the inserted content or moves
/// after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
	/// Position stays before insertions at the same location.
	Left,
	/// Position moves after insertions at the same location.
	Right,
}

/// A single atomic document change.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
	/// Replaces `from..to` with `content`. Both ends must share a parent.
	Replace {
		from: usize,
		to: usize,
		content: Vec<Node>,
	},
	/// Adds `mark` to inline content in `from..to` where the parent allows it.
	AddMark { from: usize, to: usize, mark: Mark },
	/// Removes marks of type `kind` from inline content in `from..to`.
	RemoveMark { from: usize, to: usize, kind: String },
	/// Changes every textblock overlapping `from..to` to `kind`.
	SetBlockType {
		from: usize,
		to: usize,
		kind: String,
		attrs: Attrs,
	},
	/// Merges `attrs` into the attributes of the node starting at `pos`.
	SetAttrs { pos: usize, attrs: Attrs },
}

impl Step {
	/// Applies the step to `doc`, returning the new document.
	pub fn apply(&self, schema: &Schema, doc: &Node) -> Result<Node, DocError> {
		match self {
			Step::Replace { from, to, content } => replace(schema, doc, *from, *to, content),
			Step::AddMark { from, to, mark } => {
				let mut add = |parent: &Node, marks: &[Mark]| {
					let allowed = schema
						.node_type(parent.kind())
						.is_some_and(|t| t.allows_mark(mark.kind()));
					if !allowed {
						return marks.to_vec();
					}
					schema
						.add_mark_to_set(marks, mark.clone())
						.unwrap_or_else(|_| marks.to_vec())
				};
				Ok(map_inline(doc, 0, *from, *to, &mut add).0)
			}
			Step::RemoveMark { from, to, kind } => {
				let mut remove = |_: &Node, marks: &[Mark]| Mark::remove_from_set(marks, kind);
				Ok(map_inline(doc, 0, *from, *to, &mut remove).0)
			}
			Step::SetBlockType {
				from,
				to,
				kind,
				attrs,
			} => {
				let ty = schema.require_node(kind)?;
				if !ty.is_textblock() {
					return Err(DocError::InvalidContent {
						node: kind.clone(),
						content: "block type changes need a textblock type".into(),
					});
				}
				let attrs = compute_attrs(kind, &ty.spec().attrs, Some(attrs.clone()))?;
				let mut retype = |block: &Node| -> Result<Option<Node>, DocError> {
					if block.kind() == kind && block.attrs() == &attrs {
						return Ok(None);
					}
					let content: Vec<Node> = block
						.content()
						.iter()
						.map(|child| {
							let kept: Vec<Mark> = child
								.marks()
								.iter()
								.filter(|m| ty.allows_mark(m.kind()))
								.cloned()
								.collect();
							if kept.len() == child.marks().len() {
								child.clone()
							} else {
								child.with_marks(kept)
							}
						})
						.collect();
					let retyped = block.with_content(Node::join_text(content)).with_type(ty, attrs.clone());
					schema.check_content(ty, retyped.content())?;
					Ok(Some(retyped))
				};
				Ok(map_textblocks(schema, doc, 0, *from, *to, &mut retype)?.0)
			}
			Step::SetAttrs { pos, attrs } => {
				let rp = doc.resolve(*pos)?;
				let index = rp.index(rp.depth());
				let target = match rp.parent().child(index) {
					Some(node) if rp.text_offset() == 0 && !node.is_text() => node.clone(),
					_ => return Err(DocError::NoNodeAt(*pos)),
				};
				let ty = schema.require_node(target.kind())?;
				let mut merged = target.attrs().clone();
				merged.extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
				let merged = compute_attrs(target.kind(), &ty.spec().attrs, Some(merged))?;
				let parent = rp.parent().with_child(index, target.with_attrs(merged));
				Ok(rp.replace_parent(parent))
			}
		}
	}

	/// Position map describing how this step moves positions.
	pub fn map(&self) -> StepMap {
		match self {
			Step::Replace { from, to, content } => StepMap {
				ranges: vec![MapRange {
					start: *from,
					old_size: to - from,
					new_size: content.iter().map(Node::node_size).sum(),
				}],
			},
			_ => StepMap::default(),
		}
	}
}

fn replace(schema: &Schema, doc: &Node, from: usize, to: usize, content: &[Node]) -> Result<Node, DocError> {
	if from > to {
		return Err(DocError::InvalidReplace {
			from,
			to,
			reason: "range is reversed",
		});
	}
	let rf = doc.resolve(from)?;
	let rt = doc.resolve(to)?;
	let depth = rf.depth();
	if rt.depth() != depth || rf.start(depth) != rt.start(depth) {
		return Err(DocError::InvalidReplace {
			from,
			to,
			reason: "positions do not share a parent",
		});
	}
	let parent = rf.parent();
	let start = rf.start(depth);
	let mut children = parent.cut_content(0, from - start);
	children.extend(content.iter().cloned());
	children.extend(parent.cut_content(to - start, parent.content_size()));
	let children = Node::join_text(children);
	let ty = schema.require_node(parent.kind())?;
	schema.check_content(ty, &children)?;
	Ok(rf.replace_parent(parent.with_content(children)))
}

/// Rewrites the marks of inline content inside `from..to`.
///
/// `f` receives the inline node's parent and current marks. Returns the new
/// node and whether anything changed.
fn map_inline<F>(node: &Node, content_start: usize, from: usize, to: usize, f: &mut F) -> (Node, bool)
where
	F: FnMut(&Node, &[Mark]) -> Vec<Mark>,
{
	let mut out = Vec::with_capacity(node.child_count());
	let mut changed = false;
	let mut pos = content_start;
	for child in node.content() {
		let end = pos + child.node_size();
		if end <= from || pos >= to {
			out.push(child.clone());
		} else if child.is_inline() {
			let marks = f(node, child.marks());
			if marks.as_slice() == child.marks() {
				out.push(child.clone());
			} else if child.is_text() {
				let lo = from.max(pos) - pos;
				let hi = to.min(end) - pos;
				out.push(child.cut_text(0, lo));
				out.push(child.cut_text(lo, hi).with_marks(marks));
				out.push(child.cut_text(hi, child.node_size()));
				changed = true;
			} else {
				out.push(child.with_marks(marks));
				changed = true;
			}
		} else if !child.is_leaf() {
			let (mapped, child_changed) = map_inline(child, pos + 1, from, to, f);
			changed |= child_changed;
			out.push(mapped);
		} else {
			out.push(child.clone());
		}
		pos = end;
	}
	if changed {
		(node.with_content(Node::join_text(out)), true)
	} else {
		(node.clone(), false)
	}
}

/// Replaces textblocks overlapping `from..to` with the result of `f`.
fn map_textblocks<F>(
	schema: &Schema,
	node: &Node,
	content_start: usize,
	from: usize,
	to: usize,
	f: &mut F,
) -> Result<(Node, bool), DocError>
where
	F: FnMut(&Node) -> Result<Option<Node>, DocError>,
{
	let mut out = Vec::with_capacity(node.child_count());
	let mut changed = false;
	let mut pos = content_start;
	for child in node.content() {
		let end = pos + child.node_size();
		let overlaps = pos < to.max(from + 1) && end > from;
		if overlaps && child.is_textblock() {
			match f(child)? {
				Some(replaced) => {
					out.push(replaced);
					changed = true;
				}
				None => out.push(child.clone()),
			}
		} else if overlaps && !child.is_leaf() && !child.is_inline() {
			let (mapped, child_changed) = map_textblocks(schema, child, pos + 1, from, to, f)?;
			changed |= child_changed;
			out.push(mapped);
		} else {
			out.push(child.clone());
		}
		pos = end;
	}
	if !changed {
		return Ok((node.clone(), false));
	}
	let ty = schema.require_node(node.kind())?;
	schema.check_content(ty, &out)?;
	Ok((node.with_content(out), true))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MapRange {
	start: usize,
	old_size: usize,
	new_size: usize,
}

/// Position map of a single step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
	ranges: Vec<MapRange>,
}

/// Result of mapping a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
	/// The mapped position.
	pub pos: usize,
	/// Whether the content on the `bias` side of the position was deleted.
	pub deleted: bool,
}

impl StepMap {
	/// Maps a position through this step.
	pub fn map(&self, pos: usize, bias: Bias) -> usize {
		self.map_result(pos, bias).pos
	}

	/// Maps a position, also reporting whether its surroundings were deleted.
	pub fn map_result(&self, pos: usize, bias: Bias) -> MapResult {
		let mut diff: isize = 0;
		for range in &self.ranges {
			if range.start > pos {
				break;
			}
			let end = range.start + range.old_size;
			if pos <= end {
				let side_left = if range.old_size == 0 {
					bias == Bias::Left
				} else if pos == range.start {
					true
				} else if pos == end {
					false
				} else {
					bias == Bias::Left
				};
				let base = range.start as isize + diff;
				let mapped = if side_left {
					base
				} else {
					base + range.new_size as isize
				};
				let deleted = range.old_size > 0
					&& match bias {
						Bias::Left => pos > range.start,
						Bias::Right => pos < end,
					};
				return MapResult {
					pos: mapped.max(0) as usize,
					deleted,
				};
			}
			diff += range.new_size as isize - range.old_size as isize;
		}
		MapResult {
			pos: (pos as isize + diff).max(0) as usize,
			deleted: false,
		}
	}
}

/// A sequence of step maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
	maps: Vec<StepMap>,
}

impl Mapping {
	/// Appends a step map.
	pub fn push(&mut self, map: StepMap) {
		self.maps.push(map);
	}

	/// Step maps in application order.
	pub fn maps(&self) -> &[StepMap] {
		&self.maps
	}

	/// Maps a position through every step.
	pub fn map(&self, pos: usize, bias: Bias) -> usize {
		self.map_result(pos, bias).pos
	}

	/// Maps a position through every step, accumulating deletion.
	pub fn map_result(&self, pos: usize, bias: Bias) -> MapResult {
		let mut result = MapResult { pos, deleted: false };
		for map in &self.maps {
			let next = map.map_result(result.pos, bias);
			result = MapResult {
				pos: next.pos,
				deleted: result.deleted || next.deleted,
			};
		}
		result
	}
}
