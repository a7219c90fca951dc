use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::transaction::{Bias, Mapping};


/// The selected part of a document.
///
/// Text selections always sit inside textblocks; node selections point at the
/// position directly before the selected node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Selection {
	/// A range of inline content. `head` is the moving end.
	Text { anchor: usize, head: usize },
	/// A single selected node.
	Node { pos: usize },
	/// The whole document.
	All,
}

impl Selection {
	/// Collapsed text selection.
	pub fn cursor(pos: usize) -> Self {
		Self::Text { anchor: pos, head: pos }
	}

	/// Text selection between two positions.
	pub fn text(anchor: usize, head: usize) -> Self {
		Self::Text { anchor, head }
	}

	/// Start of the selected range.
	pub fn from(&self, doc: &Node) -> usize {
		self.range(doc).0
	}

	/// End of the selected range.
	pub fn to(&self, doc: &Node) -> usize {
		self.range(doc).1
	}

	/// The selected range as `(from, to)`.
	pub fn range(&self, doc: &Node) -> (usize, usize) {
		match *self {
			Self::Text { anchor, head } => (anchor.min(head), anchor.max(head)),
			Self::Node { pos } => {
				let size = doc.node_at(pos).map_or(0, |n| n.node_size());
				(pos, pos + size)
			}
			Self::All => (0, doc.content_size()),
		}
	}

	/// Fixed end of the selection.
	pub fn anchor(&self, doc: &Node) -> usize {
		match *self {
			Self::Text { anchor, .. } => anchor,
			_ => self.from(doc),
		}
	}

	/// Moving end of the selection.
	pub fn head(&self, doc: &Node) -> usize {
		match *self {
			Self::Text { head, .. } => head,
			_ => self.to(doc),
		}
	}

	/// Whether nothing is selected.
	pub fn is_empty(&self, doc: &Node) -> bool {
		let (from, to) = self.range(doc);
		from == to
	}

	/// Maps the selection through document changes.
	///
	/// `doc` is the document after the changes.
	pub fn map(&self, mapping: &Mapping, doc: &Node) -> Selection {
		match *self {
			Self::Text { anchor, head } => {
				let head = mapping.map(head, Bias::Right);
				let anchor = mapping.map(anchor, Bias::Right);
				if is_text_position(doc, head) && is_text_position(doc, anchor) {
					Self::Text { anchor, head }
				} else {
					Self::near(doc, head, Bias::Right)
				}
			}
			Self::Node { pos } => {
				let mapped = mapping.map_result(pos, Bias::Right);
				if mapped.deleted || doc.node_at(mapped.pos).is_none_or(|n| n.is_text()) {
					Self::near(doc, mapped.pos, Bias::Right)
				} else {
					Self::Node { pos: mapped.pos }
				}
			}
			Self::All => Self::All,
		}
	}

	/// Finds a valid cursor near `pos`, searching in the direction of `bias` first.
	pub fn near(doc: &Node, pos: usize, bias: Bias) -> Selection {
		let pos = pos.min(doc.content_size());
		let blocks = textblock_ranges(doc);
		if let Some(&(start, end)) = blocks.iter().find(|(s, e)| *s <= pos && pos <= *e) {
			return Self::cursor(pos.clamp(start, end));
		}
		let after = blocks.iter().find(|(s, _)| *s >= pos).map(|&(s, _)| s);
		let before = blocks.iter().rev().find(|(_, e)| *e <= pos).map(|&(_, e)| e);
		let found = match bias {
			Bias::Right => after.or(before),
			Bias::Left => before.or(after),
		};
		match found {
			Some(p) => Self::cursor(p),
			None => Self::All,
		}
	}

	/// Cursor at the first valid position of the document.
	pub fn at_start(doc: &Node) -> Selection {
		Self::near(doc, 0, Bias::Right)
	}

	/// Cursor at the last valid position of the document.
	pub fn at_end(doc: &Node) -> Selection {
		Self::near(doc, doc.content_size(), Bias::Left)
	}

	/// Clamps the selection to a possibly smaller document.
	pub fn clamp(&self, doc: &Node) -> Selection {
		let size = doc.content_size();
		match *self {
			Self::Text { anchor, head } if anchor <= size && head <= size => {
				if is_text_position(doc, anchor) && is_text_position(doc, head) {
					*self
				} else {
					Self::near(doc, head, Bias::Left)
				}
			}
			Self::Text { head, .. } => Self::near(doc, head.min(size), Bias::Left),
			Self::Node { pos } if doc.node_at(pos).is_some_and(|n| !n.is_text()) => *self,
			Self::Node { pos } => Self::near(doc, pos, Bias::Left),
			Self::All => Self::All,
		}
	}
}

fn is_text_position(doc: &Node, pos: usize) -> bool {
	doc.resolve(pos).is_ok_and(|rp| rp.parent().is_textblock())
}

/// Content ranges `(start, end)` of every textblock, in document order.
fn textblock_ranges(doc: &Node) -> Vec<(usize, usize)> {
	let mut out = Vec::new();
	doc.nodes_between(0, doc.content_size(), &mut |node, pos| {
		if node.is_textblock() {
			out.push((pos + 1, pos + 1 + node.content_size()));
			return false;
		}
		true
	});
	out
}
