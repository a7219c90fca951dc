//! Command bodies shared by several built-ins.

use quire_primitives::{Attrs, DocError, EditorState, Node, Transaction};
use quire_registry::{InputRuleProps, Store};
use serde_json::Value;

/// Adds `mark` to the selection, or to the stored marks when nothing is selected.
pub(crate) fn set_mark(tr: &mut Transaction, mark: &str) -> Result<bool, DocError> {
	let value = tr.schema().mark(mark, None)?;
	let (from, to) = tr.selection().range(tr.doc());
	if from == to {
		tr.add_stored_mark(value)?;
	} else {
		tr.add_mark(from, to, value)?;
	}
	Ok(true)
}

pub(crate) fn remove_mark(tr: &mut Transaction, mark: &str) -> Result<bool, DocError> {
	let (from, to) = tr.selection().range(tr.doc());
	if from == to {
		tr.remove_stored_mark(mark)?;
	} else {
		tr.remove_mark(from, to, mark)?;
	}
	Ok(true)
}

/// Removes `mark` when the whole selection carries it, adds it otherwise.
pub(crate) fn toggle_mark(tr: &mut Transaction, mark: &str) -> Result<bool, DocError> {
	let (from, to) = tr.selection().range(tr.doc());
	let active = if from == to {
		tr.current_marks()?.iter().any(|m| m.kind() == mark)
	} else {
		tr.doc().range_fully_marked(from, to, mark)
	};
	if active { remove_mark(tr, mark) } else { set_mark(tr, mark) }
}

/// Whether `mark` applies at the cursor, or anywhere in a selected range.
pub(crate) fn mark_active(state: &EditorState, mark: &str) -> bool {
	let (from, to) = state.selection().range(state.doc());
	if from != to {
		return state.doc().range_has_mark(from, to, mark);
	}
	if let Some(stored) = state.stored_marks() {
		return stored.iter().any(|m| m.kind() == mark);
	}
	state
		.doc()
		.resolve(from)
		.is_ok_and(|rp| rp.marks(state.schema()).iter().any(|m| m.kind() == mark))
}

/// Replaces an input rule match with `inner` wrapped in `mark`.
///
/// `skip` characters at the start of the match are kept as typed.
pub(crate) fn wrap_match(props: &mut InputRuleProps<'_>, mark: &str, skip: usize, inner: &str) -> Result<bool, DocError> {
	if inner.is_empty() {
		return Ok(false);
	}
	let schema = props.tr.schema().clone();
	let value = schema.mark(mark, None)?;
	let marks = schema.add_mark_to_set(&props.tr.current_marks()?, value)?;
	let node = schema.text(inner, marks)?;
	props.tr.replace_with(props.from + skip, props.to, node)?;
	props.tr.remove_stored_mark(mark)?;
	Ok(true)
}

/// The textblock around the selection head, with its start position.
pub(crate) fn textblock_at_head(tr: &Transaction) -> Result<Option<(Node, usize)>, DocError> {
	let head = tr.selection().head(tr.doc());
	let rp = tr.doc().resolve(head)?;
	let parent = rp.parent();
	if !parent.is_textblock() {
		return Ok(None);
	}
	Ok(rp.before(rp.depth()).map(|pos| (parent.clone(), pos)))
}

/// Starts of the textblocks overlapping the selection.
pub(crate) fn selected_textblocks(tr: &Transaction) -> Vec<(Node, usize)> {
	let (from, to) = tr.selection().range(tr.doc());
	let mut found = Vec::new();
	tr.doc().nodes_between(from, to, &mut |node, pos| {
		if node.is_textblock() {
			found.push((node.clone(), pos));
			return false;
		}
		true
	});
	found
}

pub(crate) fn single_attr(name: &str, value: impl Into<Value>) -> Attrs {
	let mut attrs = Attrs::new();
	attrs.insert(name.to_string(), value.into());
	attrs
}

/// Key handler body running `command` with `args`.
pub(crate) fn run_bound(store: &Store, command: &'static str, args: &[Value]) -> bool {
	match store.commands().run(command, args) {
		Ok(applied) => applied,
		Err(err) => {
			tracing::debug!(command, error = %err, "key command failed");
			false
		}
	}
}
