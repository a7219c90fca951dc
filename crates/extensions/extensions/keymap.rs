//! Base editing keys plus bindings registered at runtime.

use std::sync::Arc;

use quire_keymap::Platform;
use quire_primitives::{DocError, Node, Selection, Transaction};
use quire_registry::{
	CommandSpec, CustomHandlerKey, Disposer, Extension, KeyBinding, Options, OptionsError, OptionsSchema,
	PartialOptions, Priority,
};

/// Custom handler slot holding extra bindings. Later registrations take precedence.
pub const KEYMAP: CustomHandlerKey<Vec<KeyBinding>> = CustomHandlerKey::new("keymap");

/// Runs late so that every other extension sees a key first.
pub struct Keymap {
	options: Options,
}

impl Keymap {
	pub fn new() -> Result<Self, OptionsError> {
		Self::with_options(PartialOptions::new())
	}

	pub fn with_options(partial: PartialOptions) -> Result<Self, OptionsError> {
		let schema = OptionsSchema::builder("keymap")
			.dynamic_key("excludeBaseKeymap", false)
			.custom_handler_key(&KEYMAP)
			.build();
		Ok(Self {
			options: Options::new(schema, partial)?,
		})
	}

	/// Registers extra bindings; the keymap is rebuilt on the next key.
	pub fn add_bindings(options: &Options, bindings: Vec<KeyBinding>) -> Result<Disposer, OptionsError> {
		options.add_custom_handler(&KEYMAP, bindings)
	}
}

/// Deletes a range; removing everything leaves the empty document the schema fills in.
fn delete_selected(tr: &mut Transaction, from: usize, to: usize) -> Result<bool, DocError> {
	let size = tr.doc().content_size();
	if from > 0 || to < size {
		tr.delete(from, to)?;
		return Ok(true);
	}
	let schema = Arc::clone(tr.schema());
	let empty = schema.create_and_fill(schema.top_node(), None)?;
	tr.replace(0, size, empty.content().to_vec())?;
	tr.set_selection(Selection::at_start(tr.doc()));
	Ok(true)
}

fn delete_backward(tr: &mut Transaction) -> Result<bool, DocError> {
	let (from, to) = tr.selection().range(tr.doc());
	if from != to {
		return delete_selected(tr, from, to);
	}
	let rp = tr.doc().resolve(from)?;
	if rp.parent_offset() > 0 {
		tr.delete(from - 1, from)?;
		return Ok(true);
	}
	let depth = rp.depth();
	let (Some(start), true) = (rp.before(depth), depth > 0) else {
		return Ok(false);
	};
	let index = rp.index(depth - 1);
	let Some(previous) = index.checked_sub(1).and_then(|i| rp.node(depth - 1).child(i)).cloned() else {
		return Ok(false);
	};
	let current = rp.parent().clone();
	join(tr, start - previous.node_size(), &previous, &current)
}

fn delete_forward(tr: &mut Transaction) -> Result<bool, DocError> {
	let (from, to) = tr.selection().range(tr.doc());
	if from != to {
		return delete_selected(tr, from, to);
	}
	let rp = tr.doc().resolve(from)?;
	if rp.parent_offset() < rp.parent().content_size() {
		tr.delete(from, from + 1)?;
		return Ok(true);
	}
	let depth = rp.depth();
	let (Some(start), true) = (rp.before(depth), depth > 0) else {
		return Ok(false);
	};
	let Some(next) = rp.node(depth - 1).child(rp.index(depth - 1) + 1).cloned() else {
		return Ok(false);
	};
	let current = rp.parent().clone();
	join(tr, start, &current, &next)
}

/// Merges two adjacent siblings starting at `start`: two textblocks become the
/// first one; a leaf on either side is removed.
fn join(tr: &mut Transaction, start: usize, first: &Node, second: &Node) -> Result<bool, DocError> {
	let end = start + first.node_size() + second.node_size();
	if first.is_textblock() && second.is_textblock() {
		let mut content = first.content().to_vec();
		content.extend(second.content().iter().cloned());
		let merged = tr
			.schema()
			.node(first.kind(), Some(first.attrs().clone()), content, first.marks().to_vec())?;
		tr.replace(start, end, vec![merged])?;
		tr.set_selection(Selection::cursor(start + 1 + first.content_size()));
		return Ok(true);
	}
	if first.is_leaf() && !first.is_inline() {
		tr.delete(start, start + first.node_size())?;
		tr.set_selection(Selection::cursor(start + 1));
		return Ok(true);
	}
	if second.is_leaf() && !second.is_inline() {
		let leaf = start + first.node_size();
		tr.delete(leaf, leaf + second.node_size())?;
		return Ok(true);
	}
	Ok(false)
}

impl Extension for Keymap {
	fn name(&self) -> &'static str {
		"keymap"
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn default_priority(&self) -> Priority {
		Priority::LOW
	}

	fn create_commands(&self) -> Vec<(&'static str, CommandSpec)> {
		vec![
			(
				"selectAll",
				CommandSpec::new(|props| {
					props.tr.set_selection(Selection::All);
					true
				}),
			),
			("deleteBackward", CommandSpec::fallible(|props| delete_backward(props.tr))),
			("deleteForward", CommandSpec::fallible(|props| delete_forward(props.tr))),
		]
	}

	fn create_keymap(&self, _platform: Platform) -> Vec<KeyBinding> {
		let mut bindings: Vec<KeyBinding> = self
			.options
			.custom_handlers(&KEYMAP)
			.iter()
			.rev()
			.flat_map(|extra| extra.iter().cloned())
			.collect();
		if !self.options.get_as::<bool>("excludeBaseKeymap").unwrap_or(false) {
			bindings.extend([
				KeyBinding::command("Mod-a", "selectAll"),
				KeyBinding::command("Backspace", "deleteBackward"),
				KeyBinding::command("Delete", "deleteForward"),
			]);
		}
		bindings
	}
}
