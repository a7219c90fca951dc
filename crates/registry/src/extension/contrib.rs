use std::fmt;
use std::sync::Arc;

use quire_primitives::{Attrs, DocError, EditorState, Transaction};
use serde_json::Value;

use crate::manager::Store;
use crate::options::OptionValues;

/// Everything a command sees while it runs.
pub struct CommandProps<'a> {
	/// Transaction to add steps to. Shared by every command of a chain.
	pub tr: &'a mut Transaction,
	/// State the command (or chain) started from.
	pub state: &'a EditorState,
	/// `false` for dry runs: the transaction is discarded afterwards.
	pub dispatch: bool,
	pub args: &'a [Value],
	/// Options of the extension that contributed the command.
	pub options: &'a OptionValues,
}

/// Returns whether the command applied.
pub type CommandFn = Arc<dyn Fn(&mut CommandProps<'_>) -> bool + Send + Sync>;

/// Reports whether a command's effect is active in a state (e.g. bold at the cursor).
pub type ActiveFn = Arc<dyn Fn(&EditorState, &OptionValues) -> bool + Send + Sync>;

/// A named command contribution.
#[derive(Clone)]
pub struct CommandSpec {
	pub run: CommandFn,
	pub is_active: Option<ActiveFn>,
}

impl CommandSpec {
	pub fn new<F>(run: F) -> Self
	where
		F: Fn(&mut CommandProps<'_>) -> bool + Send + Sync + 'static,
	{
		Self {
			run: Arc::new(run),
			is_active: None,
		}
	}

	/// Builds a command from a fallible body; errors count as "not applicable".
	pub fn fallible<F>(run: F) -> Self
	where
		F: Fn(&mut CommandProps<'_>) -> Result<bool, DocError> + Send + Sync + 'static,
	{
		Self::new(move |props| match run(props) {
			Ok(applied) => applied,
			Err(err) => {
				tracing::debug!(error = %err, "command failed");
				false
			}
		})
	}

	pub fn with_active<F>(mut self, is_active: F) -> Self
	where
		F: Fn(&EditorState, &OptionValues) -> bool + Send + Sync + 'static,
	{
		self.is_active = Some(Arc::new(is_active));
		self
	}
}

impl fmt::Debug for CommandSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CommandSpec")
			.field("is_active", &self.is_active.is_some())
			.finish_non_exhaustive()
	}
}

/// Inputs of a helper call.
pub struct HelperProps<'a> {
	pub state: &'a EditorState,
	pub args: &'a [Value],
	pub options: &'a OptionValues,
}

/// A read-only query over the editor state.
pub type HelperFn = Arc<dyn Fn(&HelperProps<'_>) -> Value + Send + Sync>;

/// Key handler; returns whether it handled the key.
pub type KeyHandler = Arc<dyn Fn(&Store) -> bool + Send + Sync>;

/// A key chord (in text form, resolved at composition time) and its handler.
#[derive(Clone)]
pub struct KeyBinding {
	pub chord: String,
	pub handler: KeyHandler,
}

impl KeyBinding {
	pub fn new<F>(chord: impl Into<String>, handler: F) -> Self
	where
		F: Fn(&Store) -> bool + Send + Sync + 'static,
	{
		Self {
			chord: chord.into(),
			handler: Arc::new(handler),
		}
	}

	/// Binding that runs a named command without arguments.
	pub fn command(chord: impl Into<String>, command: &'static str) -> Self {
		Self::new(chord, move |store| match store.commands().run(command, &[]) {
			Ok(applied) => applied,
			Err(err) => {
				tracing::debug!(command, error = %err, "key command failed");
				false
			}
		})
	}
}

impl fmt::Debug for KeyBinding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("KeyBinding").field(&self.chord).finish()
	}
}

/// What an input rule handler receives after its pattern matched.
pub struct InputRuleProps<'a> {
	/// Fresh transaction; the typed text has not been inserted.
	pub tr: &'a mut Transaction,
	/// Capture groups of the match; index 0 is the whole match.
	pub captures: &'a [Option<String>],
	/// Document range of the matched text already in the document.
	pub from: usize,
	pub to: usize,
	/// Text being typed.
	pub text: &'a str,
}

/// Returns whether the rule applied; a rule that does not apply lets later rules try.
pub type InputRuleFn = Arc<dyn Fn(&mut InputRuleProps<'_>) -> Result<bool, DocError> + Send + Sync>;

/// A pattern matched against the text before the cursor plus the typed text.
///
/// The pattern is compiled when the composition is built; it should end with `$`.
#[derive(Clone)]
pub struct InputRule {
	pub(crate) pattern: String,
	pub(crate) handler: InputRuleFn,
}

impl InputRule {
	pub fn new<F>(pattern: impl Into<String>, handler: F) -> Self
	where
		F: Fn(&mut InputRuleProps<'_>) -> Result<bool, DocError> + Send + Sync + 'static,
	{
		Self {
			pattern: pattern.into(),
			handler: Arc::new(handler),
		}
	}

	/// Replaces the match with the text of capture group 1 wrapped in `mark`.
	pub fn mark(pattern: impl Into<String>, mark: &'static str) -> Self {
		Self::new(pattern, move |props| {
			let Some(Some(inner)) = props.captures.get(1) else {
				return Ok(false);
			};
			if inner.is_empty() {
				return Ok(false);
			}
			let schema = props.tr.schema().clone();
			let mark_value = schema.mark(mark, None)?;
			let marks = schema.add_mark_to_set(&props.tr.current_marks()?, mark_value)?;
			let node = schema.text(inner.clone(), marks)?;
			props.tr.replace_with(props.from, props.to, node)?;
			props.tr.remove_stored_mark(mark)?;
			Ok(true)
		})
	}

	/// Deletes the match and turns the surrounding textblock into `node`.
	pub fn textblock<F>(pattern: impl Into<String>, node: &'static str, attrs: F) -> Self
	where
		F: Fn(&[Option<String>]) -> Option<Attrs> + Send + Sync + 'static,
	{
		Self::new(pattern, move |props| {
			let rp = props.tr.doc().resolve(props.from)?;
			if rp.parent_offset() != 0 {
				return Ok(false);
			}
			let attrs = attrs(props.captures);
			props.tr.delete(props.from, props.to)?;
			props.tr.set_block_type(props.from, props.from, node, attrs)?;
			Ok(true)
		})
	}

	/// Replaces the surrounding textblock with the leaf block `node`.
	pub fn leaf_block(pattern: impl Into<String>, node: &'static str) -> Self {
		Self::new(pattern, move |props| {
			let schema = props.tr.schema().clone();
			let leaf = schema.node(node, None, Vec::new(), Vec::new())?;
			props.tr.delete(props.from, props.to)?;
			props.tr.replace_range_with(props.from, props.from, leaf)?;
			Ok(true)
		})
	}
}

impl fmt::Debug for InputRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("InputRule").field(&self.pattern).finish()
	}
}

/// Derives mark attributes from the capture groups of a paste match.
pub type PasteAttrsFn = Arc<dyn Fn(&[Option<String>]) -> Option<Attrs> + Send + Sync>;

/// Marks the text of every match of a pattern in pasted plain text.
///
/// Capture group 1, when present, is the text kept and marked; otherwise the
/// whole match is.
#[derive(Clone)]
pub struct PasteRule {
	pub(crate) pattern: String,
	pub(crate) mark: &'static str,
	pub(crate) attrs: Option<PasteAttrsFn>,
}

impl PasteRule {
	pub fn mark(pattern: impl Into<String>, mark: &'static str) -> Self {
		Self {
			pattern: pattern.into(),
			mark,
			attrs: None,
		}
	}

	pub fn with_attrs<F>(mut self, attrs: F) -> Self
	where
		F: Fn(&[Option<String>]) -> Option<Attrs> + Send + Sync + 'static,
	{
		self.attrs = Some(Arc::new(attrs));
		self
	}
}

impl fmt::Debug for PasteRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PasteRule")
			.field("pattern", &self.pattern)
			.field("mark", &self.mark)
			.finish()
	}
}
