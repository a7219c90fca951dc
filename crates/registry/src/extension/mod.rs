//! The extension contract.
//!
//! An extension is a named unit with typed options that contributes to the
//! editor: schema types, commands, helpers, key bindings, input and paste
//! rules, state plugins and extra attributes. Contributions are produced by
//! the `create_*` methods, each called once per composition; lifecycle hooks
//! run in priority order and receive the [`Store`].

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;
use quire_keymap::Platform;
use quire_primitives::{EditorState, MarkSpec, NodeSpec, Plugin, Transaction};

use crate::core::{ExtensionTag, Priority};
use crate::error::HookError;
use crate::manager::Store;
use crate::options::{Options, OptionsDiff, OptionsError, PartialOptions};
use crate::schema::{ExtraAttributes, ExtraAttributesHelper};

mod contrib;

pub use contrib::{
	ActiveFn, CommandFn, CommandProps, CommandSpec, HelperFn, HelperProps, InputRule, InputRuleFn,
	InputRuleProps, KeyBinding, KeyHandler, PasteAttrsFn, PasteRule,
};

/// Shared, lockable handle to an extension instance.
pub type ExtensionRef = Arc<Mutex<dyn Extension>>;

/// Wraps an extension in a shared handle.
pub fn extension_ref<E: Extension>(extension: E) -> ExtensionRef {
	Arc::new(Mutex::new(extension))
}

/// Upcast to [`Any`] for typed lookups.
pub trait AsAny: Any {
	fn as_any(&self) -> &dyn Any;
	fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}
}

/// A node extension contributes exactly one node type named after itself.
pub trait NodeExtension {
	/// Builds the node spec. Attributes from `extra` are merged in afterwards
	/// for every name the node spec does not declare itself.
	fn create_node_spec(&self, extra: &ExtraAttributesHelper) -> NodeSpec;
}

/// A mark extension contributes exactly one mark type named after itself.
pub trait MarkExtension {
	fn create_mark_spec(&self, extra: &ExtraAttributesHelper) -> MarkSpec;
}

/// Variant of an extension.
pub enum ExtensionKind<'a> {
	Plain,
	Node(&'a dyn NodeExtension),
	Mark(&'a dyn MarkExtension),
}

/// What the manager must do after an options update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reconfigure {
	/// Contributions read options live; nothing to rebuild.
	#[default]
	None,
	/// Contributions captured option values; recompose everything.
	Rebuild,
}

/// State change delivered to `on_state_update` hooks and subscribers.
#[derive(Debug, Clone)]
pub struct StateUpdate {
	pub previous: EditorState,
	pub state: EditorState,
	/// Applied transactions, the dispatched one first. Empty for forced updates.
	pub transactions: Vec<Transaction>,
	/// Set when the update comes from a rebuild rather than a dispatch.
	pub forced: bool,
}

/// The extension contract.
///
/// Only [`Extension::name`] and [`Extension::options`] are required.
pub trait Extension: AsAny + Send + 'static {
	/// Unique name; node and mark extensions also use it as their type name.
	fn name(&self) -> &'static str;

	fn options(&self) -> &Options;

	fn kind(&self) -> ExtensionKind<'_> {
		ExtensionKind::Plain
	}

	fn default_priority(&self) -> Priority {
		Priority::DEFAULT
	}

	fn tags(&self) -> Vec<ExtensionTag> {
		Vec::new()
	}

	/// Names of extensions that must be present in the same composition.
	fn required_extensions(&self) -> Vec<&'static str> {
		Vec::new()
	}

	/// Extensions spliced into the composition right after this one.
	fn child_extensions(&self) -> Vec<ExtensionRef> {
		Vec::new()
	}

	fn create_commands(&self) -> Vec<(&'static str, CommandSpec)> {
		Vec::new()
	}

	fn create_helpers(&self) -> Vec<(&'static str, HelperFn)> {
		Vec::new()
	}

	fn create_keymap(&self, _platform: Platform) -> Vec<KeyBinding> {
		Vec::new()
	}

	fn create_input_rules(&self) -> Vec<InputRule> {
		Vec::new()
	}

	fn create_paste_rules(&self) -> Vec<PasteRule> {
		Vec::new()
	}

	fn create_plugins(&self) -> Vec<Plugin> {
		Vec::new()
	}

	/// Attributes injected into other node or mark types.
	fn create_extra_attributes(&self) -> Vec<ExtraAttributes> {
		Vec::new()
	}

	fn on_create(&mut self, _store: &Store) -> Result<(), HookError> {
		Ok(())
	}

	fn on_view(&mut self, _store: &Store) -> Result<(), HookError> {
		Ok(())
	}

	fn on_state_update(&mut self, _update: &StateUpdate, _store: &Store) -> Result<(), HookError> {
		Ok(())
	}

	fn on_destroy(&mut self, _store: &Store) -> Result<(), HookError> {
		Ok(())
	}

	/// Called once per options update with the whole diff.
	fn on_set_options(&mut self, _diff: &OptionsDiff, _store: &Store) -> Result<Reconfigure, HookError> {
		Ok(Reconfigure::None)
	}
}

/// Applies an options update to an extension and runs its hook.
pub(crate) fn set_options(
	extension: &mut dyn Extension,
	partial: &PartialOptions,
	store: &Store,
) -> Result<(OptionsDiff, Result<Reconfigure, HookError>), OptionsError> {
	let diff = extension.options().update(partial)?;
	let reconfigure = extension.on_set_options(&diff, store);
	Ok((diff, reconfigure))
}

/// An extension plus an optional priority override.
#[derive(Clone)]
pub struct ExtensionInput {
	pub extension: ExtensionRef,
	pub priority: Option<Priority>,
}

impl ExtensionInput {
	pub fn new(extension: ExtensionRef) -> Self {
		Self {
			extension,
			priority: None,
		}
	}

	/// Overrides the priority of this extension. Children keep their own.
	pub fn with_priority(mut self, priority: Priority) -> Self {
		self.priority = Some(priority);
		self
	}

	pub fn name(&self) -> &'static str {
		self.extension.lock().name()
	}
}

impl<E: Extension> From<E> for ExtensionInput {
	fn from(extension: E) -> Self {
		Self::new(extension_ref(extension))
	}
}

impl From<ExtensionRef> for ExtensionInput {
	fn from(extension: ExtensionRef) -> Self {
		Self::new(extension)
	}
}
