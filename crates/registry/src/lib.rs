//! Extension composition for the quire editor runtime.
//!
//! Extensions declare typed options and contribute schema types, commands,
//! helpers, key bindings, input and paste rules and state plugins. The
//! [`Manager`] flattens them into a priority-ordered index, builds the
//! document schema, resolves every contribution and drives the lifecycle.
//!
//! ```text
//! inputs ─► flatten ─► schema ─► resolve ─► Manager (create → view → active → destroyed)
//! ```

/// Priority and tag vocabulary.
pub mod core;
/// Error taxonomy.
pub mod error;
/// The extension contract and its contribution types.
pub mod extension;
/// Flattening and the priority-ordered index.
pub mod index;
/// Lifecycle owner and the store facade.
pub mod manager;
/// Option descriptors, values and handler slots.
pub mod options;
/// Contribution resolution.
pub mod resolve;
/// Schema assembly and extra attributes.
pub mod schema;

#[cfg(test)]
mod test_fixtures;

pub use crate::core::{ExtensionTag, Priority};
pub use error::{ConfigError, HookError, HookFailure, HookPhase, ManagerError, UsageError};
pub use extension::{
	ActiveFn, AsAny, CommandFn, CommandProps, CommandSpec, Extension, ExtensionInput, ExtensionKind,
	ExtensionRef, HelperFn, HelperProps, InputRule, InputRuleFn, InputRuleProps, KeyBinding, KeyHandler,
	MarkExtension, NodeExtension, PasteRule, Reconfigure, StateUpdate, extension_ref,
};
pub use index::{ExtensionEntry, ExtensionVariant, FlatIndex};
pub use manager::{
	Chain, Commands, EditorView, Exclusions, Helpers, Manager, ManagerSettings, Phase, Store,
};
pub use options::{
	CustomHandlerKey, Disposer, FromOptionValue, HandlerKey, HandlerOutcome, OptionChange, OptionKind,
	OptionValue, OptionValues, Options, OptionsDiff, OptionsError, OptionsSchema, OptionsSchemaBuilder,
	PartialOptions,
};
pub use schema::{AttributeTarget, ExtraAttributes, ExtraAttributesHelper};
