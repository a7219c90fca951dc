//! Option descriptors.
//!
//! Each extension declares its option slots once through an [`OptionsSchema`].
//! Value slots are static (fixed at construction) or dynamic (changeable at
//! runtime); handler slots hold typed callbacks; custom handler slots hold
//! registrations the owning extension interprets, such as extra key bindings.

mod diff;
mod handler;
mod schema;
mod store;
mod value;

#[cfg(test)]
mod tests;

pub use diff::{OptionChange, OptionsDiff};
pub use handler::{CustomHandlerKey, Disposer, HandlerKey, HandlerOutcome};
pub use schema::{EXCLUDE, EXTRA_ATTRIBUTES, OptionKind, OptionsSchema, OptionsSchemaBuilder};
pub use store::{OptionValues, Options};
pub use value::{FromOptionValue, OptionValue, PartialOptions};

/// Errors raised while constructing or updating options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
	#[error("{extension:?} has no option {key:?}")]
	UnknownKey { extension: &'static str, key: String },
	#[error("option {key:?} of {extension:?} is a {kind} slot and cannot be used this way")]
	Misclassified {
		extension: &'static str,
		key: String,
		kind: OptionKind,
	},
	#[error("option {key:?} of {extension:?} expects {expected}, got {got}")]
	TypeMismatch {
		extension: &'static str,
		key: String,
		expected: &'static str,
		got: &'static str,
	},
	#[error("option {key:?} of {extension:?} is static")]
	StaticMutation { extension: &'static str, key: String },
	#[error("option {key:?} of {extension:?} is declared twice")]
	DuplicateKey { extension: &'static str, key: String },
}
