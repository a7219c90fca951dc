//! Error taxonomy.
//!
//! Configuration problems surface while a composition is built, usage errors
//! when an operation is invalid for the current lifecycle phase, and hook
//! failures when an extension hook reports an error.

use std::fmt;

use quire_keymap::ParseError;
use quire_primitives::{DocError, SchemaError};

use crate::core::Priority;
use crate::manager::Phase;
use crate::options::OptionsError;

/// Problems with the set of extensions or their declarations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error(transparent)]
	Options(OptionsError),
	#[error("extension {name:?} is registered twice with different configurations")]
	DuplicateExtension { name: &'static str },
	#[error("extension {extension:?} requires {requires:?}, which is not registered")]
	MissingDependency {
		extension: &'static str,
		requires: &'static str,
	},
	#[error("no node extension is tagged as the document root")]
	MissingRoot,
	#[error("both {first:?} and {second:?} are tagged as the document root")]
	MultipleRoots {
		first: &'static str,
		second: &'static str,
	},
	#[error("no node extension is tagged as the default block")]
	MissingDefaultBlock,
	#[error("both {first:?} and {second:?} are tagged as the default block")]
	MultipleDefaultBlocks {
		first: &'static str,
		second: &'static str,
	},
	#[error(
		"attribute {attr:?} on {owner:?} has conflicting defaults from {first:?} and {second:?} at priority {priority}"
	)]
	AmbiguousAttribute {
		owner: String,
		attr: String,
		first: String,
		second: String,
		priority: Priority,
	},
	#[error("command {name:?} is provided by both {first:?} and {second:?}")]
	DuplicateCommand {
		name: &'static str,
		first: &'static str,
		second: &'static str,
	},
	#[error("helper {name:?} is provided by both {first:?} and {second:?}")]
	DuplicateHelper {
		name: &'static str,
		first: &'static str,
		second: &'static str,
	},
	#[error("plugin key {key:?} is provided by both {first:?} and {second:?}")]
	DuplicatePlugin {
		key: String,
		first: &'static str,
		second: &'static str,
	},
	#[error("invalid key chord {chord:?} in {extension:?}")]
	InvalidKeyChord {
		extension: &'static str,
		chord: String,
		#[source]
		source: ParseError,
	},
	#[error("invalid rule pattern {pattern:?} in {extension:?}")]
	InvalidPattern {
		extension: &'static str,
		pattern: String,
		#[source]
		source: regex::Error,
	},
	#[error(transparent)]
	Schema(#[from] SchemaError),
	#[error("invalid manager settings")]
	Settings(#[from] toml::de::Error),
}

impl From<OptionsError> for ConfigError {
	fn from(err: OptionsError) -> Self {
		Self::Options(err)
	}
}

/// Operations that are invalid in the current state of the manager.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
	#[error("option {key:?} of {extension:?} is static and cannot change after construction")]
	StaticMutation {
		extension: &'static str,
		key: String,
	},
	#[error("{operation} is not allowed while the manager is {phase}")]
	InvalidPhase { operation: &'static str, phase: Phase },
	#[error("the manager has been destroyed")]
	Destroyed,
	#[error("a previous hook failure left the manager unusable")]
	Unusable,
	#[error("{0} was called while another lifecycle operation is running")]
	Reentrant(&'static str),
	#[error("unknown command {0:?}")]
	UnknownCommand(String),
	#[error("unknown helper {0:?}")]
	UnknownHelper(String),
	#[error("unknown extension {0:?}")]
	UnknownExtension(String),
	#[error("extension {0:?} has a different concrete type")]
	ExtensionType(String),
	#[error("extension {0:?} is currently locked by a running hook")]
	ExtensionBusy(String),
}

/// Which hook reported a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
	Create,
	View,
	StateUpdate,
	SetOptions,
	Destroy,
}

impl fmt::Display for HookPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Create => "onCreate",
			Self::View => "onView",
			Self::StateUpdate => "onStateUpdate",
			Self::SetOptions => "onSetOptions",
			Self::Destroy => "onDestroy",
		})
	}
}

/// Error returned by an extension hook.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct HookError(String);

impl HookError {
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}

impl From<DocError> for HookError {
	fn from(err: DocError) -> Self {
		Self(err.to_string())
	}
}

/// A hook failed; the phase it belonged to was aborted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{phase} hook of {extension:?} failed")]
pub struct HookFailure {
	pub extension: &'static str,
	pub phase: HookPhase,
	#[source]
	pub source: HookError,
}

/// Every error the manager can return.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Usage(#[from] UsageError),
	#[error(transparent)]
	Hook(#[from] HookFailure),
	#[error(transparent)]
	Doc(#[from] DocError),
}

impl From<OptionsError> for ManagerError {
	/// Writes to static options are usage errors; everything else is configuration.
	fn from(err: OptionsError) -> Self {
		match err {
			OptionsError::StaticMutation { extension, key } => {
				Self::Usage(UsageError::StaticMutation { extension, key })
			}
			other => Self::Config(ConfigError::Options(other)),
		}
	}
}
