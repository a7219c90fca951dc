use std::fmt;

use indexmap::IndexMap;
use indexmap::map::Entry;

use super::OptionsError;
use super::handler::{CustomHandlerKey, HandlerKey};
use super::value::OptionValue;

/// Name of the option every extension carries to switch off contributions.
pub const EXCLUDE: &str = "exclude";
/// Name of the option schema contributors use to inject attributes into their own type.
pub const EXTRA_ATTRIBUTES: &str = "extraAttributes";

/// How an option slot may be read and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
	/// Fixed at construction.
	Static,
	/// Changeable at runtime through `set_options`.
	Dynamic,
	/// A list of typed callbacks, added and removed at runtime.
	Handler,
	/// A list of registrations interpreted by the owning extension.
	CustomHandler,
}

impl fmt::Display for OptionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Static => "static",
			Self::Dynamic => "dynamic",
			Self::Handler => "handler",
			Self::CustomHandler => "custom handler",
		})
	}
}

#[derive(Debug, Clone)]
pub(crate) struct OptionDecl {
	pub(crate) kind: OptionKind,
	pub(crate) default: OptionValue,
}

/// The declared option slots of one extension.
///
/// Declaration errors are kept and reported when [`super::Options`] are
/// constructed, so building a schema never fails on its own.
#[derive(Debug, Clone)]
pub struct OptionsSchema {
	extension: &'static str,
	pub(crate) decls: IndexMap<&'static str, OptionDecl>,
	pub(crate) conflict: Option<OptionsError>,
}

impl OptionsSchema {
	/// Starts a schema for the extension called `extension`.
	pub fn builder(extension: &'static str) -> OptionsSchemaBuilder {
		let mut decls = IndexMap::new();
		decls.insert(
			EXCLUDE,
			OptionDecl {
				kind: OptionKind::Static,
				default: OptionValue::Map(Default::default()),
			},
		);
		OptionsSchemaBuilder {
			schema: OptionsSchema {
				extension,
				decls,
				conflict: None,
			},
		}
	}

	pub fn extension(&self) -> &'static str {
		self.extension
	}

	pub fn kind(&self, key: &str) -> Option<OptionKind> {
		self.decls.get(key).map(|d| d.kind)
	}

	/// Declared default of a value slot.
	pub fn default_value(&self, key: &str) -> Option<&OptionValue> {
		self.decls
			.get(key)
			.filter(|d| matches!(d.kind, OptionKind::Static | OptionKind::Dynamic))
			.map(|d| &d.default)
	}

	/// Declared keys in declaration order.
	pub fn keys(&self) -> impl Iterator<Item = (&'static str, OptionKind)> + '_ {
		self.decls.iter().map(|(k, d)| (*k, d.kind))
	}
}

/// Builder returned by [`OptionsSchema::builder`].
#[derive(Debug)]
pub struct OptionsSchemaBuilder {
	schema: OptionsSchema,
}

impl OptionsSchemaBuilder {
	fn declare(mut self, key: &'static str, kind: OptionKind, default: OptionValue) -> Self {
		match self.schema.decls.entry(key) {
			Entry::Vacant(slot) => {
				slot.insert(OptionDecl { kind, default });
			}
			Entry::Occupied(_) => {
				self.schema.conflict.get_or_insert(OptionsError::DuplicateKey {
					extension: self.schema.extension,
					key: key.to_string(),
				});
			}
		}
		self
	}

	/// Declares a value fixed at construction.
	pub fn static_key(self, key: &'static str, default: impl Into<OptionValue>) -> Self {
		self.declare(key, OptionKind::Static, default.into())
	}

	/// Declares a value that can change at runtime.
	pub fn dynamic_key(self, key: &'static str, default: impl Into<OptionValue>) -> Self {
		self.declare(key, OptionKind::Dynamic, default.into())
	}

	/// Declares a typed callback list.
	pub fn handler_key<E: 'static>(self, key: &HandlerKey<E>) -> Self {
		self.declare(key.name(), OptionKind::Handler, OptionValue::Null)
	}

	/// Declares a custom registration list.
	pub fn custom_handler_key<T: 'static>(self, key: &CustomHandlerKey<T>) -> Self {
		self.declare(key.name(), OptionKind::CustomHandler, OptionValue::Null)
	}

	/// Declares the static `extraAttributes` slot of a node or mark extension.
	pub fn schema_contributor(self) -> Self {
		self.static_key(EXTRA_ATTRIBUTES, OptionValue::Map(Default::default()))
	}

	pub fn build(self) -> OptionsSchema {
		self.schema
	}
}
