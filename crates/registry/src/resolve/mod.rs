//! Contribution resolution.
//!
//! Walks the flattened index in priority order and collects commands,
//! helpers, input and paste rules and plugins into one [`Composition`]. The
//! keymap is resolved separately (see [`keymap`]) because it is rebuilt
//! lazily when options change.

use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use quire_primitives::{Plugin, Schema};
use regex::Regex;

use crate::error::ConfigError;
use crate::extension::{CommandSpec, ExtensionInput, HelperFn, InputRuleFn, PasteAttrsFn};
use crate::index::{ExtensionEntry, FlatIndex};
use crate::manager::{Exclusions, ManagerSettings};
use crate::options::{EXCLUDE, Options};
use crate::schema::build_schema;

pub(crate) mod keymap;
pub(crate) mod rules;

#[cfg(test)]
mod tests;

/// A contribution kind that can be switched off per extension or globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Switch {
	Keymap,
	InputRules,
	PasteRules,
	Plugins,
}

impl Switch {
	/// Key inside an extension's `exclude` option.
	fn key(self) -> &'static str {
		match self {
			Self::Keymap => "keymap",
			Self::InputRules => "inputRules",
			Self::PasteRules => "pasteRules",
			Self::Plugins => "plugins",
		}
	}

	fn global(self, exclusions: &Exclusions) -> bool {
		match self {
			Self::Keymap => exclusions.keymap,
			Self::InputRules => exclusions.input_rules,
			Self::PasteRules => exclusions.paste_rules,
			Self::Plugins => exclusions.plugins,
		}
	}
}

/// Whether `entry` may contribute `switch`.
pub(crate) fn enabled(entry: &ExtensionEntry, switch: Switch, exclusions: &Exclusions) -> bool {
	if switch.global(exclusions) {
		return false;
	}
	let excluded = entry
		.options
		.get(EXCLUDE)
		.and_then(|v| v.as_map().and_then(|m| m.get(switch.key())).and_then(|v| v.as_bool()))
		.unwrap_or(false);
	!excluded
}

/// A command with the extension it came from.
#[derive(Debug, Clone)]
pub struct ResolvedCommand {
	pub owner: &'static str,
	pub spec: CommandSpec,
	pub options: Options,
}

#[derive(Clone)]
pub(crate) struct ResolvedHelper {
	pub(crate) owner: &'static str,
	pub(crate) helper: HelperFn,
	pub(crate) options: Options,
}

#[derive(Clone)]
pub(crate) struct CompiledInputRule {
	pub(crate) owner: &'static str,
	pub(crate) regex: Regex,
	pub(crate) handler: InputRuleFn,
}

#[derive(Clone)]
pub(crate) struct CompiledPasteRule {
	pub(crate) owner: &'static str,
	pub(crate) regex: Regex,
	pub(crate) mark: &'static str,
	pub(crate) attrs: Option<PasteAttrsFn>,
}

/// Everything derived from one set of inputs, swapped atomically on rebuild.
pub(crate) struct Composition {
	pub(crate) inputs: Vec<ExtensionInput>,
	pub(crate) index: FlatIndex,
	pub(crate) schema: Arc<Schema>,
	pub(crate) owners: IndexMap<String, &'static str>,
	pub(crate) commands: IndexMap<&'static str, ResolvedCommand>,
	pub(crate) helpers: IndexMap<&'static str, ResolvedHelper>,
	pub(crate) input_rules: Vec<CompiledInputRule>,
	pub(crate) paste_rules: Vec<CompiledPasteRule>,
	pub(crate) plugins: Vec<Plugin>,
}

impl std::fmt::Debug for Composition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Composition")
			.field("index", &self.index)
			.field("commands", &self.commands.keys().collect::<Vec<_>>())
			.field("helpers", &self.helpers.keys().collect::<Vec<_>>())
			.field("plugins", &self.plugins.len())
			.finish_non_exhaustive()
	}
}

/// Flattens `inputs`, builds the schema and resolves every contribution.
pub(crate) fn compose(inputs: Vec<ExtensionInput>, settings: &ManagerSettings) -> Result<Composition, ConfigError> {
	let index = FlatIndex::build(&inputs, &settings.priority)?;
	let built = build_schema(&index, &settings.extra_attributes)?;

	let mut commands: IndexMap<&'static str, ResolvedCommand> = IndexMap::new();
	let mut helpers: IndexMap<&'static str, ResolvedHelper> = IndexMap::new();
	let mut input_rules = Vec::new();
	let mut paste_rules = Vec::new();
	let mut plugins: Vec<Plugin> = Vec::new();
	let mut plugin_owners: IndexMap<String, &'static str> = IndexMap::new();

	for entry in index.entries() {
		let ext = entry.extension.lock();

		for (name, spec) in ext.create_commands() {
			match commands.entry(name) {
				Entry::Vacant(slot) => {
					slot.insert(ResolvedCommand {
						owner: entry.name,
						spec,
						options: entry.options.clone(),
					});
				}
				Entry::Occupied(slot) => {
					let first = slot.get().owner;
					if first == entry.name || !index.related(first, entry.name) {
						return Err(ConfigError::DuplicateCommand {
							name,
							first,
							second: entry.name,
						});
					}
					tracing::debug!(command = name, kept = first, shadowed = entry.name, "command shadowed");
				}
			}
		}

		for (name, helper) in ext.create_helpers() {
			match helpers.entry(name) {
				Entry::Vacant(slot) => {
					slot.insert(ResolvedHelper {
						owner: entry.name,
						helper,
						options: entry.options.clone(),
					});
				}
				Entry::Occupied(slot) => {
					let first = slot.get().owner;
					if first == entry.name || !index.related(first, entry.name) {
						return Err(ConfigError::DuplicateHelper {
							name,
							first,
							second: entry.name,
						});
					}
					tracing::debug!(helper = name, kept = first, shadowed = entry.name, "helper shadowed");
				}
			}
		}

		if enabled(entry, Switch::InputRules, &settings.exclude) {
			for rule in ext.create_input_rules() {
				input_rules.push(CompiledInputRule {
					owner: entry.name,
					regex: compile(entry.name, &rule.pattern)?,
					handler: rule.handler,
				});
			}
		}

		if enabled(entry, Switch::PasteRules, &settings.exclude) {
			for rule in ext.create_paste_rules() {
				paste_rules.push(CompiledPasteRule {
					owner: entry.name,
					regex: compile(entry.name, &rule.pattern)?,
					mark: rule.mark,
					attrs: rule.attrs,
				});
			}
		}

		if enabled(entry, Switch::Plugins, &settings.exclude) {
			for plugin in ext.create_plugins() {
				if let Some(first) = plugin_owners.get(plugin.key()).copied() {
					return Err(ConfigError::DuplicatePlugin {
						key: plugin.key().to_string(),
						first,
						second: entry.name,
					});
				}
				plugin_owners.insert(plugin.key().to_string(), entry.name);
				plugins.push(plugin);
			}
		}
	}

	tracing::debug!(
		commands = commands.len(),
		helpers = helpers.len(),
		input_rules = input_rules.len(),
		paste_rules = paste_rules.len(),
		plugins = plugins.len(),
		"resolved contributions"
	);

	Ok(Composition {
		inputs,
		index,
		schema: built.schema,
		owners: built.owners,
		commands,
		helpers,
		input_rules,
		paste_rules,
		plugins,
	})
}

fn compile(extension: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
	Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
		extension,
		pattern: pattern.to_string(),
		source,
	})
}
