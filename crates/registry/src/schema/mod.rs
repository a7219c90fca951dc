//! Schema assembly.
//!
//! Every node and mark extension contributes one type named after itself.
//! Before a type's spec is built, the extra attributes aimed at it are
//! resolved from three sources: contributions of other extensions, the
//! type's own `extraAttributes` option and the manager settings. When two
//! sources define the same attribute on the same type, the lower priority
//! number wins; equal priorities with different defaults are rejected.

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use quire_primitives::{AttributeSpec, Schema, SchemaSpec};
use serde::{Deserialize, Serialize};

use crate::core::{ExtensionTag, Priority};
use crate::error::ConfigError;
use crate::extension::ExtensionKind;
use crate::index::{ExtensionEntry, ExtensionVariant, FlatIndex};
use crate::options::{EXTRA_ATTRIBUTES, OptionValue};


/// Which node and mark types an [`ExtraAttributes`] declaration applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeTarget {
	Nodes,
	Marks,
	All,
	/// Types with these names.
	Names(Vec<String>),
	/// Types whose extensions carry any of these tags.
	Tags(Vec<ExtensionTag>),
}

/// Attributes injected into the types matched by `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraAttributes {
	pub target: AttributeTarget,
	pub attrs: BTreeMap<String, AttributeSpec>,
	/// Overrides the priority of the contributing extension.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub priority: Option<Priority>,
}

impl ExtraAttributes {
	pub fn new(target: AttributeTarget) -> Self {
		Self {
			target,
			attrs: BTreeMap::new(),
			priority: None,
		}
	}

	pub fn attr(mut self, name: impl Into<String>, spec: AttributeSpec) -> Self {
		self.attrs.insert(name.into(), spec);
		self
	}

	fn applies_to(&self, entry: &ExtensionEntry) -> bool {
		match &self.target {
			AttributeTarget::All => true,
			AttributeTarget::Nodes => entry.variant == ExtensionVariant::Node,
			AttributeTarget::Marks => entry.variant == ExtensionVariant::Mark,
			AttributeTarget::Names(names) => names.iter().any(|n| n == entry.name),
			AttributeTarget::Tags(tags) => tags.iter().any(|t| entry.tags.contains(t)),
		}
	}
}

/// Resolved extra attributes of one node or mark type.
#[derive(Debug, Clone, Default)]
pub struct ExtraAttributesHelper {
	attrs: BTreeMap<String, AttributeSpec>,
}

impl ExtraAttributesHelper {
	pub fn get(&self, name: &str) -> Option<&AttributeSpec> {
		self.attrs.get(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeSpec)> {
		self.attrs.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn is_empty(&self) -> bool {
		self.attrs.is_empty()
	}

	/// Adds every extra attribute missing from `attrs`.
	pub fn merge_into(&self, attrs: &mut BTreeMap<String, AttributeSpec>) {
		for (name, spec) in &self.attrs {
			attrs.entry(name.clone()).or_insert_with(|| spec.clone());
		}
	}
}

/// A compiled schema plus the extension that owns each type.
#[derive(Debug, Clone)]
pub struct BuiltSchema {
	pub schema: Arc<Schema>,
	/// Type name to owning extension, nodes first.
	pub owners: IndexMap<String, &'static str>,
}

#[derive(Debug, Clone)]
struct Contribution {
	source: String,
	priority: Priority,
	spec: AttributeSpec,
}

/// Builds the schema of a flattened composition.
pub fn build_schema(index: &FlatIndex, settings: &[ExtraAttributes]) -> Result<BuiltSchema, ConfigError> {
	let root = single_tagged(index, &ExtensionTag::DOCUMENT).map_err(|pair| match pair {
		None => ConfigError::MissingRoot,
		Some((first, second)) => ConfigError::MultipleRoots { first, second },
	})?;
	let default_block = single_tagged(index, &ExtensionTag::DEFAULT_BLOCK).map_err(|pair| match pair {
		None => ConfigError::MissingDefaultBlock,
		Some((first, second)) => ConfigError::MultipleDefaultBlocks { first, second },
	})?;

	let declarations = collect_declarations(index, settings);
	let mut nodes = Vec::new();
	let mut marks = Vec::new();
	let mut owners = IndexMap::new();

	let node_entries = index.of_variant(ExtensionVariant::Node);
	let ordered = ordered_nodes(node_entries, root, default_block);
	for entry in ordered {
		let extra = resolve_extra(entry, &declarations)?;
		let ext = entry.extension.lock();
		if let ExtensionKind::Node(node) = ext.kind() {
			let mut spec = node.create_node_spec(&extra);
			extra.merge_into(&mut spec.attrs);
			nodes.push((entry.name.to_string(), spec));
			owners.insert(entry.name.to_string(), entry.name);
		}
	}
	for entry in index.of_variant(ExtensionVariant::Mark) {
		let extra = resolve_extra(entry, &declarations)?;
		let ext = entry.extension.lock();
		if let ExtensionKind::Mark(mark) = ext.kind() {
			let mut spec = mark.create_mark_spec(&extra);
			extra.merge_into(&mut spec.attrs);
			marks.push((entry.name.to_string(), spec));
			owners.insert(entry.name.to_string(), entry.name);
		}
	}

	let spec = SchemaSpec {
		top_node: root.to_string(),
		nodes,
		marks,
	};
	let schema = Schema::new(spec)?;
	tracing::debug!(
		nodes = schema.node_types().count(),
		marks = schema.mark_types().count(),
		top = root,
		"built schema"
	);
	Ok(BuiltSchema {
		schema: Arc::new(schema),
		owners,
	})
}

/// Name of the only node extension tagged `tag`; `Err(None)` when absent,
/// `Err(Some(..))` with the first two when ambiguous.
fn single_tagged(
	index: &FlatIndex,
	tag: &ExtensionTag,
) -> Result<&'static str, Option<(&'static str, &'static str)>> {
	let mut tagged = index.tagged(tag).filter(|e| e.variant == ExtensionVariant::Node);
	let first = tagged.next().ok_or(None)?;
	match tagged.next() {
		Some(second) => Err(Some((first.name, second.name))),
		None => Ok(first.name),
	}
}

/// Root first, then the default block, then the rest in priority order.
fn ordered_nodes<'a>(
	entries: impl Iterator<Item = &'a ExtensionEntry>,
	root: &str,
	default_block: &str,
) -> Vec<&'a ExtensionEntry> {
	let mut ordered: Vec<&ExtensionEntry> = entries.collect();
	ordered.sort_by_key(|e| match e.name {
		n if n == root => 0,
		n if n == default_block => 1,
		_ => 2,
	});
	ordered
}

/// Every extra-attribute declaration with its source name and priority.
fn collect_declarations(index: &FlatIndex, settings: &[ExtraAttributes]) -> Vec<(String, Priority, ExtraAttributes)> {
	let mut out = Vec::new();
	for entry in index.entries() {
		let contributed = entry.extension.lock().create_extra_attributes();
		for decl in contributed {
			let priority = decl.priority.unwrap_or(entry.priority);
			out.push((entry.name.to_string(), priority, decl));
		}
		if let Some(own) = own_extra_attributes(entry) {
			out.push((format!("{}.{EXTRA_ATTRIBUTES}", entry.name), entry.priority, own));
		}
	}
	for (i, decl) in settings.iter().enumerate() {
		let priority = decl.priority.unwrap_or(Priority::DEFAULT);
		out.push((format!("settings[{i}]"), priority, decl.clone()));
	}
	out
}

/// The `extraAttributes` option of a node or mark, as a declaration aimed at itself.
///
/// Values map attribute names to defaults; `null` makes the attribute required.
fn own_extra_attributes(entry: &ExtensionEntry) -> Option<ExtraAttributes> {
	let value = entry.options.get(EXTRA_ATTRIBUTES)?;
	let map = value.as_map()?;
	if map.is_empty() {
		return None;
	}
	let mut decl = ExtraAttributes::new(AttributeTarget::Names(vec![entry.name.to_string()]));
	for (name, default) in map {
		let spec = match default {
			OptionValue::Null => AttributeSpec::required(),
			other => AttributeSpec::with_default(other.to_json()),
		};
		decl = decl.attr(name.clone(), spec);
	}
	Some(decl)
}

/// Picks the lowest-priority definition of each attribute aimed at `entry`.
///
/// A disagreement only matters between definitions sharing the winning priority.
fn resolve_extra(
	entry: &ExtensionEntry,
	declarations: &[(String, Priority, ExtraAttributes)],
) -> Result<ExtraAttributesHelper, ConfigError> {
	let mut best: BTreeMap<String, (Contribution, Option<String>)> = BTreeMap::new();
	for (source, priority, decl) in declarations {
		if !decl.applies_to(entry) {
			continue;
		}
		for (attr, spec) in &decl.attrs {
			let candidate = Contribution {
				source: source.clone(),
				priority: *priority,
				spec: spec.clone(),
			};
			match best.get_mut(attr) {
				None => {
					best.insert(attr.clone(), (candidate, None));
				}
				Some((current, conflict)) if candidate.priority < current.priority => {
					*current = candidate;
					*conflict = None;
				}
				Some((current, conflict)) if candidate.priority == current.priority && candidate.spec != current.spec => {
					conflict.get_or_insert(candidate.source);
				}
				Some(_) => {}
			}
		}
	}
	for (attr, (winner, conflict)) in &best {
		if let Some(second) = conflict {
			return Err(ConfigError::AmbiguousAttribute {
				owner: entry.name.to_string(),
				attr: attr.clone(),
				first: winner.source.clone(),
				second: second.clone(),
				priority: winner.priority,
			});
		}
	}
	Ok(ExtraAttributesHelper {
		attrs: best.into_iter().map(|(k, (c, _))| (k, c.spec)).collect(),
	})
}
