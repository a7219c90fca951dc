//! Flattening: turns the input extensions into a deduplicated,
//! priority-sorted list with lookups by name, tag and variant.
//!
//! Children are spliced in right after their parent (pre-order). A repeated
//! name is tolerated when both registrations are the same instance or the same
//! concrete type with equal options; the last registration then wins, both
//! instance and position. Anything else is a [`ConfigError::DuplicateExtension`].

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::{ExtensionTag, Priority};
use crate::error::ConfigError;
use crate::extension::{ExtensionInput, ExtensionKind, ExtensionRef};
use crate::options::Options;

#[cfg(test)]
mod tests;

/// Which kind of contribution an extension makes to the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionVariant {
	Plain,
	Node,
	Mark,
}

/// One flattened extension.
#[derive(Clone)]
pub struct ExtensionEntry {
	pub name: &'static str,
	pub extension: ExtensionRef,
	pub options: Options,
	pub priority: Priority,
	pub tags: Vec<ExtensionTag>,
	pub variant: ExtensionVariant,
	/// Name of the extension that declared this one as a child.
	pub parent: Option<&'static str>,
}

impl std::fmt::Debug for ExtensionEntry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ExtensionEntry")
			.field("name", &self.name)
			.field("priority", &self.priority)
			.field("variant", &self.variant)
			.field("parent", &self.parent)
			.finish_non_exhaustive()
	}
}

/// Priority-ordered extensions with derived lookups.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
	entries: Vec<ExtensionEntry>,
	by_name: FxHashMap<&'static str, usize>,
	by_tag: FxHashMap<ExtensionTag, Vec<usize>>,
}

impl FlatIndex {
	/// Flattens `inputs`. `priorities` maps extension names to configured priorities.
	pub fn build(inputs: &[ExtensionInput], priorities: &BTreeMap<String, Priority>) -> Result<Self, ConfigError> {
		let mut raw = Vec::new();
		let mut path = Vec::new();
		for input in inputs {
			expand(&input.extension, input.priority, None, &mut path, &mut raw);
		}

		let deduped = dedupe(raw)?;

		let mut entries: Vec<ExtensionEntry> = deduped
			.into_iter()
			.map(|r| {
				let ext = r.extension.lock();
				let name = ext.name();
				let priority = r
					.priority
					.or_else(|| priorities.get(name).copied())
					.unwrap_or_else(|| ext.default_priority());
				let variant = match ext.kind() {
					ExtensionKind::Plain => ExtensionVariant::Plain,
					ExtensionKind::Node(_) => ExtensionVariant::Node,
					ExtensionKind::Mark(_) => ExtensionVariant::Mark,
				};
				let entry = ExtensionEntry {
					name,
					options: ext.options().clone(),
					priority,
					tags: ext.tags(),
					variant,
					parent: r.parent,
					extension: Arc::clone(&r.extension),
				};
				drop(ext);
				entry
			})
			.collect();
		entries.sort_by_key(|e| e.priority);

		let mut index = Self::default();
		for (i, entry) in entries.iter().enumerate() {
			index.by_name.insert(entry.name, i);
			for tag in &entry.tags {
				index.by_tag.entry(tag.clone()).or_default().push(i);
			}
		}
		index.entries = entries;

		for entry in &index.entries {
			let required = entry.extension.lock().required_extensions();
			if let Some(missing) = required.into_iter().find(|r| !index.by_name.contains_key(r)) {
				return Err(ConfigError::MissingDependency {
					extension: entry.name,
					requires: missing,
				});
			}
		}

		tracing::debug!(
			count = index.entries.len(),
			order = ?index.entries.iter().map(|e| e.name).collect::<Vec<_>>(),
			"flattened extensions"
		);
		Ok(index)
	}

	/// Entries in priority order.
	pub fn entries(&self) -> &[ExtensionEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, name: &str) -> Option<&ExtensionEntry> {
		self.by_name.get(name).map(|&i| &self.entries[i])
	}

	pub fn contains(&self, name: &str) -> bool {
		self.by_name.contains_key(name)
	}

	/// Entries carrying `tag`, in priority order.
	pub fn tagged(&self, tag: &ExtensionTag) -> impl Iterator<Item = &ExtensionEntry> {
		self.by_tag
			.get(tag)
			.into_iter()
			.flat_map(|ids| ids.iter().map(|&i| &self.entries[i]))
	}

	pub fn of_variant(&self, variant: ExtensionVariant) -> impl Iterator<Item = &ExtensionEntry> {
		self.entries.iter().filter(move |e| e.variant == variant)
	}

	/// Whether `a` and `b` are related through the parent chain, in either direction.
	pub fn related(&self, a: &str, b: &str) -> bool {
		self.is_ancestor(a, b) || self.is_ancestor(b, a)
	}

	fn is_ancestor(&self, ancestor: &str, name: &str) -> bool {
		let mut current = self.get(name).and_then(|e| e.parent);
		for _ in 0..self.entries.len() {
			match current {
				Some(parent) if parent == ancestor => return true,
				Some(parent) => current = self.get(parent).and_then(|e| e.parent),
				None => return false,
			}
		}
		false
	}
}

struct Raw {
	extension: ExtensionRef,
	priority: Option<Priority>,
	parent: Option<&'static str>,
}

/// Pre-order walk. `path` holds the instances currently being expanded.
fn expand(
	extension: &ExtensionRef,
	priority: Option<Priority>,
	parent: Option<&'static str>,
	path: &mut Vec<*const ()>,
	out: &mut Vec<Raw>,
) {
	let ptr = Arc::as_ptr(extension) as *const ();
	let (name, children) = {
		let ext = extension.lock();
		(ext.name(), ext.child_extensions())
	};
	if path.contains(&ptr) {
		tracing::warn!(extension = name, "extension lists itself as a descendant, skipping");
		return;
	}
	out.push(Raw {
		extension: Arc::clone(extension),
		priority,
		parent,
	});
	path.push(ptr);
	for child in &children {
		expand(child, None, Some(name), path, out);
	}
	path.pop();
}

fn dedupe(raw: Vec<Raw>) -> Result<Vec<Raw>, ConfigError> {
	let mut kept: Vec<Option<Raw>> = Vec::with_capacity(raw.len());
	let mut positions: FxHashMap<&'static str, usize> = FxHashMap::default();
	for item in raw {
		let name = item.extension.lock().name();
		if let Some(&prev) = positions.get(name) {
			let Some(existing) = kept[prev].take() else {
				continue;
			};
			if !interchangeable(&existing.extension, &item.extension) {
				return Err(ConfigError::DuplicateExtension { name });
			}
			tracing::debug!(extension = name, "duplicate registration, keeping the last one");
		}
		positions.insert(name, kept.len());
		kept.push(Some(item));
	}
	Ok(kept.into_iter().flatten().collect())
}

/// Same instance, or same concrete type with equal option values.
fn interchangeable(a: &ExtensionRef, b: &ExtensionRef) -> bool {
	if Arc::ptr_eq(a, b) {
		return true;
	}
	let (type_a, values_a) = identity(a);
	let (type_b, values_b) = identity(b);
	type_a == type_b && values_a == values_b
}

fn identity(extension: &ExtensionRef) -> (TypeId, crate::options::OptionValues) {
	let ext = extension.lock();
	let any: &dyn Any = (*ext).as_any();
	(any.type_id(), ext.options().values())
}
