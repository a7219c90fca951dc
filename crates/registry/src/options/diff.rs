use indexmap::IndexMap;

use super::value::OptionValue;

/// One entry of an [`OptionsDiff`].
#[derive(Debug, Clone, PartialEq)]
pub struct OptionChange {
	/// Whether the new value differs from the previous one.
	pub changed: bool,
	pub previous: OptionValue,
	pub value: OptionValue,
}

/// The effect of one options update, keyed by option name.
///
/// Every key of the update appears, including keys whose value did not change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptionsDiff {
	entries: IndexMap<String, OptionChange>,
}

impl OptionsDiff {
	pub(crate) fn insert(&mut self, key: String, change: OptionChange) {
		self.entries.insert(key, change);
	}

	pub fn get(&self, key: &str) -> Option<&OptionChange> {
		self.entries.get(key)
	}

	/// Whether `key` was part of the update and changed.
	pub fn changed(&self, key: &str) -> bool {
		self.entries.get(key).is_some_and(|c| c.changed)
	}

	pub fn any_changed(&self) -> bool {
		self.entries.values().any(|c| c.changed)
	}

	/// Names of the options that changed.
	pub fn changed_keys(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().filter(|(_, c)| c.changed).map(|(k, _)| k.as_str())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionChange)> {
		self.entries.iter().map(|(k, c)| (k.as_str(), c))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
