//! Keymap resolution.
//!
//! Bindings are grouped by normalized chord. Within a chord, handlers keep
//! priority order and form a fallback chain: the first handler returning
//! `true` consumes the key.

use std::collections::BTreeMap;

use quire_keymap::{KeyChord, Platform};

use super::{Switch, enabled};
use crate::error::ConfigError;
use crate::extension::KeyHandler;
use crate::index::FlatIndex;
use crate::manager::Exclusions;

#[derive(Clone)]
pub(crate) struct ResolvedBinding {
	pub(crate) owner: &'static str,
	pub(crate) handler: KeyHandler,
}

#[derive(Clone, Default)]
pub(crate) struct ResolvedKeymap {
	bindings: BTreeMap<KeyChord, Vec<ResolvedBinding>>,
	/// Sum of option revisions the keymap was built from.
	pub(crate) fingerprint: u64,
}

impl std::fmt::Debug for ResolvedKeymap {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResolvedKeymap")
			.field("chords", &self.bindings.keys().map(ToString::to_string).collect::<Vec<_>>())
			.field("fingerprint", &self.fingerprint)
			.finish()
	}
}

impl ResolvedKeymap {
	pub(crate) fn chain(&self, chord: &KeyChord) -> &[ResolvedBinding] {
		self.bindings.get(chord).map_or(&[], Vec::as_slice)
	}

	pub(crate) fn len(&self) -> usize {
		self.bindings.len()
	}
}

/// Revision fingerprint of every option set in `index`.
///
/// Revisions only grow, so the sum changes whenever any of them does.
pub(crate) fn fingerprint(index: &FlatIndex) -> u64 {
	index.entries().iter().map(|e| e.options.revision()).sum()
}

pub(crate) fn build_keymap(
	index: &FlatIndex,
	platform: Platform,
	exclusions: &Exclusions,
) -> Result<ResolvedKeymap, ConfigError> {
	let mut keymap = ResolvedKeymap {
		fingerprint: fingerprint(index),
		..ResolvedKeymap::default()
	};
	for entry in index.entries() {
		if !enabled(entry, Switch::Keymap, exclusions) {
			continue;
		}
		let bindings = entry.extension.lock().create_keymap(platform);
		for binding in bindings {
			let chord = KeyChord::parse(&binding.chord, platform).map_err(|source| ConfigError::InvalidKeyChord {
				extension: entry.name,
				chord: binding.chord.clone(),
				source,
			})?;
			keymap.bindings.entry(chord).or_default().push(ResolvedBinding {
				owner: entry.name,
				handler: binding.handler,
			});
		}
	}
	tracing::debug!(chords = keymap.len(), fingerprint = keymap.fingerprint, "built keymap");
	Ok(keymap)
}
