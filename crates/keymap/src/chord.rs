use std::fmt;
use std::str::FromStr;

use crate::modifiers::{Modifiers, Platform};
use crate::parser::{self, ParseError};

/// Named keys with their canonical spelling.
const NAMED_KEYS: &[&str] = &[
	"Backspace",
	"Delete",
	"Enter",
	"Escape",
	"Tab",
	"Space",
	"ArrowUp",
	"ArrowDown",
	"ArrowLeft",
	"ArrowRight",
	"Home",
	"End",
	"PageUp",
	"PageDown",
	"Insert",
];

/// Shorthand spellings accepted for named keys.
const ALIASES: &[(&str, &str)] = &[
	("esc", "Escape"),
	("del", "Delete"),
	("return", "Enter"),
	("up", "ArrowUp"),
	("down", "ArrowDown"),
	("left", "ArrowLeft"),
	("right", "ArrowRight"),
];

/// Returns the canonical spelling of a key name, or `None` if unknown.
///
/// Single characters are lowercased; `" "` becomes `Space`; `F1`..`F24` are accepted.
pub(crate) fn normalize_key(name: &str) -> Option<String> {
	let mut chars = name.chars();
	if let (Some(ch), None) = (chars.next(), chars.next()) {
		if ch == ' ' {
			return Some("Space".to_string());
		}
		return Some(ch.to_lowercase().collect());
	}
	let lower = name.to_ascii_lowercase();
	if let Some(named) = NAMED_KEYS.iter().find(|k| k.to_ascii_lowercase() == lower) {
		return Some((*named).to_string());
	}
	if let Some((_, named)) = ALIASES.iter().find(|(alias, _)| *alias == lower) {
		return Some((*named).to_string());
	}
	let n: u8 = lower.strip_prefix('f')?.parse().ok()?;
	(1..=24).contains(&n).then(|| format!("F{n}"))
}

/// A normalized key chord: a modifier set plus a canonical key name.
///
/// Ordering and equality follow the canonical form, so `Ctrl-Shift-B` and
/// `shift-ctrl-b` are the same chord.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyChord {
	modifiers: Modifiers,
	key: String,
}

impl KeyChord {
	pub(crate) fn from_parts(modifiers: Modifiers, key: String) -> Self {
		Self { modifiers, key }
	}

	/// Parses chord text, resolving `Mod` for `platform`.
	pub fn parse(text: &str, platform: Platform) -> Result<Self, ParseError> {
		parser::parse(text, platform)
	}

	/// Builds a chord from a key event.
	pub fn new(modifiers: Modifiers, key: &str) -> Result<Self, ParseError> {
		let key = normalize_key(key).ok_or_else(|| ParseError::UnknownKey {
			name: key.to_string(),
			position: 0,
		})?;
		Ok(Self { modifiers, key })
	}

	/// Held modifiers.
	pub fn modifiers(&self) -> Modifiers {
		self.modifiers
	}

	/// Canonical key name.
	pub fn key(&self) -> &str {
		&self.key
	}
}

impl fmt::Display for KeyChord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (flag, name) in Modifiers::NAMES {
			if self.modifiers.contains(flag) {
				write!(f, "{name}-")?;
			}
		}
		f.write_str(&self.key)
	}
}

impl FromStr for KeyChord {
	type Err = ParseError;

	/// Parses for the current platform.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s, Platform::current())
	}
}
