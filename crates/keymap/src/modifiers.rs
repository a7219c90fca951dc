//! Modifier sets and the platform used to resolve `Mod`.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
	/// A set of held modifier keys.
	///
	/// Bit order matches canonical display order.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
	pub struct Modifiers: u8 {
		/// Alt (Option on mac).
		const ALT = 1 << 0;
		/// Control.
		const CTRL = 1 << 1;
		/// Meta (Command on mac).
		const META = 1 << 2;
		/// Shift.
		const SHIFT = 1 << 3;
	}
}

impl Modifiers {
	/// Canonical names in display order.
	pub(crate) const NAMES: [(Modifiers, &'static str); 4] = [
		(Modifiers::ALT, "Alt"),
		(Modifiers::CTRL, "Ctrl"),
		(Modifiers::META, "Meta"),
		(Modifiers::SHIFT, "Shift"),
	];

	/// Resolves a modifier name, including `Mod` for the given platform.
	pub fn parse_modifier(name: &str, platform: Platform) -> Option<Modifiers> {
		match name.to_ascii_lowercase().as_str() {
			"mod" => Some(platform.primary()),
			"cmd" | "command" | "meta" => Some(Modifiers::META),
			"ctrl" | "control" => Some(Modifiers::CTRL),
			"alt" | "option" => Some(Modifiers::ALT),
			"shift" => Some(Modifiers::SHIFT),
			_ => None,
		}
	}
}

/// Host platform, deciding what `Mod` means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
	/// macOS and iOS: `Mod` is Meta.
	Mac,
	/// Everything else: `Mod` is Ctrl.
	#[default]
	Other,
}

impl Platform {
	/// Platform of the running binary.
	pub fn current() -> Self {
		if cfg!(any(target_os = "macos", target_os = "ios")) {
			Self::Mac
		} else {
			Self::Other
		}
	}

	/// The modifier `Mod` resolves to.
	pub fn primary(self) -> Modifiers {
		match self {
			Self::Mac => Modifiers::META,
			Self::Other => Modifiers::CTRL,
		}
	}
}
