use std::collections::BTreeMap;

use quire_keymap::Platform;
use serde::{Deserialize, Serialize};

use crate::core::Priority;
use crate::error::ConfigError;
use crate::schema::ExtraAttributes;

/// Manager-wide configuration.
///
/// ```toml
/// platform = "mac"
///
/// [priority]
/// bold = 10
///
/// [exclude]
/// input_rules = true
///
/// [[extra_attributes]]
/// target = { names = ["paragraph", "heading"] }
/// attrs = { id = { default = "" } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerSettings {
	/// Resolves `Mod` in key chords.
	pub platform: Platform,
	/// Priority overrides by extension name.
	pub priority: BTreeMap<String, Priority>,
	/// Contributions switched off for every extension.
	pub exclude: Exclusions,
	/// Attributes injected into node and mark types.
	pub extra_attributes: Vec<ExtraAttributes>,
}

impl Default for ManagerSettings {
	fn default() -> Self {
		Self {
			platform: Platform::current(),
			priority: BTreeMap::new(),
			exclude: Exclusions::default(),
			extra_attributes: Vec::new(),
		}
	}
}

impl ManagerSettings {
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	pub fn with_platform(mut self, platform: Platform) -> Self {
		self.platform = platform;
		self
	}
}

/// Global contribution switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Exclusions {
	pub keymap: bool,
	pub input_rules: bool,
	pub paste_rules: bool,
	pub plugins: bool,
}
