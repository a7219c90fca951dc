use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordering weight of an extension. Lower numbers run first and win conflicts.
///
/// The named levels leave gaps so callers can slot extensions between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
	/// Reserved for infrastructure that must see everything first.
	pub const CRITICAL: Priority = Priority(0);
	pub const HIGHEST: Priority = Priority(10);
	pub const HIGH: Priority = Priority(30);
	/// Priority used when an extension does not declare one.
	pub const DEFAULT: Priority = Priority(50);
	pub const LOW: Priority = Priority(70);
	pub const LOWEST: Priority = Priority(100);
}

impl Default for Priority {
	fn default() -> Self {
		Self::DEFAULT
	}
}

impl fmt::Display for Priority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
