use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification label attached to extensions, queried by the manager and
/// targeted by extra attributes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionTag(Cow<'static, str>);

impl ExtensionTag {
	/// The node type that roots every document. Exactly one per composition.
	pub const DOCUMENT: ExtensionTag = ExtensionTag::new("document");
	/// The block created when nothing more specific applies. Exactly one per composition.
	pub const DEFAULT_BLOCK: ExtensionTag = ExtensionTag::new("defaultBlock");
	pub const BLOCK: ExtensionTag = ExtensionTag::new("block");
	pub const INLINE: ExtensionTag = ExtensionTag::new("inline");
	pub const TEXT_BLOCK: ExtensionTag = ExtensionTag::new("textBlock");
	pub const FORMATTING_MARK: ExtensionTag = ExtensionTag::new("formattingMark");
	pub const FORMATTING_NODE: ExtensionTag = ExtensionTag::new("formattingNode");
	/// Blocks that may end a document without a trailing default block.
	pub const LAST_NODE_COMPATIBLE: ExtensionTag = ExtensionTag::new("lastNodeCompatible");
	pub const FONT_STYLE: ExtensionTag = ExtensionTag::new("fontStyle");

	pub const fn new(name: &'static str) -> Self {
		Self(Cow::Borrowed(name))
	}

	/// Tag with a runtime name.
	pub fn custom(name: impl Into<String>) -> Self {
		Self(Cow::Owned(name.into()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ExtensionTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
