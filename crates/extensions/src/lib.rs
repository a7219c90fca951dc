//! Built-in quire extensions.
//!
//! Each module under `extensions/` is discovered at build time and exposes
//! one extension. [`core_preset`] bundles the ones every editor needs.

include!(concat!(env!("OUT_DIR"), "/builtins.rs"));

mod commands;

pub use bold::Bold;
pub use doc::Doc;
pub use doc_changed::{DOC_CHANGED, DocChanged, DocChangedEvent};
pub use heading::Heading;
pub use horizontal_rule::HorizontalRule;
pub use italic::Italic;
pub use keymap::{KEYMAP, Keymap};
pub use paragraph::Paragraph;
pub use quire_registry::{ExtensionInput, OptionsError, PartialOptions};
pub use text::Text;
pub use text_align::TextAlign;

/// `doc`, `text`, `paragraph`, `keymap` and `docChanged`, with default options.
pub fn core_preset() -> Result<Vec<ExtensionInput>, OptionsError> {
	Ok(vec![
		Doc::new()?.into(),
		Text::new()?.into(),
		Paragraph::new()?.into(),
		Keymap::new()?.into(),
		DocChanged::new()?.into(),
	])
}
