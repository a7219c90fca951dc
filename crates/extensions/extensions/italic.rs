//! Emphasis.

use quire_keymap::Platform;
use quire_primitives::MarkSpec;
use quire_registry::{
	CommandSpec, Extension, ExtensionKind, ExtensionTag, ExtraAttributesHelper, InputRule, KeyBinding,
	MarkExtension, Options, OptionsError, OptionsSchema, PartialOptions,
};

use crate::commands::{mark_active, toggle_mark, wrap_match};

const NAME: &str = "italic";

pub struct Italic {
	options: Options,
}

impl Italic {
	pub fn new() -> Result<Self, OptionsError> {
		Ok(Self {
			options: Options::defaults(OptionsSchema::builder(NAME).schema_contributor().build())?,
		})
	}
}

impl MarkExtension for Italic {
	fn create_mark_spec(&self, _extra: &ExtraAttributesHelper) -> MarkSpec {
		MarkSpec {
			group: Some("fontStyle".into()),
			..MarkSpec::default()
		}
	}
}

impl Extension for Italic {
	fn name(&self) -> &'static str {
		NAME
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn kind(&self) -> ExtensionKind<'_> {
		ExtensionKind::Mark(self)
	}

	fn tags(&self) -> Vec<ExtensionTag> {
		vec![ExtensionTag::FORMATTING_MARK, ExtensionTag::FONT_STYLE]
	}

	fn create_commands(&self) -> Vec<(&'static str, CommandSpec)> {
		let toggle = CommandSpec::fallible(|props| toggle_mark(props.tr, NAME))
			.with_active(|state, _| mark_active(state, NAME));
		vec![("toggleItalic", toggle)]
	}

	fn create_keymap(&self, _platform: Platform) -> Vec<KeyBinding> {
		vec![KeyBinding::command("Mod-i", "toggleItalic")]
	}

	fn create_input_rules(&self) -> Vec<InputRule> {
		// The character before the opening `*` is part of the match but stays as typed.
		vec![InputRule::new(r"(^|[^*])\*([^*\s](?:[^*]*[^*\s])?)\*$", |props| {
			let prefix = props.captures.get(1).cloned().flatten().unwrap_or_default();
			let inner = props.captures.get(2).cloned().flatten().unwrap_or_default();
			wrap_match(props, NAME, prefix.chars().count(), &inner)
		})]
	}
}
