//! Strong emphasis.

use std::sync::Arc;

use quire_keymap::Platform;
use quire_primitives::MarkSpec;
use quire_registry::{
	CommandSpec, Extension, ExtensionKind, ExtensionTag, ExtraAttributesHelper, HelperFn, HelperProps,
	InputRule, KeyBinding, MarkExtension, Options, OptionsError, OptionsSchema, PartialOptions, PasteRule,
};
use serde_json::Value;

use crate::commands::{mark_active, remove_mark, set_mark, toggle_mark};

const NAME: &str = "bold";

pub struct Bold {
	options: Options,
}

impl Bold {
	pub fn new() -> Result<Self, OptionsError> {
		Self::with_options(PartialOptions::new())
	}

	pub fn with_options(partial: PartialOptions) -> Result<Self, OptionsError> {
		let schema = OptionsSchema::builder(NAME).schema_contributor().build();
		Ok(Self {
			options: Options::new(schema, partial)?,
		})
	}
}

impl MarkExtension for Bold {
	fn create_mark_spec(&self, _extra: &ExtraAttributesHelper) -> MarkSpec {
		MarkSpec {
			group: Some("fontStyle".into()),
			..MarkSpec::default()
		}
	}
}

impl Extension for Bold {
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
		vec![
			("toggleBold", toggle),
			("setBold", CommandSpec::fallible(|props| set_mark(props.tr, NAME))),
			("removeBold", CommandSpec::fallible(|props| remove_mark(props.tr, NAME))),
		]
	}

	fn create_helpers(&self) -> Vec<(&'static str, HelperFn)> {
		let active: HelperFn = Arc::new(|props: &HelperProps<'_>| Value::Bool(mark_active(props.state, NAME)));
		vec![("isBoldActive", active)]
	}

	fn create_keymap(&self, _platform: Platform) -> Vec<KeyBinding> {
		vec![KeyBinding::command("Mod-b", "toggleBold")]
	}

	fn create_input_rules(&self) -> Vec<InputRule> {
		vec![InputRule::mark(r"\*\*([^*\s](?:[^*]*[^*\s])?)\*\*$", NAME)]
	}

	fn create_paste_rules(&self) -> Vec<PasteRule> {
		vec![PasteRule::mark(r"\*\*([^*\s](?:[^*]*[^*\s])?)\*\*", NAME)]
	}
}
