//! Block alignment through a `textAlign` attribute.

use quire_keymap::Platform;
use quire_primitives::AttributeSpec;
use quire_registry::{
	AttributeTarget, CommandSpec, Extension, ExtensionTag, ExtraAttributes, KeyBinding, OptionValue, Options,
	OptionsError, OptionsSchema, PartialOptions,
};
use serde_json::Value;

use crate::commands::{run_bound, selected_textblocks, single_attr};

const ATTR: &str = "textAlign";
const ALIGNMENTS: [&str; 4] = ["left", "center", "right", "justify"];

/// Adds `textAlign` to every node type tagged [`ExtensionTag::FORMATTING_NODE`].
///
/// Both options are static: `alignments` lists the accepted values and
/// `defaultAlignment` becomes the attribute default.
pub struct TextAlign {
	options: Options,
}

impl TextAlign {
	pub fn new() -> Result<Self, OptionsError> {
		Self::with_options(PartialOptions::new())
	}

	pub fn with_options(partial: PartialOptions) -> Result<Self, OptionsError> {
		let schema = OptionsSchema::builder(ATTR)
			.static_key("alignments", ALIGNMENTS.to_vec())
			.static_key("defaultAlignment", ALIGNMENTS[0])
			.build();
		Ok(Self {
			options: Options::new(schema, partial)?,
		})
	}

	fn alignments(&self) -> Vec<String> {
		match self.options.get("alignments") {
			Some(OptionValue::List(items)) => items
				.iter()
				.filter_map(|v| v.as_str().map(str::to_string))
				.collect(),
			_ => ALIGNMENTS.iter().map(|a| (*a).to_string()).collect(),
		}
	}
}

impl Extension for TextAlign {
	fn name(&self) -> &'static str {
		ATTR
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn create_extra_attributes(&self) -> Vec<ExtraAttributes> {
		let default = self
			.options
			.get_as::<String>("defaultAlignment")
			.unwrap_or_else(|| ALIGNMENTS[0].to_string());
		vec![
			ExtraAttributes::new(AttributeTarget::Tags(vec![ExtensionTag::FORMATTING_NODE]))
				.attr(ATTR, AttributeSpec::with_default(default)),
		]
	}

	fn create_commands(&self) -> Vec<(&'static str, CommandSpec)> {
		let allowed = self.alignments();
		let set = CommandSpec::fallible(move |props| {
			let Some(alignment) = props.args.first().and_then(Value::as_str) else {
				return Ok(false);
			};
			if !allowed.iter().any(|a| a == alignment) {
				return Ok(false);
			}
			let targets: Vec<usize> = selected_textblocks(props.tr)
				.into_iter()
				.filter(|(node, _)| node.attr(ATTR).is_some())
				.map(|(_, pos)| pos)
				.collect();
			if targets.is_empty() {
				return Ok(false);
			}
			for pos in targets {
				props.tr.set_node_attrs(pos, single_attr(ATTR, alignment))?;
			}
			Ok(true)
		});
		vec![("setTextAlign", set)]
	}

	fn create_keymap(&self, _platform: Platform) -> Vec<KeyBinding> {
		let allowed = self.alignments();
		[("Mod-Shift-l", "left"), ("Mod-Shift-e", "center"), ("Mod-Shift-r", "right"), ("Mod-Shift-j", "justify")]
			.into_iter()
			.filter(|(_, alignment)| allowed.iter().any(|a| a == alignment))
			.map(|(chord, alignment)| {
				KeyBinding::new(chord, move |store| run_bound(store, "setTextAlign", &[Value::from(alignment)]))
			})
			.collect()
	}
}
