//! The default block.

use quire_keymap::Platform;
use quire_primitives::NodeSpec;
use quire_registry::{
	CommandSpec, Extension, ExtensionKind, ExtensionTag, ExtraAttributesHelper, KeyBinding, NodeExtension,
	Options, OptionsError, OptionsSchema, PartialOptions,
};

use crate::commands::selected_textblocks;

pub struct Paragraph {
	options: Options,
}

impl Paragraph {
	pub fn new() -> Result<Self, OptionsError> {
		Self::with_options(PartialOptions::new())
	}

	pub fn with_options(partial: PartialOptions) -> Result<Self, OptionsError> {
		let schema = OptionsSchema::builder("paragraph").schema_contributor().build();
		Ok(Self {
			options: Options::new(schema, partial)?,
		})
	}
}

impl NodeExtension for Paragraph {
	fn create_node_spec(&self, _extra: &ExtraAttributesHelper) -> NodeSpec {
		NodeSpec::block(Some("inline*"), "block")
	}
}

impl Extension for Paragraph {
	fn name(&self) -> &'static str {
		"paragraph"
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn kind(&self) -> ExtensionKind<'_> {
		ExtensionKind::Node(self)
	}

	fn tags(&self) -> Vec<ExtensionTag> {
		vec![
			ExtensionTag::BLOCK,
			ExtensionTag::TEXT_BLOCK,
			ExtensionTag::DEFAULT_BLOCK,
			ExtensionTag::LAST_NODE_COMPATIBLE,
			ExtensionTag::FORMATTING_NODE,
		]
	}

	fn create_commands(&self) -> Vec<(&'static str, CommandSpec)> {
		let convert = CommandSpec::fallible(|props| {
			let blocks = selected_textblocks(props.tr);
			if blocks.iter().all(|(node, _)| node.kind() == "paragraph") {
				return Ok(false);
			}
			let (from, to) = props.tr.selection().range(props.tr.doc());
			props.tr.set_block_type(from, to, "paragraph", None)?;
			Ok(true)
		})
		.with_active(|state, _| {
			let head = state.selection().head(state.doc());
			state.doc().resolve(head).is_ok_and(|rp| rp.parent().kind() == "paragraph")
		});
		vec![("convertParagraph", convert)]
	}

	fn create_keymap(&self, _platform: Platform) -> Vec<KeyBinding> {
		vec![KeyBinding::command("Mod-Shift-0", "convertParagraph")]
	}
}
