//! Inline text.

use quire_primitives::NodeSpec;
use quire_registry::{
	Extension, ExtensionKind, ExtensionTag, ExtraAttributesHelper, NodeExtension, Options, OptionsError,
	OptionsSchema,
};

pub struct Text {
	options: Options,
}

impl Text {
	pub fn new() -> Result<Self, OptionsError> {
		Ok(Self {
			options: Options::defaults(OptionsSchema::builder("text").schema_contributor().build())?,
		})
	}
}

impl NodeExtension for Text {
	fn create_node_spec(&self, _extra: &ExtraAttributesHelper) -> NodeSpec {
		NodeSpec {
			group: Some("inline".into()),
			inline: true,
			..NodeSpec::default()
		}
	}
}

impl Extension for Text {
	fn name(&self) -> &'static str {
		"text"
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn kind(&self) -> ExtensionKind<'_> {
		ExtensionKind::Node(self)
	}

	fn tags(&self) -> Vec<ExtensionTag> {
		vec![ExtensionTag::INLINE]
	}
}
