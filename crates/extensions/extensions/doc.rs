//! The document root.

use std::sync::Arc;

use quire_primitives::NodeSpec;
use quire_registry::{
	Extension, ExtensionKind, ExtensionTag, ExtraAttributesHelper, HelperFn, HelperProps, NodeExtension,
	Options, OptionsError, OptionsSchema, PartialOptions,
};
use serde_json::Value;

const DEFAULT_CONTENT: &str = "block+";
const DEFAULT_SEPARATOR: &str = "\n\n";

/// Root node type. Its static `content` option is the content expression of the document.
pub struct Doc {
	options: Options,
}

impl Doc {
	pub fn new() -> Result<Self, OptionsError> {
		Self::with_options(PartialOptions::new())
	}

	pub fn with_options(partial: PartialOptions) -> Result<Self, OptionsError> {
		let schema = OptionsSchema::builder("doc")
			.static_key("content", DEFAULT_CONTENT)
			.schema_contributor()
			.build();
		Ok(Self {
			options: Options::new(schema, partial)?,
		})
	}
}

impl NodeExtension for Doc {
	fn create_node_spec(&self, _extra: &ExtraAttributesHelper) -> NodeSpec {
		let content = self
			.options
			.get_as::<String>("content")
			.unwrap_or_else(|| DEFAULT_CONTENT.to_string());
		NodeSpec::block(Some(&content), "")
	}
}

impl Extension for Doc {
	fn name(&self) -> &'static str {
		"doc"
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn kind(&self) -> ExtensionKind<'_> {
		ExtensionKind::Node(self)
	}

	fn tags(&self) -> Vec<ExtensionTag> {
		vec![ExtensionTag::DOCUMENT]
	}

	fn create_helpers(&self) -> Vec<(&'static str, HelperFn)> {
		let json: HelperFn = Arc::new(|props: &HelperProps<'_>| props.state.doc().to_json());
		// getText([separator]) joins blocks with the separator, two newlines by default.
		let text: HelperFn = Arc::new(|props: &HelperProps<'_>| {
			let separator = props.args.first().and_then(Value::as_str).unwrap_or(DEFAULT_SEPARATOR);
			let doc = props.state.doc();
			Value::String(doc.text_between(0, doc.content_size(), separator))
		});
		vec![("getJSON", json), ("getText", text)]
	}
}
