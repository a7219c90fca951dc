//! Thematic break between blocks.

use quire_primitives::{Bias, DocError, NodeSpec, Selection, Step, Transaction};
use quire_registry::{
	CommandSpec, Extension, ExtensionKind, ExtensionTag, ExtraAttributesHelper, InputRule, NodeExtension,
	Options, OptionsError, OptionsSchema, PartialOptions,
};

const NAME: &str = "horizontalRule";

/// Leaf block with a dynamic `insertionNode` option: the node added after a
/// rule that would otherwise end the document or precede a non-textblock.
/// An empty name disables it.
pub struct HorizontalRule {
	options: Options,
}

impl HorizontalRule {
	pub fn new() -> Result<Self, OptionsError> {
		Self::with_options(PartialOptions::new())
	}

	pub fn with_options(partial: PartialOptions) -> Result<Self, OptionsError> {
		let schema = OptionsSchema::builder(NAME)
			.dynamic_key("insertionNode", "paragraph")
			.schema_contributor()
			.build();
		Ok(Self {
			options: Options::new(schema, partial)?,
		})
	}
}

/// Inserts a rule over `from..to` and moves the cursor after it.
fn insert_rule(tr: &mut Transaction, from: usize, to: usize, insertion: &str) -> Result<(), DocError> {
	let rule = tr.schema().node(NAME, None, Vec::new(), Vec::new())?;
	tr.replace_range_with(from, to, rule)?;
	let Some(end) = rule_end(tr) else {
		return Ok(());
	};

	let rp = tr.doc().resolve(end)?;
	let next = rp.parent().child(rp.index(rp.depth()));
	if next.is_some_and(|n| n.is_textblock()) {
		tr.set_selection(Selection::cursor(end + 1));
		return Ok(());
	}
	if insertion.is_empty() {
		tr.set_selection(Selection::near(tr.doc(), end, Bias::Right));
		return Ok(());
	}
	let block = tr.schema().create_and_fill(insertion, None)?;
	let enters = block.is_textblock();
	tr.insert(end, vec![block])?;
	let cursor = if enters { end + 1 } else { end };
	tr.set_selection(Selection::near(tr.doc(), cursor, Bias::Right));
	Ok(())
}

/// End position of the rule placed by the last replace step.
fn rule_end(tr: &Transaction) -> Option<usize> {
	let Some(Step::Replace { from, content, .. }) = tr.steps().last() else {
		return None;
	};
	let mut pos = *from;
	for node in content {
		pos += node.node_size();
		if node.kind() == NAME {
			return Some(pos);
		}
	}
	None
}

impl NodeExtension for HorizontalRule {
	fn create_node_spec(&self, _extra: &ExtraAttributesHelper) -> NodeSpec {
		NodeSpec::block(None, "block")
	}
}

impl Extension for HorizontalRule {
	fn name(&self) -> &'static str {
		NAME
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn kind(&self) -> ExtensionKind<'_> {
		ExtensionKind::Node(self)
	}

	fn tags(&self) -> Vec<ExtensionTag> {
		vec![ExtensionTag::BLOCK]
	}

	fn create_commands(&self) -> Vec<(&'static str, CommandSpec)> {
		let insert = CommandSpec::fallible(|props| {
			let insertion = props.options.get_as::<String>("insertionNode").unwrap_or_default();
			let (from, to) = props.tr.selection().range(props.tr.doc());
			insert_rule(props.tr, from, to, &insertion)?;
			Ok(true)
		});
		vec![("insertHorizontalRule", insert)]
	}

	fn create_input_rules(&self) -> Vec<InputRule> {
		let options = self.options.clone();
		vec![InputRule::new(r"^(?:---|___|\*\*\*)$", move |props| {
			let insertion = options.get_as::<String>("insertionNode").unwrap_or_default();
			props.tr.delete(props.from, props.to)?;
			insert_rule(props.tr, props.from, props.from, &insertion)?;
			Ok(true)
		})]
	}
}
