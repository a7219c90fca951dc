//! Section headings, `level` 1 to 6 by default.

use quire_keymap::Platform;
use quire_primitives::{AttributeSpec, EditorState, NodeSpec};
use quire_registry::{
	CommandSpec, Extension, ExtensionKind, ExtensionTag, ExtraAttributesHelper, InputRule, KeyBinding,
	NodeExtension, OptionValue, Options, OptionsError, OptionsSchema, PartialOptions,
};
use serde_json::Value;

use crate::commands::{run_bound, single_attr, textblock_at_head};

const DEFAULT_LEVELS: [i64; 6] = [1, 2, 3, 4, 5, 6];

pub struct Heading {
	options: Options,
}

impl Heading {
	pub fn new() -> Result<Self, OptionsError> {
		Self::with_options(PartialOptions::new())
	}

	/// `levels` is static: it shapes the keymap and input rule.
	pub fn with_options(partial: PartialOptions) -> Result<Self, OptionsError> {
		let schema = OptionsSchema::builder("heading")
			.static_key("levels", DEFAULT_LEVELS.to_vec())
			.schema_contributor()
			.build();
		Ok(Self {
			options: Options::new(schema, partial)?,
		})
	}

	pub fn levels(&self) -> Vec<i64> {
		levels(&self.options)
	}
}

fn levels(options: &Options) -> Vec<i64> {
	match options.get("levels") {
		Some(OptionValue::List(items)) => items.iter().filter_map(OptionValue::as_int).collect(),
		_ => DEFAULT_LEVELS.to_vec(),
	}
}

/// Accepts `[2]` as well as `[{"level": 2}]`.
fn requested_level(args: &[Value]) -> Option<i64> {
	let first = args.first()?;
	first.as_i64().or_else(|| first.get("level").and_then(Value::as_i64))
}

fn heading_level(state: &EditorState) -> Option<i64> {
	let head = state.selection().head(state.doc());
	let rp = state.doc().resolve(head).ok()?;
	let parent = rp.parent();
	if parent.kind() != "heading" {
		return None;
	}
	parent.attr("level").and_then(Value::as_i64)
}

impl NodeExtension for Heading {
	fn create_node_spec(&self, _extra: &ExtraAttributesHelper) -> NodeSpec {
		let first = self.levels().first().copied().unwrap_or(1);
		NodeSpec::block(Some("inline*"), "block").attr("level", AttributeSpec::with_default(first))
	}
}

impl Extension for Heading {
	fn name(&self) -> &'static str {
		"heading"
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn kind(&self) -> ExtensionKind<'_> {
		ExtensionKind::Node(self)
	}

	fn tags(&self) -> Vec<ExtensionTag> {
		vec![ExtensionTag::BLOCK, ExtensionTag::TEXT_BLOCK, ExtensionTag::FORMATTING_NODE]
	}

	fn required_extensions(&self) -> Vec<&'static str> {
		vec!["paragraph"]
	}

	fn create_commands(&self) -> Vec<(&'static str, CommandSpec)> {
		let allowed = self.levels();
		// A heading of the requested level turns back into a paragraph.
		let toggle = CommandSpec::fallible(move |props| {
			let Some(level) = requested_level(props.args).filter(|l| allowed.contains(l)) else {
				return Ok(false);
			};
			let Some((block, _)) = textblock_at_head(props.tr)? else {
				return Ok(false);
			};
			let is_same = block.kind() == "heading" && block.attr("level").and_then(Value::as_i64) == Some(level);
			let (from, to) = props.tr.selection().range(props.tr.doc());
			if is_same {
				props.tr.set_block_type(from, to, "paragraph", None)?;
			} else {
				props.tr.set_block_type(from, to, "heading", Some(single_attr("level", level)))?;
			}
			Ok(true)
		})
		.with_active(|state, _| heading_level(state).is_some());
		vec![("toggleHeading", toggle)]
	}

	fn create_keymap(&self, _platform: Platform) -> Vec<KeyBinding> {
		self.levels()
			.into_iter()
			.filter(|level| (1..=9).contains(level))
			.map(|level| {
				KeyBinding::new(format!("Mod-Shift-{level}"), move |store| {
					run_bound(store, "toggleHeading", &[Value::from(level)])
				})
			})
			.collect()
	}

	fn create_input_rules(&self) -> Vec<InputRule> {
		let allowed = self.levels();
		let max = allowed.iter().copied().max().unwrap_or(6);
		let pattern = format!(r"^(#{{1,{max}}})\s$");
		vec![InputRule::textblock(pattern, "heading", move |captures| {
			let hashes = captures.get(1)?.as_deref()?;
			let level = i64::try_from(hashes.len()).ok()?;
			allowed.contains(&level).then(|| single_attr("level", level))
		})]
	}
}
