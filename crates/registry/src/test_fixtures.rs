//! Configurable extensions shared by the registry tests.

use std::sync::Arc;

use parking_lot::Mutex;
use quire_keymap::Platform;
use quire_primitives::{MarkSpec, NodeSpec, Plugin};

use crate::core::{ExtensionTag, Priority};
use crate::error::{HookError, HookPhase};
use crate::extension::{
	CommandSpec, Extension, ExtensionKind, ExtensionRef, HelperFn, InputRule, KeyBinding, MarkExtension,
	NodeExtension, PasteRule, Reconfigure, StateUpdate,
};
use crate::manager::{ManagerSettings, Store};
use crate::options::{EXCLUDE, OptionValue, Options, OptionsDiff, OptionsSchema, PartialOptions};
use crate::schema::{ExtraAttributes, ExtraAttributesHelper};

pub(crate) type Log = Arc<Mutex<Vec<String>>>;

pub(crate) fn log() -> Log {
	Arc::new(Mutex::new(Vec::new()))
}

pub(crate) fn settings() -> ManagerSettings {
	ManagerSettings::default().with_platform(Platform::Other)
}

fn plain_options(name: &'static str) -> Options {
	Options::defaults(OptionsSchema::builder(name).build()).unwrap()
}

pub(crate) struct TestNode {
	name: &'static str,
	spec: NodeSpec,
	tags: Vec<ExtensionTag>,
	priority: Priority,
	options: Options,
}

impl TestNode {
	pub(crate) fn new(name: &'static str, spec: NodeSpec) -> Self {
		Self {
			name,
			spec,
			tags: Vec::new(),
			priority: Priority::DEFAULT,
			options: Options::defaults(OptionsSchema::builder(name).schema_contributor().build()).unwrap(),
		}
	}

	pub(crate) fn doc() -> Self {
		Self::new("doc", NodeSpec::block(Some("block+"), "")).tag(ExtensionTag::DOCUMENT)
	}

	pub(crate) fn paragraph() -> Self {
		Self::new("paragraph", NodeSpec::block(Some("inline*"), "block"))
			.tag(ExtensionTag::DEFAULT_BLOCK)
			.tag(ExtensionTag::TEXT_BLOCK)
	}

	pub(crate) fn text() -> Self {
		Self::new(
			"text",
			NodeSpec {
				group: Some("inline".into()),
				inline: true,
				..NodeSpec::default()
			},
		)
	}

	pub(crate) fn rule() -> Self {
		Self::new("horizontalRule", NodeSpec::block(None, "block"))
	}

	pub(crate) fn tag(mut self, tag: ExtensionTag) -> Self {
		self.tags.push(tag);
		self
	}

	pub(crate) fn priority(mut self, priority: Priority) -> Self {
		self.priority = priority;
		self
	}

	pub(crate) fn options(mut self, options: Options) -> Self {
		self.options = options;
		self
	}
}

impl NodeExtension for TestNode {
	fn create_node_spec(&self, _extra: &ExtraAttributesHelper) -> NodeSpec {
		self.spec.clone()
	}
}

impl Extension for TestNode {
	fn name(&self) -> &'static str {
		self.name
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn kind(&self) -> ExtensionKind<'_> {
		ExtensionKind::Node(self)
	}

	fn default_priority(&self) -> Priority {
		self.priority
	}

	fn tags(&self) -> Vec<ExtensionTag> {
		self.tags.clone()
	}
}

pub(crate) struct TestMark {
	name: &'static str,
	priority: Priority,
	options: Options,
}

impl TestMark {
	pub(crate) fn new(name: &'static str) -> Self {
		Self {
			name,
			priority: Priority::DEFAULT,
			options: Options::defaults(OptionsSchema::builder(name).schema_contributor().build()).unwrap(),
		}
	}

	pub(crate) fn priority(mut self, priority: Priority) -> Self {
		self.priority = priority;
		self
	}
}

impl MarkExtension for TestMark {
	fn create_mark_spec(&self, _extra: &ExtraAttributesHelper) -> MarkSpec {
		MarkSpec::default()
	}
}

impl Extension for TestMark {
	fn name(&self) -> &'static str {
		self.name
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn kind(&self) -> ExtensionKind<'_> {
		ExtensionKind::Mark(self)
	}

	fn default_priority(&self) -> Priority {
		self.priority
	}

	fn tags(&self) -> Vec<ExtensionTag> {
		vec![ExtensionTag::FORMATTING_MARK]
	}
}

/// `doc`, `paragraph` and `text`, the minimum a schema needs.
pub(crate) fn base() -> Vec<crate::extension::ExtensionInput> {
	vec![TestNode::doc().into(), TestNode::paragraph().into(), TestNode::text().into()]
}

/// Plain extension recording its hook calls as `"<name>:<hook>"`.
pub(crate) struct Probe {
	name: &'static str,
	options: Options,
	priority: Priority,
	log: Log,
	fail: Option<HookPhase>,
	reconfigure: Reconfigure,
	required: Vec<&'static str>,
	children: Vec<ExtensionRef>,
	commands: Vec<(&'static str, CommandSpec)>,
	helpers: Vec<(&'static str, HelperFn)>,
	keymap: Vec<KeyBinding>,
	input_rules: Vec<InputRule>,
	paste_rules: Vec<PasteRule>,
	plugins: Vec<Plugin>,
	extra: Vec<ExtraAttributes>,
	/// Bumped by every contribution pass, to observe rebuilds.
	pub(crate) built: Arc<Mutex<u32>>,
}

impl Probe {
	pub(crate) fn new(name: &'static str, log: &Log) -> Self {
		Self {
			name,
			options: plain_options(name),
			priority: Priority::DEFAULT,
			log: Arc::clone(log),
			fail: None,
			reconfigure: Reconfigure::None,
			required: Vec::new(),
			children: Vec::new(),
			commands: Vec::new(),
			helpers: Vec::new(),
			keymap: Vec::new(),
			input_rules: Vec::new(),
			paste_rules: Vec::new(),
			plugins: Vec::new(),
			extra: Vec::new(),
			built: Arc::new(Mutex::new(0)),
		}
	}

	pub(crate) fn options(mut self, schema: OptionsSchema) -> Self {
		self.options = Options::defaults(schema).unwrap();
		self
	}

	pub(crate) fn priority(mut self, priority: Priority) -> Self {
		self.priority = priority;
		self
	}

	/// Switches off one contribution kind through the `exclude` option.
	pub(crate) fn excluding(mut self, switch: &str) -> Self {
		let mut exclude = std::collections::BTreeMap::new();
		exclude.insert(switch.to_string(), OptionValue::Bool(true));
		let mut partial = PartialOptions::new();
		partial.insert(EXCLUDE.to_string(), OptionValue::Map(exclude));
		self.options = Options::new(self.options.schema().clone(), partial).unwrap();
		self
	}

	pub(crate) fn fail_on(mut self, phase: HookPhase) -> Self {
		self.fail = Some(phase);
		self
	}

	pub(crate) fn rebuild_on_set_options(mut self) -> Self {
		self.reconfigure = Reconfigure::Rebuild;
		self
	}

	pub(crate) fn requires(mut self, name: &'static str) -> Self {
		self.required.push(name);
		self
	}

	pub(crate) fn child(mut self, child: ExtensionRef) -> Self {
		self.children.push(child);
		self
	}

	pub(crate) fn push_child(&mut self, child: ExtensionRef) {
		self.children.push(child);
	}

	pub(crate) fn command(mut self, name: &'static str, spec: CommandSpec) -> Self {
		self.commands.push((name, spec));
		self
	}

	pub(crate) fn helper(mut self, name: &'static str, helper: HelperFn) -> Self {
		self.helpers.push((name, helper));
		self
	}

	pub(crate) fn key(mut self, binding: KeyBinding) -> Self {
		self.keymap.push(binding);
		self
	}

	pub(crate) fn input_rule(mut self, rule: InputRule) -> Self {
		self.input_rules.push(rule);
		self
	}

	pub(crate) fn paste_rule(mut self, rule: PasteRule) -> Self {
		self.paste_rules.push(rule);
		self
	}

	pub(crate) fn plugin(mut self, plugin: Plugin) -> Self {
		self.plugins.push(plugin);
		self
	}

	pub(crate) fn extra(mut self, extra: ExtraAttributes) -> Self {
		self.extra.push(extra);
		self
	}

	fn record(&self, phase: HookPhase) -> Result<(), HookError> {
		self.log.lock().push(format!("{}:{phase}", self.name));
		if self.fail == Some(phase) {
			return Err(HookError::new(format!("{} refused {phase}", self.name)));
		}
		Ok(())
	}
}

impl Extension for Probe {
	fn name(&self) -> &'static str {
		self.name
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn default_priority(&self) -> Priority {
		self.priority
	}

	fn required_extensions(&self) -> Vec<&'static str> {
		self.required.clone()
	}

	fn child_extensions(&self) -> Vec<ExtensionRef> {
		self.children.clone()
	}

	fn create_commands(&self) -> Vec<(&'static str, CommandSpec)> {
		*self.built.lock() += 1;
		self.commands.clone()
	}

	fn create_helpers(&self) -> Vec<(&'static str, HelperFn)> {
		self.helpers.clone()
	}

	fn create_keymap(&self, _platform: Platform) -> Vec<KeyBinding> {
		self.keymap.clone()
	}

	fn create_input_rules(&self) -> Vec<InputRule> {
		self.input_rules.clone()
	}

	fn create_paste_rules(&self) -> Vec<PasteRule> {
		self.paste_rules.clone()
	}

	fn create_plugins(&self) -> Vec<Plugin> {
		self.plugins.clone()
	}

	fn create_extra_attributes(&self) -> Vec<ExtraAttributes> {
		self.extra.clone()
	}

	fn on_create(&mut self, _store: &Store) -> Result<(), HookError> {
		self.record(HookPhase::Create)
	}

	fn on_view(&mut self, _store: &Store) -> Result<(), HookError> {
		self.record(HookPhase::View)
	}

	fn on_state_update(&mut self, update: &StateUpdate, _store: &Store) -> Result<(), HookError> {
		if update.forced {
			self.log.lock().push(format!("{}:forced", self.name));
		}
		self.record(HookPhase::StateUpdate)
	}

	fn on_set_options(&mut self, diff: &OptionsDiff, _store: &Store) -> Result<Reconfigure, HookError> {
		let keys: Vec<&str> = diff.changed_keys().collect();
		self.log.lock().push(format!("{}:changed={}", self.name, keys.join(",")));
		self.record(HookPhase::SetOptions)?;
		Ok(self.reconfigure)
	}

	fn on_destroy(&mut self, _store: &Store) -> Result<(), HookError> {
		self.record(HookPhase::Destroy)
	}
}
