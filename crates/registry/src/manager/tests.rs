use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use quire_keymap::{KeyChord, Platform};
use quire_primitives::{EditorState, Node};
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::error::ConfigError;
use crate::extension::{CommandSpec, HelperFn, InputRule, KeyBinding, PasteRule};
use crate::options::{OptionValue, Options, OptionsError, OptionsSchema};
use crate::test_fixtures::{Log, Probe, TestMark, base, log, settings};

fn take(log: &Log) -> Vec<String> {
	std::mem::take(&mut *log.lock())
}

fn with(extra: Vec<ExtensionInput>) -> Vec<ExtensionInput> {
	let mut inputs = base();
	inputs.push(TestMark::new("bold").into());
	inputs.extend(extra);
	inputs
}

/// Records the text of every state it is shown.
struct RecordingView {
	seen: Arc<Mutex<Vec<String>>>,
}

impl EditorView for RecordingView {
	fn update_state(&mut self, state: &EditorState) {
		self.seen.lock().push(state.doc().text_content());
	}

	fn destroy(&mut self) {
		self.seen.lock().push("<destroyed>".into());
	}
}

fn attach(manager: &Manager) -> Arc<Mutex<Vec<String>>> {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let state = manager.create_state(None).unwrap();
	let view = RecordingView {
		seen: Arc::clone(&seen),
	};
	manager.attach_view(Box::new(view), state).unwrap();
	seen
}

fn text(manager: &Manager) -> String {
	manager.state().unwrap().doc().text_content()
}

fn insert(text: &'static str) -> CommandSpec {
	CommandSpec::fallible(move |props| {
		let (from, to) = props.tr.selection().range(props.tr.doc());
		props.tr.insert_text(text, from, to)?;
		Ok(true)
	})
}

/// Inserts its first argument at the selection.
fn insert_arg() -> CommandSpec {
	CommandSpec::fallible(|props| {
		let args = props.args;
		let Some(text) = args.first().and_then(Value::as_str) else {
			return Ok(false);
		};
		let (from, to) = props.tr.selection().range(props.tr.doc());
		props.tr.insert_text(text, from, to)?;
		Ok(true)
	})
}

fn partial(key: &str, value: impl Into<OptionValue>) -> PartialOptions {
	let mut partial = PartialOptions::new();
	partial.insert(key.to_string(), value.into());
	partial
}

#[test]
fn hooks_follow_the_lifecycle() {
	let log = log();
	let manager = Manager::create(
		with(vec![
			Probe::new("a", &log).into(),
			Probe::new("b", &log).priority(Priority::HIGH).into(),
		]),
		settings(),
	)
	.unwrap();
	assert_eq!(manager.phase(), Phase::Created);
	assert_eq!(take(&log), ["b:onCreate", "a:onCreate"]);

	let seen = attach(&manager);
	assert_eq!(manager.phase(), Phase::ViewAttached);
	assert_eq!(take(&log), ["b:onView", "a:onView"]);

	let mut tr = manager.state().unwrap().tr();
	tr.insert_text("x", 1, 1).unwrap();
	manager.dispatch(tr).unwrap();
	assert_eq!(manager.phase(), Phase::Active);
	assert_eq!(take(&log), ["b:onStateUpdate", "a:onStateUpdate"]);
	assert_eq!(text(&manager), "x");
	let previous = manager.previous_state().unwrap().map(|s| s.doc().text_content());
	assert_eq!(previous.as_deref(), Some(""));

	manager.destroy().unwrap();
	assert_eq!(manager.phase(), Phase::Destroyed);
	assert_eq!(take(&log), ["a:onDestroy", "b:onDestroy"]);
	assert_eq!(*seen.lock(), ["", "x", "<destroyed>"]);
	assert!(matches!(manager.state(), Err(ManagerError::Usage(UsageError::Destroyed))));
	assert!(matches!(manager.destroy(), Err(ManagerError::Usage(UsageError::Destroyed))));
}

#[test]
fn dispatch_needs_a_view() {
	let manager = Manager::create(base(), settings()).unwrap();
	let state = manager.create_state(None).unwrap();
	let err = manager.dispatch(state.tr()).unwrap_err();
	assert!(
		matches!(
			err,
			ManagerError::Usage(UsageError::InvalidPhase {
				operation: "dispatch",
				phase: Phase::Created
			})
		),
		"{err:?}"
	);
}

#[test]
fn view_can_only_be_attached_once() {
	let manager = Manager::create(base(), settings()).unwrap();
	attach(&manager);
	let state = manager.create_state(None).unwrap();
	let view = RecordingView {
		seen: Arc::default(),
	};
	let err = manager.attach_view(Box::new(view), state).unwrap_err();
	assert!(matches!(err, ManagerError::Usage(UsageError::InvalidPhase { .. })));
}

#[test]
fn failing_create_hook_aborts_creation() {
	let log = log();
	let err = Manager::create(
		with(vec![
			Probe::new("bad", &log).fail_on(HookPhase::Create).into(),
			Probe::new("never", &log).priority(Priority::LOW).into(),
		]),
		settings(),
	)
	.unwrap_err();
	match err {
		ManagerError::Hook(failure) => {
			assert_eq!(failure.extension, "bad");
			assert_eq!(failure.phase, HookPhase::Create);
		}
		other => panic!("unexpected error: {other:?}"),
	}
	assert_eq!(take(&log), ["bad:onCreate"]);
}

#[test]
fn failing_hook_leaves_the_manager_unusable() {
	let log = log();
	let manager = Manager::create(
		with(vec![Probe::new("bad", &log).fail_on(HookPhase::View).into()]),
		settings(),
	)
	.unwrap();
	let state = manager.create_state(None).unwrap();
	let view = RecordingView {
		seen: Arc::default(),
	};
	assert!(matches!(
		manager.attach_view(Box::new(view), state),
		Err(ManagerError::Hook(_))
	));
	assert!(matches!(manager.state(), Err(ManagerError::Usage(UsageError::Unusable))));
	assert!(matches!(manager.recreate(), Err(ManagerError::Usage(UsageError::Unusable))));
}

#[test]
fn dispatching_from_a_subscriber_is_reentrant() {
	let manager = Manager::create(base(), settings()).unwrap();
	attach(&manager);

	let store = manager.store();
	let outcome = Arc::new(Mutex::new(None));
	let recorded = Arc::clone(&outcome);
	let _subscription = manager.on_state_update(move |_| {
		let Ok(tr) = store.tr() else {
			return;
		};
		let result = store.dispatch(tr);
		*recorded.lock() = Some(matches!(
			result,
			Err(ManagerError::Usage(UsageError::Reentrant("dispatch")))
		));
	})
	.unwrap();

	let mut tr = manager.state().unwrap().tr();
	tr.insert_text("a", 1, 1).unwrap();
	manager.dispatch(tr).unwrap();
	assert_eq!(*outcome.lock(), Some(true));
}

#[test]
fn disposed_subscribers_stop_receiving_updates() {
	let manager = Manager::create(base(), settings()).unwrap();
	attach(&manager);
	let count = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&count);
	let subscription = manager.on_state_update(move |update| {
		assert!(!update.forced);
		counter.fetch_add(1, Ordering::SeqCst);
	})
	.unwrap();

	for _ in 0..2 {
		let mut tr = manager.state().unwrap().tr();
		tr.insert_text("a", 1, 1).unwrap();
		manager.dispatch(tr).unwrap();
	}
	subscription.dispose();
	let mut tr = manager.state().unwrap().tr();
	tr.insert_text("a", 1, 1).unwrap();
	manager.dispatch(tr).unwrap();
	assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn store_outliving_the_manager_reports_destroyed() {
	let manager = Manager::create(base(), settings()).unwrap();
	let store = manager.store();
	assert!(store.has_extension("paragraph"));
	drop(manager);
	assert_eq!(store.phase(), Phase::Destroyed);
	assert!(matches!(store.state(), Err(ManagerError::Usage(UsageError::Destroyed))));
	assert!(!store.has_extension("paragraph"));
}

#[test]
fn commands_run_and_dry_run() {
	let log = log();
	let manager = Manager::create(
		with(vec![
			Probe::new("editing", &log)
				.command("insert", insert_arg())
				.command("refuse", CommandSpec::new(|_| false))
				.command(
					"empty",
					CommandSpec::new(|_| true).with_active(|state, _| state.doc().text_content().is_empty()),
				)
				.into(),
		]),
		settings(),
	)
	.unwrap();

	let err = manager.commands().run("insert", &[json!("hi")]).unwrap_err();
	assert!(matches!(err, ManagerError::Usage(UsageError::InvalidPhase { .. })), "{err:?}");

	attach(&manager);
	let commands = manager.commands();
	assert!(commands.is_active("empty").unwrap());
	assert!(commands.can("insert", &[json!("hi")]).unwrap());
	assert_eq!(text(&manager), "");

	assert!(commands.run("insert", &[json!("hi")]).unwrap());
	assert_eq!(text(&manager), "hi");
	assert!(!commands.is_active("empty").unwrap());
	assert!(!commands.run("insert", &[]).unwrap());
	assert!(!commands.run("refuse", &[]).unwrap());
	assert!(!commands.is_active("refuse").unwrap());
	assert!(matches!(
		commands.run("missing", &[]),
		Err(ManagerError::Usage(UsageError::UnknownCommand(name))) if name == "missing"
	));
	assert_eq!(commands.names().unwrap(), ["insert", "refuse", "empty"]);
}

#[test]
fn chains_dispatch_once_and_only_when_every_command_applies() {
	let log = log();
	let manager = Manager::create(
		with(vec![
			Probe::new("editing", &log)
				.command("insert", insert_arg())
				.command("refuse", CommandSpec::new(|_| false))
				.into(),
		]),
		settings(),
	)
	.unwrap();
	attach(&manager);
	let dispatched = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&dispatched);
	let _subscription = manager.on_state_update(move |_| {
		counter.fetch_add(1, Ordering::SeqCst);
	})
	.unwrap();

	let failing = manager
		.chain()
		.cmd("insert", vec![json!("a")])
		.cmd("refuse", Vec::new());
	assert!(!failing.can().unwrap());
	assert!(!failing.run().unwrap());
	assert_eq!(text(&manager), "");

	let chain = manager
		.chain()
		.cmd("insert", vec![json!("a")])
		.cmd("insert", vec![json!("b")]);
	assert!(chain.can().unwrap());
	assert_eq!(dispatched.load(Ordering::SeqCst), 0);
	assert!(chain.run().unwrap());
	assert_eq!(text(&manager), "ab");
	assert_eq!(dispatched.load(Ordering::SeqCst), 1);
}

#[test]
fn helpers_see_live_options() {
	let log = log();
	let greeting: HelperFn = Arc::new(|props: &HelperProps<'_>| {
		let name = props.args.first().and_then(Value::as_str).unwrap_or("you");
		let greeting = props.options.get_as::<String>("greeting").unwrap_or_default();
		json!(format!("{greeting}, {name}"))
	});
	let manager = Manager::create(
		with(vec![
			Probe::new("greeter", &log)
				.options(OptionsSchema::builder("greeter").dynamic_key("greeting", "hello").build())
				.helper("greet", greeting)
				.into(),
		]),
		settings(),
	)
	.unwrap();
	attach(&manager);

	let helpers = manager.helpers();
	assert_eq!(helpers.call("greet", &[json!("ada")]).unwrap(), json!("hello, ada"));
	manager.set_options("greeter", &partial("greeting", "hi")).unwrap();
	assert_eq!(helpers.call("greet", &[]).unwrap(), json!("hi, you"));
	assert!(matches!(
		helpers.call("nope", &[]),
		Err(ManagerError::Usage(UsageError::UnknownHelper(_)))
	));
	assert_eq!(helpers.names().unwrap(), ["greet"]);
}

#[test]
fn keys_fall_through_until_a_handler_accepts() {
	let log = log();
	let declined = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&declined);
	let manager = Manager::create(
		with(vec![
			Probe::new("cmds", &log)
				.command("insertX", insert("X"))
				.key(KeyBinding::command("Mod-b", "insertX"))
				.into(),
			Probe::new("keys", &log)
				.priority(Priority::HIGH)
				.key(KeyBinding::new("Ctrl-B", move |_| {
					counter.fetch_add(1, Ordering::SeqCst);
					false
				}))
				.into(),
		]),
		settings(),
	)
	.unwrap();

	let chord = KeyChord::parse("Ctrl-b", Platform::Other).unwrap();
	assert!(matches!(
		manager.handle_key(&chord),
		Err(ManagerError::Usage(UsageError::InvalidPhase { .. }))
	));

	attach(&manager);
	assert_eq!(manager.key_bindings(&chord).unwrap(), ["keys", "cmds"]);
	assert!(manager.handle_key(&chord).unwrap());
	assert_eq!(declined.load(Ordering::SeqCst), 1);
	assert_eq!(text(&manager), "X");

	let unbound = KeyChord::parse("Ctrl-q", Platform::Other).unwrap();
	assert!(!manager.handle_key(&unbound).unwrap());
}

/// Binds the chord named by its `chord` option.
struct ConfigurableKey {
	options: Options,
	hits: Arc<AtomicUsize>,
}

impl Extension for ConfigurableKey {
	fn name(&self) -> &'static str {
		"configurableKey"
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn create_keymap(&self, _platform: Platform) -> Vec<KeyBinding> {
		let chord = self.options.get_as::<String>("chord").unwrap_or_default();
		let hits = Arc::clone(&self.hits);
		vec![KeyBinding::new(chord, move |_| {
			hits.fetch_add(1, Ordering::SeqCst);
			true
		})]
	}
}

#[test]
fn keymap_is_rebuilt_after_option_changes() {
	let hits = Arc::new(AtomicUsize::new(0));
	let schema = OptionsSchema::builder("configurableKey").dynamic_key("chord", "Ctrl-k").build();
	let extension = ConfigurableKey {
		options: Options::defaults(schema).unwrap(),
		hits: Arc::clone(&hits),
	};
	let mut inputs = base();
	inputs.push(extension.into());
	let manager = Manager::create(inputs, settings()).unwrap();
	attach(&manager);

	let k = KeyChord::parse("Ctrl-k", Platform::Other).unwrap();
	let j = KeyChord::parse("Ctrl-j", Platform::Other).unwrap();
	assert!(manager.handle_key(&k).unwrap());

	manager.set_options("configurableKey", &partial("chord", "Ctrl-j")).unwrap();
	assert_eq!(manager.generation(), 0);
	assert!(!manager.handle_key(&k).unwrap());
	assert!(manager.handle_key(&j).unwrap());
	assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn set_options_reports_the_diff_and_rebuilds_on_request() {
	let log = log();
	let probe = Probe::new("p", &log)
		.options(
			OptionsSchema::builder("p")
				.static_key("mode", "fast")
				.dynamic_key("size", 1)
				.build(),
		)
		.rebuild_on_set_options();
	let built = Arc::clone(&probe.built);
	let manager = Manager::create(with(vec![probe.into()]), settings()).unwrap();
	attach(&manager);
	take(&log);

	let diff = manager.set_options("p", &partial("size", 2)).unwrap();
	assert!(diff.changed("size"));
	assert_eq!(diff.get("size").map(|c| c.previous.clone()), Some(OptionValue::Int(1)));
	assert_eq!(manager.generation(), 1);
	assert_eq!(*built.lock(), 2);
	assert_eq!(
		take(&log),
		["p:changed=size", "p:onSetOptions", "p:forced", "p:onStateUpdate"]
	);

	let diff = manager.set_options("p", &partial("size", 2)).unwrap();
	assert!(!diff.any_changed());
	assert_eq!(manager.generation(), 1);
}

#[test]
fn failed_set_options_hook_keeps_the_new_values() {
	let log = log();
	let probe = Probe::new("p", &log)
		.options(OptionsSchema::builder("p").dynamic_key("size", 1).build())
		.fail_on(HookPhase::SetOptions);
	let options = Extension::options(&probe).clone();
	let manager = Manager::create(with(vec![probe.into()]), settings()).unwrap();

	let err = manager.set_options("p", &partial("size", 2)).unwrap_err();
	assert!(
		matches!(&err, ManagerError::Hook(failure) if failure.phase == HookPhase::SetOptions),
		"{err:?}"
	);
	assert_eq!(options.get("size"), Some(OptionValue::Int(2)));
	assert!(matches!(
		manager.set_options("p", &partial("size", 3)),
		Err(ManagerError::Usage(UsageError::Unusable))
	));
}

#[rstest]
#[case::static_key("p", "mode")]
#[case::unknown_key("p", "colour")]
#[case::unknown_extension("q", "size")]
fn set_options_rejects(#[case] extension: &str, #[case] key: &str) {
	let log = log();
	let probe = Probe::new("p", &log).options(
		OptionsSchema::builder("p")
			.static_key("mode", "fast")
			.dynamic_key("size", 1)
			.build(),
	);
	let manager = Manager::create(with(vec![probe.into()]), settings()).unwrap();
	let err = manager.set_options(extension, &partial(key, "slow")).unwrap_err();
	match key {
		"mode" => assert!(
			matches!(&err, ManagerError::Usage(UsageError::StaticMutation { key, .. }) if key == "mode"),
			"{err:?}"
		),
		"colour" => assert!(
			matches!(&err, ManagerError::Config(ConfigError::Options(OptionsError::UnknownKey { .. }))),
			"{err:?}"
		),
		_ => assert!(
			matches!(&err, ManagerError::Usage(UsageError::UnknownExtension(_))),
			"{err:?}"
		),
	}
}

#[test]
fn extensions_can_be_added_and_removed() {
	let log = log();
	let manager = Manager::create(with(vec![Probe::new("first", &log).into()]), settings()).unwrap();
	attach(&manager);
	take(&log);

	manager
		.add_extension(Probe::new("late", &log).command("late", CommandSpec::new(|_| true)))
		.unwrap();
	assert_eq!(manager.generation(), 1);
	assert!(manager.command_names().unwrap().contains(&"late"));
	assert_eq!(
		take(&log),
		[
			"late:onCreate",
			"late:onView",
			"first:forced",
			"first:onStateUpdate",
			"late:forced",
			"late:onStateUpdate"
		]
	);

	manager.remove_extension("late").unwrap();
	assert!(!manager.extension_names().unwrap().contains(&"late"));
	assert_eq!(take(&log), ["late:onDestroy", "first:forced", "first:onStateUpdate"]);

	assert!(matches!(
		manager.remove_extension("late"),
		Err(ManagerError::Usage(UsageError::UnknownExtension(_)))
	));
}

#[test]
fn failed_rebuild_keeps_the_current_composition() {
	let log = log();
	let manager = Manager::create(
		with(vec![Probe::new("first", &log).command("go", CommandSpec::new(|_| true)).into()]),
		settings(),
	)
	.unwrap();
	let before = manager.extension_names().unwrap();

	let err = manager
		.add_extension(Probe::new("second", &log).command("go", CommandSpec::new(|_| true)))
		.unwrap_err();
	assert!(matches!(err, ManagerError::Config(ConfigError::DuplicateCommand { .. })), "{err:?}");
	assert_eq!(manager.extension_names().unwrap(), before);
	assert_eq!(manager.generation(), 0);
	assert!(manager.recreate().is_ok());
}

#[test]
fn typed_access_to_extensions() {
	let log = log();
	let manager = Manager::create(with(vec![Probe::new("probe", &log).into()]), settings()).unwrap();
	let builds = manager.with_extension::<Probe, _>("probe", |p| *p.built.lock()).unwrap();
	assert_eq!(builds, 1);
	assert!(matches!(
		manager.with_extension::<TestMark, _>("probe", |_| ()),
		Err(ManagerError::Usage(UsageError::ExtensionType(_)))
	));
	assert!(matches!(
		manager.with_extension::<Probe, _>("ghost", |_| ()),
		Err(ManagerError::Usage(UsageError::UnknownExtension(_)))
	));
}

#[test]
fn typed_access_blocks_nested_lifecycle_calls() {
	let log = log();
	let manager = Manager::create(with(vec![Probe::new("probe", &log).into()]), settings()).unwrap();
	attach(&manager);
	let tr = manager.state().unwrap().tr();

	let nested = manager.with_extension::<TestMark, _>("bold", |_| manager.dispatch(tr)).unwrap();
	assert!(matches!(
		nested,
		Err(ManagerError::Usage(UsageError::Reentrant("dispatch")))
	));
	let nested = manager.with_extension::<Probe, _>("probe", |_| manager.recreate()).unwrap();
	assert!(matches!(nested, Err(ManagerError::Usage(UsageError::Reentrant(_)))));
	let nested = manager.with_extension::<Probe, _>("probe", |_| {
		manager.with_extension::<TestMark, _>("bold", |_| ())
	});
	assert!(matches!(
		nested,
		Ok(Err(ManagerError::Usage(UsageError::Reentrant("with_extension"))))
	));

	let mut tr = manager.state().unwrap().tr();
	tr.insert_text("a", 1, 1).unwrap();
	manager.dispatch(tr).unwrap();
	assert_eq!(text(&manager), "a");
}

#[test]
fn lookups_fail_after_destroy() {
	let log = log();
	let manager = Manager::create(with(vec![Probe::new("probe", &log).into()]), settings()).unwrap();
	manager.destroy().unwrap();

	let destroyed = |result: Result<(), ManagerError>| matches!(result, Err(ManagerError::Usage(UsageError::Destroyed)));
	assert!(destroyed(manager.with_extension::<TestMark, _>("bold", |_| ())));
	assert!(destroyed(manager.schema().map(drop)));
	assert!(destroyed(manager.extension_names().map(drop)));
	assert!(destroyed(manager.extensions_by_tag(&ExtensionTag::DOCUMENT).map(drop)));
	assert!(destroyed(manager.priority_of("bold").map(drop)));
	assert!(destroyed(manager.type_owner("paragraph").map(drop)));
	assert!(destroyed(manager.command_names().map(drop)));
	let chord = KeyChord::parse("Mod-b", Platform::Other).unwrap();
	assert!(destroyed(manager.key_bindings(&chord).map(drop)));
	assert!(destroyed(manager.on_state_update(|_| {}).map(drop)));
}

#[test]
fn lookups_expose_the_composition() {
	let log = log();
	let mut manager_settings = settings();
	manager_settings.priority.insert("bold".into(), Priority::HIGHEST);
	let manager = Manager::create(with(vec![Probe::new("probe", &log).into()]), manager_settings).unwrap();

	assert_eq!(manager.priority_of("bold").unwrap(), Some(Priority::HIGHEST));
	assert_eq!(manager.extension_names().unwrap()[0], "bold");
	assert_eq!(manager.extensions_by_tag(&ExtensionTag::DOCUMENT).unwrap(), ["doc"]);
	assert_eq!(manager.type_owner("paragraph").unwrap(), Some("paragraph"));
	assert_eq!(manager.type_owner("probe").unwrap(), None);
	assert!(manager.schema().unwrap().mark_type("bold").is_some());
}

#[test]
fn typing_runs_input_rules_first() {
	let log = log();
	let manager = Manager::create(
		with(vec![
			Probe::new("rules", &log)
				.input_rule(InputRule::mark(r"\*\*([^*]+)\*\*$", "bold"))
				.into(),
		]),
		settings(),
	)
	.unwrap();
	attach(&manager);

	assert!(!manager.handle_text_input("a").unwrap());
	assert!(!manager.handle_text_input("**b*").unwrap());
	assert!(manager.handle_text_input("*").unwrap());

	let state = manager.state().unwrap();
	let paragraph = state.doc().child(0).unwrap();
	assert_eq!(paragraph.text_content(), "ab");
	assert!(paragraph.child(1).is_some_and(|n| n.has_mark("bold")));
}

#[test]
fn pasting_applies_paste_rules() {
	let log = log();
	let manager = Manager::create(
		with(vec![
			Probe::new("rules", &log)
				.paste_rule(PasteRule::mark(r"\*\*([^*]+)\*\*", "bold"))
				.into(),
		]),
		settings(),
	)
	.unwrap();
	attach(&manager);

	assert!(!manager.handle_paste("plain ").unwrap());
	assert!(manager.handle_paste("x **y** z").unwrap());
	let state = manager.state().unwrap();
	let paragraph = state.doc().child(0).unwrap();
	assert_eq!(paragraph.text_content(), "plain x y z");
	let bold: Vec<String> = paragraph
		.content()
		.iter()
		.filter(|n| n.has_mark("bold"))
		.map(Node::text_content)
		.collect();
	assert_eq!(bold, ["y"]);
}

#[test]
fn states_from_json_use_the_current_schema() {
	let manager = Manager::create(with(Vec::new()), settings()).unwrap();
	let json = json!({"type": "doc", "content": [{"type": "paragraph", "content": [
		{"type": "text", "text": "bold", "marks": [{"type": "bold"}]}
	]}]});
	let state = manager.create_state(Some(&json)).unwrap();
	assert!(Arc::ptr_eq(state.schema(), &manager.schema().unwrap()));
	assert_eq!(state.doc().text_content(), "bold");

	let unknown = json!({"type": "doc", "content": [{"type": "heading"}]});
	assert!(matches!(manager.create_state(Some(&unknown)), Err(ManagerError::Doc(_))));
}

#[test]
fn settings_parse_from_toml() {
	let parsed = ManagerSettings::from_toml_str(
		r#"
			platform = "mac"

			[priority]
			bold = 10

			[exclude]
			input_rules = true

			[[extra_attributes]]
			target = "nodes"
			attrs = { id = {} }
		"#,
	)
	.unwrap();
	assert_eq!(parsed.platform, Platform::Mac);
	assert_eq!(parsed.priority.get("bold"), Some(&Priority::HIGHEST));
	assert!(parsed.exclude.input_rules);
	assert!(!parsed.exclude.keymap);
	assert_eq!(parsed.extra_attributes.len(), 1);

	assert!(matches!(
		ManagerSettings::from_toml_str("colour = 1"),
		Err(ConfigError::Settings(_))
	));
}
