use std::sync::Arc;

use pretty_assertions::assert_eq;
use quire_keymap::{KeyChord, Platform};
use quire_primitives::{EditorState, Plugin};
use rstest::rstest;
use serde_json::{Value, json};

use super::keymap::{build_keymap, fingerprint};
use super::rules::{apply_paste_rules, run_input_rules};
use super::*;
use crate::core::Priority;
use crate::extension::{HelperProps, InputRule, KeyBinding, PasteRule, extension_ref};
use crate::options::PartialOptions;
use crate::test_fixtures::{Probe, TestMark, base, log, settings};

fn noop() -> CommandSpec {
	CommandSpec::new(|_| true)
}

fn helper() -> HelperFn {
	Arc::new(|_: &HelperProps<'_>| Value::Null)
}

fn with(extra: Vec<ExtensionInput>) -> Vec<ExtensionInput> {
	let mut inputs = base();
	inputs.push(TestMark::new("bold").into());
	inputs.extend(extra);
	inputs
}

fn state(composition: &Composition, text: &str, anchor: usize, head: usize) -> EditorState {
	let doc = json!({
		"doc": {"type": "doc", "content": [{"type": "paragraph", "content": [{"type": "text", "text": text}]}]},
		"selection": {"type": "text", "anchor": anchor, "head": head},
	});
	EditorState::from_json(Arc::clone(&composition.schema), &doc, Vec::new()).unwrap()
}

#[test]
fn commands_and_helpers_keep_priority_order() {
	let log = log();
	let composition = compose(
		with(vec![
			Probe::new("late", &log).command("b", noop()).helper("h2", helper()).into(),
			Probe::new("early", &log)
				.priority(Priority::HIGH)
				.command("a", noop())
				.helper("h1", helper())
				.into(),
		]),
		&settings(),
	)
	.unwrap();

	let commands: Vec<_> = composition.commands.keys().copied().collect();
	assert_eq!(commands, ["a", "b"]);
	assert_eq!(composition.commands.get("b").map(|c| c.owner), Some("late"));
	let helpers: Vec<_> = composition.helpers.keys().copied().collect();
	assert_eq!(helpers, ["h1", "h2"]);
}

#[test]
fn unrelated_command_collision_is_rejected() {
	let log = log();
	let err = compose(
		with(vec![
			Probe::new("one", &log).command("toggle", noop()).into(),
			Probe::new("two", &log).command("toggle", noop()).into(),
		]),
		&settings(),
	)
	.unwrap_err();
	assert!(
		matches!(err, ConfigError::DuplicateCommand { name: "toggle", first: "one", second: "two" }),
		"{err:?}"
	);
}

#[test]
fn one_extension_cannot_register_a_name_twice() {
	let log = log();
	let err = compose(
		with(vec![Probe::new("one", &log).helper("h", helper()).helper("h", helper()).into()]),
		&settings(),
	)
	.unwrap_err();
	assert!(matches!(err, ConfigError::DuplicateHelper { name: "h", .. }), "{err:?}");
}

#[test]
fn parent_shadows_its_child() {
	let log = log();
	let child = extension_ref(Probe::new("child", &log).command("shared", noop()).command("own", noop()));
	let composition = compose(
		with(vec![Probe::new("parent", &log).command("shared", noop()).child(child).into()]),
		&settings(),
	)
	.unwrap();
	assert_eq!(composition.commands.get("shared").map(|c| c.owner), Some("parent"));
	assert_eq!(composition.commands.get("own").map(|c| c.owner), Some("child"));
}

#[test]
fn invalid_pattern_names_its_extension() {
	let log = log();
	let err = compose(
		with(vec![Probe::new("rules", &log).input_rule(InputRule::mark("(unclosed$", "bold")).into()]),
		&settings(),
	)
	.unwrap_err();
	assert!(
		matches!(&err, ConfigError::InvalidPattern { extension: "rules", pattern, .. } if pattern == "(unclosed$"),
		"{err:?}"
	);
}

#[test]
fn duplicate_plugin_keys_are_rejected() {
	let log = log();
	let err = compose(
		with(vec![
			Probe::new("one", &log).plugin(Plugin::new("history")).into(),
			Probe::new("two", &log).plugin(Plugin::new("history")).into(),
		]),
		&settings(),
	)
	.unwrap_err();
	assert!(matches!(&err, ConfigError::DuplicatePlugin { key, .. } if key == "history"), "{err:?}");
}

#[test]
fn exclusions_per_extension_and_globally() {
	let log = log();
	let inputs = || {
		with(vec![
			Probe::new("quiet", &log)
				.excluding("inputRules")
				.input_rule(InputRule::mark(r"\*(\w+)\*$", "bold"))
				.plugin(Plugin::new("quiet"))
				.into(),
			Probe::new("loud", &log)
				.input_rule(InputRule::mark(r"_(\w+)_$", "bold"))
				.paste_rule(PasteRule::mark(r"_(\w+)_", "bold"))
				.plugin(Plugin::new("loud"))
				.into(),
		])
	};

	let composition = compose(inputs(), &settings()).unwrap();
	let owners: Vec<_> = composition.input_rules.iter().map(|r| r.owner).collect();
	assert_eq!(owners, ["loud"]);
	assert_eq!(composition.plugins.len(), 2);

	let mut global = settings();
	global.exclude.plugins = true;
	global.exclude.paste_rules = true;
	let composition = compose(inputs(), &global).unwrap();
	assert!(composition.plugins.is_empty());
	assert!(composition.paste_rules.is_empty());
	assert_eq!(composition.input_rules.len(), 1);
}

#[test]
fn keymap_groups_spellings_in_priority_order() {
	let log = log();
	let composition = compose(
		with(vec![
			Probe::new("fallback", &log).key(KeyBinding::new("Ctrl-b", |_| true)).into(),
			Probe::new("first", &log)
				.priority(Priority::HIGH)
				.key(KeyBinding::new("Mod-B", |_| false))
				.into(),
			Probe::new("muted", &log)
				.excluding("keymap")
				.key(KeyBinding::new("Mod-b", |_| true))
				.into(),
		]),
		&settings(),
	)
	.unwrap();

	let keymap = build_keymap(&composition.index, Platform::Other, &Exclusions::default()).unwrap();
	let chord = KeyChord::parse("ctrl-b", Platform::Other).unwrap();
	let owners: Vec<_> = keymap.chain(&chord).iter().map(|b| b.owner).collect();
	assert_eq!(owners, ["first", "fallback"]);

	let mac = build_keymap(&composition.index, Platform::Mac, &Exclusions::default()).unwrap();
	assert_eq!(mac.chain(&chord).len(), 1);

	let none = build_keymap(
		&composition.index,
		Platform::Other,
		&Exclusions {
			keymap: true,
			..Exclusions::default()
		},
	)
	.unwrap();
	assert_eq!(none.len(), 0);
}

#[test]
fn invalid_chord_is_a_config_error() {
	let log = log();
	let composition = compose(
		with(vec![Probe::new("keys", &log).key(KeyBinding::new("Ctrl-Nope", |_| true)).into()]),
		&settings(),
	)
	.unwrap();
	let err = build_keymap(&composition.index, Platform::Other, &Exclusions::default()).unwrap_err();
	assert!(
		matches!(&err, ConfigError::InvalidKeyChord { extension: "keys", chord, .. } if chord == "Ctrl-Nope"),
		"{err:?}"
	);
}

#[test]
fn fingerprint_tracks_option_updates() {
	let log = log();
	let schema = crate::options::OptionsSchema::builder("tunable").dynamic_key("level", 1).build();
	let composition = compose(with(vec![Probe::new("tunable", &log).options(schema).into()]), &settings()).unwrap();
	let before = fingerprint(&composition.index);

	let mut partial = PartialOptions::new();
	partial.insert("level".into(), 1.into());
	let options = &composition.index.get("tunable").unwrap().options;
	options.update(&partial).unwrap();
	assert_eq!(fingerprint(&composition.index), before);

	partial.insert("level".into(), 2.into());
	options.update(&partial).unwrap();
	assert!(fingerprint(&composition.index) > before);
}

fn bold_rules() -> Composition {
	let log = log();
	compose(
		with(vec![
			Probe::new("rules", &log)
				.input_rule(InputRule::mark(r"\*\*([^*]+)\*\*$", "bold"))
				.paste_rule(PasteRule::mark(r"\*\*([^*]+)\*\*", "bold"))
				.into(),
		]),
		&settings(),
	)
	.unwrap()
}

#[test]
fn input_rule_replaces_the_match() {
	let composition = bold_rules();
	let before = state(&composition, "x **abc*", 9, 9);
	let tr = run_input_rules(&composition.input_rules, &before, 9, 9, "*")
		.unwrap()
		.expect("rule applies");
	let after = before.apply(tr).unwrap();

	let paragraph = after.doc().child(0).unwrap();
	assert_eq!(paragraph.text_content(), "x abc");
	assert_eq!(paragraph.child_count(), 2);
	assert!(paragraph.child(1).is_some_and(|n| n.has_mark("bold")));
	assert!(paragraph.child(0).is_some_and(|n| !n.has_mark("bold")));
}

#[rstest]
#[case::no_match("abc", 4, 4, "*")]
#[case::match_not_at_cursor("**abc** tail", 13, 13, "*")]
#[case::range_selected("**abc*", 1, 7, "*")]
fn input_rule_does_not_apply(#[case] text: &str, #[case] from: usize, #[case] to: usize, #[case] typed: &str) {
	let composition = bold_rules();
	let before = state(&composition, text, from, to);
	let tr = run_input_rules(&composition.input_rules, &before, from, to, typed).unwrap();
	assert!(tr.is_none());
}

#[test]
fn paste_rules_mark_every_match() {
	let composition = bold_rules();
	let (nodes, matched) =
		apply_paste_rules(&composition.paste_rules, &composition.schema, "a **b** c **d**", Vec::new()).unwrap();
	assert!(matched);
	let parts: Vec<(String, bool)> = nodes
		.iter()
		.map(|n| (n.text().unwrap_or_default().to_string(), n.has_mark("bold")))
		.collect();
	assert_eq!(
		parts,
		[
			("a ".to_string(), false),
			("b".to_string(), true),
			(" c ".to_string(), false),
			("d".to_string(), true),
		]
	);
}

#[test]
fn paste_rules_skip_text_already_marked() {
	let composition = bold_rules();
	let bold = composition.schema.mark("bold", None).unwrap();
	let (nodes, matched) =
		apply_paste_rules(&composition.paste_rules, &composition.schema, "**x**", vec![bold]).unwrap();
	assert!(!matched);
	assert_eq!(nodes.len(), 1);
	assert_eq!(nodes[0].text(), Some("**x**"));
}

#[test]
fn same_inputs_compose_identically() {
	let log = log();
	let inputs = || {
		with(vec![
			Probe::new("late", &log)
				.command("b", noop())
				.helper("h2", helper())
				.key(KeyBinding::new("Mod-z", |_| true))
				.into(),
			Probe::new("early", &log)
				.priority(Priority::HIGH)
				.command("a", noop())
				.helper("h1", helper())
				.key(KeyBinding::new("Mod-y", |_| true))
				.key(KeyBinding::new("Mod-z", |_| false))
				.into(),
		])
	};
	let first = compose(inputs(), &settings()).unwrap();
	let second = compose(inputs(), &settings()).unwrap();

	assert_eq!(first.schema.spec(), second.schema.spec());
	let names = |c: &Composition| c.index.entries().iter().map(|e| e.name).collect::<Vec<_>>();
	assert_eq!(names(&first), names(&second));
	assert_eq!(
		first.commands.keys().collect::<Vec<_>>(),
		second.commands.keys().collect::<Vec<_>>()
	);
	assert_eq!(first.helpers.keys().collect::<Vec<_>>(), second.helpers.keys().collect::<Vec<_>>());

	let keymaps = [&first, &second]
		.map(|c| build_keymap(&c.index, Platform::Other, &Exclusions::default()).unwrap());
	assert_eq!(format!("{:?}", keymaps[0]), format!("{:?}", keymaps[1]));
	let chord = KeyChord::parse("Ctrl-z", Platform::Other).unwrap();
	let owners = keymaps.each_ref().map(|k| k.chain(&chord).iter().map(|b| b.owner).collect::<Vec<_>>());
	assert_eq!(owners[0], ["early", "late"]);
	assert_eq!(owners[0], owners[1]);
}
