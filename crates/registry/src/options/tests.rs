use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;

const CLICK: HandlerKey<u32> = HandlerKey::new("onClick");
const SHORTCUTS: CustomHandlerKey<String> = CustomHandlerKey::new("shortcuts");

fn schema() -> OptionsSchema {
	OptionsSchema::builder("probe")
		.static_key("mode", "fast")
		.dynamic_key("level", 1)
		.dynamic_key("ratio", 0.5)
		.dynamic_key("anything", OptionValue::Null)
		.handler_key(&CLICK)
		.custom_handler_key(&SHORTCUTS)
		.build()
}

fn partial(entries: &[(&str, OptionValue)]) -> PartialOptions {
	entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn defaults_fill_unspecified_slots() {
	let options = Options::new(schema(), partial(&[("level", 3.into())])).unwrap();
	assert_eq!(options.get_as::<i64>("level"), Some(3));
	assert_eq!(options.get_as::<String>("mode").as_deref(), Some("fast"));
	assert_eq!(options.get_as::<f64>("ratio"), Some(0.5));
	assert_eq!(options.get("exclude"), Some(OptionValue::Map(Default::default())));
}

#[rstest]
#[case("nope", OptionValue::Bool(true), "UnknownKey")]
#[case("level", OptionValue::from("high"), "TypeMismatch")]
#[case("onClick", OptionValue::Null, "Misclassified")]
#[case("shortcuts", OptionValue::Null, "Misclassified")]
fn construction_rejects(#[case] key: &str, #[case] value: OptionValue, #[case] expected: &str) {
	let err = Options::new(schema(), partial(&[(key, value)])).unwrap_err();
	let variant = format!("{err:?}");
	assert!(variant.starts_with(expected), "{variant}");
}

#[test]
fn duplicate_declaration_fails_at_construction() {
	let schema = OptionsSchema::builder("dup").dynamic_key("a", 1).static_key("a", 2).build();
	assert_eq!(
		Options::defaults(schema).unwrap_err(),
		OptionsError::DuplicateKey {
			extension: "dup",
			key: "a".into()
		}
	);
}

#[test]
fn float_slot_accepts_integers() {
	let options = Options::new(schema(), partial(&[("ratio", 2.into())])).unwrap();
	assert_eq!(options.get_as::<f64>("ratio"), Some(2.0));
}

#[test]
fn update_reports_every_key_with_changed_flag() {
	let options = Options::defaults(schema()).unwrap();
	let diff = options
		.update(&partial(&[("level", 1.into()), ("ratio", 0.75.into())]))
		.unwrap();
	assert_eq!(diff.len(), 2);
	assert!(!diff.changed("level"));
	assert!(diff.changed("ratio"));
	let change = diff.get("ratio").unwrap();
	assert_eq!(change.previous, OptionValue::Float(0.5));
	assert_eq!(change.value, OptionValue::Float(0.75));
	assert_eq!(options.get_as::<f64>("ratio"), Some(0.75));
}

/// A failing key rejects the whole batch.
#[test]
fn update_is_atomic() {
	let options = Options::defaults(schema()).unwrap();
	let err = options
		.update(&partial(&[("level", 9.into()), ("mode", "slow".into())]))
		.unwrap_err();
	assert_eq!(
		err,
		OptionsError::StaticMutation {
			extension: "probe",
			key: "mode".into()
		}
	);
	assert_eq!(options.get_as::<i64>("level"), Some(1));
}

#[test]
fn revision_moves_only_on_change() {
	let options = Options::defaults(schema()).unwrap();
	options.update(&partial(&[("level", 1.into())])).unwrap();
	assert_eq!(options.revision(), 0);
	options.update(&partial(&[("level", 2.into())])).unwrap();
	assert_eq!(options.revision(), 1);
}

#[test]
fn clones_share_slots() {
	let options = Options::defaults(schema()).unwrap();
	let captured = options.clone();
	options.update(&partial(&[("anything", "x".into())])).unwrap();
	assert_eq!(captured.get_as::<String>("anything").as_deref(), Some("x"));
}

#[test]
fn handlers_run_in_order_until_stopped() {
	let options = Options::defaults(schema()).unwrap();
	let calls = Arc::new(AtomicUsize::new(0));

	let seen = Arc::clone(&calls);
	options
		.add_handler(&CLICK, move |n| {
			seen.fetch_add(*n as usize, Ordering::SeqCst);
			HandlerOutcome::Stop
		})
		.unwrap();
	let seen = Arc::clone(&calls);
	options
		.add_handler(&CLICK, move |_| {
			seen.fetch_add(100, Ordering::SeqCst);
			HandlerOutcome::Continue
		})
		.unwrap();

	assert_eq!(options.dispatch(&CLICK, &2), HandlerOutcome::Stop);
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn disposer_is_idempotent() {
	let options = Options::defaults(schema()).unwrap();
	let first = options.add_handler(&CLICK, |_| HandlerOutcome::Continue).unwrap();
	let _second = options.add_handler(&CLICK, |_| HandlerOutcome::Continue).unwrap();
	assert_eq!(options.handler_count(&CLICK), 2);

	first.dispose();
	first.dispose();
	assert!(first.is_disposed());
	assert_eq!(options.handler_count(&CLICK), 1);
}

#[test]
fn undeclared_handler_slot_is_rejected() {
	const OTHER: HandlerKey<u32> = HandlerKey::new("onOther");
	let options = Options::defaults(schema()).unwrap();
	assert!(matches!(
		options.add_handler(&OTHER, |_| HandlerOutcome::Continue),
		Err(OptionsError::UnknownKey { .. })
	));
}

#[test]
fn custom_handlers_bump_revision() {
	let options = Options::defaults(schema()).unwrap();
	let disposer = options.add_custom_handler(&SHORTCUTS, "Mod-k".to_string()).unwrap();
	assert_eq!(options.revision(), 1);
	let values: Vec<String> = options.custom_handlers(&SHORTCUTS).iter().map(|v| (**v).clone()).collect();
	assert_eq!(values, vec!["Mod-k".to_string()]);

	disposer.dispose();
	disposer.dispose();
	assert_eq!(options.revision(), 2);
	assert!(options.custom_handlers(&SHORTCUTS).is_empty());
}

#[test]
fn option_values_deserialize_untagged() {
	let value: OptionValue = serde_json::from_str(r#"[1, 2.5, "x", true, null]"#).unwrap();
	assert_eq!(
		value,
		OptionValue::List(vec![
			OptionValue::Int(1),
			OptionValue::Float(2.5),
			OptionValue::String("x".into()),
			OptionValue::Bool(true),
			OptionValue::Null,
		])
	);
}
