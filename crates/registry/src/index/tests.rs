use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use super::*;
use crate::extension::{Extension, ExtensionInput, extension_ref};
use crate::options::{OptionsSchema, PartialOptions};
use crate::test_fixtures::{Probe, TestMark, TestNode, log};

fn names(index: &FlatIndex) -> Vec<&'static str> {
	index.entries().iter().map(|e| e.name).collect()
}

fn build(inputs: Vec<ExtensionInput>) -> Result<FlatIndex, ConfigError> {
	FlatIndex::build(&inputs, &BTreeMap::new())
}

#[test]
fn sorts_by_priority_keeping_input_order_for_ties() {
	let log = log();
	let index = build(vec![
		Probe::new("a", &log).into(),
		Probe::new("b", &log).priority(Priority::HIGH).into(),
		Probe::new("c", &log).into(),
		Probe::new("d", &log).priority(Priority::LOWEST).into(),
		Probe::new("e", &log).priority(Priority::CRITICAL).into(),
	])
	.unwrap();
	assert_eq!(names(&index), ["e", "b", "a", "c", "d"]);
}

#[test]
fn input_priority_beats_settings_which_beat_defaults() {
	let log = log();
	let mut settings = BTreeMap::new();
	settings.insert("a".to_string(), Priority::LOW);
	settings.insert("b".to_string(), Priority::LOW);
	let inputs = vec![
		ExtensionInput::from(Probe::new("a", &log)),
		ExtensionInput::from(Probe::new("b", &log)).with_priority(Priority::HIGHEST),
		ExtensionInput::from(Probe::new("c", &log)),
	];
	let index = FlatIndex::build(&inputs, &settings).unwrap();
	assert_eq!(names(&index), ["b", "c", "a"]);
	assert_eq!(index.get("a").map(|e| e.priority), Some(Priority::LOW));
	assert_eq!(index.get("b").map(|e| e.priority), Some(Priority::HIGHEST));
}

#[test]
fn children_follow_their_parent() {
	let log = log();
	let grandchild = extension_ref(Probe::new("grandchild", &log));
	let child = extension_ref(Probe::new("child", &log).child(grandchild));
	let index = build(vec![
		Probe::new("parent", &log).child(child).into(),
		Probe::new("sibling", &log).into(),
	])
	.unwrap();

	assert_eq!(names(&index), ["parent", "child", "grandchild", "sibling"]);
	assert_eq!(index.get("grandchild").and_then(|e| e.parent), Some("child"));
	assert!(index.related("parent", "grandchild"));
	assert!(index.related("grandchild", "parent"));
	assert!(!index.related("sibling", "child"));
}

#[test]
fn child_priority_is_not_inherited() {
	let log = log();
	let child = extension_ref(Probe::new("child", &log));
	let inputs = vec![
		ExtensionInput::from(Probe::new("other", &log)),
		ExtensionInput::from(Probe::new("parent", &log).child(child)).with_priority(Priority::HIGH),
	];
	let index = FlatIndex::build(&inputs, &BTreeMap::new()).unwrap();
	assert_eq!(names(&index), ["parent", "other", "child"]);
}

#[test]
fn self_referencing_extension_is_expanded_once() {
	let log = log();
	let typed = Arc::new(Mutex::new(Probe::new("loop", &log)));
	let erased: ExtensionRef = typed.clone();
	typed.lock().push_child(Arc::clone(&erased));

	let index = build(vec![ExtensionInput::new(erased)]).unwrap();
	assert_eq!(names(&index), ["loop"]);
}

#[test]
fn same_instance_twice_keeps_the_last_position() {
	let log = log();
	let shared = extension_ref(Probe::new("shared", &log));
	let index = build(vec![
		ExtensionInput::new(Arc::clone(&shared)),
		Probe::new("middle", &log).into(),
		ExtensionInput::new(Arc::clone(&shared)),
	])
	.unwrap();
	assert_eq!(names(&index), ["middle", "shared"]);
}

#[test]
fn equal_copies_are_deduplicated() {
	let log = log();
	let index = build(vec![
		TestMark::new("bold").into(),
		Probe::new("x", &log).into(),
		TestMark::new("bold").into(),
	])
	.unwrap();
	assert_eq!(names(&index), ["x", "bold"]);
}

#[test]
fn copies_with_different_options_conflict() {
	let log = log();
	let schema = || OptionsSchema::builder("p").dynamic_key("level", 1).build();
	let first = Probe::new("p", &log).options(schema());
	let second = Probe::new("p", &log).options(schema());
	let mut partial = PartialOptions::new();
	partial.insert("level".into(), 2.into());
	Extension::options(&second).update(&partial).unwrap();

	let err = build(vec![first.into(), second.into()]).unwrap_err();
	assert!(matches!(err, ConfigError::DuplicateExtension { name: "p" }), "{err:?}");
}

#[test]
fn different_types_with_one_name_conflict() {
	let log = log();
	let err = build(vec![TestMark::new("same").into(), Probe::new("same", &log).into()]).unwrap_err();
	assert!(matches!(err, ConfigError::DuplicateExtension { name: "same" }));
}

#[test]
fn missing_requirement_is_reported() {
	let log = log();
	let err = build(vec![Probe::new("history", &log).requires("doc").into()]).unwrap_err();
	assert!(
		matches!(err, ConfigError::MissingDependency { extension: "history", requires: "doc" }),
		"{err:?}"
	);

	let ok = build(vec![
		Probe::new("history", &log).requires("doc").into(),
		TestNode::doc().into(),
	]);
	assert!(ok.is_ok());
}

#[test]
fn lookups_by_tag_and_variant() {
	let log = log();
	let index = build(vec![
		TestNode::doc().into(),
		TestNode::paragraph().into(),
		TestNode::text().into(),
		TestMark::new("bold").priority(Priority::HIGH).into(),
		Probe::new("plain", &log).into(),
	])
	.unwrap();

	let marks: Vec<_> = index.of_variant(ExtensionVariant::Mark).map(|e| e.name).collect();
	assert_eq!(marks, ["bold"]);
	let nodes: Vec<_> = index.of_variant(ExtensionVariant::Node).map(|e| e.name).collect();
	assert_eq!(nodes, ["doc", "paragraph", "text"]);
	let blocks: Vec<_> = index.tagged(&ExtensionTag::DEFAULT_BLOCK).map(|e| e.name).collect();
	assert_eq!(blocks, ["paragraph"]);
	assert_eq!(index.tagged(&ExtensionTag::new("alignable")).count(), 0);
	assert!(index.contains("plain"));
	assert!(!index.contains("missing"));
	assert_eq!(index.len(), 5);
}
