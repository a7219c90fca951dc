use rstest::rstest;

use crate::{KeyChord, Modifiers, ParseError, Platform};

#[rstest]
#[case("a", "a")]
#[case("B", "b")]
#[case("Mod-b", "Ctrl-b")]
#[case("mod-shift-B", "Ctrl-Shift-b")]
#[case("Shift-Alt-Meta-Ctrl-x", "Alt-Ctrl-Meta-Shift-x")]
#[case("Cmd-Enter", "Meta-Enter")]
#[case("Control-Option-esc", "Alt-Ctrl-Escape")]
#[case("Ctrl--", "Ctrl--")]
#[case("-", "-")]
#[case("Shift-Space", "Shift-Space")]
#[case("Ctrl- ", "Ctrl-Space")]
#[case("f5", "F5")]
#[case("backspace", "Backspace")]
fn canonical_form(#[case] input: &str, #[case] expected: &str) {
	let chord = KeyChord::parse(input, Platform::Other).unwrap();
	assert_eq!(chord.to_string(), expected);
}

/// `Mod` means Meta on mac and Ctrl elsewhere.
#[rstest]
#[case(Platform::Mac, Modifiers::META)]
#[case(Platform::Other, Modifiers::CTRL)]
fn mod_follows_platform(#[case] platform: Platform, #[case] expected: Modifiers) {
	let chord = KeyChord::parse("Mod-z", platform).unwrap();
	assert_eq!(chord.modifiers(), expected);
	assert_eq!(chord.key(), "z");
}

/// Two spellings of one chord compare equal.
#[test]
fn spellings_collide() {
	let a = KeyChord::parse("Ctrl-Shift-B", Platform::Other).unwrap();
	let b = KeyChord::parse("shift-mod-b", Platform::Other).unwrap();
	assert_eq!(a, b);
}

#[test]
fn event_chords_match_parsed_chords() {
	let parsed = KeyChord::parse("Mod-b", Platform::Other).unwrap();
	let event = KeyChord::new(Modifiers::CTRL, "B").unwrap();
	assert_eq!(parsed, event);
}

#[rstest]
#[case("", ParseError::Empty)]
#[case("   ", ParseError::Empty)]
#[case("Ctrl-", ParseError::MissingKey { position: 5 })]
#[case("Ctrl-Nope", ParseError::UnknownKey { name: "Nope".into(), position: 5 })]
#[case("Shift-shift-a", ParseError::DuplicateModifier { name: "shift".into(), position: 6 })]
#[case("F99", ParseError::UnknownKey { name: "F99".into(), position: 0 })]
fn rejects(#[case] input: &str, #[case] expected: ParseError) {
	assert_eq!(KeyChord::parse(input, Platform::Other).unwrap_err(), expected);
}

#[rstest]
#[case("Mod", Platform::Mac, Some(Modifiers::META))]
#[case("option", Platform::Other, Some(Modifiers::ALT))]
#[case("CONTROL", Platform::Mac, Some(Modifiers::CTRL))]
#[case("hyper", Platform::Other, None)]
fn modifier_names(#[case] name: &str, #[case] platform: Platform, #[case] expected: Option<Modifiers>) {
	assert_eq!(Modifiers::parse_modifier(name, platform), expected);
	assert_eq!(Modifiers::from_name("SHIFT"), Some(Modifiers::SHIFT));
}
