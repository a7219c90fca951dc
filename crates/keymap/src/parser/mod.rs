//! Recursive descent parser for key chords.
//!
//! ```text
//! chord     = (modifier "-")* key
//! modifier  = "Mod" | "Cmd" | "Meta" | "Ctrl" | "Control" | "Alt" | "Option" | "Shift"
//! key       = named-key | char
//! named-key = alnum alnum+
//! char      = any single character, including "-"
//! ```
//!
//! Modifier names are case-insensitive. `Mod` resolves through the platform.

use crate::chord::{KeyChord, normalize_key};
use crate::modifiers::{Modifiers, Platform};

#[cfg(test)]
mod tests;

/// Errors raised while parsing a chord.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
	/// The input was empty or whitespace.
	#[error("empty key chord")]
	Empty,
	/// Modifiers were not followed by a key.
	#[error("expected a key at position {position}")]
	MissingKey { position: usize },
	/// The key name is not known.
	#[error("unknown key {name:?} at position {position}")]
	UnknownKey { name: String, position: usize },
	/// The same modifier was given twice.
	#[error("modifier {name:?} repeated at position {position}")]
	DuplicateModifier { name: String, position: usize },
}

/// Parser state: remaining input and byte position.
struct Parser<'a> {
	input: &'a str,
	position: usize,
}

impl<'a> Parser<'a> {
	fn new(input: &'a str) -> Self {
		Self { input, position: 0 }
	}

	fn peek(&self) -> Option<char> {
		self.input.chars().next()
	}

	fn next(&mut self) -> Option<char> {
		let ch = self.peek()?;
		self.position += ch.len_utf8();
		self.input = &self.input[ch.len_utf8()..];
		Some(ch)
	}

	fn is_end(&self) -> bool {
		self.input.is_empty()
	}

	/// Runs `f`, restoring the parser when it yields nothing.
	fn try_parse<T, F>(&mut self, f: F) -> Option<T>
	where
		F: FnOnce(&mut Parser<'a>) -> Option<T>,
	{
		let snapshot = (self.input, self.position);
		let result = f(self);
		if result.is_none() {
			(self.input, self.position) = snapshot;
		}
		result
	}

	fn take_while<F>(&mut self, predicate: F) -> &'a str
	where
		F: Fn(char) -> bool,
	{
		let len = self
			.input
			.char_indices()
			.find(|&(_, ch)| !predicate(ch))
			.map_or(self.input.len(), |(i, _)| i);
		let (taken, rest) = self.input.split_at(len);
		self.input = rest;
		self.position += len;
		taken
	}
}

/// Parses a chord, resolving `Mod` for `platform`.
pub(crate) fn parse(text: &str, platform: Platform) -> Result<KeyChord, ParseError> {
	if text.trim().is_empty() {
		return Err(ParseError::Empty);
	}
	let mut parser = Parser::new(text);
	let mut modifiers = Modifiers::empty();

	while let Some((modifier, name, position)) = try_parse_modifier(&mut parser, platform) {
		if modifiers.contains(modifier) {
			return Err(ParseError::DuplicateModifier {
				name: name.to_string(),
				position,
			});
		}
		modifiers |= modifier;
	}

	let key = parse_key(&mut parser)?;
	Ok(KeyChord::from_parts(modifiers, key))
}

/// Parses `modifier "-"`, leaving the parser untouched when absent.
fn try_parse_modifier<'a>(
	parser: &mut Parser<'a>,
	platform: Platform,
) -> Option<(Modifiers, &'a str, usize)> {
	parser.try_parse(|p| {
		let position = p.position;
		let name = p.take_while(|ch| ch.is_ascii_alphabetic());
		let modifier = Modifiers::parse_modifier(name, platform)?;
		if p.next() != Some('-') {
			return None;
		}
		Some((modifier, name, position))
	})
}

fn parse_key(parser: &mut Parser) -> Result<String, ParseError> {
	let position = parser.position;
	if parser.is_end() {
		return Err(ParseError::MissingKey { position });
	}
	let rest = parser.take_while(|_| true);
	normalize_key(rest).ok_or_else(|| ParseError::UnknownKey {
		name: rest.to_string(),
		position,
	})
}
