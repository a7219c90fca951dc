//! Content expressions.
//!
//! A content expression describes which child sequences a node accepts:
//!
//! ```text
//! expr   = term*
//! term   = atom quant?
//! atom   = name | "(" name ("|" name)* ")"
//! quant  = "*" | "+" | "?"
//! ```
//!
//! Names refer either to a node type or to a group. Groups expand to every node
//! type that lists them, in schema order.

use crate::error::SchemaError;

/// One parsed but unresolved term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawTerm {
	pub names: Vec<String>,
	pub min: usize,
	pub max: Option<usize>,
}

/// A resolved term: the concrete node types it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Term {
	pub choices: Vec<String>,
	pub min: usize,
	pub max: Option<usize>,
	/// First choice that can be created without arguments, used to fill required content.
	pub default: Option<String>,
}

impl Term {
	fn accepts(&self, name: &str) -> bool {
		self.choices.iter().any(|c| c == name)
	}
}

/// A compiled content expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentExpr {
	pub(crate) terms: Vec<Term>,
}

impl ContentExpr {
	/// Expression accepting nothing (leaf nodes).
	pub fn empty() -> Self {
		Self::default()
	}

	/// Returns true when no child is accepted.
	pub fn is_leaf(&self) -> bool {
		self.terms.is_empty()
	}

	/// Returns every node type name this expression can contain.
	pub fn choices(&self) -> impl Iterator<Item = &str> {
		self.terms
			.iter()
			.flat_map(|t| t.choices.iter().map(String::as_str))
	}

	/// Checks whether a sequence of child type names satisfies this expression.
	pub fn matches(&self, types: &[&str]) -> bool {
		self.match_from(0, types)
	}

	fn match_from(&self, t: usize, types: &[&str]) -> bool {
		let Some(term) = self.terms.get(t) else {
			return types.is_empty();
		};
		let mut run = 0;
		while run < types.len() && term.max.is_none_or(|m| run < m) && term.accepts(types[run]) {
			run += 1;
		}
		if run < term.min {
			return false;
		}
		(term.min..=run)
			.rev()
			.any(|k| self.match_from(t + 1, &types[k..]))
	}

	/// Returns the child types required to make an empty node valid.
	///
	/// Returns `None` when a required term has no creatable default.
	pub fn fill(&self) -> Option<Vec<String>> {
		let mut out = Vec::new();
		for term in &self.terms {
			if term.min == 0 {
				continue;
			}
			let name = term.default.as_ref()?;
			out.extend(std::iter::repeat_n(name.clone(), term.min));
		}
		Some(out)
	}
}

/// Parses the textual form of a content expression.
pub(crate) fn parse(node: &str, expr: &str) -> Result<Vec<RawTerm>, SchemaError> {
	let err = |reason: &str| SchemaError::InvalidContent {
		node: node.to_string(),
		expr: expr.to_string(),
		reason: reason.to_string(),
	};

	let tokens = tokenize(expr);
	let mut terms = Vec::new();
	let mut i = 0;
	while i < tokens.len() {
		let names = match tokens[i].as_str() {
			"(" => {
				let mut names = Vec::new();
				i += 1;
				loop {
					let Some(tok) = tokens.get(i) else {
						return Err(err("unclosed group"));
					};
					if !is_name(tok) {
						return Err(err("expected a name inside group"));
					}
					names.push(tok.clone());
					i += 1;
					match tokens.get(i).map(String::as_str) {
						Some("|") => i += 1,
						Some(")") => break,
						_ => return Err(err("expected '|' or ')'")),
					}
				}
				names
			}
			tok if is_name(tok) => vec![tok.to_string()],
			_ => return Err(err("unexpected token")),
		};
		i += 1;

		let (min, max) = match tokens.get(i).map(String::as_str) {
			Some("*") => {
				i += 1;
				(0, None)
			}
			Some("+") => {
				i += 1;
				(1, None)
			}
			Some("?") => {
				i += 1;
				(0, Some(1))
			}
			_ => (1, Some(1)),
		};
		terms.push(RawTerm { names, min, max });
	}
	Ok(terms)
}

fn is_name(tok: &str) -> bool {
	tok.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn tokenize(expr: &str) -> Vec<String> {
	let mut tokens = Vec::new();
	let mut word = String::new();
	for ch in expr.chars() {
		if ch.is_alphanumeric() || ch == '_' {
			word.push(ch);
			continue;
		}
		if !word.is_empty() {
			tokens.push(std::mem::take(&mut word));
		}
		if !ch.is_whitespace() {
			tokens.push(ch.to_string());
		}
	}
	if !word.is_empty() {
		tokens.push(word);
	}
	tokens
}
