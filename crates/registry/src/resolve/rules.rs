//! Applying input and paste rules.

use quire_primitives::{DocError, EditorState, Mark, Node, Schema, Transaction};

use super::{CompiledInputRule, CompiledPasteRule};
use crate::extension::InputRuleProps;

/// Placeholder for inline leaves in the text a rule is matched against.
const LEAF_CHAR: char = '\u{fffc}';
/// How much of the textblock before the cursor input rules look at.
const MAX_MATCH_CHARS: usize = 500;

/// Runs input rules for `text` typed over `from..to`.
///
/// Returns the transaction of the first rule that applied. Rules only run in
/// textblocks and when nothing is selected.
pub(crate) fn run_input_rules(
	rules: &[CompiledInputRule],
	state: &EditorState,
	from: usize,
	to: usize,
	text: &str,
) -> Result<Option<Transaction>, DocError> {
	if rules.is_empty() || from != to {
		return Ok(None);
	}
	let rp = state.doc().resolve(from)?;
	if !rp.parent().is_textblock() {
		return Ok(None);
	}
	let before = text_before(rp.parent(), rp.parent_offset());
	let before_chars = before.chars().count();
	let full = format!("{before}{text}");

	for rule in rules {
		let Some(caps) = rule.regex.captures(&full) else {
			continue;
		};
		let Some(whole) = caps.get(0) else {
			continue;
		};
		if whole.end() != full.len() {
			continue;
		}
		let start_chars = full[..whole.start()].chars().count().min(before_chars);
		let captures: Vec<Option<String>> = caps.iter().map(|m| m.map(|m| m.as_str().to_string())).collect();
		let mut tr = state.tr();
		let mut props = InputRuleProps {
			tr: &mut tr,
			captures: &captures,
			from: from - (before_chars - start_chars),
			to: from,
			text,
		};
		match (rule.handler)(&mut props) {
			Ok(true) => {
				tracing::debug!(extension = rule.owner, pattern = rule.regex.as_str(), "input rule applied");
				return Ok(Some(tr));
			}
			Ok(false) => {}
			Err(err) => {
				tracing::debug!(extension = rule.owner, error = %err, "input rule failed");
			}
		}
	}
	Ok(None)
}

/// Text of `parent` up to `offset`, trimmed to the last [`MAX_MATCH_CHARS`] characters.
fn text_before(parent: &Node, offset: usize) -> String {
	let mut out = String::new();
	let mut pos = 0;
	for child in parent.content() {
		if pos >= offset {
			break;
		}
		let take = (offset - pos).min(child.node_size());
		match child.text() {
			Some(text) => out.extend(text.chars().take(take)),
			None => out.push(LEAF_CHAR),
		}
		pos += child.node_size();
	}
	let count = out.chars().count();
	if count > MAX_MATCH_CHARS {
		out.chars().skip(count - MAX_MATCH_CHARS).collect()
	} else {
		out
	}
}

/// Splits pasted `text` into text nodes, marking every paste rule match.
///
/// Returns the nodes and whether any rule matched. Rules run in priority
/// order; text already carrying a rule's mark is not matched again by it.
pub(crate) fn apply_paste_rules(
	rules: &[CompiledPasteRule],
	schema: &Schema,
	text: &str,
	marks: Vec<Mark>,
) -> Result<(Vec<Node>, bool), DocError> {
	let mut segments = vec![(text.to_string(), marks)];
	let mut matched = false;

	for rule in rules {
		let mut next = Vec::with_capacity(segments.len());
		for (segment, marks) in segments {
			if marks.iter().any(|m| m.kind() == rule.mark) {
				next.push((segment, marks));
				continue;
			}
			let mut last = 0;
			for caps in rule.regex.captures_iter(&segment) {
				let Some(whole) = caps.get(0) else {
					continue;
				};
				if whole.as_str().is_empty() {
					continue;
				}
				let kept = caps.get(1).unwrap_or(whole);
				let captures: Vec<Option<String>> =
					caps.iter().map(|m| m.map(|m| m.as_str().to_string())).collect();
				let attrs = rule.attrs.as_ref().and_then(|f| f(&captures));
				let mark = schema.mark(rule.mark, attrs)?;
				next.push((segment[last..whole.start()].to_string(), marks.clone()));
				next.push((kept.as_str().to_string(), schema.add_mark_to_set(&marks, mark)?));
				last = whole.end();
				matched = true;
			}
			next.push((segment[last..].to_string(), marks));
		}
		segments = next;
	}

	let mut nodes = Vec::new();
	for (segment, marks) in segments {
		if !segment.is_empty() {
			nodes.push(schema.text(segment, marks)?);
		}
	}
	Ok((nodes, matched))
}
