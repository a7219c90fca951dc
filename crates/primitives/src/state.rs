//! Immutable editor state.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::error::DocError;
use crate::mark::Mark;
use crate::node::Node;
use crate::plugin::Plugin;
use crate::schema::Schema;
use crate::selection::Selection;
use crate::transaction::Transaction;

/// Upper bound on append rounds before the remaining appenders are skipped.
const MAX_APPEND_ROUNDS: usize = 64;

/// Inputs for [`EditorState::create`].
#[derive(Debug, Clone)]
pub struct StateConfig {
	pub schema: Arc<Schema>,
	/// Starting document; defaults to an empty, filled top node.
	pub doc: Option<Node>,
	/// Starting selection; defaults to the first cursor position.
	pub selection: Option<Selection>,
	pub stored_marks: Option<Vec<Mark>>,
	pub plugins: Vec<Plugin>,
}

impl StateConfig {
	/// Config with only a schema.
	pub fn new(schema: Arc<Schema>) -> Self {
		Self {
			schema,
			doc: None,
			selection: None,
			stored_marks: None,
			plugins: Vec::new(),
		}
	}
}

/// Result of [`EditorState::apply_transaction`].
#[derive(Debug, Clone)]
pub struct Applied {
	/// The resulting state.
	pub state: EditorState,
	/// Every applied transaction, the root first. Empty if the root was filtered.
	pub transactions: Vec<Transaction>,
}

/// Document, selection and plugins at one point in time.
#[derive(Debug, Clone)]
pub struct EditorState {
	schema: Arc<Schema>,
	doc: Node,
	selection: Selection,
	stored_marks: Option<Vec<Mark>>,
	plugins: Arc<[Plugin]>,
}

impl EditorState {
	/// Creates a state.
	pub fn create(config: StateConfig) -> Result<Self, DocError> {
		let doc = match config.doc {
			Some(doc) => doc,
			None => config.schema.create_and_fill(config.schema.top_node(), None)?,
		};
		let selection = match config.selection {
			Some(sel) => sel.clamp(&doc),
			None => Selection::at_start(&doc),
		};
		Ok(Self {
			schema: config.schema,
			doc,
			selection,
			stored_marks: config.stored_marks,
			plugins: config.plugins.into(),
		})
	}

	/// Creates a state from the JSON produced by [`EditorState::to_json`], or from a bare document.
	pub fn from_json(schema: Arc<Schema>, json: &Value, plugins: Vec<Plugin>) -> Result<Self, DocError> {
		let (doc_json, selection) = match json.get("doc") {
			Some(doc) => {
				let selection = match json.get("selection") {
					Some(sel) => Some(
						serde_json::from_value::<Selection>(sel.clone())
							.map_err(|e| DocError::InvalidJson(e.to_string()))?,
					),
					None => None,
				};
				(doc, selection)
			}
			None => (json, None),
		};
		let doc = Node::from_json(&schema, doc_json)?;
		Self::create(StateConfig {
			schema,
			doc: Some(doc),
			selection,
			stored_marks: None,
			plugins,
		})
	}

	/// Serializes document and selection.
	pub fn to_json(&self) -> Value {
		json!({
			"doc": self.doc.to_json(),
			"selection": serde_json::to_value(self.selection).unwrap_or(Value::Null),
		})
	}

	pub fn schema(&self) -> &Arc<Schema> {
		&self.schema
	}

	pub fn doc(&self) -> &Node {
		&self.doc
	}

	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	pub fn stored_marks(&self) -> Option<&[Mark]> {
		self.stored_marks.as_deref()
	}

	pub fn plugins(&self) -> &[Plugin] {
		&self.plugins
	}

	/// Looks up a plugin by key.
	pub fn plugin(&self, key: &str) -> Option<&Plugin> {
		self.plugins.iter().find(|p| p.key() == key)
	}

	/// Starts a transaction from this state.
	pub fn tr(&self) -> Transaction {
		Transaction::new(self)
	}

	/// Applies a transaction, returning only the resulting state.
	pub fn apply(&self, tr: Transaction) -> Result<EditorState, DocError> {
		Ok(self.apply_transaction(tr)?.state)
	}

	/// Applies a transaction through plugin filters and appenders.
	pub fn apply_transaction(&self, root: Transaction) -> Result<Applied, DocError> {
		if !self.filter_transaction(&root, None) {
			tracing::debug!("transaction rejected by plugin filter");
			return Ok(Applied {
				state: self.clone(),
				transactions: Vec::new(),
			});
		}
		let mut state = self.apply_inner(&root)?;
		let mut trs = vec![root];
		// Per plugin: how many transactions it has seen and the state it saw last.
		let mut seen: Option<Vec<(usize, EditorState)>> = None;

		for _ in 0..MAX_APPEND_ROUNDS {
			let mut have_new = false;
			for (i, plugin) in self.plugins.iter().enumerate() {
				let Some(append) = plugin.append() else {
					continue;
				};
				let (n, old_state) = match &seen {
					Some(s) => (s[i].0, s[i].1.clone()),
					None => (0, self.clone()),
				};
				if n < trs.len()
					&& let Some(mut tr) = append(&trs[n..], &old_state, &state)
					&& state.filter_transaction(&tr, Some(i))
				{
					tr.set_meta("appendedTransaction", true);
					let seen = seen.get_or_insert_with(|| {
						self.plugins.iter().map(|_| (0, self.clone())).collect()
					});
					state = state.apply_inner(&tr)?;
					trs.push(tr);
					seen[i] = (trs.len(), state.clone());
					have_new = true;
				} else if let Some(seen) = &mut seen {
					seen[i] = (trs.len(), state.clone());
				}
			}
			if !have_new {
				return Ok(Applied {
					state,
					transactions: trs,
				});
			}
		}
		tracing::warn!(
			rounds = MAX_APPEND_ROUNDS,
			"plugin appenders kept producing transactions; stopping"
		);
		Ok(Applied {
			state,
			transactions: trs,
		})
	}

	fn filter_transaction(&self, tr: &Transaction, ignore: Option<usize>) -> bool {
		self.plugins
			.iter()
			.enumerate()
			.filter(|(i, _)| Some(*i) != ignore)
			.filter_map(|(_, p)| p.filter())
			.all(|f| f(tr, self))
	}

	fn apply_inner(&self, tr: &Transaction) -> Result<EditorState, DocError> {
		if tr.before() != &self.doc {
			return Err(DocError::StaleTransaction);
		}
		let stored_marks = if tr.stored_marks_set() {
			tr.stored_marks().map(<[Mark]>::to_vec)
		} else if tr.doc_changed() {
			None
		} else {
			self.stored_marks.clone()
		};
		Ok(Self {
			schema: Arc::clone(&self.schema),
			doc: tr.doc().clone(),
			selection: tr.selection().clamp(tr.doc()),
			stored_marks,
			plugins: Arc::clone(&self.plugins),
		})
	}

	/// Moves the document to a new schema and plugin set.
	///
	/// Marks the new schema does not know are dropped; node types must still exist.
	pub fn reconfigure(&self, schema: Arc<Schema>, plugins: Vec<Plugin>) -> Result<EditorState, DocError> {
		let doc = Node::from_json_lenient(&schema, &self.doc.to_json())?;
		let selection = self.selection.clamp(&doc);
		let stored_marks = self.stored_marks.as_ref().map(|marks| {
			marks
				.iter()
				.filter(|m| schema.mark_type(m.kind()).is_some())
				.cloned()
				.collect()
		});
		Ok(Self {
			schema,
			doc,
			selection,
			stored_marks,
			plugins: plugins.into(),
		})
	}
}
