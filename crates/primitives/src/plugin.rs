//! State plugins: transaction filters and appenders.

use std::fmt;
use std::sync::Arc;

use crate::state::EditorState;
use crate::transaction::Transaction;

/// Decides whether a transaction may be applied.
pub type FilterFn = Arc<dyn Fn(&Transaction, &EditorState) -> bool + Send + Sync>;

/// Produces a follow-up transaction after others were applied.
///
/// Receives the transactions not yet seen by this plugin, the state before
/// them and the state after them. A returned transaction must be created from
/// the new state.
pub type AppendFn =
	Arc<dyn Fn(&[Transaction], &EditorState, &EditorState) -> Option<Transaction> + Send + Sync>;

/// A keyed state plugin.
#[derive(Clone)]
pub struct Plugin {
	key: Arc<str>,
	filter: Option<FilterFn>,
	append: Option<AppendFn>,
}

impl fmt::Debug for Plugin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Plugin")
			.field("key", &self.key)
			.field("filter", &self.filter.is_some())
			.field("append", &self.append.is_some())
			.finish()
	}
}

impl Plugin {
	/// Plugin with the given unique key and no behavior.
	pub fn new(key: impl Into<Arc<str>>) -> Self {
		Self {
			key: key.into(),
			filter: None,
			append: None,
		}
	}

	/// Sets the transaction filter.
	pub fn with_filter<F>(mut self, f: F) -> Self
	where
		F: Fn(&Transaction, &EditorState) -> bool + Send + Sync + 'static,
	{
		self.filter = Some(Arc::new(f));
		self
	}

	/// Sets the transaction appender.
	pub fn with_append<F>(mut self, f: F) -> Self
	where
		F: Fn(&[Transaction], &EditorState, &EditorState) -> Option<Transaction> + Send + Sync + 'static,
	{
		self.append = Some(Arc::new(f));
		self
	}

	/// Unique key.
	pub fn key(&self) -> &str {
		&self.key
	}

	pub(crate) fn filter(&self) -> Option<&FilterFn> {
		self.filter.as_ref()
	}

	pub(crate) fn append(&self) -> Option<&AppendFn> {
		self.append.as_ref()
	}
}
