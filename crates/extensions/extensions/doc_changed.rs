//! Notifies `docChanged` handlers after updates that touched the document.

use quire_primitives::EditorState;
use quire_registry::{
	Extension, HandlerKey, HandlerOutcome, HookError, Options, OptionsError, OptionsSchema, StateUpdate, Store,
};

/// Delivered once per dispatch whose transactions changed the document.
#[derive(Debug, Clone)]
pub struct DocChangedEvent {
	pub previous: EditorState,
	pub state: EditorState,
	/// Number of applied transactions, appended ones included.
	pub transactions: usize,
}

pub const DOC_CHANGED: HandlerKey<DocChangedEvent> = HandlerKey::new("docChanged");

pub struct DocChanged {
	options: Options,
}

impl DocChanged {
	pub fn new() -> Result<Self, OptionsError> {
		let schema = OptionsSchema::builder("docChanged").handler_key(&DOC_CHANGED).build();
		Ok(Self {
			options: Options::defaults(schema)?,
		})
	}
}

impl Extension for DocChanged {
	fn name(&self) -> &'static str {
		"docChanged"
	}

	fn options(&self) -> &Options {
		&self.options
	}

	fn on_state_update(&mut self, update: &StateUpdate, _store: &Store) -> Result<(), HookError> {
		if update.forced || !update.transactions.iter().any(|tr| tr.doc_changed()) {
			return Ok(());
		}
		let event = DocChangedEvent {
			previous: update.previous.clone(),
			state: update.state.clone(),
			transactions: update.transactions.len(),
		};
		if self.options.dispatch(&DOC_CHANGED, &event) == HandlerOutcome::Stop {
			tracing::trace!("docChanged handler stopped propagation");
		}
		Ok(())
	}
}
