use std::sync::{Arc, Weak};

use quire_keymap::Platform;
use quire_primitives::{EditorState, Schema, Transaction};

use super::{Chain, Commands, Core, EditorView, Helpers, Phase};
use crate::error::{ManagerError, UsageError};
use crate::options::Options;

/// Handle extensions use to reach the manager.
///
/// Holds the manager weakly; every call fails with [`UsageError::Destroyed`]
/// once the manager is gone.
#[derive(Clone)]
pub struct Store {
	core: Weak<Core>,
}

impl std::fmt::Debug for Store {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Store").field("alive", &(self.core.strong_count() > 0)).finish()
	}
}

impl Store {
	pub(crate) fn new(core: Weak<Core>) -> Self {
		Self { core }
	}

	pub(crate) fn core(&self) -> Result<Arc<Core>, UsageError> {
		self.core.upgrade().ok_or(UsageError::Destroyed)
	}

	pub fn phase(&self) -> Phase {
		self.core.upgrade().map_or(Phase::Destroyed, |core| core.phase())
	}

	pub fn platform(&self) -> Result<Platform, UsageError> {
		Ok(self.core()?.settings.platform)
	}

	pub fn schema(&self) -> Result<Arc<Schema>, UsageError> {
		Ok(Arc::clone(&self.core()?.composition().schema))
	}

	/// Current state; fails before a view is attached.
	pub fn state(&self) -> Result<EditorState, ManagerError> {
		self.core()?.current_state("state")
	}

	pub fn previous_state(&self) -> Result<Option<EditorState>, ManagerError> {
		self.core()?.previous_state()
	}

	/// A fresh transaction on the current state.
	pub fn tr(&self) -> Result<Transaction, ManagerError> {
		Ok(self.state()?.tr())
	}

	pub fn dispatch(&self, tr: Transaction) -> Result<(), ManagerError> {
		self.core()?.dispatch(tr)
	}

	pub fn commands(&self) -> Commands {
		Commands::new(self.clone())
	}

	pub fn chain(&self) -> Chain {
		Chain::new(self.clone())
	}

	pub fn helpers(&self) -> Helpers {
		Helpers::new(self.clone())
	}

	pub fn with_view<R>(&self, f: impl FnOnce(&mut dyn EditorView) -> R) -> Result<R, ManagerError> {
		self.core()?.with_view(f)
	}

	pub fn has_extension(&self, name: &str) -> bool {
		self.core
			.upgrade()
			.is_some_and(|core| core.composition().index.contains(name))
	}

	/// Options of another extension, shared with it.
	pub fn extension_options(&self, name: &str) -> Result<Options, UsageError> {
		self.core()?
			.composition()
			.index
			.get(name)
			.map(|entry| entry.options.clone())
			.ok_or_else(|| UsageError::UnknownExtension(name.to_string()))
	}
}
