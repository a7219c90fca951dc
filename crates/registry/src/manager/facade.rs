//! Command and helper facades.

use serde_json::Value;

use super::Store;
use crate::error::ManagerError;

/// Runs registered commands by name.
#[derive(Debug, Clone)]
pub struct Commands {
	store: Store,
}

impl Commands {
	pub(super) fn new(store: Store) -> Self {
		Self { store }
	}

	/// Runs a command and dispatches its transaction if it applied.
	pub fn run(&self, name: &str, args: &[Value]) -> Result<bool, ManagerError> {
		self.store.core()?.run_commands([(name, args)], true)
	}

	/// Whether a command would apply, without dispatching.
	pub fn can(&self, name: &str, args: &[Value]) -> Result<bool, ManagerError> {
		self.store.core()?.run_commands([(name, args)], false)
	}

	pub fn is_active(&self, name: &str) -> Result<bool, ManagerError> {
		self.store.core()?.is_active(name)
	}

	pub fn names(&self) -> Result<Vec<&'static str>, ManagerError> {
		Ok(self.store.core()?.composition().commands.keys().copied().collect())
	}
}

/// Several commands applied to one transaction.
///
/// The chain dispatches once, and only if every command applied.
#[derive(Debug, Clone)]
pub struct Chain {
	store: Store,
	steps: Vec<(String, Vec<Value>)>,
}

impl Chain {
	pub(super) fn new(store: Store) -> Self {
		Self {
			store,
			steps: Vec::new(),
		}
	}

	pub fn cmd(mut self, name: impl Into<String>, args: Vec<Value>) -> Self {
		self.steps.push((name.into(), args));
		self
	}

	pub fn run(&self) -> Result<bool, ManagerError> {
		self.execute(true)
	}

	pub fn can(&self) -> Result<bool, ManagerError> {
		self.execute(false)
	}

	fn execute(&self, dispatch: bool) -> Result<bool, ManagerError> {
		let steps = self.steps.iter().map(|(name, args)| (name.as_str(), args.as_slice()));
		self.store.core()?.run_commands(steps, dispatch)
	}
}

/// Calls registered helpers by name.
#[derive(Debug, Clone)]
pub struct Helpers {
	store: Store,
}

impl Helpers {
	pub(super) fn new(store: Store) -> Self {
		Self { store }
	}

	pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, ManagerError> {
		self.store.core()?.call_helper(name, args)
	}

	pub fn names(&self) -> Result<Vec<&'static str>, ManagerError> {
		Ok(self.store.core()?.composition().helpers.keys().copied().collect())
	}
}
