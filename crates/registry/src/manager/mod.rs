//! The manager owns a composition and drives its lifecycle.
//!
//! ```text
//! Uninitialized ─create─► Created ─attach_view─► ViewAttached ─dispatch─► Active
//!                            │                         │                   │
//!                            └─────────────────────────┴──────destroy──────┴─► Destroyed
//! ```
//!
//! Hooks run in priority order (`on_destroy` in reverse). A failing hook
//! aborts its phase and leaves the manager unusable. Lifecycle-driving calls
//! made while another one is running (for example dispatching from inside
//! `on_state_update`) fail with [`UsageError::Reentrant`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use quire_keymap::KeyChord;
use quire_primitives::{EditorState, Schema, StateConfig, Transaction};
use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::core::{ExtensionTag, Priority};
use crate::error::{HookError, HookFailure, HookPhase, ManagerError, UsageError};
use crate::extension::{self, AsAny, CommandProps, Extension, ExtensionInput, HelperProps, Reconfigure, StateUpdate};
use crate::index::ExtensionEntry;
use crate::options::{Disposer, OptionsDiff, PartialOptions};
use crate::resolve::keymap::{ResolvedKeymap, build_keymap, fingerprint};
use crate::resolve::rules::{apply_paste_rules, run_input_rules};
use crate::resolve::{Composition, compose};

mod facade;
mod settings;
mod store;
mod view;

#[cfg(test)]
mod tests;

pub use facade::{Chain, Commands, Helpers};
pub use settings::{Exclusions, ManagerSettings};
pub use store::Store;
pub use view::EditorView;

/// Lifecycle phase of a [`Manager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
	Uninitialized,
	Created,
	ViewAttached,
	/// Entered on the first dispatched transaction.
	Active,
	Destroyed,
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Uninitialized => "uninitialized",
			Self::Created => "created",
			Self::ViewAttached => "view-attached",
			Self::Active => "active",
			Self::Destroyed => "destroyed",
		})
	}
}

type Subscriber = Arc<dyn Fn(&StateUpdate) + Send + Sync>;

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

pub(crate) struct Core {
	this: Weak<Core>,
	settings: ManagerSettings,
	composition: ArcSwap<Composition>,
	keymap: ArcSwap<ResolvedKeymap>,
	phase: RwLock<Phase>,
	state: RwLock<Option<EditorState>>,
	previous: RwLock<Option<EditorState>>,
	view: Mutex<Option<Box<dyn EditorView>>>,
	busy: AtomicBool,
	failed: AtomicBool,
	subscribers: Mutex<Vec<(u64, Subscriber)>>,
	next_subscriber: AtomicU64,
	generation: AtomicU64,
}

impl Core {
	fn store(&self) -> Store {
		Store::new(self.this.clone())
	}

	pub(crate) fn phase(&self) -> Phase {
		*self.phase.read()
	}

	fn set_phase(&self, phase: Phase) {
		let previous = std::mem::replace(&mut *self.phase.write(), phase);
		tracing::debug!(from = %previous, to = %phase, "manager phase");
	}

	fn enter(&self, operation: &'static str) -> Result<BusyGuard<'_>, UsageError> {
		if self.busy.swap(true, Ordering::AcqRel) {
			return Err(UsageError::Reentrant(operation));
		}
		Ok(BusyGuard(&self.busy))
	}

	pub(crate) fn ensure_usable(&self) -> Result<(), UsageError> {
		if self.phase() == Phase::Destroyed {
			return Err(UsageError::Destroyed);
		}
		if self.failed.load(Ordering::Acquire) {
			return Err(UsageError::Unusable);
		}
		Ok(())
	}

	fn require_view(&self, operation: &'static str) -> Result<Phase, UsageError> {
		self.ensure_usable()?;
		match self.phase() {
			phase @ (Phase::ViewAttached | Phase::Active) => Ok(phase),
			phase => Err(UsageError::InvalidPhase { operation, phase }),
		}
	}

	pub(crate) fn composition(&self) -> Arc<Composition> {
		self.composition.load_full()
	}

	pub(crate) fn current_state(&self, operation: &'static str) -> Result<EditorState, ManagerError> {
		self.ensure_usable()?;
		let state = self.state.read().clone();
		state.ok_or_else(|| {
			UsageError::InvalidPhase {
				operation,
				phase: self.phase(),
			}
			.into()
		})
	}

	pub(crate) fn previous_state(&self) -> Result<Option<EditorState>, ManagerError> {
		self.ensure_usable()?;
		Ok(self.previous.read().clone())
	}

	/// Runs one hook per entry; the first failure marks the manager unusable.
	fn run_hooks<'a, F>(
		&self,
		phase: HookPhase,
		entries: impl Iterator<Item = &'a ExtensionEntry>,
		mut hook: F,
	) -> Result<(), HookFailure>
	where
		F: FnMut(&mut dyn Extension, &Store) -> Result<(), HookError>,
	{
		let store = self.store();
		for entry in entries {
			let result = {
				let mut ext = entry.extension.lock();
				hook(&mut *ext, &store)
			};
			if let Err(source) = result {
				self.failed.store(true, Ordering::Release);
				tracing::error!(extension = entry.name, phase = %phase, error = %source, "hook failed");
				return Err(HookFailure {
					extension: entry.name,
					phase,
					source,
				});
			}
		}
		Ok(())
	}

	pub(crate) fn dispatch(&self, tr: Transaction) -> Result<(), ManagerError> {
		let phase = self.require_view("dispatch")?;
		let _busy = self.enter("dispatch")?;
		let previous = self.current_state("dispatch")?;
		let applied = previous.apply_transaction(tr)?;
		if applied.transactions.is_empty() {
			tracing::debug!("transaction filtered out");
			return Ok(());
		}

		*self.state.write() = Some(applied.state.clone());
		*self.previous.write() = Some(previous.clone());
		if phase == Phase::ViewAttached {
			self.set_phase(Phase::Active);
		}
		if let Some(view) = self.view.lock().as_mut() {
			view.update_state(&applied.state);
		}
		tracing::trace!(transactions = applied.transactions.len(), "dispatched");

		self.broadcast(&StateUpdate {
			previous,
			state: applied.state,
			transactions: applied.transactions,
			forced: false,
		})
	}

	/// Delivers a state update to hooks, then to subscribers.
	fn broadcast(&self, update: &StateUpdate) -> Result<(), ManagerError> {
		let composition = self.composition();
		self.run_hooks(HookPhase::StateUpdate, composition.index.entries().iter(), |ext, store| {
			ext.on_state_update(update, store)
		})?;
		let subscribers: Vec<Subscriber> = self.subscribers.lock().iter().map(|(_, s)| Arc::clone(s)).collect();
		for subscriber in subscribers {
			subscriber(update);
		}
		Ok(())
	}

	/// Runs commands on one transaction; dispatches only if every one applied.
	pub(crate) fn run_commands<'a>(
		&self,
		steps: impl IntoIterator<Item = (&'a str, &'a [Value])>,
		dispatch: bool,
	) -> Result<bool, ManagerError> {
		let composition = self.composition();
		let state = self.current_state("commands")?;
		let mut tr = state.tr();
		for (name, args) in steps {
			let command = composition
				.commands
				.get(name)
				.ok_or_else(|| UsageError::UnknownCommand(name.to_string()))?;
			let options = command.options.values();
			let mut props = CommandProps {
				tr: &mut tr,
				state: &state,
				dispatch,
				args,
				options: &options,
			};
			if !(command.spec.run)(&mut props) {
				tracing::trace!(command = name, extension = command.owner, "command not applicable");
				return Ok(false);
			}
		}
		if dispatch {
			self.dispatch(tr)?;
		}
		Ok(true)
	}

	pub(crate) fn is_active(&self, name: &str) -> Result<bool, ManagerError> {
		let composition = self.composition();
		let state = self.current_state("is_active")?;
		let command = composition
			.commands
			.get(name)
			.ok_or_else(|| UsageError::UnknownCommand(name.to_string()))?;
		Ok(match &command.spec.is_active {
			Some(is_active) => is_active(&state, &command.options.values()),
			None => false,
		})
	}

	pub(crate) fn call_helper(&self, name: &str, args: &[Value]) -> Result<Value, ManagerError> {
		let composition = self.composition();
		let state = self.current_state("helpers")?;
		let helper = composition
			.helpers
			.get(name)
			.ok_or_else(|| UsageError::UnknownHelper(name.to_string()))?;
		let options = helper.options.values();
		tracing::trace!(helper = name, extension = helper.owner, "helper called");
		Ok((helper.helper)(&HelperProps {
			state: &state,
			args,
			options: &options,
		}))
	}

	pub(crate) fn with_view<R>(&self, f: impl FnOnce(&mut dyn EditorView) -> R) -> Result<R, ManagerError> {
		self.require_view("with_view")?;
		let mut view = self.view.lock();
		match view.as_mut() {
			Some(view) => Ok(f(view.as_mut())),
			None => Err(UsageError::InvalidPhase {
				operation: "with_view",
				phase: self.phase(),
			}
			.into()),
		}
	}

	/// Keymap for the current option revisions, rebuilt if any changed.
	fn current_keymap(&self) -> Result<Arc<ResolvedKeymap>, ManagerError> {
		let composition = self.composition();
		let keymap = self.keymap.load_full();
		if keymap.fingerprint == fingerprint(&composition.index) {
			return Ok(keymap);
		}
		let _busy = self.enter("handle_key")?;
		let rebuilt = Arc::new(build_keymap(
			&composition.index,
			self.settings.platform,
			&self.settings.exclude,
		)?);
		self.keymap.store(Arc::clone(&rebuilt));
		Ok(rebuilt)
	}

	/// Recomposes from `inputs`. The caller holds the busy guard.
	///
	/// A configuration error leaves the current composition in place.
	fn rebuild(&self, inputs: Vec<ExtensionInput>) -> Result<(), ManagerError> {
		let old = self.composition();
		let next = compose(inputs, &self.settings)?;
		let keymap = build_keymap(&next.index, self.settings.platform, &self.settings.exclude)?;

		let old_ptrs: FxHashSet<*const ()> = old.index.entries().iter().map(entry_ptr).collect();
		let new_ptrs: FxHashSet<*const ()> = next.index.entries().iter().map(entry_ptr).collect();
		let removed: Vec<ExtensionEntry> = old
			.index
			.entries()
			.iter()
			.filter(|e| !new_ptrs.contains(&entry_ptr(e)))
			.cloned()
			.collect();
		let added: Vec<ExtensionEntry> = next
			.index
			.entries()
			.iter()
			.filter(|e| !old_ptrs.contains(&entry_ptr(e)))
			.cloned()
			.collect();

		let next = Arc::new(next);
		self.composition.store(Arc::clone(&next));
		self.keymap.store(Arc::new(keymap));
		let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
		tracing::info!(
			generation,
			added = added.len(),
			removed = removed.len(),
			extensions = next.index.len(),
			"rebuilt composition"
		);

		self.run_hooks(HookPhase::Destroy, removed.iter().rev(), |ext, store| ext.on_destroy(store))?;
		self.run_hooks(HookPhase::Create, added.iter(), |ext, store| ext.on_create(store))?;
		if self.phase() >= Phase::ViewAttached {
			self.run_hooks(HookPhase::View, added.iter(), |ext, store| ext.on_view(store))?;
		}

		let current = self.state.read().clone();
		if let Some(previous) = current {
			let state = previous.reconfigure(Arc::clone(&next.schema), next.plugins.clone())?;
			*self.state.write() = Some(state.clone());
			*self.previous.write() = Some(previous.clone());
			if let Some(view) = self.view.lock().as_mut() {
				view.update_state(&state);
			}
			self.broadcast(&StateUpdate {
				previous,
				state,
				transactions: Vec::new(),
				forced: true,
			})?;
		}
		Ok(())
	}
}

fn entry_ptr(entry: &ExtensionEntry) -> *const () {
	Arc::as_ptr(&entry.extension) as *const ()
}

/// Owns a composition of extensions and its lifecycle.
pub struct Manager {
	core: Arc<Core>,
}

impl fmt::Debug for Manager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Manager")
			.field("phase", &self.core.phase())
			.field("extensions", &self.extension_names().ok())
			.finish_non_exhaustive()
	}
}

impl Manager {
	/// Composes `inputs` and runs every `on_create` hook.
	pub fn create(inputs: Vec<ExtensionInput>, settings: ManagerSettings) -> Result<Self, ManagerError> {
		let composition = compose(inputs, &settings)?;
		let keymap = build_keymap(&composition.index, settings.platform, &settings.exclude)?;
		let core = Arc::new_cyclic(|this| Core {
			this: this.clone(),
			settings,
			composition: ArcSwap::from_pointee(composition),
			keymap: ArcSwap::from_pointee(keymap),
			phase: RwLock::new(Phase::Uninitialized),
			state: RwLock::new(None),
			previous: RwLock::new(None),
			view: Mutex::new(None),
			busy: AtomicBool::new(false),
			failed: AtomicBool::new(false),
			subscribers: Mutex::new(Vec::new()),
			next_subscriber: AtomicU64::new(0),
			generation: AtomicU64::new(0),
		});

		{
			let _busy = core.enter("create")?;
			let composition = core.composition();
			core.run_hooks(HookPhase::Create, composition.index.entries().iter(), |ext, store| {
				ext.on_create(store)
			})?;
		}
		core.set_phase(Phase::Created);
		tracing::info!(extensions = core.composition().index.len(), "manager created");
		Ok(Self { core })
	}

	/// Facade handed to extensions.
	pub fn store(&self) -> Store {
		self.core.store()
	}

	pub fn phase(&self) -> Phase {
		self.core.phase()
	}

	/// Number of completed rebuilds.
	pub fn generation(&self) -> u64 {
		self.core.generation.load(Ordering::Acquire)
	}

	/// Current composition, or an error once the manager is destroyed or unusable.
	fn composition(&self) -> Result<Arc<Composition>, UsageError> {
		self.core.ensure_usable()?;
		Ok(self.core.composition())
	}

	pub fn schema(&self) -> Result<Arc<Schema>, ManagerError> {
		Ok(Arc::clone(&self.composition()?.schema))
	}

	/// Extension names in priority order.
	pub fn extension_names(&self) -> Result<Vec<&'static str>, ManagerError> {
		Ok(self.composition()?.index.entries().iter().map(|e| e.name).collect())
	}

	pub fn extensions_by_tag(&self, tag: &ExtensionTag) -> Result<Vec<&'static str>, ManagerError> {
		Ok(self.composition()?.index.tagged(tag).map(|e| e.name).collect())
	}

	pub fn priority_of(&self, name: &str) -> Result<Option<Priority>, ManagerError> {
		Ok(self.composition()?.index.get(name).map(|e| e.priority))
	}

	/// Extension that contributed a node or mark type.
	pub fn type_owner(&self, type_name: &str) -> Result<Option<&'static str>, ManagerError> {
		Ok(self.composition()?.owners.get(type_name).copied())
	}

	pub fn command_names(&self) -> Result<Vec<&'static str>, ManagerError> {
		Ok(self.composition()?.commands.keys().copied().collect())
	}

	pub fn helper_names(&self) -> Result<Vec<&'static str>, ManagerError> {
		Ok(self.composition()?.helpers.keys().copied().collect())
	}

	pub fn plugin_keys(&self) -> Result<Vec<String>, ManagerError> {
		Ok(self.composition()?.plugins.iter().map(|p| p.key().to_string()).collect())
	}

	/// Owners of the handlers bound to `chord`, in the order they are tried.
	pub fn key_bindings(&self, chord: &KeyChord) -> Result<Vec<&'static str>, ManagerError> {
		self.core.ensure_usable()?;
		Ok(self.core.current_keymap()?.chain(chord).iter().map(|b| b.owner).collect())
	}

	/// Runs `f` with the extension called `name`, downcast to `E`.
	///
	/// Counts as a lifecycle call: `f` cannot dispatch, reconfigure or destroy.
	pub fn with_extension<E, R>(&self, name: &str, f: impl FnOnce(&mut E) -> R) -> Result<R, ManagerError>
	where
		E: Extension,
	{
		let composition = self.composition()?;
		let _busy = self.core.enter("with_extension")?;
		let entry = composition
			.index
			.get(name)
			.ok_or_else(|| UsageError::UnknownExtension(name.to_string()))?;
		let mut ext = entry
			.extension
			.try_lock()
			.ok_or_else(|| UsageError::ExtensionBusy(name.to_string()))?;
		let typed = AsAny::as_any_mut(&mut *ext)
			.downcast_mut::<E>()
			.ok_or_else(|| UsageError::ExtensionType(name.to_string()))?;
		Ok(f(typed))
	}

	/// Creates a state for the current schema and plugins, optionally from JSON.
	pub fn create_state(&self, json: Option<&Value>) -> Result<EditorState, ManagerError> {
		self.core.ensure_usable()?;
		let composition = self.core.composition();
		let schema = Arc::clone(&composition.schema);
		let plugins = composition.plugins.clone();
		let state = match json {
			Some(json) => EditorState::from_json(schema, json, plugins)?,
			None => EditorState::create(StateConfig {
				plugins,
				..StateConfig::new(schema)
			})?,
		};
		Ok(state)
	}

	/// Attaches the view with its initial state and runs every `on_view` hook.
	pub fn attach_view(&self, mut view: Box<dyn EditorView>, state: EditorState) -> Result<(), ManagerError> {
		let core = &self.core;
		core.ensure_usable()?;
		let phase = core.phase();
		if phase != Phase::Created {
			return Err(UsageError::InvalidPhase {
				operation: "attach_view",
				phase,
			}
			.into());
		}
		let _busy = core.enter("attach_view")?;
		let composition = core.composition();
		let state = if Arc::ptr_eq(state.schema(), &composition.schema) {
			state
		} else {
			state.reconfigure(Arc::clone(&composition.schema), composition.plugins.clone())?
		};
		view.update_state(&state);
		*core.state.write() = Some(state);
		*core.view.lock() = Some(view);
		core.set_phase(Phase::ViewAttached);
		core.run_hooks(HookPhase::View, composition.index.entries().iter(), |ext, store| {
			ext.on_view(store)
		})?;
		tracing::info!("view attached");
		Ok(())
	}

	pub fn state(&self) -> Result<EditorState, ManagerError> {
		self.core.current_state("state")
	}

	pub fn previous_state(&self) -> Result<Option<EditorState>, ManagerError> {
		self.core.previous_state()
	}

	pub fn dispatch(&self, tr: Transaction) -> Result<(), ManagerError> {
		self.core.dispatch(tr)
	}

	pub fn commands(&self) -> Commands {
		self.store().commands()
	}

	pub fn chain(&self) -> Chain {
		self.store().chain()
	}

	pub fn helpers(&self) -> Helpers {
		self.store().helpers()
	}

	/// Offers a key to its bindings in priority order.
	pub fn handle_key(&self, chord: &KeyChord) -> Result<bool, ManagerError> {
		self.core.require_view("handle_key")?;
		let keymap = self.core.current_keymap()?;
		let chain = keymap.chain(chord).to_vec();
		let store = self.store();
		for binding in chain {
			if (binding.handler)(&store) {
				tracing::debug!(chord = %chord, extension = binding.owner, "key handled");
				return Ok(true);
			}
		}
		Ok(false)
	}

	/// Types `text` over the selection, giving input rules the first chance.
	///
	/// Returns whether an input rule handled the text.
	pub fn handle_text_input(&self, text: &str) -> Result<bool, ManagerError> {
		self.core.require_view("handle_text_input")?;
		let state = self.core.current_state("handle_text_input")?;
		let (from, to) = state.selection().range(state.doc());
		let composition = self.core.composition();
		if let Some(tr) = run_input_rules(&composition.input_rules, &state, from, to, text)? {
			self.core.dispatch(tr)?;
			return Ok(true);
		}
		let mut tr = state.tr();
		tr.insert_text(text, from, to)?;
		self.core.dispatch(tr)?;
		Ok(false)
	}

	/// Pastes plain text over the selection, applying paste rules.
	///
	/// Returns whether any paste rule matched.
	pub fn handle_paste(&self, text: &str) -> Result<bool, ManagerError> {
		self.core.require_view("handle_paste")?;
		let state = self.core.current_state("handle_paste")?;
		let (from, to) = state.selection().range(state.doc());
		let rp = state.doc().resolve(from)?;
		if !rp.parent().is_textblock() {
			return Ok(false);
		}
		let marks = match state.stored_marks() {
			Some(marks) => marks.to_vec(),
			None => rp.marks(state.schema()),
		};
		let composition = self.core.composition();
		let (nodes, matched) = apply_paste_rules(&composition.paste_rules, state.schema(), text, marks)?;
		let mut tr = state.tr();
		tr.replace(from, to, nodes)?;
		self.core.dispatch(tr)?;
		Ok(matched)
	}

	/// Updates options of one extension and runs its `on_set_options` hook.
	///
	/// Rebuilds the composition when the hook asks for it and something changed.
	/// The new values stay written if the hook fails, though the manager is then unusable.
	pub fn set_options(&self, name: &str, partial: &PartialOptions) -> Result<OptionsDiff, ManagerError> {
		let core = &self.core;
		core.ensure_usable()?;
		let _busy = core.enter("set_options")?;
		let composition = core.composition();
		let entry = composition
			.index
			.get(name)
			.ok_or_else(|| UsageError::UnknownExtension(name.to_string()))?;
		let store = core.store();
		let (diff, reconfigure) = {
			let mut ext = entry.extension.lock();
			extension::set_options(&mut *ext, partial, &store)?
		};
		let reconfigure = reconfigure.map_err(|source| {
			core.failed.store(true, Ordering::Release);
			tracing::error!(extension = entry.name, error = %source, "onSetOptions failed");
			HookFailure {
				extension: entry.name,
				phase: HookPhase::SetOptions,
				source,
			}
		})?;
		if reconfigure == Reconfigure::Rebuild && diff.any_changed() {
			core.rebuild(composition.inputs.clone())?;
		}
		Ok(diff)
	}

	/// Adds a top-level extension and rebuilds.
	pub fn add_extension(&self, input: impl Into<ExtensionInput>) -> Result<(), ManagerError> {
		let core = &self.core;
		core.ensure_usable()?;
		let _busy = core.enter("add_extension")?;
		let mut inputs = core.composition().inputs.clone();
		inputs.push(input.into());
		core.rebuild(inputs)
	}

	/// Removes a top-level extension (with its children) and rebuilds.
	pub fn remove_extension(&self, name: &str) -> Result<(), ManagerError> {
		let core = &self.core;
		core.ensure_usable()?;
		let _busy = core.enter("remove_extension")?;
		let mut inputs = core.composition().inputs.clone();
		let before = inputs.len();
		inputs.retain(|input| input.name() != name);
		if inputs.len() == before {
			return Err(UsageError::UnknownExtension(name.to_string()).into());
		}
		core.rebuild(inputs)
	}

	/// Rebuilds from the current inputs, re-reading every contribution.
	pub fn recreate(&self) -> Result<(), ManagerError> {
		let core = &self.core;
		core.ensure_usable()?;
		let _busy = core.enter("recreate")?;
		core.rebuild(core.composition().inputs.clone())
	}

	/// Subscribes to state updates after every dispatch and rebuild.
	pub fn on_state_update<F>(&self, subscriber: F) -> Result<Disposer, ManagerError>
	where
		F: Fn(&StateUpdate) + Send + Sync + 'static,
	{
		self.core.ensure_usable()?;
		let id = self.core.next_subscriber.fetch_add(1, Ordering::Relaxed);
		self.core.subscribers.lock().push((id, Arc::new(subscriber)));
		let weak = Arc::downgrade(&self.core);
		Ok(Disposer::new(move || {
			if let Some(core) = weak.upgrade() {
				core.subscribers.lock().retain(|(entry, _)| *entry != id);
			}
		}))
	}

	/// Runs every `on_destroy` hook in reverse priority order and tears down the view.
	pub fn destroy(&self) -> Result<(), ManagerError> {
		let core = &self.core;
		core.ensure_usable()?;
		let _busy = core.enter("destroy")?;
		let composition = core.composition();
		core.run_hooks(HookPhase::Destroy, composition.index.entries().iter().rev(), |ext, store| {
			ext.on_destroy(store)
		})?;
		if let Some(mut view) = core.view.lock().take() {
			view.destroy();
		}
		core.subscribers.lock().clear();
		*core.state.write() = None;
		*core.previous.write() = None;
		core.set_phase(Phase::Destroyed);
		tracing::info!("manager destroyed");
		Ok(())
	}
}
