use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use super::diff::{OptionChange, OptionsDiff};
use super::handler::{
	CustomHandlerKey, Disposer, ErasedHandler, ErasedValue, HandlerKey, HandlerOutcome, Slot,
};
use super::schema::{OptionKind, OptionsSchema};
use super::value::{FromOptionValue, OptionValue, PartialOptions};
use super::OptionsError;

/// Snapshot of the value slots of one extension.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptionValues {
	values: IndexMap<&'static str, OptionValue>,
}

impl OptionValues {
	pub fn get(&self, key: &str) -> Option<&OptionValue> {
		self.values.get(key)
	}

	pub fn get_as<T: FromOptionValue>(&self, key: &str) -> Option<T> {
		self.values.get(key).and_then(T::from_option)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&'static str, &OptionValue)> {
		self.values.iter().map(|(k, v)| (*k, v))
	}
}

struct Inner {
	schema: OptionsSchema,
	values: RwLock<OptionValues>,
	handlers: Mutex<FxHashMap<&'static str, Slot<ErasedHandler>>>,
	custom: Mutex<FxHashMap<&'static str, Slot<ErasedValue>>>,
	/// Bumped whenever values or custom registrations change.
	revision: AtomicU64,
	next_id: AtomicU64,
}

/// Live option slots of one extension.
///
/// Cloning yields another handle to the same slots, so closures contributed by
/// an extension can capture it and observe later updates.
#[derive(Clone)]
pub struct Options {
	inner: Arc<Inner>,
}

impl fmt::Debug for Options {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Options")
			.field("extension", &self.inner.schema.extension())
			.field("values", &*self.inner.values.read())
			.finish_non_exhaustive()
	}
}

impl Options {
	/// Validates `partial` against `schema` and fills the remaining slots with defaults.
	pub fn new(schema: OptionsSchema, partial: PartialOptions) -> Result<Self, OptionsError> {
		if let Some(conflict) = &schema.conflict {
			return Err(conflict.clone());
		}
		for (key, value) in &partial {
			check_value(&schema, key, value)?;
		}
		let mut values = IndexMap::new();
		for (key, decl) in &schema.decls {
			if matches!(decl.kind, OptionKind::Static | OptionKind::Dynamic) {
				let value = partial.get(*key).cloned().unwrap_or_else(|| decl.default.clone());
				values.insert(*key, value);
			}
		}
		Ok(Self {
			inner: Arc::new(Inner {
				schema,
				values: RwLock::new(OptionValues { values }),
				handlers: Mutex::new(FxHashMap::default()),
				custom: Mutex::new(FxHashMap::default()),
				revision: AtomicU64::new(0),
				next_id: AtomicU64::new(0),
			}),
		})
	}

	/// Options with every slot at its default.
	pub fn defaults(schema: OptionsSchema) -> Result<Self, OptionsError> {
		Self::new(schema, PartialOptions::new())
	}

	pub fn extension(&self) -> &'static str {
		self.inner.schema.extension()
	}

	pub fn schema(&self) -> &OptionsSchema {
		&self.inner.schema
	}

	pub fn get(&self, key: &str) -> Option<OptionValue> {
		self.inner.values.read().get(key).cloned()
	}

	pub fn get_as<T: FromOptionValue>(&self, key: &str) -> Option<T> {
		self.inner.values.read().get_as(key)
	}

	/// Snapshot of every value slot.
	pub fn values(&self) -> OptionValues {
		self.inner.values.read().clone()
	}

	/// Increases whenever values or custom registrations change.
	pub fn revision(&self) -> u64 {
		self.inner.revision.load(Ordering::Acquire)
	}

	/// Applies an update atomically: every key is validated before any is written.
	pub fn update(&self, partial: &PartialOptions) -> Result<OptionsDiff, OptionsError> {
		let schema = &self.inner.schema;
		for (key, value) in partial {
			check_value(schema, key, value)?;
			if schema.kind(key) == Some(OptionKind::Static) {
				return Err(OptionsError::StaticMutation {
					extension: schema.extension(),
					key: key.clone(),
				});
			}
		}

		let mut diff = OptionsDiff::default();
		let mut values = self.inner.values.write();
		for (key, value) in partial {
			let Some(slot) = values.values.get_mut(key.as_str()) else {
				continue;
			};
			let previous = std::mem::replace(slot, value.clone());
			diff.insert(
				key.clone(),
				OptionChange {
					changed: previous != *value,
					previous,
					value: value.clone(),
				},
			);
		}
		drop(values);

		if diff.any_changed() {
			self.inner.revision.fetch_add(1, Ordering::AcqRel);
			tracing::debug!(
				extension = schema.extension(),
				changed = ?diff.changed_keys().collect::<Vec<_>>(),
				"options updated"
			);
		}
		Ok(diff)
	}

	/// Registers a callback in a handler slot.
	pub fn add_handler<E, F>(&self, key: &HandlerKey<E>, handler: F) -> Result<Disposer, OptionsError>
	where
		E: 'static,
		F: Fn(&E) -> HandlerOutcome + Send + Sync + 'static,
	{
		self.expect_kind(key.name(), OptionKind::Handler)?;
		let erased: ErasedHandler = Arc::new(move |event: &dyn Any| match event.downcast_ref::<E>() {
			Some(event) => handler(event),
			None => HandlerOutcome::Continue,
		});
		let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
		self.inner
			.handlers
			.lock()
			.entry(key.name())
			.or_default()
			.push((id, erased));

		let weak = Arc::downgrade(&self.inner);
		let name = key.name();
		Ok(Disposer::new(move || {
			if let Some(inner) = weak.upgrade() {
				if let Some(slot) = inner.handlers.lock().get_mut(name) {
					slot.retain(|(entry, _)| *entry != id);
				}
			}
		}))
	}

	/// Calls the handlers of a slot in registration order until one stops.
	pub fn dispatch<E: 'static>(&self, key: &HandlerKey<E>, event: &E) -> HandlerOutcome {
		let handlers: Vec<ErasedHandler> = match self.inner.handlers.lock().get(key.name()) {
			Some(slot) => slot.iter().map(|(_, h)| Arc::clone(h)).collect(),
			None => return HandlerOutcome::Continue,
		};
		for handler in handlers {
			if handler(event) == HandlerOutcome::Stop {
				return HandlerOutcome::Stop;
			}
		}
		HandlerOutcome::Continue
	}

	pub fn handler_count<E: 'static>(&self, key: &HandlerKey<E>) -> usize {
		self.inner.handlers.lock().get(key.name()).map_or(0, Vec::len)
	}

	/// Adds a registration to a custom handler slot.
	pub fn add_custom_handler<T>(&self, key: &CustomHandlerKey<T>, value: T) -> Result<Disposer, OptionsError>
	where
		T: Send + Sync + 'static,
	{
		self.expect_kind(key.name(), OptionKind::CustomHandler)?;
		let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
		self.inner
			.custom
			.lock()
			.entry(key.name())
			.or_default()
			.push((id, Arc::new(value)));
		self.inner.revision.fetch_add(1, Ordering::AcqRel);

		let weak: Weak<Inner> = Arc::downgrade(&self.inner);
		let name = key.name();
		Ok(Disposer::new(move || {
			let Some(inner) = weak.upgrade() else {
				return;
			};
			let removed = match inner.custom.lock().get_mut(name) {
				Some(slot) => {
					let before = slot.len();
					slot.retain(|(entry, _)| *entry != id);
					slot.len() != before
				}
				None => false,
			};
			if removed {
				inner.revision.fetch_add(1, Ordering::AcqRel);
			}
		}))
	}

	/// Current registrations of a custom handler slot, oldest first.
	pub fn custom_handlers<T>(&self, key: &CustomHandlerKey<T>) -> Vec<Arc<T>>
	where
		T: Send + Sync + 'static,
	{
		self.inner
			.custom
			.lock()
			.get(key.name())
			.map(|slot| {
				slot.iter()
					.filter_map(|(_, value)| Arc::clone(value).downcast::<T>().ok())
					.collect()
			})
			.unwrap_or_default()
	}

	fn expect_kind(&self, key: &'static str, expected: OptionKind) -> Result<(), OptionsError> {
		let schema = &self.inner.schema;
		match schema.kind(key) {
			None => Err(OptionsError::UnknownKey {
				extension: schema.extension(),
				key: key.to_string(),
			}),
			Some(kind) if kind != expected => Err(OptionsError::Misclassified {
				extension: schema.extension(),
				key: key.to_string(),
				kind,
			}),
			Some(_) => Ok(()),
		}
	}
}

/// Checks that `value` may be written to the value slot `key`.
fn check_value(schema: &OptionsSchema, key: &str, value: &OptionValue) -> Result<(), OptionsError> {
	let extension = schema.extension();
	let Some(decl) = schema.decls.get(key) else {
		return Err(OptionsError::UnknownKey {
			extension,
			key: key.to_string(),
		});
	};
	if matches!(decl.kind, OptionKind::Handler | OptionKind::CustomHandler) {
		return Err(OptionsError::Misclassified {
			extension,
			key: key.to_string(),
			kind: decl.kind,
		});
	}
	if !value.fits(&decl.default) {
		return Err(OptionsError::TypeMismatch {
			extension,
			key: key.to_string(),
			expected: decl.default.type_name(),
			got: value.type_name(),
		});
	}
	Ok(())
}
