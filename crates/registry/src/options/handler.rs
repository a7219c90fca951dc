use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

/// Typed name of a handler slot whose callbacks receive `&E`.
pub struct HandlerKey<E> {
	name: &'static str,
	_event: PhantomData<fn(&E)>,
}

impl<E> HandlerKey<E> {
	pub const fn new(name: &'static str) -> Self {
		Self {
			name,
			_event: PhantomData,
		}
	}

	pub const fn name(&self) -> &'static str {
		self.name
	}
}

impl<E> fmt::Debug for HandlerKey<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("HandlerKey").field(&self.name).finish()
	}
}

/// Typed name of a custom handler slot holding registrations of type `T`.
pub struct CustomHandlerKey<T> {
	name: &'static str,
	_value: PhantomData<fn() -> T>,
}

impl<T> CustomHandlerKey<T> {
	pub const fn new(name: &'static str) -> Self {
		Self {
			name,
			_value: PhantomData,
		}
	}

	pub const fn name(&self) -> &'static str {
		self.name
	}
}

impl<T> fmt::Debug for CustomHandlerKey<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("CustomHandlerKey").field(&self.name).finish()
	}
}

/// Returned by a handler to decide whether later handlers still run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerOutcome {
	#[default]
	Continue,
	Stop,
}

pub(crate) type ErasedHandler = Arc<dyn Fn(&dyn Any) -> HandlerOutcome + Send + Sync>;
pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Registrations of one slot, in insertion order, keyed by registration id.
pub(crate) type Slot<T> = Vec<(u64, T)>;

/// Removes a registration. Calling it more than once does nothing.
///
/// Dropping a disposer keeps the registration alive.
pub struct Disposer(Mutex<Option<Box<dyn FnOnce() + Send>>>);

impl Disposer {
	pub(crate) fn new(remove: impl FnOnce() + Send + 'static) -> Self {
		Self(Mutex::new(Some(Box::new(remove))))
	}

	pub fn dispose(&self) {
		let remove = self.0.lock().take();
		if let Some(remove) = remove {
			remove();
		}
	}

	pub fn is_disposed(&self) -> bool {
		self.0.lock().is_none()
	}
}

impl fmt::Debug for Disposer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Disposer").field("disposed", &self.is_disposed()).finish()
	}
}
