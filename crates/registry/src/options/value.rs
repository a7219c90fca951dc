use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A configuration value held by an option slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	List(Vec<OptionValue>),
	Map(BTreeMap<String, OptionValue>),
}

/// A partial set of option values, as given to constructors and updates.
pub type PartialOptions = BTreeMap<String, OptionValue>;

impl OptionValue {
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(v) => Some(*v),
			_ => None,
		}
	}

	/// Floats, with integers widened.
	pub fn as_float(&self) -> Option<f64> {
		match self {
			Self::Float(v) => Some(*v),
			Self::Int(v) => Some(*v as f64),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[OptionValue]> {
		match self {
			Self::List(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&BTreeMap<String, OptionValue>> {
		match self {
			Self::Map(v) => Some(v),
			_ => None,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::String(_) => "string",
			Self::List(_) => "list",
			Self::Map(_) => "map",
		}
	}

	/// Whether `self` may replace a slot whose default is `default`.
	///
	/// A `null` default accepts anything; float slots accept integers.
	pub(crate) fn fits(&self, default: &OptionValue) -> bool {
		match (default, self) {
			(Self::Null, _) => true,
			(Self::Float(_), Self::Int(_)) => true,
			_ => std::mem::discriminant(default) == std::mem::discriminant(self),
		}
	}

	/// JSON form, used for node attributes and command arguments.
	pub fn to_json(&self) -> Value {
		match self {
			Self::Null => Value::Null,
			Self::Bool(v) => Value::Bool(*v),
			Self::Int(v) => Value::from(*v),
			Self::Float(v) => Value::from(*v),
			Self::String(v) => Value::String(v.clone()),
			Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
			Self::Map(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
		}
	}
}

impl From<&Value> for OptionValue {
	fn from(value: &Value) -> Self {
		match value {
			Value::Null => Self::Null,
			Value::Bool(v) => Self::Bool(*v),
			Value::Number(n) => match n.as_i64() {
				Some(i) => Self::Int(i),
				None => Self::Float(n.as_f64().unwrap_or_default()),
			},
			Value::String(s) => Self::String(s.clone()),
			Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
			Value::Object(map) => Self::Map(map.iter().map(|(k, v)| (k.clone(), Self::from(v))).collect()),
		}
	}
}

impl From<bool> for OptionValue {
	fn from(v: bool) -> Self {
		Self::Bool(v)
	}
}

impl From<i64> for OptionValue {
	fn from(v: i64) -> Self {
		Self::Int(v)
	}
}

impl From<i32> for OptionValue {
	fn from(v: i32) -> Self {
		Self::Int(i64::from(v))
	}
}

impl From<f64> for OptionValue {
	fn from(v: f64) -> Self {
		Self::Float(v)
	}
}

impl From<String> for OptionValue {
	fn from(v: String) -> Self {
		Self::String(v)
	}
}

impl From<&str> for OptionValue {
	fn from(v: &str) -> Self {
		Self::String(v.to_string())
	}
}

impl<T: Into<OptionValue>> From<Vec<T>> for OptionValue {
	fn from(v: Vec<T>) -> Self {
		Self::List(v.into_iter().map(Into::into).collect())
	}
}

impl From<BTreeMap<String, OptionValue>> for OptionValue {
	fn from(v: BTreeMap<String, OptionValue>) -> Self {
		Self::Map(v)
	}
}

mod sealed {
	pub trait Sealed {}
	impl Sealed for bool {}
	impl Sealed for i64 {}
	impl Sealed for f64 {}
	impl Sealed for String {}
	impl Sealed for Vec<super::OptionValue> {}
	impl Sealed for std::collections::BTreeMap<String, super::OptionValue> {}
	impl Sealed for super::OptionValue {}
}

/// Types that can be read out of an [`OptionValue`].
pub trait FromOptionValue: sealed::Sealed + Sized {
	/// `None` if the value has another type.
	fn from_option(value: &OptionValue) -> Option<Self>;
}

impl FromOptionValue for bool {
	fn from_option(value: &OptionValue) -> Option<Self> {
		value.as_bool()
	}
}

impl FromOptionValue for i64 {
	fn from_option(value: &OptionValue) -> Option<Self> {
		value.as_int()
	}
}

impl FromOptionValue for f64 {
	fn from_option(value: &OptionValue) -> Option<Self> {
		value.as_float()
	}
}

impl FromOptionValue for String {
	fn from_option(value: &OptionValue) -> Option<Self> {
		value.as_str().map(str::to_string)
	}
}

impl FromOptionValue for Vec<OptionValue> {
	fn from_option(value: &OptionValue) -> Option<Self> {
		value.as_list().map(<[OptionValue]>::to_vec)
	}
}

impl FromOptionValue for BTreeMap<String, OptionValue> {
	fn from_option(value: &OptionValue) -> Option<Self> {
		value.as_map().cloned()
	}
}

impl FromOptionValue for OptionValue {
	fn from_option(value: &OptionValue) -> Option<Self> {
		Some(value.clone())
	}
}
