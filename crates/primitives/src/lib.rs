//! Document engine: schemas, immutable node trees, steps, transactions and state.

/// Schema and document errors.
pub mod error;
/// Inline marks.
pub mod mark;
/// Document nodes and resolved positions.
pub mod node;
/// State plugins.
pub mod plugin;
/// Node and mark type definitions.
pub mod schema;
/// Selection types.
pub mod selection;
/// Editor state.
pub mod state;
/// Steps, mapping and transactions.
pub mod transaction;

pub use error::{DocError, SchemaError};
pub use mark::Mark;
pub use node::{Attrs, Node, ResolvedPos};
pub use plugin::{AppendFn, FilterFn, Plugin};
pub use schema::{AttributeSpec, ContentExpr, MarkSpec, MarkType, NodeSpec, NodeType, Schema, SchemaSpec};
pub use selection::Selection;
pub use state::{Applied, EditorState, StateConfig};
pub use transaction::{Bias, MapResult, Mapping, Step, StepMap, Transaction};

#[cfg(test)]
mod test_support;
