use quire_primitives::EditorState;

/// The rendering side of an editor, as seen by the manager.
///
/// The manager pushes every new state to the view and hands it to
/// extensions through [`crate::Store::with_view`].
pub trait EditorView: Send + 'static {
	fn update_state(&mut self, state: &EditorState);

	fn focus(&mut self) {}

	/// Called once when the manager is destroyed.
	fn destroy(&mut self) {}
}
