use std::sync::Arc;

use serde_json::json;

use crate::{AttributeSpec, MarkSpec, Node, NodeSpec, Schema, SchemaSpec};

/// doc > (paragraph | heading | horizontalRule)+, with bold, italic and link marks.
pub(crate) fn schema() -> Arc<Schema> {
	let spec = SchemaSpec {
		top_node: "doc".into(),
		nodes: vec![
			("doc".into(), NodeSpec::block(Some("block+"), "")),
			("paragraph".into(), NodeSpec::block(Some("inline*"), "block")),
			(
				"heading".into(),
				NodeSpec::block(Some("inline*"), "block").attr("level", AttributeSpec::with_default(1)),
			),
			("horizontalRule".into(), NodeSpec::block(None, "block")),
			(
				"text".into(),
				NodeSpec {
					group: Some("inline".into()),
					inline: true,
					..NodeSpec::default()
				},
			),
		],
		marks: vec![
			("bold".into(), MarkSpec::default()),
			("italic".into(), MarkSpec::default()),
			(
				"link".into(),
				MarkSpec {
					inclusive: false,
					..MarkSpec::default()
				}
				.attr("href", AttributeSpec::required()),
			),
		],
	};
	match Schema::new(spec) {
		Ok(schema) => Arc::new(schema),
		Err(e) => panic!("test schema: {e}"),
	}
}

/// Builds a document from its JSON form.
pub(crate) fn doc(schema: &Schema, json: serde_json::Value) -> Node {
	Node::from_json(schema, &json).unwrap()
}

/// `doc(paragraph(text))`.
pub(crate) fn para_doc(schema: &Schema, text: &str) -> Node {
	doc(
		schema,
		json!({"type": "doc", "content": [{"type": "paragraph", "content": [{"type": "text", "text": text}]}]}),
	)
}
