//! Construct spec trees from live nodes.
//!
//! This is the inverse direction of rendering: given an existing subtree
//! (parsed server markup, or nodes built by other code), produce the spec
//! that describes it. The differ uses this for adoption and `sync`; it is
//! public because hosts doing their own hydration bookkeeping want it too.

use crate::dom::RealNode;
use crate::spec::{ElementSpec, Spec, Value};
use std::rc::Rc;
use tracing::warn;

pub fn load_children(node: &RealNode) -> Vec<Spec> {
	node.children().iter().filter_map(load_node).collect()
}

/// `None` for comment nodes: comments are serializer placeholders and have
/// no spec-side counterpart that owns a real node.
pub fn load_node(node: &RealNode) -> Option<Spec> {
	if node.is_element() {
		Some(Spec::Element(Rc::new(load_element(node))))
	} else if node.is_text() {
		Some(Spec::Text(node.text().unwrap_or_default()))
	} else {
		None
	}
}

pub fn load_element(node: &RealNode) -> ElementSpec {
	let tag = match node.tag() {
		Some(tag) => tag,
		None => {
			warn!("load_element on non-element {:?}", node);
			String::new()
		}
	};
	ElementSpec {
		tag,
		attrs: load_attributes(node),
		children: load_children(node),
	}
}

pub fn load_attributes(node: &RealNode) -> Vec<(String, Value)> {
	node.attributes().into_iter().map(|(name, value)| (name, Value::Str(value))).collect()
}
