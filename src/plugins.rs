//! Override chains for element creation and attribute assignment.
//!
//! Overrides are registered on a [`crate::diff::Differ`] against a component
//! identity and are consulted only while that component (or a descendant
//! being unboxed within the same call) is reconciling, so a wrapper
//! component can scope special handling to its own subtree. Within the
//! active chain the innermost component is asked first, and within one
//! registration the most recently added override wins; returning
//! `None`/`false` falls through, ultimately to the engine defaults
//! (namespace-aware creation, [`crate::attrs`] assignment).

use crate::dom::RealNode;
use crate::spec::{ElementSpec, Value};

/// Context for an element-creation override.
pub struct CreateElement<'a> {
	pub spec: &'a ElementSpec,
	pub parent: &'a RealNode,
}

/// Context for an attribute-assignment override. `new` is `None` when the
/// attribute is being removed, `old` is `None` when it is first set.
pub struct SetAttribute<'a> {
	pub element: &'a RealNode,
	pub name: &'a str,
	pub new: Option<&'a Value>,
	pub old: Option<&'a Value>,
}

type CreateElementFn = Box<dyn Fn(&CreateElement<'_>) -> Option<RealNode>>;
type SetAttributeFn = Box<dyn Fn(&SetAttribute<'_>) -> bool>;

/// An ordered set of overrides for one component identity.
#[derive(Default)]
pub struct Overrides {
	create_element: Vec<CreateElementFn>,
	set_attribute: Vec<SetAttributeFn>,
}

impl Overrides {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a creation override; return `Some(node)` to take over creating
	/// the element for `spec`.
	pub fn on_create_element(mut self, f: impl Fn(&CreateElement<'_>) -> Option<RealNode> + 'static) -> Self {
		self.create_element.push(Box::new(f));
		self
	}

	/// Adds an assignment override; return `true` to claim ownership of
	/// applying (or skipping) that attribute for this cycle.
	pub fn on_set_attribute(mut self, f: impl Fn(&SetAttribute<'_>) -> bool + 'static) -> Self {
		self.set_attribute.push(Box::new(f));
		self
	}

	pub(crate) fn create_element(&self, cx: &CreateElement<'_>) -> Option<RealNode> {
		self.create_element.iter().rev().find_map(|f| f(cx))
	}

	pub(crate) fn set_attribute(&self, cx: &SetAttribute<'_>) -> bool {
		self.set_attribute.iter().rev().any(|f| f(cx))
	}
}
