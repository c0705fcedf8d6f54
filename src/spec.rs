//! The immutable, author-supplied description of a desired tree.
//!
//! A [`Spec`] is plain data: building one performs no tree mutation and no
//! component execution. Specs are cheap to clone (shared internals) and are
//! never mutated by the engine; every render takes a fresh spec tree.

use crate::component::Component;
use crate::dom::{Event, EventHandler, RealNode};
use crate::draw::Painter;
use crate::error::Error;
use core::fmt;
use std::rc::Rc;

/// One node of the desired tree.
#[derive(Clone)]
pub enum Spec {
	Element(Rc<ElementSpec>),
	Component(Rc<ComponentSpec>),
	Text(String),
	/// Explicit absence: nothing in the live tree, a `<!---->` placeholder
	/// in serialized markup.
	Null,
	/// A pre-existing live node embedded directly as a child.
	Real(RealNode),
	/// Transparent grouping with an optional identity key; contributes its
	/// items' nodes to the surrounding parent.
	Many(Rc<ManySpec>),
	/// Draw-backend callback child; not valid in the live or markup
	/// backends.
	Painter(Painter),
	/// Sentinel returned by [`crate::component::Ctx::leave`]; only valid as
	/// a component's return value.
	Leave,
}

#[derive(Clone, Debug)]
pub struct ElementSpec {
	pub tag: String,
	pub attrs: Vec<(String, Value)>,
	pub children: Vec<Spec>,
}

#[derive(Clone, Debug)]
pub struct ComponentSpec {
	pub component: Component,
	pub props: Vec<(String, Value)>,
	pub children: Vec<Spec>,
}

#[derive(Clone, Debug)]
pub struct ManySpec {
	pub key: Option<Value>,
	pub items: Vec<Spec>,
}

/// Attribute, prop and store values.
///
/// `List` and `Map` are shorthand for `class` lists and `style` maps (see
/// [`crate::attrs`]); `Handler` attaches an event listener when used under
/// an `on*` attribute name.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
	List(Vec<Value>),
	Map(Vec<(String, Value)>),
	Handler(EventHandler),
}

/// Explicit child identity, from the reserved `key` prop.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
	Int(i64),
	Str(String),
}

impl Value {
	pub(crate) fn kind_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "a bool",
			Value::Int(_) => "an integer",
			Value::Float(_) => "a float",
			Value::Str(_) => "a string",
			Value::List(_) => "a list",
			Value::Map(_) => "a map",
			Value::Handler(_) => "a handler",
		}
	}

	pub(crate) fn key(&self) -> Result<Key, Error> {
		match self {
			Value::Int(int) => Ok(Key::Int(*int)),
			Value::Str(string) => Ok(Key::Str(string.clone())),
			other => Err(Error::BadKey { found: other.kind_name() }),
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(string) => Some(string),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_int(&self) -> Option<i64> {
		match self {
			Value::Int(int) => Some(*int),
			_ => None,
		}
	}
}

/// Starts an element spec; finish with [`ElementSpec::build`].
#[must_use]
pub fn el(tag: impl Into<String>) -> ElementSpec {
	ElementSpec {
		tag: tag.into(),
		attrs: Vec::new(),
		children: Vec::new(),
	}
}

/// Groups `items` transparently under the surrounding parent.
#[must_use]
pub fn many(items: Vec<Spec>) -> Spec {
	Spec::Many(Rc::new(ManySpec { key: None, items }))
}

/// Like [`many`], with an explicit identity key for the group itself.
#[must_use]
pub fn keyed(key: impl Into<Value>, items: Vec<Spec>) -> Spec {
	Spec::Many(Rc::new(ManySpec {
		key: Some(key.into()),
		items,
	}))
}

impl ElementSpec {
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.attrs.push((name.into(), value.into()));
		self
	}

	/// Sets the reserved `key` prop; never written to the live node.
	pub fn key(self, key: impl Into<Value>) -> Self {
		self.attr("key", key)
	}

	/// Attaches a fresh listener for `event` (e.g. `"click"`).
	pub fn on(self, event: &str, f: impl Fn(&mut Event) + 'static) -> Self {
		self.handler(event, EventHandler::new(f))
	}

	/// Attaches a pre-built listener; reusing the same [`EventHandler`]
	/// across renders keeps the live listener untouched.
	pub fn handler(self, event: &str, handler: EventHandler) -> Self {
		let name = format!("on{}", event);
		self.attr(name, Value::Handler(handler))
	}

	pub fn child(mut self, child: impl Into<Spec>) -> Self {
		self.children.push(child.into());
		self
	}

	pub fn children(mut self, children: Vec<Spec>) -> Self {
		self.children.extend(children);
		self
	}

	pub fn text(self, text: impl Into<String>) -> Self {
		self.child(Spec::Text(text.into()))
	}

	#[must_use]
	pub fn build(self) -> Spec {
		Spec::Element(Rc::new(self))
	}
}

impl ComponentSpec {
	pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.props.push((name.into(), value.into()));
		self
	}

	pub fn key(self, key: impl Into<Value>) -> Self {
		self.prop("key", key)
	}

	pub fn child(mut self, child: impl Into<Spec>) -> Self {
		self.children.push(child.into());
		self
	}

	pub fn children(mut self, children: Vec<Spec>) -> Self {
		self.children.extend(children);
		self
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.props.iter().find(|(n, _)| n == name).map(|(_, v)| v)
	}

	#[must_use]
	pub fn build(self) -> Spec {
		Spec::Component(Rc::new(self))
	}
}

/// Explicit key of a spec, if it carries one.
pub(crate) fn spec_key(spec: &Spec) -> Result<Option<Key>, Error> {
	let value = match spec {
		Spec::Element(element) => element.attrs.iter().find(|(n, _)| n == "key").map(|(_, v)| v),
		Spec::Component(component) => component.get("key"),
		Spec::Many(group) => group.key.as_ref(),
		_ => None,
	};
	value.map(Value::key).transpose()
}

impl fmt::Debug for Spec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Spec::Element(element) => write!(f, "<{}>", element.tag),
			Spec::Component(component) => write!(f, "component {:?}", component.component.name()),
			Spec::Text(text) => write!(f, "#text {:?}", text),
			Spec::Null => write!(f, "null"),
			Spec::Real(node) => write!(f, "real {:?}", node),
			Spec::Many(group) => write!(f, "group[{}]", group.items.len()),
			Spec::Painter(_) => write!(f, "painter"),
			Spec::Leave => write!(f, "leave"),
		}
	}
}

impl From<ElementSpec> for Spec {
	fn from(element: ElementSpec) -> Self {
		element.build()
	}
}

impl From<ComponentSpec> for Spec {
	fn from(component: ComponentSpec) -> Self {
		component.build()
	}
}

impl From<&str> for Spec {
	fn from(text: &str) -> Self {
		Spec::Text(text.to_string())
	}
}

impl From<String> for Spec {
	fn from(text: String) -> Self {
		Spec::Text(text)
	}
}

impl From<RealNode> for Spec {
	fn from(node: RealNode) -> Self {
		Spec::Real(node)
	}
}

impl From<Vec<Spec>> for Spec {
	fn from(items: Vec<Spec>) -> Self {
		many(items)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Int(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Value::Int(i64::from(value))
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::Str(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::Str(value)
	}
}

impl From<EventHandler> for Value {
	fn from(handler: EventHandler) -> Self {
		Value::Handler(handler)
	}
}

impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Self {
		Value::List(items)
	}
}
