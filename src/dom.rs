//! The live mutable tree the engine reconciles against.
//!
//! [`RealNode`] is a cheap-clone handle with reference identity; the engine
//! never assumes anything about a node beyond what this API exposes, so a
//! host can treat rendered nodes as externally owned and mutate them through
//! the same handle (at its own risk between renders).

use crate::spec::Value;
use core::fmt;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::warn;

/// Element namespace. `svg` elements and their descendants are created in
/// [`Namespace::Svg`]; everything else inherits from its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Namespace {
	Html,
	Svg,
}

/// A dispatched event, passed mutably through every listener on the node.
#[derive(Debug)]
pub struct Event {
	pub name: String,
	pub data: Value,
}

/// A shared event listener. Identity (pointer equality) doubles as the
/// bookkeeping key, so cloning a handler keeps it "the same listener".
#[derive(Clone)]
pub struct EventHandler(Rc<HandlerInner>);

struct HandlerInner {
	f: Box<dyn Fn(&mut Event)>,
}

impl EventHandler {
	pub fn new(f: impl Fn(&mut Event) + 'static) -> Self {
		EventHandler(Rc::new(HandlerInner { f: Box::new(f) }))
	}

	pub fn call(&self, event: &mut Event) {
		(self.0.f)(event)
	}

	pub(crate) fn addr(&self) -> usize {
		Rc::as_ptr(&self.0) as usize
	}
}

impl PartialEq for EventHandler {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for EventHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
	}
}

/// Handle to one node of the live tree.
#[derive(Clone)]
pub struct RealNode(Rc<RefCell<NodeData>>);

struct NodeData {
	kind: NodeKind,
	parent: Weak<RefCell<NodeData>>,
	children: Vec<RealNode>,
	listeners: Vec<(String, EventHandler)>,
}

enum NodeKind {
	Element {
		tag: String,
		namespace: Namespace,
		attributes: Vec<(String, String)>,
	},
	Text(String),
	Comment(String),
}

impl RealNode {
	fn new(kind: NodeKind) -> Self {
		RealNode(Rc::new(RefCell::new(NodeData {
			kind,
			parent: Weak::new(),
			children: Vec::new(),
			listeners: Vec::new(),
		})))
	}

	#[must_use]
	pub fn create_element(tag: impl Into<String>) -> Self {
		Self::create_element_ns(Namespace::Html, tag)
	}

	#[must_use]
	pub fn create_element_ns(namespace: Namespace, tag: impl Into<String>) -> Self {
		Self::new(NodeKind::Element {
			tag: tag.into(),
			namespace,
			attributes: Vec::new(),
		})
	}

	#[must_use]
	pub fn create_text(data: impl Into<String>) -> Self {
		Self::new(NodeKind::Text(data.into()))
	}

	#[must_use]
	pub fn create_comment(data: impl Into<String>) -> Self {
		Self::new(NodeKind::Comment(data.into()))
	}

	#[must_use]
	pub fn is_element(&self) -> bool {
		matches!(self.0.borrow().kind, NodeKind::Element { .. })
	}

	#[must_use]
	pub fn is_text(&self) -> bool {
		matches!(self.0.borrow().kind, NodeKind::Text(_))
	}

	#[must_use]
	pub fn is_comment(&self) -> bool {
		matches!(self.0.borrow().kind, NodeKind::Comment(_))
	}

	/// Tag name, for element nodes.
	#[must_use]
	pub fn tag(&self) -> Option<String> {
		match &self.0.borrow().kind {
			NodeKind::Element { tag, .. } => Some(tag.clone()),
			_ => None,
		}
	}

	#[must_use]
	pub fn namespace(&self) -> Option<Namespace> {
		match &self.0.borrow().kind {
			NodeKind::Element { namespace, .. } => Some(*namespace),
			_ => None,
		}
	}

	/// Character data, for text and comment nodes.
	#[must_use]
	pub fn text(&self) -> Option<String> {
		match &self.0.borrow().kind {
			NodeKind::Text(data) | NodeKind::Comment(data) => Some(data.clone()),
			NodeKind::Element { .. } => None,
		}
	}

	pub fn set_text(&self, data: impl Into<String>) {
		{
			let mut node = self.0.borrow_mut();
			if let NodeKind::Text(existing) | NodeKind::Comment(existing) = &mut node.kind {
				*existing = data.into();
				return;
			}
		}
		warn!("Ignoring set_text on {:?}", self);
	}

	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<String> {
		match &self.0.borrow().kind {
			NodeKind::Element { attributes, .. } => attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone()),
			_ => None,
		}
	}

	/// Snapshot of the attribute list in document order.
	#[must_use]
	pub fn attributes(&self) -> Vec<(String, String)> {
		match &self.0.borrow().kind {
			NodeKind::Element { attributes, .. } => attributes.clone(),
			_ => Vec::new(),
		}
	}

	pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
		{
			let mut node = self.0.borrow_mut();
			if let NodeKind::Element { attributes, .. } = &mut node.kind {
				let value = value.into();
				match attributes.iter_mut().find(|(n, _)| n == name) {
					Some((_, existing)) => *existing = value,
					None => attributes.push((name.to_string(), value)),
				}
				return;
			}
		}
		warn!("Ignoring set_attribute({:?}) on {:?}", name, self);
	}

	pub fn remove_attribute(&self, name: &str) -> Option<String> {
		match &mut self.0.borrow_mut().kind {
			NodeKind::Element { attributes, .. } => {
				let at = attributes.iter().position(|(n, _)| n == name)?;
				Some(attributes.remove(at).1)
			}
			_ => None,
		}
	}

	#[must_use]
	pub fn parent(&self) -> Option<RealNode> {
		self.0.borrow().parent.upgrade().map(RealNode)
	}

	#[must_use]
	pub fn children(&self) -> Vec<RealNode> {
		self.0.borrow().children.clone()
	}

	#[must_use]
	pub fn child_count(&self) -> usize {
		self.0.borrow().children.len()
	}

	#[must_use]
	pub fn child(&self, index: usize) -> Option<RealNode> {
		self.0.borrow().children.get(index).cloned()
	}

	/// Index of this node within its parent's child list.
	#[must_use]
	pub fn child_index(&self) -> Option<usize> {
		let parent = self.parent()?;
		let index = parent.0.borrow().children.iter().position(|c| Rc::ptr_eq(&c.0, &self.0));
		index
	}

	/// Inserts `child` at `index` (clamped to the child count), detaching it
	/// from its current parent first.
	pub fn insert(&self, index: usize, child: &RealNode) {
		if !self.is_element() {
			return warn!("Ignoring insert below non-element {:?}", self);
		}
		child.detach();
		{
			let mut data = self.0.borrow_mut();
			let at = index.min(data.children.len());
			data.children.insert(at, child.clone());
		}
		child.0.borrow_mut().parent = Rc::downgrade(&self.0);
	}

	pub fn append(&self, child: &RealNode) {
		let at = self.child_count();
		self.insert(at, child);
	}

	/// Removes this node from its parent's child list, if it has one.
	pub fn detach(&self) {
		if let Some(parent) = self.parent() {
			parent.0.borrow_mut().children.retain(|c| !Rc::ptr_eq(&c.0, &self.0));
		}
		self.0.borrow_mut().parent = Weak::new();
	}

	/// Reference identity.
	#[must_use]
	pub fn same_node(&self, other: &RealNode) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	pub(crate) fn addr(&self) -> usize {
		Rc::as_ptr(&self.0) as usize
	}

	pub fn add_listener(&self, event: &str, handler: EventHandler) {
		self.0.borrow_mut().listeners.push((event.to_string(), handler));
	}

	pub fn remove_listener(&self, event: &str, handler: &EventHandler) {
		let mut data = self.0.borrow_mut();
		if let Some(at) = data.listeners.iter().position(|(n, h)| n == event && h == handler) {
			data.listeners.remove(at);
		} else {
			warn!("Tried to remove listener {:?} for {:?} that isn't attached", handler, event);
		}
	}

	#[must_use]
	pub fn listener_count(&self, event: &str) -> usize {
		self.0.borrow().listeners.iter().filter(|(n, _)| n == event).count()
	}

	/// Dispatches an event to this node's listeners, in attachment order.
	/// No bubbling; hosts that need it can walk [`RealNode::parent`].
	pub fn emit(&self, event: &str, data: Value) {
		let handlers: Vec<EventHandler> = self
			.0
			.borrow()
			.listeners
			.iter()
			.filter(|(n, _)| n == event)
			.map(|(_, h)| h.clone())
			.collect();
		let mut event = Event {
			name: event.to_string(),
			data,
		};
		for handler in handlers {
			handler.call(&mut event);
		}
	}

	/// Concatenated data of all text descendants, pre-order.
	#[must_use]
	pub fn text_content(&self) -> String {
		let mut out = String::new();
		self.collect_text(&mut out);
		out
	}

	fn collect_text(&self, out: &mut String) {
		let data = self.0.borrow();
		match &data.kind {
			NodeKind::Text(text) => out.push_str(text),
			NodeKind::Comment(_) => (),
			NodeKind::Element { .. } => {
				for child in &data.children {
					child.collect_text(out);
				}
			}
		}
	}
}

impl fmt::Debug for RealNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.0.borrow().kind {
			NodeKind::Element { tag, .. } => write!(f, "<{}>", tag),
			NodeKind::Text(data) => write!(f, "#text {:?}", data),
			NodeKind::Comment(data) => write!(f, "#comment {:?}", data),
		}
	}
}
