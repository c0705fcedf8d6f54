//! Component execution: identity, the persistent per-instance store, and the
//! context a component function runs against.

use crate::diff::Refresh;
use crate::dom::RealNode;
use crate::error::Error;
use crate::spec::{ComponentSpec, Spec, Value};
use core::any::Any;
use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

/// A component: a named function from props/children to a [`Spec`].
///
/// Identity is the shared allocation, so clones of one `Component` match
/// each other across renders while two components built from identical
/// closures do not.
#[derive(Clone)]
pub struct Component(Rc<ComponentInner>);

struct ComponentInner {
	name: &'static str,
	f: Box<dyn Fn(&mut Ctx<'_>) -> Spec>,
}

impl Component {
	pub fn new(name: &'static str, f: impl Fn(&mut Ctx<'_>) -> Spec + 'static) -> Self {
		Component(Rc::new(ComponentInner { name, f: Box::new(f) }))
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.0.name
	}

	/// Starts a spec for this component; finish with
	/// [`ComponentSpec::build`].
	#[must_use]
	pub fn with(&self) -> ComponentSpec {
		ComponentSpec {
			component: self.clone(),
			props: Vec::new(),
			children: Vec::new(),
		}
	}

	/// Spec with no props and no children.
	#[must_use]
	pub fn spec(&self) -> Spec {
		self.with().build()
	}

	pub(crate) fn addr(&self) -> usize {
		Rc::as_ptr(&self.0) as usize
	}

	pub(crate) fn run(&self, ctx: &mut Ctx<'_>) -> Spec {
		(self.0.f)(ctx)
	}
}

impl PartialEq for Component {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for Component {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Component({})", self.0.name)
	}
}

type LifecycleFn = Rc<dyn Fn(&[RealNode])>;

/// Persistent per-component-instance state.
///
/// Created when a component first attaches and carried forward by reference
/// for as long as the instance keeps matching; dropped with the instance.
/// Besides the value bag it holds the three lifecycle callback slots, which
/// the component body (re-)registers on each invocation.
#[derive(Clone, Default)]
pub struct Store(Rc<RefCell<StoreData>>);

#[derive(Default)]
struct StoreData {
	values: hashbrown::HashMap<String, Value>,
	on_attached: Option<LifecycleFn>,
	on_detached: Option<LifecycleFn>,
	on_updated: Option<LifecycleFn>,
}

impl Store {
	#[must_use]
	pub fn get(&self, key: &str) -> Option<Value> {
		self.0.borrow().values.get(key).cloned()
	}

	pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
		self.0.borrow_mut().values.insert(key.into(), value.into());
	}

	pub fn remove(&self, key: &str) -> Option<Value> {
		self.0.borrow_mut().values.remove(key)
	}

	#[must_use]
	pub fn contains(&self, key: &str) -> bool {
		self.0.borrow().values.contains_key(key)
	}

	pub(crate) fn set_on_attached(&self, f: LifecycleFn) {
		self.0.borrow_mut().on_attached = Some(f);
	}

	pub(crate) fn set_on_detached(&self, f: LifecycleFn) {
		self.0.borrow_mut().on_detached = Some(f);
	}

	pub(crate) fn set_on_updated(&self, f: LifecycleFn) {
		self.0.borrow_mut().on_updated = Some(f);
	}

	pub(crate) fn attached_fn(&self) -> Option<LifecycleFn> {
		self.0.borrow().on_attached.clone()
	}

	pub(crate) fn detached_fn(&self) -> Option<LifecycleFn> {
		self.0.borrow().on_detached.clone()
	}

	pub(crate) fn updated_fn(&self) -> Option<LifecycleFn> {
		self.0.borrow().on_updated.clone()
	}
}

/// What a component function sees while it runs.
pub struct Ctx<'a> {
	spec: Rc<ComponentSpec>,
	prev: Option<Rc<ComponentSpec>>,
	store: Store,
	real: Vec<RealNode>,
	parent_real: Option<RealNode>,
	refresh: Option<Refresh>,
	draw: Option<&'a mut dyn Any>,
}

impl<'a> Ctx<'a> {
	pub(crate) fn new(
		spec: Rc<ComponentSpec>,
		prev: Option<Rc<ComponentSpec>>,
		store: Store,
		real: Vec<RealNode>,
		parent_real: Option<RealNode>,
		refresh: Option<Refresh>,
		draw: Option<&'a mut dyn Any>,
	) -> Self {
		Ctx {
			spec,
			prev,
			store,
			real,
			parent_real,
			refresh,
			draw,
		}
	}

	#[must_use]
	pub fn props(&self) -> &[(String, Value)] {
		&self.spec.props
	}

	#[must_use]
	pub fn prop(&self, name: &str) -> Option<&Value> {
		self.spec.get(name)
	}

	#[must_use]
	pub fn children(&self) -> &[Spec] {
		&self.spec.children
	}

	/// The spec this instance was last invoked with, `None` on first attach.
	#[must_use]
	pub fn previous(&self) -> Option<&ComponentSpec> {
		self.prev.as_deref()
	}

	#[must_use]
	pub fn is_first(&self) -> bool {
		self.prev.is_none()
	}

	#[must_use]
	pub fn store(&self) -> &Store {
		&self.store
	}

	/// Real nodes this position currently resolves to (empty on first
	/// attach, and in the markup and draw backends).
	#[must_use]
	pub fn real(&self) -> &[RealNode] {
		&self.real
	}

	#[must_use]
	pub fn parent_real(&self) -> Option<&RealNode> {
		self.parent_real.as_ref()
	}

	/// The single element this instance rendered, for state-binding wrappers
	/// that require one.
	pub fn root_element(&self) -> Result<RealNode, Error> {
		match self.real.as_slice() {
			[node] if node.is_element() => Ok(node.clone()),
			[] => Err(Error::NotAnElement {
				what: "root_element",
				found: "no rendered node",
			}),
			[_] => Err(Error::NotAnElement {
				what: "root_element",
				found: "a non-element node",
			}),
			_ => Err(Error::NotAnElement {
				what: "root_element",
				found: "multiple nodes",
			}),
		}
	}

	pub fn on_attached(&self, f: impl Fn(&[RealNode]) + 'static) {
		self.store.set_on_attached(Rc::new(f));
	}

	pub fn on_detached(&self, f: impl Fn(&[RealNode]) + 'static) {
		self.store.set_on_detached(Rc::new(f));
	}

	pub fn on_updated(&self, f: impl Fn(&[RealNode]) + 'static) {
		self.store.set_on_updated(Rc::new(f));
	}

	/// Handle that re-renders just this instance when triggered from outside
	/// the render call (an event listener, a timer). `None` in the markup
	/// and draw backends.
	#[must_use]
	pub fn refresh(&self) -> Option<Refresh> {
		self.refresh.clone()
	}

	/// Keep the previous output untouched, skipping child diffing entirely.
	#[must_use]
	pub fn leave(&self) -> Spec {
		Spec::Leave
	}

	/// The draw backend's context value, if running under
	/// [`crate::draw::draw`].
	pub fn draw_context<T: Any>(&mut self) -> Option<&mut T> {
		match &mut self.draw {
			Some(any) => any.downcast_mut::<T>(),
			None => None,
		}
	}
}
