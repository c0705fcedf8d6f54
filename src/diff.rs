//! The reconciliation driver.
//!
//! [`Differ`] owns the virtual-node arena, per-target root bookkeeping, the
//! override registry and the event-handler handle ledger. One call to
//! [`Differ::render`] is a complete, blocking unit of work: it walks the new
//! spec against the previous virtual tree, decides per slot whether the old
//! node can be updated in place or must be torn down and rebuilt, and keeps
//! the live tree in agreement before returning. There is no scheduling and
//! no batching; re-entry during an active pass is a fatal error.

use crate::attrs::{self, AttrCx};
use crate::component::{Component, Ctx, Store};
use crate::dom::{EventHandler, Namespace, RealNode};
use crate::error::Error;
use crate::load;
use crate::plugins::{CreateElement, Overrides};
use crate::rc_hash_map::RcHashMap;
use crate::spec::{spec_key, ComponentSpec, ElementSpec, Key, Spec, Value};
use crate::vnode::{Arena, VKind, VNode, VNodeId};
use core::fmt;
use hashbrown::{HashMap, HashSet};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use tracing::{error, info, trace, trace_span, warn};

/// Component-in-component unboxing deeper than this is assumed to be a
/// component (indirectly) returning itself.
pub(crate) const MAX_UNBOX_DEPTH: usize = 256;

/// The live-tree backend's entry point. Cheap to clone; all clones share
/// state, which is how [`Refresh`] handles find their way back in.
#[derive(Clone)]
pub struct Differ {
	inner: Rc<RefCell<Inner>>,
}

impl Differ {
	#[must_use]
	pub fn new() -> Self {
		Differ {
			inner: Rc::new_cyclic(|self_weak| {
				RefCell::new(Inner {
					self_weak: self_weak.clone(),
					arena: Arena::new(),
					roots: HashMap::new(),
					overrides: HashMap::new(),
					scope: Vec::new(),
					handles: RcHashMap::new(),
				})
			}),
		}
	}

	/// Reconciles `spec` against whatever was previously rendered into
	/// `target`, mutating `target`'s children minimally. The first render
	/// into a non-empty target adopts its existing children, so rendering
	/// onto parsed server markup reuses matching nodes instead of replacing
	/// them. Returns the root's first real node (or `target` itself when the
	/// root resolves to nothing).
	pub fn render(&self, target: &RealNode, spec: Spec) -> Result<RealNode, Error> {
		let mut inner = self.inner.try_borrow_mut().map_err(|_| Error::Reentrant)?;
		inner.render(target, spec)
	}

	/// Detaches the tree previously rendered into `target`, firing the full
	/// detach lifecycle, and clears its bookkeeping. A no-op for targets
	/// never rendered into.
	pub fn teardown(&self, target: &RealNode) -> Result<(), Error> {
		let mut inner = self.inner.try_borrow_mut().map_err(|_| Error::Reentrant)?;
		inner.teardown(target)
	}

	/// Out-of-band imperative update: forces one specific live node to match
	/// `spec`, updating in place when it is compatible and replacing it
	/// otherwise. Stateless — nothing is remembered for later renders.
	pub fn sync(&self, node: &RealNode, spec: Spec) -> Result<RealNode, Error> {
		let mut inner = self.inner.try_borrow_mut().map_err(|_| Error::Reentrant)?;
		inner.sync(node, spec)
	}

	/// Registers `overrides` for `component`; they are consulted while that
	/// component's subtree reconciles. Repeat registrations stack, most
	/// recent first.
	pub fn extend(&self, component: &Component, overrides: Overrides) -> Result<(), Error> {
		let mut inner = self.inner.try_borrow_mut().map_err(|_| Error::Reentrant)?;
		inner.overrides.entry(component.addr()).or_insert_with(Vec::new).push(Rc::new(overrides));
		Ok(())
	}
}

impl Default for Differ {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Differ {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Differ({:p})", Rc::as_ptr(&self.inner))
	}
}

/// Re-renders one component instance in place, from outside the render call
/// that produced it (an event listener, a timer callback).
#[derive(Clone)]
pub struct Refresh {
	inner: Weak<RefCell<Inner>>,
	id: VNodeId,
}

impl Refresh {
	/// Re-invokes the component and reconciles only its own subtree against
	/// its previous output.
	///
	/// # Errors
	///
	/// [`Error::RefreshLoop`] when called while a reconcile pass is active
	/// on the owning differ — which includes the component's own render
	/// body.
	pub fn trigger(&self) -> Result<(), Error> {
		let inner = match self.inner.upgrade() {
			Some(inner) => inner,
			None => {
				warn!("Refresh triggered after its differ was dropped; ignoring");
				return Ok(());
			}
		};
		let mut inner = inner.try_borrow_mut().map_err(|_| Error::RefreshLoop)?;
		inner.refresh(self.id)
	}
}

impl fmt::Debug for Refresh {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Refresh({:?})", self.id)
	}
}

/// Insertion point for the node currently being reconciled: the real parent
/// and the child index the next real node belongs at. Transparent wrappers
/// pass it through unchanged; every node advances it by however many real
/// nodes it resolved to.
struct Cursor {
	parent: RealNode,
	index: usize,
}

struct Inner {
	self_weak: Weak<RefCell<Inner>>,
	arena: Arena,
	roots: HashMap<usize, (RealNode, VNodeId)>,
	overrides: HashMap<usize, Vec<Rc<Overrides>>>,
	/// Component identities currently executing, outermost first.
	scope: Vec<usize>,
	handles: RcHashMap<usize, u16, EventHandler>,
}

impl Inner {
	fn render(&mut self, target: &RealNode, spec: Spec) -> Result<RealNode, Error> {
		let span = trace_span!("render", target = ?target);
		let _enter = span.enter();

		if !target.is_element() {
			return Err(Error::NotAnElement {
				what: "render",
				found: "a non-element target",
			});
		}
		validate(&spec)?;
		self.scope.clear();

		let root = match self.roots.get(&target.addr()).map(|(_, id)| *id) {
			Some(root) => {
				let mut cursor = Cursor {
					parent: target.clone(),
					index: 0,
				};
				self.reconcile_slot(&spec, Some(root), None, &mut cursor)?
			}
			None => {
				// First render into this target: adopt whatever it already
				// holds so compatible nodes survive.
				let adopted: Vec<VNodeId> = target.children().iter().filter_map(|child| self.adopt(child, None, target)).collect();
				let specs = [spec];
				let mut cursor = Cursor {
					parent: target.clone(),
					index: 0,
				};
				let ids = self.reconcile_children(&specs, adopted, None, &mut cursor)?;
				ids[0]
			}
		};

		self.roots.insert(target.addr(), (target.clone(), root));
		self.finish_pass();
		Ok(self.arena.first_real(root).unwrap_or_else(|| target.clone()))
	}

	fn teardown(&mut self, target: &RealNode) -> Result<(), Error> {
		let span = trace_span!("teardown", target = ?target);
		let _enter = span.enter();

		match self.roots.remove(&target.addr()) {
			Some((_, root)) => {
				self.teardown_node(root, true);
				self.finish_pass();
				Ok(())
			}
			None => {
				warn!("Nothing was rendered into {:?}; ignoring", target);
				Ok(())
			}
		}
	}

	fn sync(&mut self, node: &RealNode, spec: Spec) -> Result<RealNode, Error> {
		let span = trace_span!("sync", node = ?node);
		let _enter = span.enter();

		validate(&spec)?;
		self.scope.clear();

		let detached_target = node.parent().is_none();
		let anchor = node.parent().unwrap_or_else(|| RealNode::create_element("template"));
		let index = node.child_index().unwrap_or(0);
		let adopted = self.adopt(node, None, &anchor);
		let mut cursor = Cursor {
			parent: anchor,
			index,
		};
		let root = self.reconcile_slot(&spec, adopted, None, &mut cursor)?;
		let result = self.arena.first_real(root);
		self.release(root);
		self.finish_pass();

		match result {
			Some(real) => {
				if detached_target && !real.same_node(node) {
					warn!("sync target had no parent; returning a detached replacement");
					real.detach();
				}
				Ok(real)
			}
			None => {
				trace!("sync resolved to no real node");
				Ok(node.clone())
			}
		}
	}

	/// Localized re-render for [`Refresh`].
	fn refresh(&mut self, id: VNodeId) -> Result<(), Error> {
		let span = trace_span!("refresh", id = ?id);
		let _enter = span.enter();

		if !self.arena.contains(id) {
			warn!("Refresh for a component that is no longer mounted; ignoring");
			return Ok(());
		}
		let spec = match &self.arena.get(id).kind {
			VKind::Component { spec, .. } => spec.clone(),
			_ => {
				error!("Refresh target is not a component; ignoring");
				return Ok(());
			}
		};

		// Rebuild the component-ancestor scope so overrides apply exactly as
		// they would mid-recursion.
		self.scope.clear();
		let mut ancestors = Vec::new();
		let mut cursor_id = self.arena.get(id).parent;
		while let Some(parent_id) = cursor_id {
			if let VKind::Component { spec, .. } = &self.arena.get(parent_id).kind {
				ancestors.push(spec.component.addr());
			}
			cursor_id = self.arena.get(parent_id).parent;
		}
		ancestors.reverse();
		self.scope = ancestors;

		let mut cursor = Cursor {
			parent: self.arena.get(id).parent_real.clone(),
			index: self.arena.position(id),
		};
		self.update_component(&spec, id, &mut cursor)?;
		self.finish_pass();
		Ok(())
	}

	/// Drains fully released handler handles and logs ledger stats, as the
	/// tail of every pass.
	fn finish_pass(&mut self) {
		let drained = self.handles.drain_weak().count();
		trace!("Freed {} event handler handle(s).", drained);
		info!("Event handler count/cached capacity: {}/{}", self.handles.len(), self.handles.capacity());
	}

	// === matching =========================================================

	fn spec_matches(&self, spec: &Spec, id: VNodeId) -> bool {
		match (spec, &self.arena.get(id).kind) {
			(Spec::Element(element), VKind::Element { tag, .. }) => element.tag == *tag,
			(Spec::Component(new), VKind::Component { spec: old, .. }) => new.component == old.component,
			(Spec::Text(_), VKind::Text { .. })
			| (Spec::Null, VKind::Null)
			| (Spec::Many(_), VKind::Many { .. })
			| (Spec::Real(_), VKind::External { .. }) => true,
			_ => false,
		}
	}

	/// Pairs new children against old ones: explicit keys look up the old
	/// keyed map, unkeyed children consume the old unkeyed queue in order. A
	/// candidate that does not [`Inner::spec_matches`] is orphaned rather
	/// than paired.
	fn pair_children(&self, new: &[Spec], old: &[VNodeId]) -> Result<(Vec<Option<VNodeId>>, Vec<VNodeId>), Error> {
		let mut new_keys = HashSet::new();
		for spec in new {
			if let Some(key) = spec_key(spec)? {
				if !new_keys.insert(key.clone()) {
					return Err(Error::DuplicateKey { key });
				}
			}
		}

		let mut keyed: HashMap<Key, VNodeId> = HashMap::new();
		let mut unkeyed: VecDeque<VNodeId> = VecDeque::new();
		for &id in old {
			match self.arena.get(id).key.clone() {
				Some(key) => {
					if keyed.insert(key.clone(), id).is_some() {
						error!("Duplicate key {:?} among previous children; keeping the later one", key);
					}
				}
				None => unkeyed.push_back(id),
			}
		}

		let mut pairs = Vec::with_capacity(new.len());
		for spec in new {
			let candidate = match spec_key(spec)? {
				Some(key) => keyed.remove(&key),
				None => unkeyed.pop_front(),
			};
			let matched = match candidate {
				Some(id) if self.spec_matches(spec, id) => Some(id),
				Some(id) => {
					trace!("Slot collision with incompatible node; orphaning {:?}", id);
					None
				}
				None => None,
			};
			pairs.push(matched);
		}

		let used: HashSet<VNodeId> = pairs.iter().filter_map(|matched| *matched).collect();
		let leftovers = old.iter().copied().filter(|id| !used.contains(id)).collect();
		Ok((pairs, leftovers))
	}

	// === recursion ========================================================

	fn reconcile_children(&mut self, new: &[Spec], old: Vec<VNodeId>, parent: Option<VNodeId>, cursor: &mut Cursor) -> Result<Vec<VNodeId>, Error> {
		let (pairs, leftovers) = self.pair_children(new, &old)?;
		let mut out = Vec::with_capacity(new.len());
		for (spec, matched) in new.iter().zip(pairs) {
			if let Some(id) = matched {
				self.ensure_position(id, cursor);
			}
			out.push(self.reconcile_slot(spec, matched, parent, cursor)?);
		}
		for id in leftovers {
			self.teardown_node(id, true);
		}
		Ok(out)
	}

	fn reconcile_slot(&mut self, spec: &Spec, old: Option<VNodeId>, parent: Option<VNodeId>, cursor: &mut Cursor) -> Result<VNodeId, Error> {
		if let Some(old_id) = old {
			if self.spec_matches(spec, old_id) {
				self.arena.get_mut(old_id).key = spec_key(spec)?;
				self.update_node(spec, old_id, cursor)?;
				return Ok(old_id);
			}
			// Mismatch: the old subtree is fully removed before the new one
			// is built, so real-node identities never collide.
			self.teardown_node(old_id, true);
		}
		self.attach_node(spec, parent, cursor)
	}

	/// Moves a matched node's real nodes to the cursor if they are not
	/// already there; reordering is detach + reinsert, never recreate.
	fn ensure_position(&self, id: VNodeId, cursor: &Cursor) {
		let reals = self.arena.real_nodes(id);
		if reals.is_empty() {
			return;
		}
		let placed = reals.iter().enumerate().all(|(offset, real)| {
			real.parent().map_or(false, |parent| parent.same_node(&cursor.parent)) && real.child_index() == Some(cursor.index + offset)
		});
		if placed {
			return;
		}
		trace!("Moving {} real node(s) to index {}", reals.len(), cursor.index);
		for real in &reals {
			real.detach();
		}
		for (offset, real) in reals.iter().enumerate() {
			cursor.parent.insert(cursor.index + offset, real);
		}
	}

	// === attach ===========================================================

	fn attach_node(&mut self, spec: &Spec, parent: Option<VNodeId>, cursor: &mut Cursor) -> Result<VNodeId, Error> {
		let key = spec_key(spec)?;
		match spec {
			Spec::Element(element) => self.attach_element(element, key, parent, cursor),
			Spec::Component(component) => self.attach_component(component, key, parent, cursor),
			Spec::Text(text) => {
				let span = trace_span!("Creating text node");
				let _enter = span.enter();
				let real = RealNode::create_text(text.as_str());
				cursor.parent.insert(cursor.index, &real);
				cursor.index += 1;
				Ok(self.arena.alloc(VNode {
					parent,
					parent_real: cursor.parent.clone(),
					key,
					kind: VKind::Text { text: text.clone(), real },
				}))
			}
			Spec::Null => Ok(self.arena.alloc(VNode {
				parent,
				parent_real: cursor.parent.clone(),
				key,
				kind: VKind::Null,
			})),
			Spec::Real(node) => {
				let span = trace_span!("Adopting external node", node = ?node);
				let _enter = span.enter();
				cursor.parent.insert(cursor.index, node);
				cursor.index += 1;
				Ok(self.arena.alloc(VNode {
					parent,
					parent_real: cursor.parent.clone(),
					key,
					kind: VKind::External { real: node.clone() },
				}))
			}
			Spec::Many(group) => {
				let span = trace_span!("Creating group", items = group.items.len());
				let _enter = span.enter();
				let id = self.arena.alloc(VNode {
					parent,
					parent_real: cursor.parent.clone(),
					key,
					kind: VKind::Many { children: Vec::new() },
				});
				let children = self.reconcile_children(&group.items, Vec::new(), Some(id), cursor)?;
				if let VKind::Many { children: slot } = &mut self.arena.get_mut(id).kind {
					*slot = children;
				}
				Ok(id)
			}
			Spec::Leave => Err(Error::UnsupportedSpec {
				what: "the leave sentinel outside a component return",
			}),
			Spec::Painter(_) => Err(Error::UnsupportedSpec {
				what: "a painter child outside the draw backend",
			}),
		}
	}

	fn attach_element(&mut self, spec: &Rc<ElementSpec>, key: Option<Key>, parent: Option<VNodeId>, cursor: &mut Cursor) -> Result<VNodeId, Error> {
		let span = trace_span!("Creating element", tag = spec.tag.as_str());
		let _enter = span.enter();

		let real = self.create_element(spec, &cursor.parent);
		cursor.parent.insert(cursor.index, &real);
		cursor.index += 1;

		let id = self.arena.alloc(VNode {
			parent,
			parent_real: cursor.parent.clone(),
			key,
			kind: VKind::Element {
				tag: spec.tag.clone(),
				attrs: spec.attrs.clone(),
				real: real.clone(),
				children: Vec::new(),
			},
		});
		self.apply_attrs(&real, None, &spec.attrs);

		let mut inner = Cursor {
			parent: real,
			index: 0,
		};
		let children = self.reconcile_children(&spec.children, Vec::new(), Some(id), &mut inner)?;
		if let VKind::Element { children: slot, .. } = &mut self.arena.get_mut(id).kind {
			*slot = children;
		}
		Ok(id)
	}

	fn attach_component(&mut self, spec: &Rc<ComponentSpec>, key: Option<Key>, parent: Option<VNodeId>, cursor: &mut Cursor) -> Result<VNodeId, Error> {
		let span = trace_span!("Creating component", name = spec.component.name());
		let _enter = span.enter();

		if self.scope.len() >= MAX_UNBOX_DEPTH {
			return Err(Error::DepthLimit { limit: MAX_UNBOX_DEPTH });
		}

		let store = Store::default();
		let id = self.arena.alloc(VNode {
			parent,
			parent_real: cursor.parent.clone(),
			key,
			kind: VKind::Component {
				spec: spec.clone(),
				store: store.clone(),
				child: None,
			},
		});

		let output = match self.run_component(id, spec, None, Vec::new(), cursor.parent.clone()) {
			Spec::Leave => {
				warn!("Component {:?} left on first attach; rendering nothing", spec.component.name());
				Spec::Null
			}
			other => other,
		};
		let result = self.attach_node(&output, Some(id), cursor);
		self.scope.pop();
		let child = result?;
		if let VKind::Component { child: slot, .. } = &mut self.arena.get_mut(id).kind {
			*slot = Some(child);
		}

		let reals = self.arena.real_nodes(id);
		if let Some(attached) = store.attached_fn() {
			attached(&reals);
		}
		Ok(id)
	}

	/// Runs the component function with its execution context. Pushes the
	/// component onto the override scope; the caller pops it after the
	/// child subtree is done.
	fn run_component(&mut self, id: VNodeId, spec: &Rc<ComponentSpec>, prev: Option<Rc<ComponentSpec>>, reals: Vec<RealNode>, parent_real: RealNode) -> Spec {
		let store = match &self.arena.get(id).kind {
			VKind::Component { store, .. } => store.clone(),
			_ => unreachable!("run_component on a non-component vnode"),
		};
		let refresh = Refresh {
			inner: self.self_weak.clone(),
			id,
		};
		let mut ctx = Ctx::new(spec.clone(), prev, store, reals, Some(parent_real), Some(refresh), None);
		self.scope.push(spec.component.addr());
		spec.component.run(&mut ctx)
	}

	// === update ===========================================================

	fn update_node(&mut self, spec: &Spec, id: VNodeId, cursor: &mut Cursor) -> Result<(), Error> {
		match spec {
			Spec::Element(element) => self.update_element(element, id, cursor),
			Spec::Component(component) => self.update_component(component, id, cursor),
			Spec::Text(text) => {
				let real = match &mut self.arena.get_mut(id).kind {
					VKind::Text { text: stored, real } => {
						if *stored == *text {
							None
						} else {
							*stored = text.clone();
							Some(real.clone())
						}
					}
					_ => unreachable!("text spec matched a non-text vnode"),
				};
				if let Some(real) = real {
					real.set_text(text.as_str());
				}
				cursor.index += 1;
				Ok(())
			}
			Spec::Null => Ok(()),
			Spec::Real(node) => {
				let previous = match &self.arena.get(id).kind {
					VKind::External { real } => real.clone(),
					_ => unreachable!("external spec matched a non-external vnode"),
				};
				if !previous.same_node(node) {
					let span = trace_span!("Replacing external node", old = ?previous, new = ?node);
					let _enter = span.enter();
					previous.detach();
					cursor.parent.insert(cursor.index, node);
					if let VKind::External { real } = &mut self.arena.get_mut(id).kind {
						*real = node.clone();
					}
				}
				cursor.index += 1;
				Ok(())
			}
			Spec::Many(group) => {
				let old_children = self.arena.children_of(id);
				let children = self.reconcile_children(&group.items, old_children, Some(id), cursor)?;
				if let VKind::Many { children: slot } = &mut self.arena.get_mut(id).kind {
					*slot = children;
				}
				Ok(())
			}
			Spec::Leave | Spec::Painter(_) => Err(Error::UnsupportedSpec {
				what: "this spec shape in an update slot",
			}),
		}
	}

	fn update_element(&mut self, spec: &Rc<ElementSpec>, id: VNodeId, cursor: &mut Cursor) -> Result<(), Error> {
		let span = trace_span!("Diffing element", tag = spec.tag.as_str());
		let _enter = span.enter();

		let (real, old_attrs, old_children) = match &self.arena.get(id).kind {
			VKind::Element { real, attrs, children, .. } => (real.clone(), attrs.clone(), children.clone()),
			_ => unreachable!("element spec matched a non-element vnode"),
		};

		self.apply_attrs(&real, Some(&old_attrs), &spec.attrs);
		if let VKind::Element { attrs, .. } = &mut self.arena.get_mut(id).kind {
			*attrs = spec.attrs.clone();
		}

		let mut inner = Cursor {
			parent: real,
			index: 0,
		};
		let children = self.reconcile_children(&spec.children, old_children, Some(id), &mut inner)?;
		if let VKind::Element { children: slot, .. } = &mut self.arena.get_mut(id).kind {
			*slot = children;
		}
		cursor.index += 1;
		Ok(())
	}

	fn update_component(&mut self, spec: &Rc<ComponentSpec>, id: VNodeId, cursor: &mut Cursor) -> Result<(), Error> {
		let span = trace_span!("Diffing component", name = spec.component.name());
		let _enter = span.enter();

		if self.scope.len() >= MAX_UNBOX_DEPTH {
			return Err(Error::DepthLimit { limit: MAX_UNBOX_DEPTH });
		}

		let (store, previous, child) = match &self.arena.get(id).kind {
			VKind::Component { spec: old, store, child } => (store.clone(), old.clone(), *child),
			_ => unreachable!("component spec matched a non-component vnode"),
		};
		if let VKind::Component { spec: slot, .. } = &mut self.arena.get_mut(id).kind {
			*slot = spec.clone();
		}

		let reals = self.arena.real_nodes(id);
		let output = self.run_component(id, spec, Some(previous), reals, cursor.parent.clone());
		let result = match output {
			Spec::Leave => {
				// Keep the previous subtree verbatim; just account for its
				// real nodes.
				trace!("Component left; keeping previous subtree");
				cursor.index += self.arena.dom_len(id);
				Ok(())
			}
			other => match self.reconcile_slot(&other, child, Some(id), cursor) {
				Ok(new_child) => {
					if let VKind::Component { child: slot, .. } = &mut self.arena.get_mut(id).kind {
						*slot = Some(new_child);
					}
					Ok(())
				}
				Err(error) => Err(error),
			},
		};
		self.scope.pop();
		result?;

		let reals = self.arena.real_nodes(id);
		if let Some(updated) = store.updated_fn() {
			updated(&reals);
		}
		Ok(())
	}

	// === teardown =========================================================

	fn teardown_node(&mut self, id: VNodeId, remove_real: bool) {
		enum Torn {
			Element {
				real: RealNode,
				attrs: Vec<(String, Value)>,
				children: Vec<VNodeId>,
			},
			Leaf {
				real: Option<RealNode>,
			},
			Many {
				children: Vec<VNodeId>,
			},
			Component {
				store: Store,
				child: Option<VNodeId>,
			},
		}

		let torn = match &self.arena.get(id).kind {
			VKind::Element { real, attrs, children, .. } => Torn::Element {
				real: real.clone(),
				attrs: attrs.clone(),
				children: children.clone(),
			},
			VKind::Text { real, .. } => Torn::Leaf { real: Some(real.clone()) },
			VKind::External { real } => Torn::Leaf { real: Some(real.clone()) },
			VKind::Null => Torn::Leaf { real: None },
			VKind::Many { children } => Torn::Many { children: children.clone() },
			VKind::Component { store, child, .. } => Torn::Component {
				store: store.clone(),
				child: *child,
			},
		};

		match torn {
			Torn::Element { real, attrs, children } => {
				let span = trace_span!("Removing element", element = ?real);
				let _enter = span.enter();
				self.release_listeners(&real, &attrs);
				if remove_real {
					real.detach();
				}
				// Descendants go with their parent; only their bookkeeping
				// and lifecycle remain to be handled.
				for child in children {
					self.teardown_node(child, false);
				}
			}
			Torn::Leaf { real } => {
				if let (true, Some(real)) = (remove_real, real) {
					let span = trace_span!("Removing node", node = ?real);
					let _enter = span.enter();
					real.detach();
				}
			}
			Torn::Many { children } => {
				for child in children {
					self.teardown_node(child, remove_real);
				}
			}
			Torn::Component { store, child } => {
				let span = trace_span!("Removing component");
				let _enter = span.enter();
				let reals = self.arena.real_nodes(id);
				if let Some(child) = child {
					self.teardown_node(child, remove_real);
				}
				if let Some(detached) = store.detached_fn() {
					detached(&reals);
				}
			}
		}
		self.arena.free(id);
	}

	fn release_listeners(&mut self, element: &RealNode, attrs: &[(String, Value)]) {
		let mut cx = AttrCx {
			chain: &[],
			handles: &mut self.handles,
		};
		for (name, value) in attrs {
			if let (Some(event), Value::Handler(handler)) = (attrs::event_name(name), value) {
				attrs::detach_listener(&mut cx, element, event, handler);
			}
		}
	}

	/// Frees a subtree's arena entries without lifecycle or live-tree
	/// effects; `sync` uses this because it keeps nothing across calls.
	fn release(&mut self, id: VNodeId) {
		for child in self.arena.children_of(id) {
			self.release(child);
		}
		self.arena.free(id);
	}

	// === backends for element creation and attributes =====================

	fn create_element(&mut self, spec: &ElementSpec, parent: &RealNode) -> RealNode {
		let chain = self.active_chain();
		let call = CreateElement { spec, parent };
		for overrides in &chain {
			if let Some(real) = overrides.create_element(&call) {
				trace!("Element <{}> created by an override", spec.tag);
				return real;
			}
		}
		let namespace = if spec.tag.eq_ignore_ascii_case("svg") {
			Namespace::Svg
		} else {
			parent.namespace().unwrap_or(Namespace::Html)
		};
		RealNode::create_element_ns(namespace, spec.tag.as_str())
	}

	fn apply_attrs(&mut self, element: &RealNode, old: Option<&[(String, Value)]>, new: &[(String, Value)]) {
		let chain = self.active_chain();
		let mut cx = AttrCx {
			chain: &chain,
			handles: &mut self.handles,
		};
		if let Some(old_attrs) = old {
			for (name, value) in old_attrs {
				if name == "key" {
					continue;
				}
				if !new.iter().any(|(n, _)| n == name) {
					attrs::apply_attribute(&mut cx, element, name, None, Some(value));
				}
			}
		}
		for (name, value) in new {
			if name == "key" {
				continue;
			}
			let previous = old.and_then(|old_attrs| old_attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v));
			if previous == Some(value) {
				continue;
			}
			attrs::apply_attribute(&mut cx, element, name, Some(value), previous);
		}
	}

	/// The override chain in effect right now: innermost executing component
	/// first, most recent registration first within each.
	fn active_chain(&self) -> Vec<Rc<Overrides>> {
		let mut chain = Vec::new();
		for addr in self.scope.iter().rev() {
			if let Some(sets) = self.overrides.get(addr) {
				for set in sets.iter().rev() {
					chain.push(set.clone());
				}
			}
		}
		chain
	}

	// === adoption =========================================================

	/// Virtualizes an existing real node so the next reconcile can match
	/// against it. Comments are serializer placeholders: the comment node is
	/// dropped (live nulls render nothing), but a null vnode keeps the slot
	/// so positional matching of the siblings stays aligned.
	fn adopt(&mut self, node: &RealNode, parent: Option<VNodeId>, parent_real: &RealNode) -> Option<VNodeId> {
		if node.is_comment() {
			trace!("Dropping adopted comment {:?}", node);
			node.detach();
			return Some(self.arena.alloc(VNode {
				parent,
				parent_real: parent_real.clone(),
				key: None,
				kind: VKind::Null,
			}));
		}
		if node.is_text() {
			return Some(self.arena.alloc(VNode {
				parent,
				parent_real: parent_real.clone(),
				key: None,
				kind: VKind::Text {
					text: node.text().unwrap_or_default(),
					real: node.clone(),
				},
			}));
		}

		let attrs = load::load_attributes(node);
		let key = attrs.iter().find(|(name, _)| name == "key").and_then(|(_, value)| value.key().ok());
		let id = self.arena.alloc(VNode {
			parent,
			parent_real: parent_real.clone(),
			key,
			kind: VKind::Element {
				tag: node.tag().unwrap_or_default(),
				attrs,
				real: node.clone(),
				children: Vec::new(),
			},
		});
		let children: Vec<VNodeId> = node.children().iter().filter_map(|child| self.adopt(child, Some(id), node)).collect();
		if let VKind::Element { children: slot, .. } = &mut self.arena.get_mut(id).kind {
			*slot = children;
		}
		Some(id)
	}
}

/// Upfront walk over an author-supplied spec tree: duplicate or malformed
/// keys and backend-foreign shapes fail here, before any real-node mutation.
fn validate(spec: &Spec) -> Result<(), Error> {
	match spec {
		Spec::Element(element) => validate_children(&element.children),
		Spec::Many(group) => validate_children(&group.items),
		Spec::Component(component) => validate_children(&component.children),
		Spec::Leave => Err(Error::UnsupportedSpec {
			what: "the leave sentinel outside a component return",
		}),
		Spec::Painter(_) => Err(Error::UnsupportedSpec {
			what: "a painter child outside the draw backend",
		}),
		Spec::Text(_) | Spec::Null | Spec::Real(_) => Ok(()),
	}
}

fn validate_children(children: &[Spec]) -> Result<(), Error> {
	let mut seen = HashSet::new();
	for child in children {
		if let Some(key) = spec_key(child)? {
			if !seen.insert(key.clone()) {
				return Err(Error::DuplicateKey { key });
			}
		}
		validate(child)?;
	}
	Ok(())
}
