//! The virtual-node arena.
//!
//! Every virtual node gets a stable integer id at creation; real-node links,
//! parent links and component state live in id-indexed storage owned by the
//! driver, so a whole reconcile pass can be exercised without any ambient
//! identity-keyed tables. Matched nodes keep their id across renders, which
//! is what carries component stores forward.

use crate::component::Store;
use crate::dom::RealNode;
use crate::spec::{ComponentSpec, Key, Value};
use std::rc::Rc;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct VNodeId(u32);

pub(crate) struct VNode {
	pub parent: Option<VNodeId>,
	/// The real parent this node's real nodes are (or would be) inserted
	/// under. For transparent wrappers this is inherited from the
	/// surrounding element.
	pub parent_real: RealNode,
	pub key: Option<Key>,
	pub kind: VKind,
}

pub(crate) enum VKind {
	Element {
		tag: String,
		attrs: Vec<(String, Value)>,
		real: RealNode,
		children: Vec<VNodeId>,
	},
	Component {
		spec: Rc<ComponentSpec>,
		store: Store,
		child: Option<VNodeId>,
	},
	Text {
		text: String,
		real: RealNode,
	},
	Null,
	Many {
		children: Vec<VNodeId>,
	},
	External {
		real: RealNode,
	},
}

pub(crate) struct Arena {
	nodes: Vec<Option<VNode>>,
	free: Vec<u32>,
}

impl Arena {
	pub fn new() -> Self {
		Arena {
			nodes: Vec::new(),
			free: Vec::new(),
		}
	}

	pub fn alloc(&mut self, node: VNode) -> VNodeId {
		match self.free.pop() {
			Some(index) => {
				self.nodes[index as usize] = Some(node);
				VNodeId(index)
			}
			None => {
				self.nodes.push(Some(node));
				VNodeId((self.nodes.len() - 1) as u32)
			}
		}
	}

	pub fn free(&mut self, id: VNodeId) {
		self.nodes[id.0 as usize] = None;
		self.free.push(id.0);
	}

	pub fn contains(&self, id: VNodeId) -> bool {
		matches!(self.nodes.get(id.0 as usize), Some(Some(_)))
	}

	pub fn get(&self, id: VNodeId) -> &VNode {
		self.nodes[id.0 as usize].as_ref().expect("stale vnode id")
	}

	pub fn get_mut(&mut self, id: VNodeId) -> &mut VNode {
		self.nodes[id.0 as usize].as_mut().expect("stale vnode id")
	}

	/// Direct virtual children, across all variants.
	pub fn children_of(&self, id: VNodeId) -> Vec<VNodeId> {
		match &self.get(id).kind {
			VKind::Element { children, .. } | VKind::Many { children, .. } => children.clone(),
			VKind::Component { child, .. } => child.iter().copied().collect(),
			VKind::Text { .. } | VKind::Null | VKind::External { .. } => Vec::new(),
		}
	}

	/// How many real nodes this virtual node currently resolves to.
	/// Transparent wrappers delegate, so the answer can change size across
	/// updates.
	pub fn dom_len(&self, id: VNodeId) -> usize {
		match &self.get(id).kind {
			VKind::Element { .. } | VKind::Text { .. } | VKind::External { .. } => 1,
			VKind::Null => 0,
			VKind::Many { children } => children.iter().map(|&child| self.dom_len(child)).sum(),
			VKind::Component { child, .. } => child.map_or(0, |child| self.dom_len(child)),
		}
	}

	pub fn collect_real(&self, id: VNodeId, out: &mut Vec<RealNode>) {
		match &self.get(id).kind {
			VKind::Element { real, .. } | VKind::Text { real, .. } | VKind::External { real } => out.push(real.clone()),
			VKind::Null => (),
			VKind::Many { children } => {
				for &child in children {
					self.collect_real(child, out);
				}
			}
			VKind::Component { child, .. } => {
				if let Some(child) = *child {
					self.collect_real(child, out);
				}
			}
		}
	}

	pub fn real_nodes(&self, id: VNodeId) -> Vec<RealNode> {
		let mut out = Vec::new();
		self.collect_real(id, &mut out);
		out
	}

	pub fn first_real(&self, id: VNodeId) -> Option<RealNode> {
		self.real_nodes(id).into_iter().next()
	}

	/// Index within `parent_real`'s child list where this node's first real
	/// node belongs, whether or not it currently owns any.
	pub fn position(&self, id: VNodeId) -> usize {
		let node = self.get(id);
		let parent_id = match node.parent {
			None => return 0,
			Some(parent_id) => parent_id,
		};
		let parent = self.get(parent_id);
		let (base, siblings) = match &parent.kind {
			VKind::Element { children, .. } => (0, children.as_slice()),
			VKind::Many { children } => (self.position(parent_id), children.as_slice()),
			VKind::Component { .. } => (self.position(parent_id), &[][..]),
			VKind::Text { .. } | VKind::Null | VKind::External { .. } => (0, &[][..]),
		};
		let mut index = base;
		for &sibling in siblings {
			if sibling == id {
				break;
			}
			index += self.dom_len(sibling);
		}
		index
	}
}
