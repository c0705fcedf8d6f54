//! A virtual-tree reconciliation engine.
//!
//! Given a declarative [`Spec`] of a desired tree, [`Differ::render`]
//! computes the minimal set of mutations that brings a live node tree into
//! agreement with it — preserving the identity of unchanged subtrees,
//! matching keyed children across reorders, and carrying component-local
//! state and lifecycle callbacks across updates. The same spec model also
//! feeds a markup serializer ([`stringify`]) and a one-shot draw backend
//! ([`draw`]).
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod attrs;
pub mod component;
pub mod diff;
pub mod dom;
pub mod draw;
pub mod error;
pub mod load;
pub mod markup;
pub mod plugins;
pub mod spec;

mod rc_hash_map;
mod vnode;

pub use component::{Component, Ctx, Store};
pub use diff::{Differ, Refresh};
pub use dom::{Event, EventHandler, Namespace, RealNode};
pub use draw::{draw, painter, DrawPass, Painter};
pub use error::Error;
pub use markup::{parse, stringify, StringifyOptions};
pub use plugins::{CreateElement, Overrides, SetAttribute};
pub use spec::{el, keyed, many, ComponentSpec, ElementSpec, Key, ManySpec, Spec, Value};
