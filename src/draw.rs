//! The one-shot backend.
//!
//! [`draw`] walks a spec against a caller-supplied context value with no
//! persistent diffing: every call unboxes every component afresh (throwaway
//! stores) and invokes [`Painter`] children with the context in document
//! order. The tree here consists of components, groups, nulls and painters;
//! element and text specs belong to the live and markup backends.

use crate::component::{Ctx, Store};
use crate::diff::MAX_UNBOX_DEPTH;
use crate::error::Error;
use crate::spec::Spec;
use core::any::Any;
use core::fmt;
use std::rc::Rc;
use tracing::{trace_span, warn};

/// A callback child: receives the draw context directly.
#[derive(Clone)]
pub struct Painter(Rc<PainterInner>);

struct PainterInner {
	f: Box<dyn Fn(&mut DrawPass<'_>)>,
}

impl Painter {
	pub fn new(f: impl Fn(&mut DrawPass<'_>) + 'static) -> Self {
		Painter(Rc::new(PainterInner { f: Box::new(f) }))
	}

	fn call(&self, pass: &mut DrawPass<'_>) {
		(self.0.f)(pass)
	}
}

impl fmt::Debug for Painter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Painter({:p})", Rc::as_ptr(&self.0))
	}
}

/// Shorthand for a [`Spec::Painter`] child.
#[must_use]
pub fn painter(f: impl Fn(&mut DrawPass<'_>) + 'static) -> Spec {
	Spec::Painter(Painter::new(f))
}

/// What a painter runs against: the context value passed to [`draw`].
pub struct DrawPass<'a> {
	context: &'a mut dyn Any,
}

impl<'a> DrawPass<'a> {
	/// The context, downcast back to its concrete type.
	pub fn context<T: Any>(&mut self) -> Option<&mut T> {
		self.context.downcast_mut::<T>()
	}
}

/// Walks `spec` once against `context`.
///
/// # Errors
///
/// [`Error::UnsupportedSpec`] for element, text and real-node specs;
/// [`Error::DepthLimit`] for runaway component recursion.
pub fn draw<C: Any>(context: &mut C, spec: &Spec) -> Result<(), Error> {
	let span = trace_span!("draw");
	let _enter = span.enter();
	draw_spec(context, spec, 0)
}

fn draw_spec(context: &mut dyn Any, spec: &Spec, unbox: usize) -> Result<(), Error> {
	match spec {
		Spec::Null => Ok(()),
		Spec::Many(group) => {
			for item in &group.items {
				draw_spec(context, item, unbox)?;
			}
			Ok(())
		}
		Spec::Painter(painter) => {
			let mut pass = DrawPass { context: &mut *context };
			painter.call(&mut pass);
			Ok(())
		}
		Spec::Component(component) => {
			if unbox >= MAX_UNBOX_DEPTH {
				return Err(Error::DepthLimit { limit: MAX_UNBOX_DEPTH });
			}
			let span = trace_span!("Unboxing component", name = component.component.name());
			let _enter = span.enter();
			let output = {
				let mut ctx = Ctx::new(component.clone(), None, Store::default(), Vec::new(), None, None, Some(&mut *context));
				component.component.run(&mut ctx)
			};
			match output {
				Spec::Leave => {
					warn!("Component {:?} left in the draw backend; nothing to keep", component.component.name());
					Ok(())
				}
				output => draw_spec(context, &output, unbox + 1),
			}
		}
		Spec::Element(_) | Spec::Text(_) | Spec::Real(_) => Err(Error::UnsupportedSpec {
			what: "element, text and real-node specs in the draw backend",
		}),
		Spec::Leave => Err(Error::UnsupportedSpec {
			what: "the leave sentinel outside a component return",
		}),
	}
}
