//! Default attribute assignment, plus the `class`/`style` string builders.
//!
//! Assignment is the bottom of the override chain (see [`crate::plugins`]):
//! `null`/`false` mean absence, `true` means bare presence, `class` lists
//! and `style` maps expand to strings, `on*` handler values attach and
//! detach live event listeners, and everything else is coerced to a string.

use crate::dom::{EventHandler, RealNode};
use crate::plugins::{Overrides, SetAttribute};
use crate::rc_hash_map::RcHashMap;
use crate::spec::Value;
use std::rc::Rc;
use tracing::{error, trace, warn};

/// Builds a `class` attribute string: strings are included, lists flatten,
/// map entries are included when their value is truthy.
#[must_use]
pub fn classes(value: &Value) -> String {
	let mut out = Vec::new();
	collect_classes(value, &mut out);
	out.join(" ")
}

fn collect_classes(value: &Value, out: &mut Vec<String>) {
	match value {
		Value::Str(name) => {
			if !name.is_empty() {
				out.push(name.clone());
			}
		}
		Value::List(items) => {
			for item in items {
				collect_classes(item, out);
			}
		}
		Value::Map(entries) => {
			for (name, condition) in entries {
				if is_truthy(condition) {
					out.push(name.clone());
				}
			}
		}
		Value::Null | Value::Bool(false) => (),
		other => warn!("Ignoring {} in a class list", other.kind_name()),
	}
}

/// Builds a `style` attribute string from a map; `null`/`false` entries are
/// skipped.
#[must_use]
pub fn styles(value: &Value) -> String {
	match value {
		Value::Str(style) => style.clone(),
		Value::Map(entries) => entries
			.iter()
			.filter_map(|(name, value)| css_value(value).map(|value| format!("{}: {}", name, value)))
			.collect::<Vec<_>>()
			.join("; "),
		other => {
			warn!("Ignoring {} as a style value", other.kind_name());
			String::new()
		}
	}
}

fn css_value(value: &Value) -> Option<String> {
	match value {
		Value::Null | Value::Bool(false) => None,
		Value::Int(int) => Some(int.to_string()),
		Value::Float(float) => Some(float.to_string()),
		Value::Str(string) => Some(string.clone()),
		other => {
			warn!("Ignoring {} as a style entry", other.kind_name());
			None
		}
	}
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null | Value::Bool(false) => false,
		Value::Bool(true) | Value::Handler(_) => true,
		Value::Int(int) => *int != 0,
		Value::Float(float) => *float != 0.0,
		Value::Str(string) => !string.is_empty(),
		Value::List(items) => !items.is_empty(),
		Value::Map(entries) => !entries.is_empty(),
	}
}

/// The serialized form an attribute value takes, `None` meaning the
/// attribute is absent. Shared between the live backend and the markup
/// serializer so both agree on coercion.
pub(crate) fn attr_string(name: &str, value: &Value) -> Option<String> {
	match value {
		Value::Null | Value::Bool(false) => None,
		Value::Bool(true) => Some(String::new()),
		Value::Int(int) => Some(int.to_string()),
		Value::Float(float) => Some(float.to_string()),
		Value::Str(string) => Some(string.clone()),
		Value::List(_) => Some(classes(value)),
		Value::Map(_) => {
			if name == "style" {
				Some(styles(value))
			} else {
				warn!("Map value for attribute {:?} is only meaningful on `style`; skipping", name);
				None
			}
		}
		Value::Handler(_) => {
			warn!("Handler value for non-event attribute {:?}; skipping", name);
			None
		}
	}
}

/// `on*` attribute names address event listeners when their value is a
/// handler.
pub(crate) fn event_name(name: &str) -> Option<&str> {
	let event = name.strip_prefix("on")?;
	if event.is_empty() {
		None
	} else {
		Some(event)
	}
}

fn as_handler(value: &Value) -> Option<&EventHandler> {
	match value {
		Value::Handler(handler) => Some(handler),
		_ => None,
	}
}

/// Capabilities the attribute step runs with: the active override chain
/// (innermost component first) and the differ's handler-handle ledger.
pub(crate) struct AttrCx<'a> {
	pub chain: &'a [Rc<Overrides>],
	pub handles: &'a mut RcHashMap<usize, u16, EventHandler>,
}

pub(crate) fn apply_attribute(cx: &mut AttrCx<'_>, element: &RealNode, name: &str, new: Option<&Value>, old: Option<&Value>) {
	let call = SetAttribute { element, name, new, old };
	for overrides in cx.chain {
		if overrides.set_attribute(&call) {
			trace!("Attribute {:?} claimed by an override", name);
			return;
		}
	}

	if let Some(event) = event_name(name) {
		let old_handler = old.and_then(as_handler);
		let new_handler = new.and_then(as_handler);
		if old_handler.is_some() || new_handler.is_some() {
			if let (Some(previous), Some(next)) = (old_handler, new_handler) {
				if previous == next {
					return;
				}
			}
			if let Some(handler) = old_handler {
				detach_listener(cx, element, event, handler);
			}
			if let Some(handler) = new_handler {
				attach_listener(cx, element, event, handler);
			}
			return;
		}
		// An `on*` name with a non-handler value is a plain attribute.
	}

	match new.and_then(|value| attr_string(name, value)) {
		Some(string) => element.set_attribute(name, string),
		None => {
			if element.attribute(name).is_some() {
				if let (Some(expected), Some(actual)) = (old.and_then(|value| attr_string(name, value)), element.attribute(name)) {
					if expected != actual {
						warn!("Unexpected value of removed attribute {:?}: expected {:?} but found {:?}", name, expected, actual);
					}
				}
				element.remove_attribute(name);
			}
		}
	}
}

pub(crate) fn attach_listener(cx: &mut AttrCx<'_>, element: &RealNode, event: &str, handler: &EventHandler) {
	element.add_listener(event, handler.clone());
	if cx.handles.increment_or_insert_with(handler.addr(), || handler.clone()).is_err() {
		error!("Too many (more than 65k) live bindings for one event handler");
	}
}

pub(crate) fn detach_listener(cx: &mut AttrCx<'_>, element: &RealNode, event: &str, handler: &EventHandler) {
	element.remove_listener(event, handler);
	match cx.handles.weak_decrement(&handler.addr()) {
		Ok(Some(_)) => (),
		Ok(None) => error!("Tried to release an event handler that was never tracked"),
		Err(_) => error!("Tried to release an event handler more often than it was bound"),
	}
}
