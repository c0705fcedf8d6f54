//! The textual backend: serialize specs to markup, and parse fragments back
//! into live nodes for adoption round-trips.
//!
//! Serialization unboxes every component eagerly with a throwaway store and
//! applies the same attribute coercion as the live backend (`on*` handlers
//! and the reserved `key` prop are skipped). Failures inside one subtree
//! degrade to an empty `<!---->` placeholder so the rest of the document is
//! unaffected — the one place in the engine without a fail-fast contract.

use crate::attrs::{attr_string, event_name};
use crate::component::{Ctx, Store};
use crate::diff::MAX_UNBOX_DEPTH;
use crate::dom::{Namespace, RealNode};
use crate::error::Error;
use crate::spec::{ElementSpec, Spec, Value};
use std::rc::Rc;
use tracing::{trace_span, warn};

/// Tags serialized without content or a closing tag.
const VOID_TAGS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

fn is_void(tag: &str) -> bool {
	VOID_TAGS.iter().any(|void| tag.eq_ignore_ascii_case(void))
}

pub struct StringifyOptions {
	/// One level of indentation; four spaces by default.
	pub indent_unit: String,
	/// Indentation level the root is written at.
	pub start_depth: usize,
}

impl Default for StringifyOptions {
	fn default() -> Self {
		StringifyOptions {
			indent_unit: "    ".to_string(),
			start_depth: 0,
		}
	}
}

/// Serializes `spec` to markup. Elements whose children are all text render
/// inline; any other child list puts each child on its own line one level
/// deeper. Null specs become `<!---->` placeholders.
#[must_use]
pub fn stringify(spec: &Spec, options: &StringifyOptions) -> String {
	let span = trace_span!("stringify");
	let _enter = span.enter();

	let mut items = Vec::new();
	if let Err(error) = resolve_into(spec, &mut items, 0) {
		warn!("Serialization failed ({}); emitting a placeholder", error);
		items.clear();
		items.push(Resolved::Placeholder);
	}

	let mut out = String::new();
	for (index, item) in items.iter().enumerate() {
		if index > 0 {
			out.push('\n');
		}
		push_indent(&mut out, options, options.start_depth);
		write_resolved(item, options.start_depth, &mut out, options);
	}
	out
}

/// What a spec position resolves to once groups are flattened and
/// components unboxed.
enum Resolved {
	Element(Rc<ElementSpec>),
	Text(String),
	Placeholder,
	Real(RealNode),
}

fn resolve_into(spec: &Spec, out: &mut Vec<Resolved>, unbox: usize) -> Result<(), Error> {
	match spec {
		Spec::Element(element) => out.push(Resolved::Element(element.clone())),
		Spec::Text(text) => out.push(Resolved::Text(text.clone())),
		Spec::Null => out.push(Resolved::Placeholder),
		Spec::Real(node) => out.push(Resolved::Real(node.clone())),
		Spec::Many(group) => {
			for item in &group.items {
				resolve_into(item, out, unbox)?;
			}
		}
		Spec::Component(component) => {
			if unbox >= MAX_UNBOX_DEPTH {
				return Err(Error::DepthLimit { limit: MAX_UNBOX_DEPTH });
			}
			let span = trace_span!("Unboxing component", name = component.component.name());
			let _enter = span.enter();
			let mut ctx = Ctx::new(component.clone(), None, Store::default(), Vec::new(), None, None, None);
			match component.component.run(&mut ctx) {
				Spec::Leave => {
					warn!("Component {:?} left during serialization; emitting a placeholder", component.component.name());
					out.push(Resolved::Placeholder);
				}
				output => resolve_into(&output, out, unbox + 1)?,
			}
		}
		Spec::Painter(_) => {
			return Err(Error::UnsupportedSpec {
				what: "a painter child in the markup backend",
			})
		}
		Spec::Leave => {
			return Err(Error::UnsupportedSpec {
				what: "the leave sentinel outside a component return",
			})
		}
	}
	Ok(())
}

fn write_resolved(item: &Resolved, depth: usize, out: &mut String, options: &StringifyOptions) {
	match item {
		Resolved::Element(element) => write_element(element, depth, out, options),
		Resolved::Text(text) => out.push_str(&escape(text)),
		Resolved::Placeholder => out.push_str("<!---->"),
		Resolved::Real(node) => write_real(node, depth, out, options),
	}
}

fn write_element(element: &ElementSpec, depth: usize, out: &mut String, options: &StringifyOptions) {
	out.push('<');
	out.push_str(&element.tag);
	for (name, value) in &element.attrs {
		if name == "key" {
			continue;
		}
		if event_name(name).is_some() && matches!(value, Value::Handler(_)) {
			continue;
		}
		if let Some(string) = attr_string(name, value) {
			write_attr(out, name, &string);
		}
	}
	out.push('>');

	if is_void(&element.tag) {
		if !element.children.is_empty() {
			warn!("Void tag <{}> given children; skipping them", element.tag);
		}
		return;
	}

	// Each child degrades independently: one bad subtree costs one
	// placeholder, not the document.
	let mut items = Vec::new();
	for child in &element.children {
		let checkpoint = items.len();
		if let Err(error) = resolve_into(child, &mut items, 0) {
			warn!("Serialization failed below <{}> ({}); emitting a placeholder", element.tag, error);
			items.truncate(checkpoint);
			items.push(Resolved::Placeholder);
		}
	}

	write_body(&items, &element.tag, depth, out, options);
}

fn write_body(items: &[Resolved], tag: &str, depth: usize, out: &mut String, options: &StringifyOptions) {
	if items.is_empty() {
		out.push_str("</");
		out.push_str(tag);
		out.push('>');
		return;
	}
	if items.iter().all(|item| matches!(item, Resolved::Text(_))) {
		for item in items {
			write_resolved(item, depth, out, options);
		}
	} else {
		for item in items {
			out.push('\n');
			push_indent(out, options, depth + 1);
			write_resolved(item, depth + 1, out, options);
		}
		out.push('\n');
		push_indent(out, options, depth);
	}
	out.push_str("</");
	out.push_str(tag);
	out.push('>');
}

/// Serializes a live node in its current state.
fn write_real(node: &RealNode, depth: usize, out: &mut String, options: &StringifyOptions) {
	if node.is_text() {
		return out.push_str(&escape(&node.text().unwrap_or_default()));
	}
	if node.is_comment() {
		out.push_str("<!--");
		out.push_str(&node.text().unwrap_or_default());
		out.push_str("-->");
		return;
	}
	let tag = node.tag().unwrap_or_default();
	out.push('<');
	out.push_str(&tag);
	for (name, value) in node.attributes() {
		write_attr(out, &name, &value);
	}
	out.push('>');
	if is_void(&tag) {
		return;
	}
	let children = node.children();
	let items: Vec<Resolved> = children
		.iter()
		.map(|child| {
			if child.is_text() {
				Resolved::Text(child.text().unwrap_or_default())
			} else {
				Resolved::Real(child.clone())
			}
		})
		.collect();
	write_body(&items, &tag, depth, out, options);
}

fn write_attr(out: &mut String, name: &str, value: &str) {
	out.push(' ');
	out.push_str(name);
	if !value.is_empty() {
		out.push_str("=\"");
		out.push_str(&escape(value));
		out.push('"');
	}
}

fn push_indent(out: &mut String, options: &StringifyOptions, depth: usize) {
	for _ in 0..depth {
		out.push_str(&options.indent_unit);
	}
}

fn escape(text: &str) -> String {
	text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn unescape(text: &str) -> String {
	text.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&amp;", "&")
}

/// Parses a markup fragment into live nodes.
///
/// Understands exactly what [`stringify`] emits plus the common authoring
/// variations: quoted and unquoted attribute values, bare attributes,
/// comments, void and self-closing tags. Whitespace-only text between
/// elements is dropped so pretty-printed markup adopts cleanly.
pub fn parse(input: &str) -> Result<Vec<RealNode>, Error> {
	let span = trace_span!("parse", len = input.len());
	let _enter = span.enter();

	let mut parser = Parser { input, pos: 0 };
	let mut roots = Vec::new();
	let mut stack: Vec<RealNode> = Vec::new();

	while parser.pos < parser.input.len() {
		if parser.eat("<!--") {
			let data = parser.take_until("-->")?;
			let node = RealNode::create_comment(data);
			append(&mut roots, &stack, &node);
			continue;
		}
		if parser.eat("</") {
			let name = parser.take_name();
			parser.skip_whitespace();
			if !parser.eat(">") {
				return Err(parser.error("expected `>` after closing tag name"));
			}
			match stack.pop() {
				Some(open) if open.tag().map_or(false, |tag| tag.eq_ignore_ascii_case(&name)) => (),
				Some(_) | None => return Err(parser.error("mismatched closing tag")),
			}
			continue;
		}
		if parser.peek_element_open() {
			parser.pos += 1;
			let name = parser.take_name();
			if name.is_empty() {
				return Err(parser.error("expected a tag name"));
			}
			let namespace = if name.eq_ignore_ascii_case("svg") {
				Namespace::Svg
			} else {
				stack.last().and_then(RealNode::namespace).unwrap_or(Namespace::Html)
			};
			let node = RealNode::create_element_ns(namespace, name.as_str());
			let self_closed = parser.take_attributes(&node)?;
			append(&mut roots, &stack, &node);
			if !self_closed && !is_void(&name) {
				stack.push(node);
			}
			continue;
		}
		let text = parser.take_text();
		if !text.trim().is_empty() {
			let node = RealNode::create_text(unescape(&text));
			append(&mut roots, &stack, &node);
		}
	}

	if stack.is_empty() {
		Ok(roots)
	} else {
		Err(Error::Parse {
			at: input.len(),
			what: "unclosed element",
		})
	}
}

fn append(roots: &mut Vec<RealNode>, stack: &[RealNode], node: &RealNode) {
	match stack.last() {
		Some(parent) => parent.append(node),
		None => roots.push(node.clone()),
	}
}

struct Parser<'a> {
	input: &'a str,
	pos: usize,
}

impl<'a> Parser<'a> {
	fn error(&self, what: &'static str) -> Error {
		Error::Parse { at: self.pos, what }
	}

	fn rest(&self) -> &'a str {
		&self.input[self.pos..]
	}

	fn eat(&mut self, token: &str) -> bool {
		if self.rest().starts_with(token) {
			self.pos += token.len();
			true
		} else {
			false
		}
	}

	fn peek_element_open(&self) -> bool {
		let bytes = self.rest().as_bytes();
		bytes.first() == Some(&b'<') && bytes.get(1).map_or(false, u8::is_ascii_alphabetic)
	}

	fn take_until(&mut self, token: &str) -> Result<String, Error> {
		match self.rest().find(token) {
			Some(at) => {
				let taken = self.rest()[..at].to_string();
				self.pos += at + token.len();
				Ok(taken)
			}
			None => Err(self.error("unterminated construct")),
		}
	}

	fn take_name(&mut self) -> String {
		let rest = self.rest();
		let end = rest
			.as_bytes()
			.iter()
			.position(|byte| !(byte.is_ascii_alphanumeric() || *byte == b'-' || *byte == b'_'))
			.unwrap_or_else(|| rest.len());
		let name = rest[..end].to_string();
		self.pos += end;
		name
	}

	fn take_text(&mut self) -> String {
		let rest = self.rest();
		let end = rest.find('<').unwrap_or_else(|| rest.len());
		// A stray `<` that opens nothing would otherwise loop forever.
		let end = if end == 0 { 1 } else { end };
		let text = rest[..end].to_string();
		self.pos += end;
		text
	}

	fn skip_whitespace(&mut self) {
		while self.rest().as_bytes().first().map_or(false, u8::is_ascii_whitespace) {
			self.pos += 1;
		}
	}

	/// Consumes up to and including `>`; returns whether the tag was
	/// self-closing.
	fn take_attributes(&mut self, node: &RealNode) -> Result<bool, Error> {
		loop {
			self.skip_whitespace();
			if self.eat("/>") {
				return Ok(true);
			}
			if self.eat(">") {
				return Ok(false);
			}
			let name = self.take_name();
			if name.is_empty() {
				return Err(self.error("expected an attribute name"));
			}
			self.skip_whitespace();
			if !self.eat("=") {
				node.set_attribute(&name, String::new());
				continue;
			}
			self.skip_whitespace();
			let value = if self.eat("\"") {
				self.take_until("\"")?
			} else if self.eat("'") {
				self.take_until("'")?
			} else {
				let rest = self.rest();
				let end = rest
					.as_bytes()
					.iter()
					.position(|byte| byte.is_ascii_whitespace() || *byte == b'>' || *byte == b'/')
					.unwrap_or_else(|| rest.len());
				let value = rest[..end].to_string();
				self.pos += end;
				value
			};
			node.set_attribute(&name, unescape(&value));
		}
	}
}
