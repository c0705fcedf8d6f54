use cambium::{el, many, painter, parse, stringify, Component, Differ, Error, RealNode, Spec, StringifyOptions, Value};

mod tracker_;
use tracker_::init_tracing;

fn pretty(spec: &Spec) -> String {
	stringify(spec, &StringifyOptions::default())
}

#[test]
fn nested_elements_indent() {
	let spec = el("div").attr("class", "a").child(el("span").text("Hi")).build();
	assert_eq!(pretty(&spec), "<div class=\"a\">\n    <span>Hi</span>\n</div>");
}

#[test]
fn all_text_children_render_inline() {
	let spec = el("p").text("one ").text("two").build();
	assert_eq!(pretty(&spec), "<p>one two</p>");
}

#[test]
fn null_renders_a_placeholder() {
	assert_eq!(pretty(&Spec::Null), "<!---->");
	let spec = el("div").child(Spec::Null).child(el("em").text("x")).build();
	assert_eq!(pretty(&spec), "<div>\n    <!---->\n    <em>x</em>\n</div>");
}

#[test]
fn text_and_attributes_escape() {
	let spec = el("p").attr("title", "a \"b\" & c").text("1 < 2 & 3 > 2").build();
	assert_eq!(pretty(&spec), "<p title=\"a &quot;b&quot; &amp; c\">1 &lt; 2 &amp; 3 &gt; 2</p>");
}

#[test]
fn void_tags_have_no_closing_tag() {
	assert_eq!(pretty(&el("br").build()), "<br>");
	assert_eq!(pretty(&el("input").attr("value", "x").build()), "<input value=\"x\">");
}

#[test]
fn keys_and_handlers_are_not_serialized() {
	let spec = el("li").key(1).on("click", |_| ()).attr("class", "row").build();
	assert_eq!(pretty(&spec), "<li class=\"row\"></li>");
}

#[test]
fn shorthand_values_expand() {
	let spec = el("div")
		.attr("class", Value::List(vec![Value::from("a"), Value::from("b")]))
		.attr("style", Value::Map(vec![("color".to_string(), Value::from("red")), ("width".to_string(), Value::from("10px"))]))
		.attr("hidden", true)
		.build();
	assert_eq!(pretty(&spec), "<div class=\"a b\" style=\"color: red; width: 10px\" hidden></div>");
}

#[test]
fn components_unbox_eagerly() {
	let item = Component::new("item", |cx| {
		let label = cx.prop("label").and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
		el("li").text(label).build()
	});
	let spec = el("ul").child(item.with().prop("label", "one").build()).child(item.with().prop("label", "two").build()).build();
	assert_eq!(pretty(&spec), "<ul>\n    <li>one</li>\n    <li>two</li>\n</ul>");
}

#[test]
fn failed_subtrees_degrade_to_placeholders() {
	init_tracing();

	// A painter is meaningless in markup: that child degrades, its siblings
	// are unaffected.
	let spec = el("div").child(painter(|_| ())).child(el("em").text("x")).build();
	assert_eq!(pretty(&spec), "<div>\n    <!---->\n    <em>x</em>\n</div>");

	// At the very top there is no surrounding document to save.
	assert_eq!(pretty(&painter(|_| ())), "<!---->");
}

#[test]
fn custom_indent_and_start_depth() {
	let options = StringifyOptions {
		indent_unit: "\t".to_string(),
		start_depth: 1,
	};
	let spec = el("div").child(el("span").text("Hi")).build();
	assert_eq!(stringify(&spec, &options), "\t<div>\n\t\t<span>Hi</span>\n\t</div>");
}

#[test]
fn parse_rebuilds_a_fragment() {
	let nodes = parse("<ul class=\"menu\"><li>one</li><li>two</li></ul>").unwrap();
	assert_eq!(nodes.len(), 1);
	let ul = &nodes[0];
	assert_eq!(ul.tag().as_deref(), Some("ul"));
	assert_eq!(ul.attribute("class").as_deref(), Some("menu"));
	assert_eq!(ul.child_count(), 2);
	assert_eq!(ul.text_content(), "onetwo");
}

#[test]
fn parse_handles_entities_comments_and_void_tags() {
	let nodes = parse("<p>a &amp; b</p><!-- note --><br><img src='x.png'>").unwrap();
	assert_eq!(nodes.len(), 4);
	assert_eq!(nodes[0].text_content(), "a & b");
	assert!(nodes[1].is_comment());
	assert_eq!(nodes[2].tag().as_deref(), Some("br"));
	assert_eq!(nodes[3].attribute("src").as_deref(), Some("x.png"));
}

#[test]
fn parse_drops_whitespace_between_elements() {
	let nodes = parse("<div>\n    <span>Hi</span>\n</div>").unwrap();
	assert_eq!(nodes.len(), 1);
	assert_eq!(nodes[0].child_count(), 1);
	assert_eq!(nodes[0].child(0).unwrap().tag().as_deref(), Some("span"));
}

#[test]
fn parse_rejects_malformed_input() {
	assert!(matches!(parse("<div>"), Err(Error::Parse { .. })));
	assert!(matches!(parse("</div>"), Err(Error::Parse { .. })));
	assert!(matches!(parse("<div></span>"), Err(Error::Parse { .. })));
	assert!(matches!(parse("<!-- open"), Err(Error::Parse { .. })));
}

#[test]
fn rendering_onto_parsed_markup_adopts_nodes() {
	init_tracing();

	let spec = || el("div").attr("class", "a").child(el("span").text("Hi")).build();
	let markup = pretty(&spec());

	let body = RealNode::create_element("body");
	for node in parse(&markup).unwrap() {
		body.append(&node);
	}
	let div = body.child(0).unwrap();
	let span = div.child(0).unwrap();

	let differ = Differ::new();
	differ.render(&body, spec()).unwrap();

	assert_eq!(body.child_count(), 1);
	assert!(body.child(0).unwrap().same_node(&div));
	assert!(div.child(0).unwrap().same_node(&span));
	assert_eq!(div.attribute("class").as_deref(), Some("a"));
	assert_eq!(span.text_content(), "Hi");
}

#[test]
fn adoption_drops_placeholder_comments() {
	init_tracing();

	let spec = || el("div").child(Spec::Null).child(el("em").text("x")).build();
	let markup = pretty(&spec());

	let body = RealNode::create_element("body");
	for node in parse(&markup).unwrap() {
		body.append(&node);
	}
	let div = body.child(0).unwrap();
	let em = div.child(1).unwrap();
	assert!(div.child(0).unwrap().is_comment());

	let differ = Differ::new();
	differ.render(&body, spec()).unwrap();

	assert!(body.child(0).unwrap().same_node(&div));
	assert_eq!(div.child_count(), 1);
	assert!(div.child(0).unwrap().same_node(&em));
}

#[test]
fn adoption_replaces_incompatible_markup() {
	init_tracing();

	let body = RealNode::create_element("body");
	for node in parse("<section>old</section>").unwrap() {
		body.append(&node);
	}
	let section = body.child(0).unwrap();

	let differ = Differ::new();
	differ.render(&body, el("article").text("new").build()).unwrap();

	assert_eq!(body.child_count(), 1);
	let article = body.child(0).unwrap();
	assert_eq!(article.tag().as_deref(), Some("article"));
	assert!(!article.same_node(&section));
	assert!(section.parent().is_none());
}

#[test]
fn real_nodes_serialize_their_current_state() {
	let node = RealNode::create_element("span");
	node.set_attribute("id", "x");
	node.append(&RealNode::create_text("live"));
	let spec = el("div").child(Spec::Real(node)).build();
	assert_eq!(pretty(&spec), "<div>\n    <span id=\"x\">live</span>\n</div>");
}

#[test]
fn many_at_the_top_level_joins_lines() {
	let spec = many(vec![el("li").text("a").build(), el("li").text("b").build()]);
	assert_eq!(pretty(&spec), "<li>a</li>\n<li>b</li>");
}
