use cambium::{el, keyed, many, Component, Differ, Namespace, Overrides, RealNode, Spec};

mod tracker_;
use tracker_::init_tracing;

fn render_into_body(spec: Spec) -> RealNode {
	init_tracing();
	let differ = Differ::new();
	let body = RealNode::create_element("body");
	differ.render(&body, spec).unwrap();
	body
}

#[test]
fn text() {
	let body = render_into_body(Spec::Text("Hello cambium text!".to_string()));
	assert_eq!(body.child_count(), 1);
	assert_eq!(body.child(0).unwrap().text().as_deref(), Some("Hello cambium text!"));
}

#[test]
fn null() {
	let body = render_into_body(Spec::Null);
	assert_eq!(body.child_count(), 0);
}

#[test]
fn minimal_div() {
	let body = render_into_body(el("div").build());
	assert_eq!(body.child_count(), 1);
	assert_eq!(body.child(0).unwrap().tag().as_deref(), Some("div"));
}

#[test]
fn attributed_div() {
	let body = render_into_body(el("div").attr("class", "a").attr("hidden", true).attr("data-skip", false).build());
	let div = body.child(0).unwrap();
	assert_eq!(div.attribute("class").as_deref(), Some("a"));
	assert_eq!(div.attribute("hidden").as_deref(), Some(""));
	assert_eq!(div.attribute("data-skip"), None);
}

#[test]
fn multi() {
	let body = render_into_body(many(vec![
		Spec::from("Hello cambium"),
		Spec::from(" multiple "),
		Spec::from("nodes!"),
	]));
	assert_eq!(body.child_count(), 3);
	assert_eq!(body.text_content(), "Hello cambium multiple nodes!");
}

#[test]
fn keyed_group() {
	let body = render_into_body(keyed("group", vec![Spec::from("a"), Spec::from("b")]));
	assert_eq!(body.child_count(), 2);
	assert_eq!(body.text_content(), "ab");
}

#[test]
fn component() {
	let greeter = Component::new("greeter", |cx| {
		let name = cx.prop("name").and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
		el("p").text(format!("Hello {}!", name)).build()
	});
	let body = render_into_body(greeter.with().prop("name", "world").build());
	assert_eq!(body.child_count(), 1);
	assert_eq!(body.text_content(), "Hello world!");
}

#[test]
fn external() {
	init_tracing();
	let differ = Differ::new();
	let body = RealNode::create_element("body");
	let external = RealNode::create_element("canvas");
	differ.render(&body, el("div").child(Spec::Real(external.clone())).build()).unwrap();
	let div = body.child(0).unwrap();
	assert_eq!(div.child_count(), 1);
	assert!(div.child(0).unwrap().same_node(&external));
}

#[test]
fn svg_namespace() {
	let body = render_into_body(el("div").child(el("svg").child(el("circle"))).build());
	let svg = body.child(0).unwrap().child(0).unwrap();
	assert_eq!(svg.namespace(), Some(Namespace::Svg));
	assert_eq!(svg.child(0).unwrap().namespace(), Some(Namespace::Svg));
	assert_eq!(body.child(0).unwrap().namespace(), Some(Namespace::Html));
}

#[test]
fn creation_overrides_win_inside_their_component() {
	init_tracing();

	let chart = Component::new("chart", |cx| el("canvas").children(cx.children().to_vec()).build());

	let differ = Differ::new();
	differ
		.extend(
			&chart,
			Overrides::new().on_create_element(|call| {
				if call.spec.tag == "canvas" {
					Some(RealNode::create_element_ns(Namespace::Svg, "canvas"))
				} else {
					None
				}
			}),
		)
		.unwrap();

	let body = RealNode::create_element("body");
	differ.render(&body, chart.spec()).unwrap();
	// The override supplied the node inside the component's subtree...
	assert_eq!(body.child(0).unwrap().namespace(), Some(Namespace::Svg));

	// ...and is inert outside it.
	differ.render(&body, el("canvas").build()).unwrap();
	assert_eq!(body.child(0).unwrap().namespace(), Some(Namespace::Html));
}

#[test]
fn nested_groups_flatten() {
	let body = render_into_body(many(vec![
		Spec::from("a"),
		many(vec![Spec::from("b"), Spec::Null, Spec::from("c")]),
		Spec::from("d"),
	]));
	assert_eq!(body.child_count(), 4);
	assert_eq!(body.text_content(), "abcd");
}
