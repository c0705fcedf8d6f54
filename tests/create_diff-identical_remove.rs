use cambium::{el, keyed, many, Differ, EventHandler, Overrides, RealNode, Spec};
use std::cell::Cell;
use std::rc::Rc;

mod tracker_;
use tracker_::{init_tracing, tracker, Counters};

#[test]
fn null() {
	test_create_diff_identical_remove(|| Spec::Null, 0);
}

#[test]
fn text() {
	test_create_diff_identical_remove(|| Spec::from("Hello cambium text!"), 1);
}

#[test]
fn multi() {
	test_create_diff_identical_remove(
		|| many(vec![Spec::from("Hello cambium"), Spec::from(" multiple "), Spec::from("nodes!")]),
		3,
	);
}

#[test]
fn keyed_group() {
	test_create_diff_identical_remove(|| keyed(0, vec![Spec::from("Hello cambium"), Spec::from(" keyed nodes.")]), 2);
}

#[test]
fn minimal_div() {
	test_create_diff_identical_remove(|| el("div").build(), 1);
}

#[test]
fn clickable_div() {
	let clicked = EventHandler::new(|_| ());
	test_create_diff_identical_remove(move || el("div").handler("click", clicked.clone()).build(), 1);
}

#[test]
fn minimal_svg() {
	test_create_diff_identical_remove(|| el("svg").build(), 1);
}

/// Creates `child` under a lifecycle-counting component, re-renders the
/// identical spec, then tears the tree down, asserting the lifecycle
/// transitions the engine guarantees at each step.
fn test_create_diff_identical_remove(child: impl Fn() -> Spec, node_count: usize) {
	init_tracing();

	let counters = Counters::default();
	let component = tracker(&counters);
	let differ = Differ::new();
	let body = RealNode::create_element("body");

	let spec = || component.with().child(child()).build();

	differ.render(&body, spec()).unwrap();
	assert_eq!(body.child_count(), node_count);
	assert_eq!(counters.attached.get(), 1);
	assert_eq!(counters.detached.get(), 0);
	assert_eq!(counters.updated.get(), 0);

	differ.render(&body, spec()).unwrap();
	assert_eq!(body.child_count(), node_count);
	assert_eq!(counters.attached.get(), 1);
	assert_eq!(counters.detached.get(), 0);
	assert_eq!(counters.updated.get(), 1);

	differ.teardown(&body).unwrap();
	assert_eq!(body.child_count(), 0);
	assert_eq!(counters.live(), 0);
	assert_eq!(counters.detached.get(), 1);
}

#[test]
fn identical_rerender_mutates_no_attributes() {
	init_tracing();

	let counters = Counters::default();
	let component = tracker(&counters);
	let differ = Differ::new();
	let body = RealNode::create_element("body");

	let assignments = Rc::new(Cell::new(0));
	let seen = assignments.clone();
	differ
		.extend(
			&component,
			Overrides::new().on_set_attribute(move |_| {
				seen.set(seen.get() + 1);
				false
			}),
		)
		.unwrap();

	let handler = EventHandler::new(|_| ());
	let spec = || {
		component
			.with()
			.child(el("div").attr("class", "a").handler("click", handler.clone()).text("hi"))
			.build()
	};

	differ.render(&body, spec()).unwrap();
	let after_create = assignments.get();
	assert_eq!(after_create, 2); // class + onclick

	let div = body.child(0).unwrap();
	differ.render(&body, spec()).unwrap();
	assert_eq!(assignments.get(), after_create);
	assert!(body.child(0).unwrap().same_node(&div));
	assert_eq!(counters.updated.get(), 1);
}

#[test]
fn identity_preserved_across_matched_update() {
	init_tracing();

	let differ = Differ::new();
	let body = RealNode::create_element("body");

	differ.render(&body, el("div").attr("class", "a").child(el("span").text("one")).build()).unwrap();
	let div = body.child(0).unwrap();
	let span = div.child(0).unwrap();

	differ.render(&body, el("div").attr("class", "b").child(el("span").text("two")).build()).unwrap();
	assert!(body.child(0).unwrap().same_node(&div));
	assert!(body.child(0).unwrap().child(0).unwrap().same_node(&span));
	assert_eq!(div.attribute("class").as_deref(), Some("b"));
	assert_eq!(span.text_content(), "two");
}

#[test]
fn mismatched_tag_rebuilds() {
	init_tracing();

	let differ = Differ::new();
	let body = RealNode::create_element("body");

	differ.render(&body, el("div").build()).unwrap();
	let div = body.child(0).unwrap();

	differ.render(&body, el("section").build()).unwrap();
	let section = body.child(0).unwrap();
	assert_eq!(section.tag().as_deref(), Some("section"));
	assert!(!section.same_node(&div));
	assert!(div.parent().is_none());
}

#[test]
fn listener_follows_handler_changes() {
	init_tracing();

	let differ = Differ::new();
	let body = RealNode::create_element("body");

	let clicks = Rc::new(Cell::new(0));
	let seen = clicks.clone();
	let handler = EventHandler::new(move |_| seen.set(seen.get() + 1));

	differ.render(&body, el("button").handler("click", handler.clone()).build()).unwrap();
	let button = body.child(0).unwrap();
	assert_eq!(button.listener_count("click"), 1);

	button.emit("click", cambium::Value::Null);
	assert_eq!(clicks.get(), 1);

	// The same handler instance survives a re-render untouched.
	differ.render(&body, el("button").handler("click", handler.clone()).build()).unwrap();
	assert_eq!(button.listener_count("click"), 1);

	// Dropping the attribute detaches the listener.
	differ.render(&body, el("button").build()).unwrap();
	assert_eq!(button.listener_count("click"), 0);
	button.emit("click", cambium::Value::Null);
	assert_eq!(clicks.get(), 1);
}
