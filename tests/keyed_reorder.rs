use cambium::{el, Differ, Error, RealNode, Spec};

mod tracker_;
use tracker_::{init_tracing, tracker, Counters};

fn item(key: &str) -> Spec {
	el("li").key(key).text(key.to_uppercase()).build()
}

fn list(keys: &[&str]) -> Spec {
	el("ul").children(keys.iter().map(|key| item(key)).collect()).build()
}

#[test]
fn reorder_preserves_instances() {
	init_tracing();

	let differ = Differ::new();
	let body = RealNode::create_element("body");

	differ.render(&body, list(&["a", "b", "c", "d"])).unwrap();
	let ul = body.child(0).unwrap();
	let before = ul.children();
	assert_eq!(ul.text_content(), "ABCD");

	differ.render(&body, list(&["d", "c", "a", "b"])).unwrap();
	let after = ul.children();
	assert_eq!(ul.text_content(), "DCAB");

	assert!(after[0].same_node(&before[3]));
	assert!(after[1].same_node(&before[2]));
	assert!(after[2].same_node(&before[0]));
	assert!(after[3].same_node(&before[1]));
}

#[test]
fn list_scenario() {
	init_tracing();

	let counters = Counters::default();
	let component = tracker(&counters);
	let differ = Differ::new();
	let body = RealNode::create_element("body");

	let entry = |key: i64, text: &str| component.with().key(key).child(el("li").text(text)).build();

	differ.render(
		&body,
		el("ul").child(entry(1, "A")).child(entry(2, "B")).build(),
	)
	.unwrap();
	let ul = body.child(0).unwrap();
	assert_eq!(ul.child_count(), 2);
	let (first, second) = (ul.child(0).unwrap(), ul.child(1).unwrap());
	assert_eq!(first.text_content(), "A");
	assert_eq!(second.text_content(), "B");
	assert_eq!(counters.attached.get(), 2);
	assert_eq!(counters.detached.get(), 0);

	differ.render(
		&body,
		el("ul").child(entry(2, "B")).child(entry(1, "A")).build(),
	)
	.unwrap();
	assert!(ul.child(0).unwrap().same_node(&second));
	assert!(ul.child(1).unwrap().same_node(&first));
	assert_eq!(counters.attached.get(), 2);
	assert_eq!(counters.detached.get(), 0);
}

#[test]
fn duplicate_keys_rejected_before_mutation() {
	init_tracing();

	let differ = Differ::new();
	let body = RealNode::create_element("body");

	let spec = el("ul").child(el("li").key("a").text("one")).child(el("li").key("a").text("two")).build();
	match differ.render(&body, spec) {
		Err(Error::DuplicateKey { .. }) => (),
		other => panic!("expected a duplicate-key error, got {:?}", other.map(|_| ())),
	}
	assert_eq!(body.child_count(), 0);
}

#[test]
fn key_collision_with_incompatible_tag_rebuilds() {
	init_tracing();

	let differ = Differ::new();
	let body = RealNode::create_element("body");

	differ.render(&body, el("ul").child(el("li").key("a").text("one")).build()).unwrap();
	let ul = body.child(0).unwrap();
	let li = ul.child(0).unwrap();

	// Same key, different tag: the key matches but the node kind does not,
	// so the old child is orphaned and a fresh one attached.
	differ.render(&body, el("ul").child(el("p").key("a").text("one")).build()).unwrap();
	let p = ul.child(0).unwrap();
	assert_eq!(p.tag().as_deref(), Some("p"));
	assert!(!p.same_node(&li));
	assert!(li.parent().is_none());
	assert_eq!(ul.child_count(), 1);
}

#[test]
fn unkeyed_children_match_positionally() {
	init_tracing();

	let differ = Differ::new();
	let body = RealNode::create_element("body");

	differ.render(&body, el("ul").child(el("li").text("one")).child(el("li").text("two")).build()).unwrap();
	let ul = body.child(0).unwrap();
	let before = ul.children();

	differ.render(&body, el("ul").child(el("li").text("uno")).child(el("li").text("dos")).build()).unwrap();
	let after = ul.children();
	assert!(after[0].same_node(&before[0]));
	assert!(after[1].same_node(&before[1]));
	assert_eq!(ul.text_content(), "unodos");
}

#[test]
fn removed_keyed_child_is_torn_down() {
	init_tracing();

	let counters = Counters::default();
	let component = tracker(&counters);
	let differ = Differ::new();
	let body = RealNode::create_element("body");

	let entry = |key: i64, text: &str| component.with().key(key).child(el("li").text(text)).build();

	differ.render(&body, el("ul").child(entry(1, "A")).child(entry(2, "B")).child(entry(3, "C")).build()).unwrap();
	assert_eq!(counters.attached.get(), 3);

	differ.render(&body, el("ul").child(entry(3, "C")).child(entry(1, "A")).build()).unwrap();
	let ul = body.child(0).unwrap();
	assert_eq!(ul.text_content(), "CA");
	assert_eq!(counters.attached.get(), 3);
	assert_eq!(counters.detached.get(), 1);
}
