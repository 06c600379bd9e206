use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ministache::value::{Object, Value};
use ministache::{context, Context, Renderer};

use similar_asserts::assert_eq;

#[test]
fn test_lookup_walks_scopes() {
    let root = Context::new(context!(a => "root-a", b => "root-b"));
    let child = root.push(context!(a => "child-a"));
    let grandchild = child.push(Value::from("item"));
    assert_eq!(grandchild.lookup("a").to_string(), "child-a");
    assert_eq!(grandchild.lookup("b").to_string(), "root-b");
    assert_eq!(grandchild.lookup(".").to_string(), "item");
    assert!(grandchild.lookup("c").is_undefined());
    assert_eq!(
        grandchild.parent().map(|x| x.view().clone()),
        Some(context!(a => "child-a"))
    );
}

#[test]
fn test_dotted_paths() {
    let root = Context::from_serialize(&serde_json::json!({
        "a": {"b": {"c": "deep"}},
        "list": ["x", "y"],
    }));
    assert_eq!(root.lookup("a.b.c").to_string(), "deep");
    assert_eq!(root.lookup("list.1").to_string(), "y");
    assert!(root.lookup("a.x.c").is_undefined());
    assert!(root.lookup("a.b.c.d").is_undefined());
}

#[test]
fn test_dotted_path_resolves_in_one_scope() {
    let root = Context::from_serialize(&serde_json::json!({"a": {"b": "root"}}));
    let child = root.push(Value::from_serialize(&serde_json::json!({"a": {"x": 1}})));
    assert_eq!(child.lookup("a.b").to_string(), "root");
    assert_eq!(child.lookup("a.x").to_string(), "1");
}

#[test]
fn test_debug() {
    let root = Context::new(context!(a => 1));
    let child = root.push(Value::from("x"));
    insta::assert_debug_snapshot!(child, @r###"
    [
        "x",
        {
            "a": 1,
        },
    ]
    "###);
}

#[derive(Debug, Default)]
struct Counter {
    lookups: AtomicUsize,
}

impl Object for Counter {
    fn get_value(&self, key: &str) -> Option<Value> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        match key {
            "value" => Some(Value::from("counted")),
            _ => None,
        }
    }
}

#[test]
fn test_lookups_are_cached_per_render() {
    let counter = Arc::new(Counter::default());
    let view = Value::from_dyn_object(counter.clone());
    let renderer = Renderer::new();
    let rv = renderer
        .render("{{value}} {{value}} {{{value}}} {{missing}}{{missing}}", &view)
        .unwrap();
    assert_eq!(rv, "counted counted counted ");
    assert_eq!(counter.lookups.load(Ordering::Relaxed), 2);

    // every render starts with fresh scopes
    renderer.render("{{value}}", &view).unwrap();
    assert_eq!(counter.lookups.load(Ordering::Relaxed), 3);
}

#[test]
fn test_render_in_context() {
    let renderer = Renderer::new();
    let root = Context::new(context!(site => "example.com"));
    let page = root.push(context!(title => "Home"));
    assert_eq!(
        renderer
            .render_in_context("{{title}} - {{site}}", &page, None)
            .unwrap(),
        "Home - example.com"
    );
}
