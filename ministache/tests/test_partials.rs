use std::collections::BTreeMap;

use ministache::value::Value;
use ministache::{context, Error, ErrorKind, PartialsFn, Renderer};

use similar_asserts::assert_eq;

#[test]
fn test_map_partials() {
    let renderer = Renderer::new();
    let mut partials = BTreeMap::new();
    partials.insert("row", "<tr>{{#cells}}{{>cell}}{{/cells}}</tr>");
    partials.insert("cell", "<td>{{.}}</td>");
    let rv = renderer
        .render_with_partials(
            "{{#rows}}{{>row}}{{/rows}}",
            context!(rows => vec![
                context!(cells => vec![1, 2]),
                context!(cells => vec![3]),
            ]),
            &partials,
        )
        .unwrap();
    assert_eq!(rv, "<tr><td>1</td><td>2</td></tr><tr><td>3</td></tr>");
}

#[test]
fn test_partials_see_enclosing_scopes() {
    let renderer = Renderer::new();
    let partials = BTreeMap::from([("greet", "{{greeting}}, {{name}}!")]);
    let rv = renderer
        .render_with_partials(
            "{{#people}}{{>greet}} {{/people}}",
            context!(greeting => "Hello", people => vec![
                context!(name => "Ann"),
                context!(name => "Bob"),
            ]),
            &partials,
        )
        .unwrap();
    assert_eq!(rv, "Hello, Ann! Hello, Bob! ");
}

#[test]
fn test_standalone_partial_lines() {
    let renderer = Renderer::new();
    let partials = BTreeMap::from([("item", "<li>{{.}}</li>\n")]);
    let rv = renderer
        .render_with_partials(
            "<ul>\n{{#items}}\n  {{>item}}\n{{/items}}\n</ul>\n",
            context!(items => ["a", "b"]),
            &partials,
        )
        .unwrap();
    assert_eq!(rv, "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n");
}

#[test]
fn test_value_partials() {
    let partials = Value::from_serialize(&serde_json::json!({
        "title": "<h1>{{text}}</h1>",
    }));
    let rv = Renderer::new()
        .render_with_partials("{{>title}}", context!(text => "Hi"), &partials)
        .unwrap();
    assert_eq!(rv, "<h1>Hi</h1>");
}

#[test]
fn test_partials_fn() {
    let partials = PartialsFn(|name: &str| -> Result<Option<String>, Error> {
        match name {
            "fail" => Err(Error::new(ErrorKind::PartialLoadFailure, "boom")),
            "missing" => Ok(None),
            other => Ok(Some(format!("<{other}:{{{{x}}}}>"))),
        }
    });
    let renderer = Renderer::new();
    let rv = renderer
        .render_with_partials("{{>a}}{{>missing}}{{>b}}", context!(x => 1), &partials)
        .unwrap();
    assert_eq!(rv, "<a:1><b:1>");

    let err = renderer
        .render_with_partials("{{>fail}}", (), &partials)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PartialLoadFailure);
    assert_eq!(err.detail(), Some("boom"));
}

#[test]
fn test_partials_are_cached_by_source() {
    let renderer = Renderer::new();
    let partials = BTreeMap::from([("a", "{{x}}"), ("b", "{{x}}")]);
    renderer
        .render_with_partials("{{>a}}{{>b}}", context!(x => 1), &partials)
        .unwrap();
    assert_eq!(renderer.cached_templates(), 2);
}

#[test]
fn test_partial_changes_delimiters_locally() {
    let renderer = Renderer::new();
    let partials = BTreeMap::from([("erb", "{{=<% %>=}}<% x %>")]);
    let rv = renderer
        .render_with_partials("{{>erb}}{{x}}", context!(x => "!"), &partials)
        .unwrap();
    assert_eq!(rv, "!!");
}

#[cfg(feature = "loader")]
mod loader {
    use super::*;

    use ministache::path_loader;
    use similar_asserts::assert_eq;

    fn partials_dir() -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("partials")
    }

    #[test]
    fn test_path_loader() {
        let partials = path_loader(partials_dir());
        let renderer = Renderer::new();
        let rv = renderer
            .render_with_partials(
                "{{#users}}{{>user}}{{/users}}|{{>plain}}|{{#items}}{{>nested/item}}{{/items}}",
                context!(
                    users => vec![context!(name => "Moe")],
                    x => 42,
                    items => ["a"],
                ),
                &partials,
            )
            .unwrap();
        assert_eq!(rv, "<strong>Moe</strong>|plain 42\n|<li>a</li>");
    }

    #[test]
    fn test_path_loader_refuses_hidden_and_missing() {
        let partials = path_loader(partials_dir());
        let renderer = Renderer::new();
        let rv = renderer
            .render_with_partials("[{{>.secret}}{{>../test_partials.rs}}{{>nope}}]", (), &partials)
            .unwrap();
        assert_eq!(rv, "[]");
    }
}
