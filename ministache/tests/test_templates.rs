use std::collections::BTreeMap;
use std::fs;

use ministache::Renderer;

use similar_asserts::assert_eq;

/// Every input is a JSON view, the template and the expected output
/// separated by `---` lines.  Partials are taken from the optional
/// `partials` key of the view.
#[test]
fn test_inputs() {
    insta::glob!("inputs/*.txt", |path| {
        let contents = fs::read_to_string(path).unwrap();
        let mut iter = contents.splitn(3, "\n---\n");
        let view: serde_json::Value = serde_json::from_str(iter.next().unwrap()).unwrap();
        let source = iter.next().unwrap();
        let expected = iter.next().unwrap();

        let partials: BTreeMap<String, String> = view
            .get("partials")
            .and_then(|x| serde_json::from_value(x.clone()).ok())
            .unwrap_or_default();

        let renderer = Renderer::new();
        let rendered = match renderer.render_with_partials(source, &view, &partials) {
            Ok(mut rendered) => {
                rendered.push('\n');
                rendered
            }
            Err(err) => format!("!!!ERROR!!! {err}\n"),
        };
        assert_eq!(
            rendered,
            expected,
            "unexpected output for {}",
            path.display()
        );
    });
}
