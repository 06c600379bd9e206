use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ministache::value::{Object, ObjectRepr, SeqObject, Value, ValueKind};
use ministache::{context, render};

use similar_asserts::assert_eq;

#[test]
fn test_kinds() {
    let value = Value::from_serialize(&serde_json::json!({
        "s": "x",
        "n": 1,
        "f": 1.5,
        "b": true,
        "z": null,
        "l": [1],
        "m": {},
    }));
    let kinds: BTreeMap<_, _> = ["s", "n", "f", "b", "z", "l", "m", "missing"]
        .iter()
        .map(|key| (*key, value.get_attr(key).unwrap_or_default().kind()))
        .collect();
    insta::assert_debug_snapshot!(kinds, @r###"
    {
        "b": Bool,
        "f": Number,
        "l": Seq,
        "m": Map,
        "missing": Undefined,
        "n": Number,
        "s": String,
        "z": None,
    }
    "###);
    assert_eq!(ValueKind::Seq.to_string(), "sequence");
}

#[test]
fn test_interpolation_of_values() {
    let rv = render(
        "[{{s}}|{{n}}|{{neg}}|{{f}}|{{whole}}|{{b}}|{{z}}|{{l}}|{{m}}]",
        serde_json::json!({
            "s": "text",
            "n": 42,
            "neg": -7,
            "f": 0.25,
            "whole": 3.0,
            "b": false,
            "z": null,
            "l": ["a", 1, true],
            "m": {"a": 1},
        }),
    )
    .unwrap();
    assert_eq!(rv, "[text|42|-7|0.25|3|false||a,1,true|[object]]");
}

#[test]
fn test_struct_serialization() {
    #[derive(serde::Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(serde::Serialize)]
    enum Shape {
        Dot(Point),
        Empty,
    }

    let value = Value::from_serialize(&vec![Shape::Dot(Point { x: 1, y: 2 }), Shape::Empty]);
    assert_eq!(
        render("{{#.}}{{Dot.x}}/{{Dot.y}}{{/.}}", &value).unwrap(),
        "1/2/"
    );
    assert_eq!(value.get_attr("1"), Some(Value::from("Empty")));
    assert_eq!(value.len(), Some(2));
}

#[test]
fn test_value_serializes_back() {
    let value = Value::from_serialize(&serde_json::json!({
        "name": "x",
        "tags": ["a", "b"],
        "meta": {"n": 1, "none": null},
    }));
    let json = serde_json::to_value(&value).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "x",
            "tags": ["a", "b"],
            "meta": {"n": 1, "none": null},
        })
    );
}

#[test]
fn test_values_embed_in_views() {
    let squares = Value::from_object(SeqObject::new(|| (1..4u64).map(|x| Value::from(x * x))));
    let rv = render(
        "{{#items}}{{.}} {{/items}}{{items.1}}",
        context!(items => squares),
    )
    .unwrap();
    assert_eq!(rv, "1 4 9 4");
}

#[derive(Debug)]
struct Temperature(f64);

impl Object for Temperature {
    fn get_value(&self, key: &str) -> Option<Value> {
        match key {
            "celsius" => Some(Value::from(self.0)),
            "freezing" => Some(Value::from(self.0 <= 0.0)),
            _ => None,
        }
    }

    fn repr(&self) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°C", self.0)
    }
}

#[test]
fn test_plain_objects() {
    let temp = Value::from_object(Temperature(-2.5));
    assert_eq!(temp.kind(), ValueKind::Object);
    assert_eq!(temp.to_string(), "-2.5°C");
    assert_eq!(
        render(
            "{{temp}} {{temp.celsius}}{{#temp.freezing}} brr{{/temp.freezing}}",
            context!(temp)
        )
        .unwrap(),
        "-2.5°C -2.5 brr"
    );
    // plain objects are not iterated
    assert!(!temp.is_seq());
    assert!(temp.try_iter().is_none());
}

#[test]
fn test_object_identity() {
    let obj: Arc<dyn Object> = Arc::new(Temperature(1.0));
    let a = Value::from_dyn_object(obj.clone());
    let b = Value::from_dyn_object(obj);
    let c = Value::from_object(Temperature(1.0));
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_collect() {
    let seq: Value = (1..4).collect();
    assert_eq!(seq.to_string(), "1,2,3");
    let map: Value = [("b", 2), ("a", 1)].into_iter().collect();
    assert_eq!(map.get_attr("a"), Some(Value::from(1)));
    assert_eq!(map.len(), Some(2));
    assert_eq!(Value::from(Some("x")), Value::from("x"));
    assert!(Value::from(None::<i32>).is_none());
    assert_eq!(Value::from("äbc").len(), Some(3));
}

#[test]
#[cfg(feature = "preserve_order")]
fn test_preserve_order() {
    let value: Value = [("z", 1), ("a", 2)].into_iter().collect();
    let json = serde_json::to_string(&value).unwrap();
    assert_eq!(json, r#"{"z":1,"a":2}"#);
}
