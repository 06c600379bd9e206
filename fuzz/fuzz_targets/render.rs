#![no_main]
use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde::Serialize;

#[derive(Debug, Serialize, Arbitrary)]
#[serde(untagged)]
enum Value {
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

fuzz_target!(|data: (&str, BTreeMap<&str, &str>, Value)| {
    let (root, partials, value) = data;

    let mut renderer = ministache::Renderer::new();
    renderer.set_recursion_limit(16);
    renderer.render_with_partials(root, &value, &partials).ok();
});
