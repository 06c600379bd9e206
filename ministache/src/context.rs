use std::fmt;

use memo_map::MemoMap;
use serde::Serialize;

use crate::value::Value;

/// A scope in the chain of views a template is rendered against.
///
/// The root context wraps the view passed to the renderer.  Sections push
/// child scopes for every item they iterate over.  A child borrows its
/// parent and never changes it, so a scope chain is an immutable tree that
/// lives exactly as long as the render frames that created it.
///
/// Lookups are memoized per scope, including misses.
///
/// ```
/// # use ministache::{context, Context};
/// let root = Context::new(context!(name => "Joe", city => "Paris"));
/// let child = root.push(context!(name => "Jane"));
/// assert_eq!(child.lookup("name").to_string(), "Jane");
/// assert_eq!(child.lookup("city").to_string(), "Paris");
/// assert!(child.lookup("missing").is_undefined());
/// ```
pub struct Context<'a> {
    view: Value,
    parent: Option<&'a Context<'a>>,
    cache: MemoMap<String, Value>,
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scopes = f.debug_list();
        let mut scope = Some(self);
        while let Some(ctx) = scope {
            scopes.entry(&ctx.view);
            scope = ctx.parent;
        }
        scopes.finish()
    }
}

impl Context<'static> {
    /// Creates a root context for a view.
    pub fn new(view: Value) -> Context<'static> {
        Context {
            view,
            parent: None,
            cache: MemoMap::default(),
        }
    }

    /// Creates a root context from a serializable view.
    pub fn from_serialize<S: Serialize + ?Sized>(view: &S) -> Context<'static> {
        Context::new(Value::from_serialize(view))
    }
}

impl<'a> Context<'a> {
    /// Creates a child scope with `view` as its innermost view.
    pub fn push(&self, view: Value) -> Context<'_> {
        Context {
            view,
            parent: Some(self),
            cache: MemoMap::default(),
        }
    }

    /// Returns the view of this scope.
    pub fn view(&self) -> &Value {
        &self.view
    }

    /// Returns the enclosing scope.
    pub fn parent(&self) -> Option<&Context<'a>> {
        self.parent
    }

    /// Resolves a name or dotted path.
    ///
    /// The innermost scope that resolves the name wins.  `.` is the view of
    /// this scope.  A dotted path only resolves in a scope if every segment
    /// yields a value, otherwise the search moves on to the parent.  Both
    /// undefined and none count as missing.  If nothing resolves the name,
    /// [`Value::UNDEFINED`] is returned.
    pub fn lookup(&self, name: &str) -> Value {
        self.cache
            .get_or_insert(name, || match self.resolve_local(name) {
                Some(value) => value,
                None => match self.parent {
                    Some(parent) => parent.lookup(name),
                    None => Value::UNDEFINED,
                },
            })
            .clone()
    }

    fn resolve_local(&self, name: &str) -> Option<Value> {
        if name == "." {
            return Some(self.view.clone());
        }
        let mut segments = name.split('.');
        let mut value = some!(self.view.get_attr(some!(segments.next())));
        for segment in segments {
            if value.is_absent() {
                return None;
            }
            value = some!(value.get_attr(segment));
        }
        if value.is_absent() {
            None
        } else {
            Some(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::value::Object;

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl Object for Counting {
        fn get_value(&self, key: &str) -> Option<Value> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            (key == "hit").then(|| Value::from(42))
        }
    }

    #[test]
    fn test_lookup_is_memoized() {
        let counting = Arc::new(Counting::default());
        let ctx = Context::new(Value::from_dyn_object(counting.clone()));
        assert_eq!(ctx.lookup("hit"), Value::from(42));
        assert_eq!(ctx.lookup("hit"), Value::from(42));
        assert!(ctx.lookup("miss").is_undefined());
        assert!(ctx.lookup("miss").is_undefined());
        assert_eq!(counting.calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_dotted_path_falls_back_to_parent() {
        let root = Context::from_serialize(&serde_json::json!({
            "a": {"b": "outer"},
        }));
        let child = root.push(Value::from_serialize(&serde_json::json!({
            "a": {"c": "inner"},
        })));
        assert_eq!(child.lookup("a.b").to_string(), "outer");
        assert_eq!(child.lookup("a.c").to_string(), "inner");
        assert!(child.lookup("a.d").is_undefined());
    }

    #[test]
    fn test_none_is_absent() {
        let root = Context::from_serialize(&serde_json::json!({"name": "root"}));
        let child = root.push(Value::from_serialize(&serde_json::json!({"name": null})));
        assert_eq!(child.lookup("name").to_string(), "root");
    }

    #[test]
    fn test_dot_is_view() {
        let root = Context::new(Value::from("item"));
        assert_eq!(root.lookup("."), Value::from("item"));
        assert_eq!(format!("{:?}", root.push(Value::from(1))), "[1, \"item\"]");
        assert!(root.parent().is_none());
    }
}
