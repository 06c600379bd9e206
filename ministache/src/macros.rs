// `ok!` and `some!` are less bloaty alternatives to the standard library's try operator (`?`).
// Since we do not need type conversions in this crate we can fall back to much easier match
// patterns that compile faster and produce less bloaty code.

macro_rules! ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(err) => return Err(err),
        }
    };
}

macro_rules! some {
    ($expr:expr) => {
        match $expr {
            Some(val) => val,
            None => return None,
        }
    };
}

/// Hidden utility module for the [`context!`](crate::context!) macro.
#[doc(hidden)]
pub mod __context {
    use crate::value::{Value, ValueMap, ValueRepr};
    use crate::Renderer;
    use std::rc::Rc;
    use std::sync::Arc;

    #[inline(always)]
    pub fn make() -> ValueMap {
        ValueMap::default()
    }

    #[inline(always)]
    pub fn add(ctx: &mut ValueMap, key: &'static str, value: Value) {
        ctx.insert(key.into(), value);
    }

    #[inline(always)]
    pub fn build(ctx: ValueMap) -> Value {
        Value(ValueRepr::Map(Arc::new(ctx)))
    }

    pub fn thread_local_renderer() -> Rc<Renderer> {
        thread_local! {
            static RENDERER: Rc<Renderer> = Rc::new(Renderer::new());
        }
        RENDERER.with(|x| x.clone())
    }
}

/// Creates a template view from keys and values.
///
/// ```rust
/// # use ministache::context;
/// let view = context!{
///     name => "Peter",
///     location => "World",
/// };
/// ```
///
/// Alternatively if the variable name matches the key name it can
/// be omitted:
///
/// ```rust
/// # use ministache::context;
/// let name = "Peter";
/// let view = context!{ name };
/// ```
///
/// The return value is a [`Value`](crate::value::Value) holding a map.  The
/// macro can be nested to build deeper structures:
///
/// ```rust
/// # use ministache::context;
/// let view = context! {
///     nav => vec![
///         context!(path => "/", title => "Index"),
///         context!(path => "/faq", title => "FAQ"),
///     ]
/// };
/// ```
///
/// Values are converted with [`Value::from_serialize`](crate::value::Value::from_serialize).
#[macro_export]
macro_rules! context {
    () => {
        $crate::__context::build($crate::__context::make())
    };
    (
        $($key:ident $(=> $value:expr)?),* $(,)?
    ) => {{
        let mut ctx = $crate::__context::make();
        $(
            $crate::__context_pair!(ctx, $key $(=> $value)?);
        )*
        $crate::__context::build(ctx)
    }};
}

#[macro_export]
#[doc(hidden)]
macro_rules! __context_pair {
    ($ctx:ident, $key:ident) => {{
        $crate::__context_pair!($ctx, $key => $key);
    }};
    ($ctx:ident, $key:ident => $value:expr) => {
        $crate::__context::add(
            &mut $ctx,
            stringify!($key),
            $crate::value::Value::from_serialize(&$value),
        );
    };
}

/// A macro similar to [`format!`] but that renders a mustache template.
///
/// The default form uses a thread local [`Renderer`](crate::Renderer), which
/// means the parsed template stays cached for the thread.  The extended form
/// takes an explicit renderer.  Variables are passed the same way as with
/// the [`context!`](crate::context) macro.
///
/// ```
/// # use ministache::render;
/// assert_eq!(render!("Hello {{name}}!", name => "World"), "Hello World!");
/// ```
///
/// ```
/// # use ministache::{Renderer, render};
/// let renderer = Renderer::new();
/// let name = "World";
/// assert_eq!(render!(in renderer, "Hello {{name}}!", name), "Hello World!");
/// ```
///
/// # Panics
///
/// This macro panics if the template fails to compile.
#[macro_export]
macro_rules! render {
    (
        in $renderer:expr,
        $tmpl:expr
        $(, $key:ident $(=> $value:expr)?)* $(,)?
    ) => {
        ($renderer).render($tmpl, $crate::context! { $($key $(=> $value)? ,)* })
            .expect("failed to render template")
    };
    (
        $tmpl:expr
        $(, $key:ident $(=> $value:expr)?)* $(,)?
    ) => {
        $crate::render!(in $crate::__context::thread_local_renderer(), $tmpl, $($key $(=> $value)? ,)*)
    }
}
