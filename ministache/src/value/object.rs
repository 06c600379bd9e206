use std::fmt;

use crate::value::Value;

/// A utility trait that represents a dynamic object.
///
/// This is the bridge between the render engine and arbitrary Rust types.
/// Most views are plain serde values (maps, sequences and primitives) but a
/// type can also be exposed directly, without a serialization step, by
/// implementing [`Object`] and wrapping it with
/// [`Value::from_object`](crate::value::Value::from_object).
///
/// Name resolution funnels through [`get_value`](Self::get_value).  Whatever
/// a host type considers a member (a method without arguments, a computed
/// property, a field or a dictionary entry) is answered from there.
/// Returning `None` means the member is absent, in which case the engine keeps
/// searching in the enclosing scopes.
///
/// ```
/// use ministache::value::{Object, Value};
///
/// #[derive(Debug)]
/// struct User {
///     first: String,
///     last: String,
/// }
///
/// impl Object for User {
///     fn get_value(&self, key: &str) -> Option<Value> {
///         match key {
///             "first" => Some(Value::from(self.first.as_str())),
///             "full_name" => Some(Value::from(format!("{} {}", self.first, self.last))),
///             _ => None,
///         }
///     }
/// }
///
/// let user = Value::from_object(User { first: "Ada".into(), last: "Lovelace".into() });
/// let rv = ministache::render("{{full_name}}", ministache::context!(user)).unwrap();
/// assert_eq!(rv, "");
/// let rv = ministache::render("{{user.full_name}}", ministache::context!(user)).unwrap();
/// assert_eq!(rv, "Ada Lovelace");
/// ```
///
/// Objects that behave like lists return [`ObjectRepr::Seq`] from
/// [`repr`](Self::repr) and yield their items from
/// [`enumerate`](Self::enumerate).  Sections iterate over them.
pub trait Object: fmt::Debug + Send + Sync {
    /// Looks up a member by name.
    fn get_value(&self, key: &str) -> Option<Value> {
        let _key = key;
        None
    }

    /// Describes how the engine should treat the object.
    fn repr(&self) -> ObjectRepr {
        ObjectRepr::Map
    }

    /// Iterates over the items of a sequence object.
    ///
    /// Only consulted when [`repr`](Self::repr) returns [`ObjectRepr::Seq`].
    fn enumerate(&self) -> Option<Box<dyn Iterator<Item = Value> + Send + Sync + '_>> {
        None
    }

    /// Writes the object as interpolated text.
    ///
    /// Sequences join their items with `,`, maps render as `[object]` and
    /// plain objects use their debug representation.
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr() {
            ObjectRepr::Seq => {
                if let Some(iter) = self.enumerate() {
                    for (idx, item) in iter.enumerate() {
                        if idx > 0 {
                            ok!(f.write_str(","));
                        }
                        ok!(fmt::Display::fmt(&item, f));
                    }
                }
                Ok(())
            }
            ObjectRepr::Map => f.write_str("[object]"),
            ObjectRepr::Plain => fmt::Debug::fmt(self, f),
        }
    }
}

/// Defines the behavior of an [`Object`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ObjectRepr {
    /// An object that only renders as text.
    Plain,
    /// An object that answers member lookups.  This is the default.
    Map,
    /// An object that sections iterate over.
    Seq,
}

/// A sequence object backed by a closure producing items.
///
/// Useful for exposing lazily computed lists to sections.
///
/// ```
/// # use ministache::value::{SeqObject, Value};
/// let squares = Value::from_object(SeqObject::new(|| (1..4u64).map(|x| Value::from(x * x))));
/// assert_eq!(ministache::render("{{#sq}}{{.}};{{/sq}}", ministache::context!(sq => squares)).unwrap(), "1;4;9;");
/// ```
pub struct SeqObject<F> {
    maker: F,
}

impl<F, I> SeqObject<F>
where
    F: Fn() -> I + Send + Sync,
    I: Iterator<Item = Value> + Send + Sync + 'static,
{
    /// Creates a sequence object from an iterator factory.
    pub fn new(maker: F) -> SeqObject<F> {
        SeqObject { maker }
    }
}

impl<F> fmt::Debug for SeqObject<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SeqObject")
    }
}

impl<F, I> Object for SeqObject<F>
where
    F: Fn() -> I + Send + Sync,
    I: Iterator<Item = Value> + Send + Sync + 'static,
{
    fn get_value(&self, key: &str) -> Option<Value> {
        let idx: usize = some!(key.parse().ok());
        (self.maker)().nth(idx)
    }

    fn repr(&self) -> ObjectRepr {
        ObjectRepr::Seq
    }

    fn enumerate(&self) -> Option<Box<dyn Iterator<Item = Value> + Send + Sync + '_>> {
        Some(Box::new((self.maker)()))
    }
}
