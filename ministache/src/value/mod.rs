//! Provides a dynamic value type abstraction.
//!
//! Views handed to the renderer are converted into [`Value`]s.  For the most
//! part this conversion is invisible as it happens through [`serde`]:
//! anything that implements [`Serialize`](serde::Serialize) can be rendered.
//!
//! # Basic Value Conversions
//!
//! Values are typically created via the [`From`] trait:
//!
//! ```
//! # use ministache::value::Value;
//! let int_value = Value::from(42);
//! let none_value = Value::from(());
//! let true_value = Value::from(true);
//! ```
//!
//! Or via the [`FromIterator`] trait:
//!
//! ```
//! # use ministache::value::Value;
//! // collection into a sequence
//! let value: Value = (1..10).into_iter().collect();
//!
//! // collection into a map
//! let value: Value = [("key", "value")].into_iter().collect();
//! ```
//!
//! # Serde Conversions
//!
//! The renderer creates values through serde whenever a view is passed to
//! it.  This can also be triggered manually with [`Value::from_serialize`]:
//!
//! ```
//! # use ministache::value::Value;
//! let value = Value::from_serialize(&[1, 2, 3]);
//! ```
//!
//! # Dynamic Objects
//!
//! Host types that want to answer lookups themselves implement [`Object`]
//! and are wrapped with [`Value::from_object`].  This is how computed
//! members are exposed to templates.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;

pub use crate::value::object::{Object, ObjectRepr, SeqObject};
pub use crate::value::serialize::serializing_for_value;

mod object;
mod serialize;

/// The map type backing map values.
#[cfg(not(feature = "preserve_order"))]
pub type ValueMap = BTreeMap<Arc<str>, Value>;

/// The map type backing map values.
#[cfg(feature = "preserve_order")]
pub type ValueMap = indexmap::IndexMap<Arc<str>, Value>;

/// Describes the kind of value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ValueKind {
    /// The value is undefined
    Undefined,
    /// The value is the none singleton ([`()`])
    None,
    /// The value is a [`bool`]
    Bool,
    /// The value is a number of a supported type.
    Number,
    /// The value is a string.
    String,
    /// The value is a sequence of values.
    Seq,
    /// The value is a key/value mapping.
    Map,
    /// The value is a dynamic object.
    Object,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            ValueKind::Undefined => "undefined",
            ValueKind::None => "none",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Seq => "sequence",
            ValueKind::Map => "map",
            ValueKind::Object => "object",
        })
    }
}

#[derive(Clone)]
pub(crate) enum ValueRepr {
    Undefined,
    None,
    Bool(bool),
    U64(u64),
    I64(i64),
    F64(f64),
    String(Arc<str>),
    Seq(Arc<Vec<Value>>),
    Map(Arc<ValueMap>),
    Object(Arc<dyn Object>),
}

/// Represents a dynamically typed value in the template engine.
#[derive(Clone)]
pub struct Value(pub(crate) ValueRepr);

impl Default for Value {
    fn default() -> Value {
        Value::UNDEFINED
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ValueRepr::Undefined => f.write_str("undefined"),
            ValueRepr::None => f.write_str("none"),
            ValueRepr::Bool(val) => fmt::Debug::fmt(&val, f),
            ValueRepr::U64(val) => fmt::Debug::fmt(&val, f),
            ValueRepr::I64(val) => fmt::Debug::fmt(&val, f),
            ValueRepr::F64(val) => fmt::Debug::fmt(&val, f),
            ValueRepr::String(ref val) => fmt::Debug::fmt(val, f),
            ValueRepr::Seq(ref items) => f.debug_list().entries(items.iter()).finish(),
            ValueRepr::Map(ref map) => f.debug_map().entries(map.iter()).finish(),
            ValueRepr::Object(ref obj) => fmt::Debug::fmt(obj, f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ValueRepr::Undefined | ValueRepr::None => Ok(()),
            ValueRepr::Bool(val) => fmt::Display::fmt(&val, f),
            ValueRepr::U64(val) => fmt::Display::fmt(&val, f),
            ValueRepr::I64(val) => fmt::Display::fmt(&val, f),
            ValueRepr::F64(val) => fmt::Display::fmt(&val, f),
            ValueRepr::String(ref val) => f.write_str(val),
            ValueRepr::Seq(ref items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        ok!(f.write_str(","));
                    }
                    ok!(fmt::Display::fmt(item, f));
                }
                Ok(())
            }
            ValueRepr::Map(_) => f.write_str("[object]"),
            ValueRepr::Object(ref obj) => obj.render(f),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (ValueRepr::Undefined, ValueRepr::Undefined) => true,
            (ValueRepr::None, ValueRepr::None) => true,
            (ValueRepr::Bool(a), ValueRepr::Bool(b)) => a == b,
            (ValueRepr::String(a), ValueRepr::String(b)) => a == b,
            (ValueRepr::Seq(a), ValueRepr::Seq(b)) => a == b,
            (ValueRepr::Map(a), ValueRepr::Map(b)) => a == b,
            (ValueRepr::Object(a), ValueRepr::Object(b)) => Arc::ptr_eq(a, b),
            _ => match (self.as_i128(), other.as_i128()) {
                (Some(a), Some(b)) => a == b,
                _ => match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                },
            },
        }
    }
}

impl Value {
    /// The undefined value.
    ///
    /// This is what lookups of missing names resolve to.
    pub const UNDEFINED: Value = Value(ValueRepr::Undefined);

    /// Creates a value from a dynamic object.
    pub fn from_object<T: Object + 'static>(value: T) -> Value {
        Value::from_dyn_object(Arc::new(value))
    }

    /// Creates a value from an already shared dynamic object.
    pub fn from_dyn_object(value: Arc<dyn Object>) -> Value {
        Value(ValueRepr::Object(value))
    }

    /// Returns the kind of the value.
    pub fn kind(&self) -> ValueKind {
        match self.0 {
            ValueRepr::Undefined => ValueKind::Undefined,
            ValueRepr::None => ValueKind::None,
            ValueRepr::Bool(_) => ValueKind::Bool,
            ValueRepr::U64(_) | ValueRepr::I64(_) | ValueRepr::F64(_) => ValueKind::Number,
            ValueRepr::String(_) => ValueKind::String,
            ValueRepr::Seq(_) => ValueKind::Seq,
            ValueRepr::Map(_) => ValueKind::Map,
            ValueRepr::Object(_) => ValueKind::Object,
        }
    }

    /// Is this value undefined?
    pub fn is_undefined(&self) -> bool {
        matches!(self.0, ValueRepr::Undefined)
    }

    /// Is this value none?
    pub fn is_none(&self) -> bool {
        matches!(self.0, ValueRepr::None)
    }

    /// Returns `true` if the value counts as missing for name resolution.
    ///
    /// Both undefined and none are absent.
    pub fn is_absent(&self) -> bool {
        matches!(self.0, ValueRepr::Undefined | ValueRepr::None)
    }

    /// Is this value true?
    ///
    /// Only undefined, none and `false` are false.  Empty strings, zero and
    /// empty sequences are all true.
    pub fn is_true(&self) -> bool {
        !matches!(
            self.0,
            ValueRepr::Undefined | ValueRepr::None | ValueRepr::Bool(false)
        )
    }

    /// If the value is a string, return it.
    pub fn as_str(&self) -> Option<&str> {
        match self.0 {
            ValueRepr::String(ref s) => Some(s),
            _ => None,
        }
    }

    /// If the value is a dynamic object, return it.
    pub fn as_object(&self) -> Option<&Arc<dyn Object>> {
        match self.0 {
            ValueRepr::Object(ref obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns `true` if sections iterate over this value.
    pub fn is_seq(&self) -> bool {
        match self.0 {
            ValueRepr::Seq(_) => true,
            ValueRepr::Object(ref obj) => obj.repr() == ObjectRepr::Seq,
            _ => false,
        }
    }

    /// Returns the number of items for sequences and maps.
    pub fn len(&self) -> Option<usize> {
        match self.0 {
            ValueRepr::String(ref s) => Some(s.chars().count()),
            ValueRepr::Seq(ref items) => Some(items.len()),
            ValueRepr::Map(ref map) => Some(map.len()),
            ValueRepr::Object(ref obj) if obj.repr() == ObjectRepr::Seq => {
                obj.enumerate().map(|iter| iter.count())
            }
            _ => None,
        }
    }

    /// Returns `true` for sequences without items.
    pub(crate) fn is_empty_seq(&self) -> bool {
        match self.0 {
            ValueRepr::Seq(ref items) => items.is_empty(),
            ValueRepr::Object(ref obj) if obj.repr() == ObjectRepr::Seq => obj
                .enumerate()
                .map_or(true, |mut iter| iter.next().is_none()),
            _ => false,
        }
    }

    /// Looks up a member by name.
    ///
    /// Maps answer by key, sequences by numeric index and objects through
    /// [`Object::get_value`].  Everything else has no members.
    ///
    /// ```
    /// # use ministache::value::Value;
    /// let value: Value = [("names", vec!["Moe", "Larry"])].into_iter().collect();
    /// let names = value.get_attr("names").unwrap();
    /// assert_eq!(names.get_attr("1"), Some(Value::from("Larry")));
    /// assert_eq!(names.get_attr("2"), None);
    /// ```
    pub fn get_attr(&self, key: &str) -> Option<Value> {
        match self.0 {
            ValueRepr::Map(ref map) => map.get(key).cloned(),
            ValueRepr::Seq(ref items) => {
                let idx: usize = some!(key.parse().ok());
                items.get(idx).cloned()
            }
            ValueRepr::Object(ref obj) => obj.get_value(key),
            _ => None,
        }
    }

    /// Iterates over the items of a sequence.
    ///
    /// Returns `None` if the value cannot be iterated.
    pub fn try_iter(&self) -> Option<ValueIter<'_>> {
        match self.0 {
            ValueRepr::Seq(ref items) => Some(ValueIter {
                imp: ValueIterImpl::Seq(items.iter()),
            }),
            ValueRepr::Object(ref obj) if obj.repr() == ObjectRepr::Seq => Some(ValueIter {
                imp: ValueIterImpl::Dyn(some!(obj.enumerate())),
            }),
            _ => None,
        }
    }

    fn as_i128(&self) -> Option<i128> {
        match self.0 {
            ValueRepr::U64(v) => Some(v as i128),
            ValueRepr::I64(v) => Some(v as i128),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self.0 {
            ValueRepr::U64(v) => Some(v as f64),
            ValueRepr::I64(v) => Some(v as f64),
            ValueRepr::F64(v) => Some(v),
            _ => None,
        }
    }
}

/// Iterates over the items of a sequence value.
pub struct ValueIter<'a> {
    imp: ValueIterImpl<'a>,
}

enum ValueIterImpl<'a> {
    Seq(std::slice::Iter<'a, Value>),
    Dyn(Box<dyn Iterator<Item = Value> + Send + Sync + 'a>),
}

impl Iterator for ValueIter<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self.imp {
            ValueIterImpl::Seq(ref mut iter) => iter.next().cloned(),
            ValueIterImpl::Dyn(ref mut iter) => iter.next(),
        }
    }
}

impl fmt::Debug for ValueIter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueIter").finish()
    }
}

macro_rules! value_from {
    ($src:ty, $dst:ident) => {
        impl From<$src> for Value {
            #[inline(always)]
            fn from(val: $src) -> Self {
                Value(ValueRepr::$dst(val as _))
            }
        }
    };
}

value_from!(bool, Bool);
value_from!(u8, U64);
value_from!(u16, U64);
value_from!(u32, U64);
value_from!(u64, U64);
value_from!(usize, U64);
value_from!(i8, I64);
value_from!(i16, I64);
value_from!(i32, I64);
value_from!(i64, I64);
value_from!(isize, I64);
value_from!(f32, F64);
value_from!(f64, F64);

impl From<()> for Value {
    #[inline(always)]
    fn from(_: ()) -> Self {
        Value(ValueRepr::None)
    }
}

impl From<char> for Value {
    #[inline(always)]
    fn from(val: char) -> Self {
        Value::from(val.to_string())
    }
}

impl<'a> From<&'a str> for Value {
    #[inline(always)]
    fn from(val: &'a str) -> Self {
        Value(ValueRepr::String(Arc::from(val)))
    }
}

impl From<String> for Value {
    #[inline(always)]
    fn from(val: String) -> Self {
        Value(ValueRepr::String(Arc::from(val)))
    }
}

impl<'a> From<Cow<'a, str>> for Value {
    #[inline(always)]
    fn from(val: Cow<'a, str>) -> Self {
        match val {
            Cow::Borrowed(x) => x.into(),
            Cow::Owned(x) => x.into(),
        }
    }
}

impl From<Arc<str>> for Value {
    #[inline(always)]
    fn from(val: Arc<str>) -> Self {
        Value(ValueRepr::String(val))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline(always)]
    fn from(val: Option<T>) -> Self {
        match val {
            Some(val) => val.into(),
            None => Value(ValueRepr::None),
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(val: Vec<T>) -> Self {
        val.into_iter().collect()
    }
}

impl<K: Into<Arc<str>>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(val: BTreeMap<K, V>) -> Self {
        val.into_iter().collect()
    }
}

impl<K: Into<Arc<str>>, V: Into<Value>, S: BuildHasher> From<HashMap<K, V, S>> for Value {
    fn from(val: HashMap<K, V, S>) -> Self {
        val.into_iter().collect()
    }
}

#[cfg(feature = "preserve_order")]
impl<K: Into<Arc<str>>, V: Into<Value>, S: BuildHasher> From<indexmap::IndexMap<K, V, S>>
    for Value
{
    fn from(val: indexmap::IndexMap<K, V, S>) -> Self {
        val.into_iter().collect()
    }
}

impl<V: Into<Value>> FromIterator<V> for Value {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        Value(ValueRepr::Seq(Arc::new(
            iter.into_iter().map(Into::into).collect(),
        )))
    }
}

impl<K: Into<Arc<str>>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Value(ValueRepr::Map(Arc::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )))
    }
}
