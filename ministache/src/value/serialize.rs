use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{ser, Serialize, Serializer};

use crate::error::{Error, ErrorKind};
use crate::utils::{untrusted_size_hint, OnDrop};
use crate::value::{Value, ValueMap, ValueRepr};

// We use in-band signalling to roundtrip values through serde.  This is
// not ideal but unfortunately there is no better system in serde today.
const VALUE_HANDLE_MARKER: &str = "\x01__ministache_ValueHandle";

thread_local! {
    static INTERNAL_SERIALIZATION: Cell<bool> = const { Cell::new(false) };

    // This should be an AtomicU64 but sadly 32bit targets do not necessarily have
    // AtomicU64 available.
    static LAST_VALUE_HANDLE: Cell<u32> = const { Cell::new(0) };
    static VALUE_HANDLES: RefCell<BTreeMap<u32, Value>> = RefCell::new(BTreeMap::new());
}

fn mark_internal_serialization() -> impl Drop {
    let old = INTERNAL_SERIALIZATION.with(|flag| {
        let old = flag.get();
        flag.set(true);
        old
    });
    OnDrop::new(move || {
        if !old {
            INTERNAL_SERIALIZATION.with(|flag| flag.set(false));
        }
    })
}

/// Function that returns true when serialization for [`Value`] is taking place.
///
/// The renderer creates [`Value`] objects from all views passed to it by
/// going through the regular serde serialization trait.  A [`Serialize`]
/// implementation can call this function to tune what the template engine
/// sees independently of what is normally serialized to disk.
pub fn serializing_for_value() -> bool {
    INTERNAL_SERIALIZATION.with(|flag| flag.get())
}

#[inline(always)]
fn value_map_with_capacity(capacity: usize) -> ValueMap {
    #[cfg(not(feature = "preserve_order"))]
    {
        let _ = capacity;
        ValueMap::new()
    }
    #[cfg(feature = "preserve_order")]
    {
        ValueMap::with_capacity(untrusted_size_hint(capacity))
    }
}

fn map_key(key: Value) -> Arc<str> {
    match key.0 {
        ValueRepr::String(s) => s,
        _ => Arc::from(key.to_string()),
    }
}

fn transform<T: Serialize + ?Sized>(value: &T) -> Result<Value, Error> {
    value.serialize(ValueSerializer)
}

impl Value {
    /// Creates a value from something that can be serialized.
    ///
    /// This is the method the renderer uses for every view, and what the
    /// [`context!`](crate::context) macro uses for its values.  Failures
    /// of the underlying [`Serialize`] implementation produce an undefined
    /// value.  Use [`try_from_serialize`](Self::try_from_serialize) to see
    /// the error instead.
    ///
    /// ```
    /// # use ministache::value::Value;
    /// let val = Value::from_serialize(&vec![1, 2, 3]);
    /// assert_eq!(val.to_string(), "1,2,3");
    /// ```
    ///
    /// Map keys that are not strings are converted to their string form.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Value {
        Value::try_from_serialize(value).unwrap_or(Value::UNDEFINED)
    }

    /// Creates a value from something that can be serialized or fails.
    pub fn try_from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Value, Error> {
        let _serialization_guard = mark_internal_serialization();
        transform(value)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // enable round tripping of values
        if serializing_for_value() {
            let handle = LAST_VALUE_HANDLE.with(|x| {
                // handles only live for a single serialization call so wrapping
                // around is not a concern.
                let rv = x.get().wrapping_add(1);
                x.set(rv);
                rv
            });
            VALUE_HANDLES.with(|handles| handles.borrow_mut().insert(handle, self.clone()));
            return serializer.serialize_unit_variant(
                VALUE_HANDLE_MARKER,
                handle,
                VALUE_HANDLE_MARKER,
            );
        }

        match self.0 {
            ValueRepr::Undefined | ValueRepr::None => serializer.serialize_unit(),
            ValueRepr::Bool(b) => serializer.serialize_bool(b),
            ValueRepr::U64(u) => serializer.serialize_u64(u),
            ValueRepr::I64(i) => serializer.serialize_i64(i),
            ValueRepr::F64(f) => serializer.serialize_f64(f),
            ValueRepr::String(ref s) => serializer.serialize_str(s),
            ValueRepr::Seq(ref items) => items.serialize(serializer),
            ValueRepr::Map(ref entries) => {
                use serde::ser::SerializeMap;
                let mut map = ok!(serializer.serialize_map(Some(entries.len())));
                for (k, v) in entries.iter() {
                    ok!(map.serialize_entry(&**k, v));
                }
                map.end()
            }
            ValueRepr::Object(ref obj) => match obj.enumerate() {
                Some(iter) => {
                    use serde::ser::SerializeSeq;
                    let mut seq = ok!(serializer.serialize_seq(None));
                    for item in iter {
                        ok!(seq.serialize_element(&item));
                    }
                    seq.end()
                }
                None => serializer.serialize_str(&self.to_string()),
            },
        }
    }
}

pub(crate) struct ValueSerializer;

impl Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeSeq;
    type SerializeTuple = SerializeSeq;
    type SerializeTupleStruct = SerializeSeq;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeStruct;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Value, Error> {
        Ok(Value(ValueRepr::Bool(v)))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, Error> {
        Ok(Value(ValueRepr::I64(v as i64)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, Error> {
        Ok(Value(ValueRepr::I64(v as i64)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, Error> {
        Ok(Value(ValueRepr::I64(v as i64)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, Error> {
        Ok(Value(ValueRepr::I64(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, Error> {
        match i64::try_from(v) {
            Ok(v) => Ok(Value(ValueRepr::I64(v))),
            Err(_) => Ok(Value(ValueRepr::F64(v as f64))),
        }
    }

    fn serialize_u8(self, v: u8) -> Result<Value, Error> {
        Ok(Value(ValueRepr::U64(v as u64)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, Error> {
        Ok(Value(ValueRepr::U64(v as u64)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, Error> {
        Ok(Value(ValueRepr::U64(v as u64)))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, Error> {
        Ok(Value(ValueRepr::U64(v)))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, Error> {
        match u64::try_from(v) {
            Ok(v) => Ok(Value(ValueRepr::U64(v))),
            Err(_) => Ok(Value(ValueRepr::F64(v as f64))),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Value, Error> {
        Ok(Value(ValueRepr::F64(v as f64)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, Error> {
        Ok(Value(ValueRepr::F64(v)))
    }

    fn serialize_char(self, v: char) -> Result<Value, Error> {
        Ok(Value::from(v))
    }

    fn serialize_str(self, value: &str) -> Result<Value, Error> {
        Ok(Value::from(value))
    }

    fn serialize_bytes(self, value: &[u8]) -> Result<Value, Error> {
        Ok(Value::from(String::from_utf8_lossy(value)))
    }

    fn serialize_none(self) -> Result<Value, Error> {
        Ok(Value(ValueRepr::None))
    }

    fn serialize_some<T: ?Sized>(self, value: &T) -> Result<Value, Error>
    where
        T: Serialize,
    {
        transform(value)
    }

    fn serialize_unit(self) -> Result<Value, Error> {
        Ok(Value(ValueRepr::None))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, Error> {
        Ok(Value(ValueRepr::None))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, Error> {
        if name == VALUE_HANDLE_MARKER && variant == VALUE_HANDLE_MARKER {
            VALUE_HANDLES
                .with(|handles| handles.borrow_mut().remove(&variant_index))
                .ok_or_else(|| {
                    Error::new(ErrorKind::BadSerialization, "value handle not in registry")
                })
        } else {
            Ok(Value::from(variant))
        }
    }

    fn serialize_newtype_struct<T: ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, Error>
    where
        T: Serialize,
    {
        transform(value)
    }

    fn serialize_newtype_variant<T: ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, Error>
    where
        T: Serialize,
    {
        let mut map = value_map_with_capacity(1);
        map.insert(Arc::from(variant), ok!(transform(value)));
        Ok(Value(ValueRepr::Map(Arc::new(map))))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeSeq, Error> {
        Ok(SerializeSeq {
            elements: Vec::with_capacity(untrusted_size_hint(len.unwrap_or(0))),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeSeq, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SerializeSeq, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant, Error> {
        Ok(SerializeTupleVariant {
            name: variant,
            fields: Vec::with_capacity(untrusted_size_hint(len)),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap, Error> {
        Ok(SerializeMap {
            entries: value_map_with_capacity(len.unwrap_or(0)),
            key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeStruct, Error> {
        Ok(SerializeStruct {
            fields: value_map_with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant, Error> {
        Ok(SerializeStructVariant {
            variant,
            map: value_map_with_capacity(len),
        })
    }
}

pub(crate) struct SerializeSeq {
    elements: Vec<Value>,
}

impl ser::SerializeSeq for SerializeSeq {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.elements.push(ok!(transform(value)));
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value(ValueRepr::Seq(Arc::new(self.elements))))
    }
}

impl ser::SerializeTuple for SerializeSeq {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeSeq {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, Error> {
        ser::SerializeSeq::end(self)
    }
}

pub(crate) struct SerializeTupleVariant {
    name: &'static str,
    fields: Vec<Value>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.fields.push(ok!(transform(value)));
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        let mut map = value_map_with_capacity(1);
        map.insert(
            Arc::from(self.name),
            Value(ValueRepr::Seq(Arc::new(self.fields))),
        );
        Ok(Value(ValueRepr::Map(Arc::new(map))))
    }
}

pub(crate) struct SerializeMap {
    entries: ValueMap,
    key: Option<Arc<str>>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: ?Sized>(&mut self, key: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.key = Some(map_key(ok!(transform(key))));
        Ok(())
    }

    fn serialize_value<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        let key = ok!(self.key.take().ok_or_else(|| {
            Error::new(ErrorKind::BadSerialization, "map value without key")
        }));
        self.entries.insert(key, ok!(transform(value)));
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value(ValueRepr::Map(Arc::new(self.entries))))
    }
}

pub(crate) struct SerializeStruct {
    fields: ValueMap,
}

impl ser::SerializeStruct for SerializeStruct {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.fields.insert(Arc::from(key), ok!(transform(value)));
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value(ValueRepr::Map(Arc::new(self.fields))))
    }
}

pub(crate) struct SerializeStructVariant {
    variant: &'static str,
    map: ValueMap,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.map.insert(Arc::from(key), ok!(transform(value)));
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        let mut rv = value_map_with_capacity(1);
        rv.insert(
            Arc::from(self.variant),
            Value(ValueRepr::Map(Arc::new(self.map))),
        );
        Ok(Value(ValueRepr::Map(Arc::new(rv))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_struct_and_enum() {
        #[derive(Serialize)]
        enum Shape {
            Circle { radius: u32 },
            Square(u32),
            Empty,
        }

        #[derive(Serialize)]
        struct View {
            name: &'static str,
            shapes: Vec<Shape>,
        }

        let value = Value::from_serialize(&View {
            name: "shapes",
            shapes: vec![Shape::Circle { radius: 2 }, Shape::Square(3), Shape::Empty],
        });
        assert_eq!(value.get_attr("name"), Some(Value::from("shapes")));
        let shapes = value.get_attr("shapes").unwrap();
        let circle = shapes.get_attr("0").unwrap();
        assert_eq!(
            circle.get_attr("Circle").and_then(|x| x.get_attr("radius")),
            Some(Value::from(2))
        );
        assert_eq!(
            shapes.get_attr("1").and_then(|x| x.get_attr("Square")),
            Some(Value::from(3))
        );
        assert_eq!(shapes.get_attr("2"), Some(Value::from("Empty")));
    }

    #[test]
    fn test_non_string_keys() {
        let mut map = BTreeMap::new();
        map.insert(1u32, "one");
        map.insert(2u32, "two");
        let value = Value::from_serialize(&map);
        assert_eq!(value.get_attr("2"), Some(Value::from("two")));
    }

    #[test]
    fn test_value_roundtrip() {
        let inner = Value::from_object(crate::value::SeqObject::new(|| {
            (0..3u64).map(Value::from)
        }));
        let outer = Value::from_serialize(&vec![inner.clone()]);
        let back = outer.get_attr("0").unwrap();
        assert!(back.as_object().is_some());
        assert_eq!(back, inner);
        assert!(!serializing_for_value());
    }

    #[test]
    fn test_failing_serialize() {
        struct Broken;

        impl Serialize for Broken {
            fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
                Err(ser::Error::custom("nope"))
            }
        }

        let err = Value::try_from_serialize(&Broken).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadSerialization);
        assert_eq!(err.detail(), Some("nope"));
        assert!(Value::from_serialize(&Broken).is_undefined());
    }
}
