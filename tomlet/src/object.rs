//! Runtime values.
//!
//! Evaluation reduces a program to a single [`Object`]: a scalar, a list or a
//! map. Objects are plain owned values; nothing is shared by reference, so
//! every operation returns a fresh object.

use std::cmp::Ordering;
use std::fmt::Display;

use json::JsonValue;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, TypeMismatch, Value};
use crate::serialize::Format;
use crate::traits::{ToMap, ToVec};
use crate::types::{BinOp, Key, List, Map, Type};


#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    List(List),
    Map(Map),
    Null,
}

impl Object {
    /// Construct an integer.
    pub fn int(value: i64) -> Self {
        Self::Integer(value)
    }

    /// Construct a float.
    pub fn float(value: f64) -> Self {
        Self::Float(value)
    }

    /// Construct a string.
    pub fn str<T: AsRef<str>>(value: T) -> Self {
        Self::String(value.as_ref().to_owned())
    }

    /// Construct a boolean.
    pub fn bool(value: bool) -> Self {
        Self::Boolean(value)
    }

    /// Construct a list.
    pub fn list<T>(x: T) -> Self
    where
        T: ToVec<Object>,
    {
        Self::List(x.to_vec())
    }

    /// Construct a map.
    pub fn map<T>(x: T) -> Self
    where
        T: ToMap,
    {
        Self::Map(x.to_map())
    }

    /// Get the type of this object.
    pub fn type_of(&self) -> Type {
        match self {
            Self::Integer(_) => Type::Integer,
            Self::Float(_) => Type::Float,
            Self::String(_) => Type::String,
            Self::Boolean(_) => Type::Boolean,
            Self::List(_) => Type::List,
            Self::Map(_) => Type::Map,
            Self::Null => Type::Null,
        }
    }

    /// Fail with a serialization error if this object, or anything it
    /// contains, has a type the output format can't represent.
    pub(crate) fn check_serializable(&self, format: Format, allow_null: bool) -> Result<(), Error> {
        match self {
            Self::Null if !allow_null => Err(Error::new(TypeMismatch::Serialize(Type::Null, format))),
            Self::List(values) => values.iter().try_for_each(|x| x.check_serializable(format, allow_null)),
            Self::Map(values) => values.iter().try_for_each(|(_, x)| x.check_serializable(format, allow_null)),
            _ => Ok(()),
        }
    }

    /// The plus operator.
    ///
    /// If either operand is a string, the result is the concatenation of the
    /// string representations of both. Otherwise both must be numbers:
    /// integers add to integers, and any float promotes the result to float.
    pub fn add(&self, other: &Self) -> Result<Self, Error> {
        match (self, other) {
            (Self::String(_), _) | (_, Self::String(_)) => Ok(Self::String(format!("{}{}", self, other))),

            (Self::Integer(x), Self::Integer(y)) => x.checked_add(*y)
                .map(Self::Integer)
                .ok_or_else(|| Error::new(Value::IntegerOverflow)),

            (Self::Integer(x), Self::Float(y)) => Ok(Self::Float(*x as f64 + y)),
            (Self::Float(x), Self::Integer(y)) => Ok(Self::Float(x + *y as f64)),
            (Self::Float(x), Self::Float(y)) => Ok(Self::Float(x + y)),

            _ => Err(Error::new(TypeMismatch::BinOp(
                self.type_of(),
                other.type_of(),
                BinOp::Add,
            ))),
        }
    }

    /// Write the representation of an object nested inside a collection.
    /// Strings are quoted here, unlike at the top level.
    fn fmt_nested(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(r) => f.write_fmt(format_args!("{:?}", r)),
            _ => Display::fmt(self, f),
        }
    }
}

/// Natural ordering: numbers among themselves, strings among themselves, and
/// lists lexicographically. Everything else is incomparable.
impl PartialOrd for Object {
    fn partial_cmp(&self, other: &Object) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(x), Self::Integer(y)) => x.partial_cmp(y),
            (Self::Integer(x), Self::Float(y)) => (*x as f64).partial_cmp(y),
            (Self::Float(x), Self::Integer(y)) => x.partial_cmp(&(*y as f64)),
            (Self::Float(x), Self::Float(y)) => x.partial_cmp(y),
            (Self::String(x), Self::String(y)) => x.partial_cmp(y),
            (Self::List(x), Self::List(y)) => {
                for (xx, yy) in x.iter().zip(y.iter()) {
                    match xx.partial_cmp(yy)? {
                        Ordering::Equal => continue,
                        ordering => return Some(ordering),
                    }
                }
                x.len().partial_cmp(&y.len())
            }
            _ => None,
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(r) => f.write_str(r),
            Self::Integer(r) => f.write_fmt(format_args!("{}", r)),
            Self::Float(r) => f.write_fmt(format_args!("{:?}", r)),
            Self::Boolean(true) => f.write_str("true"),
            Self::Boolean(false) => f.write_str("false"),
            Self::Null => f.write_str("null"),

            Self::List(elements) => {
                f.write_str("[")?;
                let mut iter = elements.iter().peekable();
                while let Some(element) = iter.next() {
                    element.fmt_nested(f)?;
                    if iter.peek().is_some() {
                        f.write_str(", ")?;
                    }
                }
                f.write_str("]")
            }

            Self::Map(elements) => {
                f.write_str("{")?;
                let mut iter = elements.iter().peekable();
                while let Some((k, v)) = iter.next() {
                    f.write_fmt(format_args!("{}: ", k.as_str()))?;
                    v.fmt_nested(f)?;
                    if iter.peek().is_some() {
                        f.write_str(", ")?;
                    }
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::bool(value)
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Object::str(value)
    }
}

impl From<String> for Object {
    fn from(value: String) -> Self {
        Object::String(value)
    }
}

impl From<i32> for Object {
    fn from(value: i32) -> Self {
        Object::Integer(value as i64)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Integer(value)
    }
}

impl From<f64> for Object {
    fn from(x: f64) -> Self {
        Object::Float(x)
    }
}

impl From<List> for Object {
    fn from(value: List) -> Self {
        Object::List(value)
    }
}

impl From<Map> for Object {
    fn from(value: Map) -> Self {
        Object::Map(value)
    }
}

impl TryFrom<Object> for JsonValue {
    type Error = Error;

    fn try_from(value: Object) -> Result<Self, Self::Error> {
        JsonValue::try_from(&value)
    }
}

impl TryFrom<&Object> for JsonValue {
    type Error = Error;

    fn try_from(value: &Object) -> Result<Self, Self::Error> {
        match value {
            Object::Integer(x) => Ok(JsonValue::from(*x)),
            Object::Float(x) => Ok(JsonValue::from(*x)),
            Object::String(x) => Ok(JsonValue::from(x.as_str())),
            Object::Boolean(x) => Ok(JsonValue::from(*x)),
            Object::List(x) => Ok(JsonValue::Array(
                x.iter().map(JsonValue::try_from).collect::<Result<Vec<_>, _>>()?
            )),
            Object::Map(x) => {
                let mut val = JsonValue::new_object();
                for (key, element) in x.iter() {
                    val[key.as_str()] = JsonValue::try_from(element)?;
                }
                Ok(val)
            }
            Object::Null => Ok(JsonValue::Null),
        }
    }
}

// Custom serialization and deserialization logic, used for TOML output and
// for reading TOML documents back.
impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(x) => serializer.serialize_i64(*x),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::String(x) => serializer.serialize_str(x),
            Self::Boolean(x) => serializer.serialize_bool(*x),
            Self::List(x) => x.serialize(serializer),
            Self::Map(x) => {
                let mut map = serializer.serialize_map(Some(x.len()))?;
                for (key, value) in x.iter() {
                    map.serialize_entry(key.as_str(), value)?;
                }
                map.end()
            }
            Self::Null => serializer.serialize_unit(),
        }
    }
}

struct ObjectVisitor;

impl<'a> Visitor<'a> for ObjectVisitor {
    type Value = Object;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("an integer, float, string, boolean, list or map")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Object::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Object::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v).map(Object::Integer).map_err(|_| E::custom("integer out of range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Object::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Object::str(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Object::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Object::Null)
    }

    fn visit_seq<A: SeqAccess<'a>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut values = List::new();
        while let Some(value) = seq.next_element::<Object>()? {
            values.push(value);
        }
        Ok(Object::List(values))
    }

    fn visit_map<A: MapAccess<'a>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut values = Map::new();
        while let Some((key, value)) = access.next_entry::<String, Object>()? {
            values.insert(Key::new(key.as_str()), value);
        }
        Ok(Object::Map(values))
    }
}

impl<'a> Deserialize<'a> for Object {
    fn deserialize<D: Deserializer<'a>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ObjectVisitor)
    }
}
