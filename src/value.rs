//! Values flowing in and out of the serializer.
//!
//! Objects hand the engine [`Attribute`]s: either a [`Scalar`] or one or
//! more related objects. The engine hands back [`Serialized`] output made of
//! [`Record`]s, which are ordered JSON maps ready for any `serde` encoder.

use crate::error::Result;
use crate::object::Serializable;

use chrono::{DateTime, FixedOffset, TimeZone};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A single serialized object. Keys keep the order they were selected in.
pub type Record = Map<String, Value>;

/// Raw scalar read from an object, before casting.
///
/// Temporal and decimal values are kept in their native types so the
/// [`CastPolicy`] can decide how they are rendered.
///
/// [`CastPolicy`]: crate::ser::cast_policy::CastPolicy
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Time(DateTime<FixedOffset>),
    Decimal(Decimal),
    Json(Value),
}

impl Scalar {
    /// Wraps any `serde` value, for attributes without a dedicated variant.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Scalar> {
        Ok(Scalar::Json(serde_json::to_value(value)?))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null | Scalar::Json(Value::Null))
    }
}

macro_rules! scalar_from {
    ($variant:ident, $target:ty, $($type:ty),*) => {
        $(
            impl From<$type> for Scalar {
                fn from(val: $type) -> Self {
                    Scalar::$variant(val as $target)
                }
            }
        )*
    };
}

macro_rules! attribute_from {
    ($($type:ty),*) => {
        $(
            impl<'a> From<$type> for Attribute<'a> {
                fn from(val: $type) -> Self {
                    Attribute::Scalar(val.into())
                }
            }
        )*
    };
}

scalar_from!(Int, i64, i8, i16, i32, i64, isize);
scalar_from!(UInt, u64, u8, u16, u32, u64, usize);
scalar_from!(Float, f64, f32, f64);

impl From<bool> for Scalar {
    fn from(val: bool) -> Self {
        Scalar::Bool(val)
    }
}

impl From<&str> for Scalar {
    fn from(val: &str) -> Self {
        Scalar::String(val.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(val: String) -> Self {
        Scalar::String(val)
    }
}

impl From<&String> for Scalar {
    fn from(val: &String) -> Self {
        Scalar::String(val.clone())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Scalar {
    fn from(val: DateTime<Tz>) -> Self {
        Scalar::Time(val.fixed_offset())
    }
}

impl From<Decimal> for Scalar {
    fn from(val: Decimal) -> Self {
        Scalar::Decimal(val)
    }
}

impl From<Value> for Scalar {
    fn from(val: Value) -> Self {
        Scalar::Json(val)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(val: Option<T>) -> Self {
        val.map_or(Scalar::Null, Into::into)
    }
}

/// The raw value of a field as read from an object.
#[derive(Debug)]
pub enum Attribute<'a> {
    Scalar(Scalar),
    One(&'a dyn Serializable),
    Many(Vec<&'a dyn Serializable>),
}

impl<'a> Attribute<'a> {
    pub fn null() -> Self {
        Attribute::Scalar(Scalar::Null)
    }

    pub fn one<T: Serializable>(object: &'a T) -> Self {
        Attribute::One(object)
    }

    /// A to-one relation that may be absent.
    pub fn optional<T: Serializable>(object: Option<&'a T>) -> Self {
        match object {
            Some(object) => Attribute::One(object),
            None => Attribute::null(),
        }
    }

    pub fn many<T: Serializable>(objects: &'a [T]) -> Self {
        Attribute::Many(
            objects
                .iter()
                .map(|object| object as &dyn Serializable)
                .collect(),
        )
    }
}

attribute_from!(
    Scalar, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, &str, String,
    &String, Decimal, Value
);

impl<'a, Tz: TimeZone> From<DateTime<Tz>> for Attribute<'a> {
    fn from(val: DateTime<Tz>) -> Self {
        Attribute::Scalar(val.into())
    }
}

impl<'a, T: Into<Scalar>> From<Option<T>> for Attribute<'a> {
    fn from(val: Option<T>) -> Self {
        Attribute::Scalar(val.into())
    }
}

/// Output of a serialization call: one record per object, in input order.
#[derive(Clone, Debug, PartialEq)]
pub enum Serialized {
    One(Record),
    Many(Vec<Record>),
}

impl Serialized {
    pub fn into_value(self) -> Value {
        match self {
            Serialized::One(record) => Value::Object(record),
            Serialized::Many(records) => {
                Value::Array(records.into_iter().map(Value::Object).collect())
            }
        }
    }

    pub fn as_one(&self) -> Option<&Record> {
        match self {
            Serialized::One(record) => Some(record),
            Serialized::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&[Record]> {
        match self {
            Serialized::One(_) => None,
            Serialized::Many(records) => Some(records),
        }
    }
}

impl From<Serialized> for Value {
    fn from(serialized: Serialized) -> Self {
        serialized.into_value()
    }
}

impl Serialize for Serialized {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Serialized::One(record) => record.serialize(serializer),
            Serialized::Many(records) => records.serialize(serializer),
        }
    }
}
