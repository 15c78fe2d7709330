use crate::value::Scalar;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

/// Decides how scalar values are rendered in the output.
///
/// Only temporal and decimal values have a choice to make; every other
/// scalar maps onto the matching JSON value.
pub trait CastPolicy: Clone + Send + Sync {
    fn cast_time(&self, time: &DateTime<FixedOffset>) -> Value;

    fn cast_decimal(&self, decimal: &Decimal) -> Value;

    fn cast(&self, scalar: Scalar) -> Value {
        match scalar {
            Scalar::Null => Value::Null,
            Scalar::Bool(val) => Value::Bool(val),
            Scalar::Int(val) => Value::from(val),
            Scalar::UInt(val) => Value::from(val),
            Scalar::Float(val) => Value::from(val),
            Scalar::String(val) => Value::String(val),
            Scalar::Time(val) => self.cast_time(&val),
            Scalar::Decimal(val) => self.cast_decimal(&val),
            Scalar::Json(val) => val,
        }
    }
}

fn iso8601_millis(time: &DateTime<FixedOffset>) -> Value {
    Value::String(time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// ISO-8601 times with millisecond precision, decimals as floats.
#[derive(Clone, Debug, Default)]
pub struct DefaultCastPolicy;

impl CastPolicy for DefaultCastPolicy {
    fn cast_time(&self, time: &DateTime<FixedOffset>) -> Value {
        iso8601_millis(time)
    }

    fn cast_decimal(&self, decimal: &Decimal) -> Value {
        decimal.to_f64().map_or(Value::Null, Value::from)
    }
}

/// Like [`DefaultCastPolicy`], but decimals keep every digit as strings.
#[derive(Clone, Debug, Default)]
pub struct PreciseCastPolicy;

impl CastPolicy for PreciseCastPolicy {
    fn cast_time(&self, time: &DateTime<FixedOffset>) -> Value {
        iso8601_millis(time)
    }

    fn cast_decimal(&self, decimal: &Decimal) -> Value {
        Value::String(decimal.to_string())
    }
}
