use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

use crate::error::CastError;
use crate::schema::{FieldDef, FieldKind};

/// A type that can appear as a value-object field.
///
/// Implemented for strings, integers, floats, `bool`, chrono date/times,
/// `serde_json::Value`, `Option<T>`, `Vec<T>`, and every
/// `#[derive(ValueObject)]` type (as a nested object).
pub trait FieldValue: Sized {
    fn kind() -> FieldKind;

    /// Whether the field must be present in stored JSON.
    fn required() -> bool {
        true
    }

    fn encode(&self) -> Result<Value, CastError>;

    fn decode(value: &Value) -> Result<Self, CastError>;

    /// Value to use when the key is absent. `None` means absence is an error.
    fn absent() -> Option<Self> {
        None
    }
}

/// A plain data record stored as one JSON object.
///
/// Usually derived: `#[derive(ValueObject)]` generates the field table and
/// both directions from the struct declaration, no runtime reflection.
pub trait ValueObject: Sized {
    /// Type name used in error messages and cast directives.
    fn type_name() -> &'static str;

    /// Ordered field table (declaration order).
    fn fields() -> Vec<FieldDef>;

    fn to_object(&self) -> Result<Map<String, Value>, CastError>;

    /// Build an instance from a JSON object. All required fields must be
    /// present; unknown keys are ignored.
    fn from_object(object: &Map<String, Value>) -> Result<Self, CastError>;
}

// ════════════════════════════════════════════════════════════════
//  Helpers used by the derive
// ════════════════════════════════════════════════════════════════

/// Fail with `MissingArguments` listing every required field absent from `object`.
pub fn check_required(
    type_name: &str,
    fields: &[FieldDef],
    object: &Map<String, Value>,
) -> Result<(), CastError> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|f| f.required && !object.contains_key(&f.name))
        .map(|f| f.name.clone())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CastError::MissingArguments {
            type_name: type_name.to_string(),
            missing,
        })
    }
}

pub fn encode_field<T: FieldValue>(value: &T, name: &str) -> Result<Value, CastError> {
    value.encode().map_err(|e| e.with_field(name))
}

pub fn decode_field<T: FieldValue>(
    object: &Map<String, Value>,
    name: &str,
    type_name: &str,
) -> Result<T, CastError> {
    match object.get(name) {
        Some(value) => T::decode(value).map_err(|e| e.with_field(name)),
        None => T::absent().ok_or_else(|| CastError::MissingArguments {
            type_name: type_name.to_string(),
            missing: vec![name.to_string()],
        }),
    }
}

/// Encode a value object as a JSON object value.
pub fn encode_object<T: ValueObject>(value: &T) -> Result<Value, CastError> {
    value.to_object().map(Value::Object)
}

/// Decode a JSON value that must be an object of type `T`.
pub fn decode_object<T: ValueObject>(value: &Value) -> Result<T, CastError> {
    match value {
        Value::Object(object) => T::from_object(object),
        other => Err(CastError::conversion(T::type_name(), other)),
    }
}

// ════════════════════════════════════════════════════════════════
//  Date/time rendering
// ════════════════════════════════════════════════════════════════

/// RFC 3339 with the original offset. Always `+HH:MM` (never `Z`); fractional
/// seconds only when non-zero.
pub fn render_datetime(value: &DateTime<FixedOffset>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

pub fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

pub fn render_date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

// ════════════════════════════════════════════════════════════════
//  Scalar impls
// ════════════════════════════════════════════════════════════════

impl FieldValue for String {
    fn kind() -> FieldKind {
        FieldKind::String
    }

    fn encode(&self) -> Result<Value, CastError> {
        Ok(Value::String(self.clone()))
    }

    fn decode(value: &Value) -> Result<Self, CastError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CastError::conversion(FieldKind::String, value))
    }
}

impl FieldValue for bool {
    fn kind() -> FieldKind {
        FieldKind::Bool
    }

    fn encode(&self) -> Result<Value, CastError> {
        Ok(Value::Bool(*self))
    }

    fn decode(value: &Value) -> Result<Self, CastError> {
        value
            .as_bool()
            .ok_or_else(|| CastError::conversion(FieldKind::Bool, value))
    }
}

macro_rules! signed_field_value {
    ($($t:ty),*) => {$(
        impl FieldValue for $t {
            fn kind() -> FieldKind {
                FieldKind::Int
            }

            fn encode(&self) -> Result<Value, CastError> {
                Ok(Value::Number(Number::from(*self)))
            }

            fn decode(value: &Value) -> Result<Self, CastError> {
                value
                    .as_i64()
                    .and_then(|n| <$t>::try_from(n).ok())
                    .ok_or_else(|| CastError::conversion(stringify!($t), value))
            }
        }
    )*};
}

macro_rules! unsigned_field_value {
    ($($t:ty),*) => {$(
        impl FieldValue for $t {
            fn kind() -> FieldKind {
                FieldKind::UInt
            }

            fn encode(&self) -> Result<Value, CastError> {
                Ok(Value::Number(Number::from(*self)))
            }

            fn decode(value: &Value) -> Result<Self, CastError> {
                value
                    .as_u64()
                    .and_then(|n| <$t>::try_from(n).ok())
                    .ok_or_else(|| CastError::conversion(stringify!($t), value))
            }
        }
    )*};
}

signed_field_value!(i8, i16, i32, i64);
unsigned_field_value!(u8, u16, u32, u64);

impl FieldValue for f64 {
    fn kind() -> FieldKind {
        FieldKind::Float
    }

    fn encode(&self) -> Result<Value, CastError> {
        Number::from_f64(*self).map(Value::Number).ok_or_else(|| {
            CastError::invalid_argument(format!("{self} cannot be stored as a JSON number"))
        })
    }

    fn decode(value: &Value) -> Result<Self, CastError> {
        value
            .as_f64()
            .ok_or_else(|| CastError::conversion(FieldKind::Float, value))
    }
}

impl FieldValue for f32 {
    fn kind() -> FieldKind {
        FieldKind::Float
    }

    /// Written in the shortest decimal form that reads back as the same
    /// `f32`, so `0.1` stays `0.1` instead of the widened `f64` digits.
    fn encode(&self) -> Result<Value, CastError> {
        let shortest: f64 = self.to_string().parse().map_err(|_| {
            CastError::invalid_argument(format!("{self} cannot be stored as a JSON number"))
        })?;
        shortest.encode()
    }

    fn decode(value: &Value) -> Result<Self, CastError> {
        let n = f64::decode(value)?;
        if n.abs() > f64::from(f32::MAX) {
            return Err(CastError::conversion("f32", value));
        }
        Ok(n as f32)
    }
}

impl FieldValue for DateTime<FixedOffset> {
    fn kind() -> FieldKind {
        FieldKind::DateTime
    }

    fn encode(&self) -> Result<Value, CastError> {
        Ok(Value::String(render_datetime(self)))
    }

    fn decode(value: &Value) -> Result<Self, CastError> {
        value
            .as_str()
            .and_then(parse_datetime)
            .ok_or_else(|| CastError::conversion(FieldKind::DateTime, value))
    }
}

impl FieldValue for DateTime<Utc> {
    fn kind() -> FieldKind {
        FieldKind::DateTime
    }

    fn encode(&self) -> Result<Value, CastError> {
        self.fixed_offset().encode()
    }

    fn decode(value: &Value) -> Result<Self, CastError> {
        DateTime::<FixedOffset>::decode(value).map(|dt| dt.with_timezone(&Utc))
    }
}

impl FieldValue for NaiveDate {
    fn kind() -> FieldKind {
        FieldKind::Date
    }

    fn encode(&self) -> Result<Value, CastError> {
        Ok(Value::String(render_date(self)))
    }

    fn decode(value: &Value) -> Result<Self, CastError> {
        value
            .as_str()
            .and_then(parse_date)
            .ok_or_else(|| CastError::conversion(FieldKind::Date, value))
    }
}

impl FieldValue for Value {
    fn kind() -> FieldKind {
        FieldKind::Json
    }

    fn encode(&self) -> Result<Value, CastError> {
        Ok(self.clone())
    }

    fn decode(value: &Value) -> Result<Self, CastError> {
        Ok(value.clone())
    }
}

// ════════════════════════════════════════════════════════════════
//  Containers
// ════════════════════════════════════════════════════════════════

impl<T: FieldValue> FieldValue for Option<T> {
    fn kind() -> FieldKind {
        T::kind()
    }

    fn required() -> bool {
        false
    }

    fn encode(&self) -> Result<Value, CastError> {
        match self {
            Some(v) => v.encode(),
            None => Ok(Value::Null),
        }
    }

    fn decode(value: &Value) -> Result<Self, CastError> {
        match value {
            Value::Null => Ok(None),
            other => T::decode(other).map(Some),
        }
    }

    fn absent() -> Option<Self> {
        Some(None)
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn kind() -> FieldKind {
        FieldKind::list(T::kind())
    }

    fn encode(&self) -> Result<Value, CastError> {
        self.iter()
            .enumerate()
            .map(|(i, item)| item.encode().map_err(|e| e.with_field(&format!("[{i}]"))))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn decode(value: &Value) -> Result<Self, CastError> {
        let items = value
            .as_array()
            .ok_or_else(|| CastError::conversion(Self::kind(), value))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| T::decode(item).map_err(|e| e.with_field(&format!("[{i}]"))))
            .collect()
    }
}
