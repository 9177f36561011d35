use std::marker::PhantomData;

use caster_api::error::describe;
use caster_api::{Cast, CastError, ColumnCast, Mode, ValueObject};
use serde_json::Value;

use crate::directive::Directive;
use crate::error::EngineError;
use crate::stored;

/// Typed column caster for value object `T`.
///
/// Stateless: holds only the column mode, so one instance can serve every
/// row of a column and be shared across threads.
///
/// ```ignore
/// let addresses = Caster::<Address>::list();
/// let stored = addresses.serialize(Some(&Cast::Many(vec![home])))?;
/// let back = addresses.deserialize(stored.as_deref())?;
/// ```
pub struct Caster<T> {
    mode: Mode,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Caster<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Caster<T> {}

impl<T: ValueObject> std::fmt::Debug for Caster<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Caster")
            .field("type_name", &T::type_name())
            .field("mode", &self.mode)
            .finish()
    }
}

impl<T: ValueObject> Caster<T> {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            _marker: PhantomData,
        }
    }

    pub fn single() -> Self {
        Self::new(Mode::Single)
    }

    pub fn list() -> Self {
        Self::new(Mode::List)
    }

    /// Build from a registration directive (`Address`, `Caster:App\Address[]`).
    ///
    /// The directive's bare type name must match `T::type_name()`; any
    /// namespace in front of it is ignored.
    pub fn from_directive(directive: &str) -> Result<Self, EngineError> {
        let parsed = Directive::parse(directive)?;
        if parsed.type_name() != T::type_name() {
            return Err(EngineError::directive(
                directive,
                format!("names type '{}', caster is for '{}'", parsed.type_name(), T::type_name()),
            ));
        }
        Ok(Self::new(parsed.mode()))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    // ────────────────────────────────────────────────────────────
    //  Write path
    // ────────────────────────────────────────────────────────────

    /// Serialize an in-memory value for storage. `None` stores SQL null.
    ///
    /// A `Cast::Many` on a single column (or `Cast::One` on a list column)
    /// is an `InvalidArgument`.
    pub fn serialize(&self, value: Option<&Cast<T>>) -> Result<Option<String>, CastError> {
        match value {
            None => Ok(None),
            Some(Cast::One(item)) => self.serialize_one(item).map(Some),
            Some(Cast::Many(items)) => self.serialize_many(items).map(Some),
        }
    }

    pub fn serialize_one(&self, value: &T) -> Result<String, CastError> {
        self.expect_mode(Mode::Single)?;
        let object = value.to_object()?;
        tracing::debug!(
            type_name = T::type_name(),
            mode = %self.mode,
            count = 1,
            "serialized column value"
        );
        Ok(stored::render(&Value::Object(object)))
    }

    pub fn serialize_many(&self, values: &[T]) -> Result<String, CastError> {
        self.expect_mode(Mode::List)?;
        let items = values
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.to_object()
                    .map(Value::Object)
                    .map_err(|e| e.with_field(&format!("[{i}]")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            type_name = T::type_name(),
            mode = %self.mode,
            count = items.len(),
            "serialized column value"
        );
        Ok(stored::render(&Value::Array(items)))
    }

    /// Serialize untyped attributes (e.g. decoded request input).
    ///
    /// The value is materialized into `T` first, so missing fields and bad
    /// field values fail exactly as they would on read, and the stored text
    /// is always the canonical encoding. Anything that is not an object
    /// (single) or array of objects (list) is an `InvalidArgument`.
    pub fn serialize_value(&self, value: Option<&Value>) -> Result<Option<String>, CastError> {
        let value = match value {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };
        let cast = match (self.mode, value) {
            (Mode::Single, Value::Object(object)) => Cast::One(T::from_object(object)?),
            (Mode::List, Value::Array(items)) => Cast::Many(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::Object(object) => {
                            T::from_object(object).map_err(|e| e.with_field(&format!("[{i}]")))
                        }
                        other => Err(CastError::invalid_argument(format!(
                            "element {i} of a {} list is a {}, not an object",
                            T::type_name(),
                            describe(other)
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            (_, other) => return Err(self.not_an_instance(describe(other))),
        };
        self.serialize(Some(&cast))
    }

    // ────────────────────────────────────────────────────────────
    //  Read path
    // ────────────────────────────────────────────────────────────

    /// Reconstruct the in-memory value from stored text.
    ///
    /// SQL null and the JSON literal `null` read as `None`. An empty array
    /// reads as an empty list, not `None`.
    pub fn deserialize(&self, stored: Option<&str>) -> Result<Option<Cast<T>>, CastError> {
        let Some(document) = stored::parse(stored)? else {
            return Ok(None);
        };
        stored::expect_shape(self.mode, &document)?;

        let cast = match document {
            Value::Object(object) => Cast::One(T::from_object(&object)?),
            Value::Array(items) => Cast::Many(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let object = item.as_object().ok_or_else(|| {
                            CastError::conversion(T::type_name(), item).with_field(&format!("[{i}]"))
                        })?;
                        T::from_object(object).map_err(|e| e.with_field(&format!("[{i}]")))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            other => {
                return Err(CastError::Shape {
                    expected: self.mode.expected_shape(),
                    found: describe(&other),
                })
            }
        };

        let count = match &cast {
            Cast::One(_) => 1,
            Cast::Many(items) => items.len(),
        };
        tracing::debug!(
            type_name = T::type_name(),
            mode = %self.mode,
            count,
            "deserialized column value"
        );
        Ok(Some(cast))
    }

    pub fn deserialize_one(&self, stored: &str) -> Result<Option<T>, CastError> {
        self.expect_mode(Mode::Single)?;
        Ok(self.deserialize(Some(stored))?.and_then(Cast::into_one))
    }

    pub fn deserialize_many(&self, stored: &str) -> Result<Option<Vec<T>>, CastError> {
        self.expect_mode(Mode::List)?;
        Ok(self.deserialize(Some(stored))?.and_then(Cast::into_many))
    }

    fn expect_mode(&self, mode: Mode) -> Result<(), CastError> {
        if self.mode == mode {
            Ok(())
        } else {
            let got = match mode {
                Mode::Single => "a single instance",
                Mode::List => "a list",
            };
            Err(self.not_an_instance(got))
        }
    }

    fn not_an_instance(&self, got: &str) -> CastError {
        let expected = match self.mode {
            Mode::Single => "an instance of",
            Mode::List => "a list of",
        };
        CastError::invalid_argument(format!("expected {expected} {}, got {got}", T::type_name()))
    }
}

impl<T: ValueObject> ColumnCast for Caster<T> {
    type Value = Cast<T>;

    fn set(&self, value: Option<&Cast<T>>) -> Result<Option<String>, CastError> {
        self.serialize(value)
    }

    fn get(&self, stored: Option<&str>) -> Result<Option<Cast<T>>, CastError> {
        self.deserialize(stored)
    }
}
