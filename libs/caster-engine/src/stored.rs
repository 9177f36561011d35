//! Stored column text: parsing, shape checks, path lookup.

use caster_api::error::describe;
use caster_api::{CastError, Mode};
use serde_json::Value;

/// Parse stored column text.
///
/// `None` (SQL null) and the JSON literal `null` both read as `None`.
/// Anything that is not JSON, including empty text, is `Malformed`.
pub fn parse(stored: Option<&str>) -> Result<Option<Value>, CastError> {
    let Some(text) = stored else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(text)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

/// Check the top-level shape of a parsed document against the column mode.
pub fn expect_shape(mode: Mode, value: &Value) -> Result<(), CastError> {
    let ok = match mode {
        Mode::Single => value.is_object(),
        Mode::List => value.is_array(),
    };
    if ok {
        Ok(())
    } else {
        Err(CastError::Shape {
            expected: mode.expected_shape(),
            found: describe(value),
        })
    }
}

/// Render a value for storage. Compact, no envelope.
pub fn render(value: &Value) -> String {
    value.to_string()
}

/// Look up a field inside a stored document by path.
///
/// Segments are separated by `.` or `->` (`address->street`); numeric
/// segments index into arrays. An empty path returns the document itself.
pub fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() {
        return Some(document);
    }
    path.replace("->", ".")
        .split('.')
        .try_fold(document, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}
