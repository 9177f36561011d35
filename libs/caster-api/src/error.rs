use std::fmt;

/// Category of a cast error. Lets the host decide how to surface a failed
/// read or write (reject the input, report corrupt data, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Write-path value is not an instance (or list) of the declared type.
    InvalidArgument,
    /// Stored object lacks one or more required fields.
    MissingArguments,
    /// A field value cannot be converted to the field's kind.
    Conversion,
    /// Stored text is not JSON.
    Malformed,
    /// Top-level object/array disagrees with the column mode.
    Shape,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidArgument => f.write_str("invalid argument"),
            ErrorKind::MissingArguments => f.write_str("missing arguments"),
            ErrorKind::Conversion => f.write_str("conversion"),
            ErrorKind::Malformed => f.write_str("malformed"),
            ErrorKind::Shape => f.write_str("shape"),
        }
    }
}

/// Error returned by both conversion directions.
///
/// Every variant is a programmer or data-integrity error: nothing here is
/// transient, so callers propagate instead of retrying.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CastError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "cannot create an instance of {type_name} from serialized data: missing required field(s) {}",
        .missing.join(", ")
    )]
    MissingArguments {
        type_name: String,
        missing: Vec<String>,
    },

    #[error("cannot convert `{path}`: expected {expected}, found {found}")]
    Conversion {
        /// Dotted path of the offending value, `[n]` for list positions.
        path: String,
        expected: String,
        found: String,
    },

    #[error("malformed JSON: {0}")]
    Malformed(String),

    #[error("expected {expected} at the top level, found {found}")]
    Shape {
        expected: &'static str,
        found: &'static str,
    },
}

impl CastError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        CastError::InvalidArgument(msg.into())
    }

    /// Conversion failure for `value`, with an empty path.
    ///
    /// The path is filled in by [`CastError::with_field`] as the error
    /// travels out through the enclosing objects.
    pub fn conversion(expected: impl fmt::Display, value: &serde_json::Value) -> Self {
        CastError::Conversion {
            path: String::new(),
            expected: expected.to_string(),
            found: describe(value).to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CastError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CastError::MissingArguments { .. } => ErrorKind::MissingArguments,
            CastError::Conversion { .. } => ErrorKind::Conversion,
            CastError::Malformed(_) => ErrorKind::Malformed,
            CastError::Shape { .. } => ErrorKind::Shape,
        }
    }

    /// Prefix the conversion path with a field name or a `[n]` list position.
    ///
    /// Other variants are returned untouched.
    pub fn with_field(self, segment: &str) -> Self {
        match self {
            CastError::Conversion {
                path,
                expected,
                found,
            } => CastError::Conversion {
                path: join_path(segment, &path),
                expected,
                found,
            },
            other => other,
        }
    }
}

impl From<serde_json::Error> for CastError {
    fn from(e: serde_json::Error) -> Self {
        CastError::Malformed(e.to_string())
    }
}

fn join_path(segment: &str, rest: &str) -> String {
    if rest.is_empty() {
        segment.to_string()
    } else if rest.starts_with('[') {
        format!("{segment}{rest}")
    } else {
        format!("{segment}.{rest}")
    }
}

/// JSON type name of a value, for error messages.
pub fn describe(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
