use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════
//  Field Kind
// ════════════════════════════════════════════════════════════════

/// Semantic type of a value-object field.
///
/// Decides how a field is rendered into JSON and which JSON values are
/// accepted back:
/// - `DateTime`: RFC 3339 string, UTC offset preserved (`+09:00`, `+00:00`).
/// - `Date`: calendar date, `YYYY-MM-DD`.
/// - `Json`: any JSON value, stored verbatim.
/// - `Object`: nested value object, referenced by type name.
///
/// Textual form (used in config files): `string`, `int`, `uint`, `float`,
/// `bool`, `datetime`, `date`, `json`, a type name, or any of those with a
/// trailing `[]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldKind {
    String,
    Int,
    UInt,
    Float,
    Bool,
    DateTime,
    Date,
    Json,
    Object(String),
    List(Box<FieldKind>),
}

impl FieldKind {
    pub fn list(inner: FieldKind) -> Self {
        FieldKind::List(Box::new(inner))
    }

    pub fn object(type_name: impl Into<String>) -> Self {
        FieldKind::Object(type_name.into())
    }

    /// Every `Object` type name reachable through this kind.
    pub fn object_refs(&self) -> Vec<&str> {
        match self {
            FieldKind::Object(name) => vec![name.as_str()],
            FieldKind::List(inner) => inner.object_refs(),
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::String => write!(f, "string"),
            FieldKind::Int => write!(f, "int"),
            FieldKind::UInt => write!(f, "uint"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::DateTime => write!(f, "datetime"),
            FieldKind::Date => write!(f, "date"),
            FieldKind::Json => write!(f, "json"),
            FieldKind::Object(name) => write!(f, "{name}"),
            FieldKind::List(inner) => write!(f, "{inner}[]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid field kind '{0}'")]
pub struct ParseKindError(pub String);

impl std::str::FromStr for FieldKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix("[]") {
            return inner
                .parse()
                .map(FieldKind::list)
                .map_err(|_| ParseKindError(s.to_string()));
        }
        let kind = match s {
            "string" => FieldKind::String,
            "int" => FieldKind::Int,
            "uint" => FieldKind::UInt,
            "float" => FieldKind::Float,
            "bool" => FieldKind::Bool,
            "datetime" => FieldKind::DateTime,
            "date" => FieldKind::Date,
            "json" => FieldKind::Json,
            name if is_type_name(name) => FieldKind::Object(name.to_string()),
            _ => return Err(ParseKindError(s.to_string())),
        };
        Ok(kind)
    }
}

impl TryFrom<String> for FieldKind {
    type Error = ParseKindError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.to_string()
    }
}

/// Identifier: starts with a letter or `_`, continues with alphanumerics or `_`.
pub fn is_type_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

// ════════════════════════════════════════════════════════════════
//  Field Definition
// ════════════════════════════════════════════════════════════════

/// One row of a value type's field table.
///
/// Tables are ordered: declaration order is the order fields are written to
/// the stored JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Required fields must be present on read. Non-required fields may be
    /// absent or `null`.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
        }
    }

    /// Shortcut: required field.
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self::new(name, kind, true)
    }

    /// Shortcut: optional (nullable) field.
    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self::new(name, kind, false)
    }
}
