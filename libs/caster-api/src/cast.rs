use serde::{Deserialize, Serialize};

use crate::error::CastError;

/// Whether a column holds one value object or an ordered list of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Single,
    List,
}

impl Mode {
    /// JSON shape the stored document must have in this mode.
    pub fn expected_shape(self) -> &'static str {
        match self {
            Mode::Single => "object",
            Mode::List => "array",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Single => f.write_str("single"),
            Mode::List => f.write_str("list"),
        }
    }
}

/// Cast target descriptor: the type to reconstruct plus its mode.
///
/// `S` is whatever identifies the type: a name, or a full field table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastTarget<S> {
    Single(S),
    List(S),
}

impl<S> CastTarget<S> {
    pub fn new(mode: Mode, target: S) -> Self {
        match mode {
            Mode::Single => CastTarget::Single(target),
            Mode::List => CastTarget::List(target),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            CastTarget::Single(_) => Mode::Single,
            CastTarget::List(_) => Mode::List,
        }
    }

    pub fn target(&self) -> &S {
        match self {
            CastTarget::Single(s) | CastTarget::List(s) => s,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(S) -> U) -> CastTarget<U> {
        match self {
            CastTarget::Single(s) => CastTarget::Single(f(s)),
            CastTarget::List(s) => CastTarget::List(f(s)),
        }
    }
}

/// In-memory column value: one instance, or an ordered list.
#[derive(Debug, Clone, PartialEq)]
pub enum Cast<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Cast<T> {
    pub fn mode(&self) -> Mode {
        match self {
            Cast::One(_) => Mode::Single,
            Cast::Many(_) => Mode::List,
        }
    }

    pub fn as_one(&self) -> Option<&T> {
        match self {
            Cast::One(v) => Some(v),
            Cast::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&[T]> {
        match self {
            Cast::One(_) => None,
            Cast::Many(v) => Some(v),
        }
    }

    pub fn into_one(self) -> Option<T> {
        match self {
            Cast::One(v) => Some(v),
            Cast::Many(_) => None,
        }
    }

    pub fn into_many(self) -> Option<Vec<T>> {
        match self {
            Cast::One(_) => None,
            Cast::Many(v) => Some(v),
        }
    }
}

/// Host-facing column cast.
///
/// The host calls `set()` before writing a row and stores the returned text
/// (`None` = SQL null), and calls `get()` after reading a row. Errors abort
/// the write or read.
pub trait ColumnCast: Send + Sync {
    type Value;

    fn set(&self, value: Option<&Self::Value>) -> Result<Option<String>, CastError>;

    fn get(&self, stored: Option<&str>) -> Result<Option<Self::Value>, CastError>;
}
