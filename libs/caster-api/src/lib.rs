pub mod cast;
pub mod error;
pub mod schema;
pub mod value;

pub use caster_derive::ValueObject;
pub use cast::{Cast, CastTarget, ColumnCast, Mode};
pub use error::{CastError, ErrorKind};
pub use schema::{FieldDef, FieldKind};
pub use value::{FieldValue, ValueObject};

// Generated code refers to these through `caster_api::`.
pub use chrono;
pub use serde_json;
