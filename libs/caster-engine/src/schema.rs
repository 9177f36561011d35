use std::collections::HashMap;
use std::sync::Arc;

use caster_api::error::describe;
use caster_api::value::{parse_date, parse_datetime, render_date, render_datetime};
use caster_api::{CastError, CastTarget, ColumnCast, FieldDef, FieldKind, Mode, ValueObject};
use serde::Deserialize;
use serde_json::{Map, Number, Value};

use crate::error::EngineError;
use crate::stored;

// ════════════════════════════════════════════════════════════════
//  Type Schema & Catalog
// ════════════════════════════════════════════════════════════════

/// A value type described by its field table instead of a Rust struct.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypeSchema {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl TypeSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Schema of a derived value object, from its static field table.
    pub fn of<T: ValueObject>() -> Self {
        Self::new(T::type_name(), T::fields())
    }
}

/// The set of value types a config declares. Resolves nested `Object` kinds.
///
/// Built explicitly and shared (`Arc`) by the casters that need it; there is
/// no process-wide registry.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, TypeSchema>,
}

impl TypeCatalog {
    /// Build a catalog, rejecting duplicate type names, duplicate field
    /// names, and references to undeclared types.
    pub fn new(types: impl IntoIterator<Item = TypeSchema>) -> Result<Self, EngineError> {
        let mut map = HashMap::new();
        for schema in types {
            let mut seen: Vec<&str> = Vec::new();
            for field in &schema.fields {
                if seen.contains(&field.name.as_str()) {
                    return Err(EngineError::Config(format!(
                        "type '{}': duplicate field '{}'",
                        schema.name, field.name
                    )));
                }
                seen.push(&field.name);
            }
            if map.contains_key(&schema.name) {
                return Err(EngineError::Config(format!(
                    "type '{}' declared more than once",
                    schema.name
                )));
            }
            map.insert(schema.name.clone(), schema);
        }

        for schema in map.values() {
            for field in &schema.fields {
                for name in field.kind.object_refs() {
                    if !map.contains_key(name) {
                        return Err(EngineError::Config(format!(
                            "type '{}', field '{}': unknown type '{name}'",
                            schema.name, field.name
                        )));
                    }
                }
            }
        }

        Ok(Self { types: map })
    }

    pub fn get(&self, name: &str) -> Option<&TypeSchema> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn resolve(&self, name: &str) -> Result<&TypeSchema, CastError> {
        self.get(name)
            .ok_or_else(|| CastError::invalid_argument(format!("unknown type '{name}'")))
    }

    /// Validate `object` against `schema` and rebuild it in declaration order.
    ///
    /// Unknown keys are dropped. Key presence is kept: an absent optional
    /// field stays absent and an explicit `null` stays `null`.
    fn normalize_object(
        &self,
        schema: &TypeSchema,
        object: &Map<String, Value>,
    ) -> Result<Map<String, Value>, CastError> {
        caster_api::value::check_required(&schema.name, &schema.fields, object)?;

        let mut out = Map::new();
        for field in &schema.fields {
            let value = match object.get(&field.name) {
                Some(Value::Null) if !field.required => Value::Null,
                // Only optional fields get here absent; check_required ran above.
                None => continue,
                Some(value) => self
                    .normalize_kind(&field.kind, value)
                    .map_err(|e| e.with_field(&field.name))?,
            };
            out.insert(field.name.clone(), value);
        }
        Ok(out)
    }

    fn normalize_kind(&self, kind: &FieldKind, value: &Value) -> Result<Value, CastError> {
        let mismatch = || CastError::conversion(kind, value);
        match kind {
            FieldKind::String => value.is_string().then(|| value.clone()).ok_or_else(mismatch),
            FieldKind::Bool => value.is_boolean().then(|| value.clone()).ok_or_else(mismatch),
            FieldKind::Int => value
                .as_i64()
                .map(|n| Value::Number(Number::from(n)))
                .ok_or_else(mismatch),
            FieldKind::UInt => value
                .as_u64()
                .map(|n| Value::Number(Number::from(n)))
                .ok_or_else(mismatch),
            FieldKind::Float => value.is_number().then(|| value.clone()).ok_or_else(mismatch),
            FieldKind::DateTime => value
                .as_str()
                .and_then(parse_datetime)
                .map(|dt| Value::String(render_datetime(&dt)))
                .ok_or_else(mismatch),
            FieldKind::Date => value
                .as_str()
                .and_then(parse_date)
                .map(|d| Value::String(render_date(&d)))
                .ok_or_else(mismatch),
            FieldKind::Json => Ok(value.clone()),
            FieldKind::Object(name) => {
                let schema = self.resolve(name)?;
                let object = value.as_object().ok_or_else(mismatch)?;
                self.normalize_object(schema, object).map(Value::Object)
            }
            FieldKind::List(inner) => {
                let items = value.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        self.normalize_kind(inner, item)
                            .map_err(|e| e.with_field(&format!("[{i}]")))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  SchemaCaster
// ════════════════════════════════════════════════════════════════

/// Column caster driven by a declared field table.
///
/// Same contract as [`crate::Caster`], with `serde_json::Value` standing in
/// for the typed instance: values are validated against the schema and
/// normalized (declaration order, unknown keys dropped, timestamps
/// re-rendered) in both directions.
#[derive(Debug, Clone)]
pub struct SchemaCaster {
    target: CastTarget<TypeSchema>,
    catalog: Arc<TypeCatalog>,
}

impl SchemaCaster {
    pub fn new(target: CastTarget<TypeSchema>, catalog: Arc<TypeCatalog>) -> Self {
        Self { target, catalog }
    }

    /// Caster for a type declared in `catalog`.
    pub fn from_catalog(
        target: CastTarget<String>,
        catalog: Arc<TypeCatalog>,
    ) -> Result<Self, EngineError> {
        let schema = catalog
            .get(target.target())
            .cloned()
            .ok_or_else(|| EngineError::Config(format!("unknown type '{}'", target.target())))?;
        Ok(Self::new(target.map(|_| schema), catalog))
    }

    pub fn target(&self) -> &CastTarget<TypeSchema> {
        &self.target
    }

    pub fn mode(&self) -> Mode {
        self.target.mode()
    }

    pub fn type_name(&self) -> &str {
        &self.target.target().name
    }

    /// Write path. `None` and JSON `null` store SQL null.
    ///
    /// The value must be an object (single mode) or an array of objects
    /// (list mode); anything else is an `InvalidArgument`.
    pub fn serialize(&self, value: Option<&Value>) -> Result<Option<String>, CastError> {
        let value = match value {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };

        let schema = self.target.target();
        let normalized = match (self.mode(), value) {
            (Mode::Single, Value::Object(object)) => {
                Value::Object(self.catalog.normalize_object(schema, object)?)
            }
            (Mode::List, Value::Array(items)) => self.normalize_list(items, |i, item| {
                CastError::invalid_argument(format!(
                    "element {i} of a {} list is a {}, not an object",
                    schema.name,
                    describe(item)
                ))
            })?,
            (mode, other) => {
                let expected = match mode {
                    Mode::Single => "an instance of",
                    Mode::List => "a list of",
                };
                return Err(CastError::invalid_argument(format!(
                    "expected {expected} {}, got {}",
                    schema.name,
                    describe(other)
                )));
            }
        };

        tracing::debug!(
            type_name = %schema.name,
            mode = %self.mode(),
            count = element_count(&normalized),
            "serialized column value"
        );
        Ok(Some(stored::render(&normalized)))
    }

    /// Read path. Returns the validated, normalized document.
    pub fn deserialize(&self, stored: Option<&str>) -> Result<Option<Value>, CastError> {
        let Some(document) = stored::parse(stored)? else {
            return Ok(None);
        };
        stored::expect_shape(self.mode(), &document)?;

        let schema = self.target.target();
        let value = match &document {
            Value::Array(items) => self.normalize_list(items, |i, item| {
                CastError::conversion(&schema.name, item).with_field(&format!("[{i}]"))
            })?,
            Value::Object(object) => Value::Object(self.catalog.normalize_object(schema, object)?),
            other => return Err(CastError::conversion(&schema.name, other)),
        };

        tracing::debug!(
            type_name = %schema.name,
            mode = %self.mode(),
            count = element_count(&value),
            "deserialized column value"
        );
        Ok(Some(value))
    }

    /// The target schema is used directly, so it need not be in the catalog
    /// (e.g. `TypeSchema::of`).
    fn normalize_list(
        &self,
        items: &[Value],
        not_object: impl Fn(usize, &Value) -> CastError,
    ) -> Result<Value, CastError> {
        let schema = self.target.target();
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let object = item.as_object().ok_or_else(|| not_object(i, item))?;
                self.catalog
                    .normalize_object(schema, object)
                    .map(Value::Object)
                    .map_err(|e| e.with_field(&format!("[{i}]")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

fn element_count(value: &Value) -> usize {
    value.as_array().map_or(1, Vec::len)
}

impl ColumnCast for SchemaCaster {
    type Value = Value;

    fn set(&self, value: Option<&Value>) -> Result<Option<String>, CastError> {
        self.serialize(value)
    }

    fn get(&self, stored: Option<&str>) -> Result<Option<Value>, CastError> {
        self.deserialize(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caster_api::ErrorKind;
    use serde_json::json;

    fn catalog() -> Arc<TypeCatalog> {
        Arc::new(
            TypeCatalog::new([
                TypeSchema::new(
                    "Address",
                    vec![
                        FieldDef::required("street", FieldKind::String),
                        FieldDef::required("moved", FieldKind::DateTime),
                        FieldDef::optional("geo", FieldKind::object("Geo")),
                    ],
                ),
                TypeSchema::new(
                    "Geo",
                    vec![
                        FieldDef::required("lat", FieldKind::Float),
                        FieldDef::required("lng", FieldKind::Float),
                    ],
                ),
            ])
            .unwrap(),
        )
    }

    fn single() -> SchemaCaster {
        SchemaCaster::from_catalog(CastTarget::Single("Address".into()), catalog()).unwrap()
    }

    fn list() -> SchemaCaster {
        SchemaCaster::from_catalog(CastTarget::List("Address".into()), catalog()).unwrap()
    }

    #[test]
    fn catalog_rejects_unknown_references() {
        let err = TypeCatalog::new([TypeSchema::new(
            "Address",
            vec![FieldDef::required("geo", FieldKind::list(FieldKind::object("Geo")))],
        )])
        .unwrap_err();
        assert!(err.to_string().contains("unknown type 'Geo'"), "{err}");
    }

    #[test]
    fn catalog_rejects_duplicates() {
        let ty = TypeSchema::new("A", vec![FieldDef::required("x", FieldKind::Int)]);
        assert!(TypeCatalog::new([ty.clone(), ty]).is_err());

        let dup_field = TypeSchema::new(
            "B",
            vec![
                FieldDef::required("x", FieldKind::Int),
                FieldDef::required("x", FieldKind::String),
            ],
        );
        assert!(TypeCatalog::new([dup_field]).is_err());
    }

    #[test]
    fn serialize_normalizes_order_and_drops_unknown_keys() {
        let stored = single()
            .serialize(Some(&json!({
                "moved": "2010-01-12T02:00:00Z",
                "extra": true,
                "street": "1640 Riverside Drive",
            })))
            .unwrap()
            .unwrap();
        assert_eq!(
            stored,
            r#"{"street":"1640 Riverside Drive","moved":"2010-01-12T02:00:00+00:00"}"#
        );
    }

    #[test]
    fn optional_key_presence_survives_a_read_write_cycle() {
        let absent = r#"{"street":"x","moved":"2010-01-12T11:00:00+09:00"}"#;
        let null = r#"{"street":"x","moved":"2010-01-12T11:00:00+09:00","geo":null}"#;
        for stored in [absent, null] {
            let read = single().deserialize(Some(stored)).unwrap();
            let written = single().serialize(read.as_ref()).unwrap().unwrap();
            assert_eq!(written, stored);
        }
    }

    #[test]
    fn serialize_rejects_non_objects() {
        let err = single().serialize(Some(&json!("string"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = list().serialize(Some(&json!({ "street": "x" }))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = list().serialize(Some(&json!([1]))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn null_short_circuits() {
        assert_eq!(single().serialize(None).unwrap(), None);
        assert_eq!(single().serialize(Some(&Value::Null)).unwrap(), None);
        assert_eq!(list().deserialize(None).unwrap(), None);
        assert_eq!(list().deserialize(Some("null")).unwrap(), None);
    }

    #[test]
    fn deserialize_validates_nested_objects() {
        let err = single()
            .deserialize(Some(
                r#"{"street":"x","moved":"2010-01-12T11:00:00+09:00","geo":{"lat":"north","lng":1}}"#,
            ))
            .unwrap_err();
        assert_eq!(
            err,
            CastError::Conversion {
                path: "geo.lat".into(),
                expected: "float".into(),
                found: "string".into(),
            }
        );
    }

    #[test]
    fn deserialize_reports_missing_fields() {
        let err = list().deserialize(Some(r#"[{"bad":"thing"}]"#)).unwrap_err();
        assert_eq!(
            err,
            CastError::MissingArguments {
                type_name: "Address".into(),
                missing: vec!["street".into(), "moved".into()],
            }
        );
    }

    #[test]
    fn deserialize_checks_shape() {
        assert_eq!(single().deserialize(Some("[]")).unwrap_err().kind(), ErrorKind::Shape);
        assert_eq!(list().deserialize(Some("{}")).unwrap_err().kind(), ErrorKind::Shape);
        assert_eq!(list().deserialize(Some("[]")).unwrap(), Some(json!([])));
        let err = list().deserialize(Some("[1]")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn works_with_derived_schemas_outside_the_catalog() {
        let schema = TypeSchema::new("Point", vec![FieldDef::required("x", FieldKind::Int)]);
        let caster = SchemaCaster::new(CastTarget::Single(schema), Arc::new(TypeCatalog::default()));
        assert_eq!(
            caster.deserialize(Some(r#"{"x":1,"y":2}"#)).unwrap(),
            Some(json!({ "x": 1 }))
        );
    }
}
