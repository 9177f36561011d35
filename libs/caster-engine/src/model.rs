use std::collections::BTreeMap;
use std::sync::Arc;

use caster_api::error::describe;
use caster_api::CastError;
use serde_json::{Map, Value};

use crate::config::CasterConfig;
use crate::directive::Directive;
use crate::error::EngineError;
use crate::schema::{SchemaCaster, TypeCatalog};

/// Column casts of every configured model.
///
/// Each (model, column) pair owns its own [`SchemaCaster`], built once from
/// the config and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct ModelCasts {
    models: BTreeMap<String, BTreeMap<String, SchemaCaster>>,
}

impl ModelCasts {
    pub fn from_config(config: &CasterConfig) -> Result<Self, EngineError> {
        config.validate()?;
        for name in config.unused_types() {
            tracing::warn!(type_name = %name, "type is declared but no column casts to it");
        }
        let catalog = Arc::new(config.catalog()?);

        let mut models = BTreeMap::new();
        for model in &config.models {
            let ctx = format!("model '{}'", model.name);
            let columns = bind_columns(&model.casts, &catalog).map_err(|e| e.with_context(&ctx))?;
            tracing::info!(model = %model.name, columns = columns.len(), "bound column casts");
            models.insert(model.name.clone(), columns);
        }
        Ok(Self { models })
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Cast columns of `model`, by column name.
    pub fn model(&self, model: &str) -> Result<&BTreeMap<String, SchemaCaster>, EngineError> {
        self.models
            .get(model)
            .ok_or_else(|| EngineError::ModelNotFound(model.to_string()))
    }

    pub fn column(&self, model: &str, column: &str) -> Result<&SchemaCaster, EngineError> {
        self.model(model)?
            .get(column)
            .ok_or_else(|| EngineError::ColumnNotFound {
                model: model.to_string(),
                column: column.to_string(),
            })
    }

    /// Prepare a row for writing: every cast column is serialized to its
    /// stored text (or `null`), other attributes pass through untouched.
    ///
    /// Fails on the first column that does not cast; nothing is returned
    /// for a partially converted row.
    pub fn encode_row(
        &self,
        model: &str,
        attributes: &Map<String, Value>,
    ) -> Result<Map<String, Value>, EngineError> {
        let columns = self.model(model)?;
        let mut row = Map::new();
        for (name, value) in attributes {
            let encoded = match columns.get(name) {
                Some(caster) => caster
                    .serialize(Some(value))?
                    .map_or(Value::Null, Value::String),
                None => value.clone(),
            };
            row.insert(name.clone(), encoded);
        }
        Ok(row)
    }

    /// Reverse of [`ModelCasts::encode_row`]: cast columns are parsed from
    /// their stored text back into validated documents.
    pub fn decode_row(
        &self,
        model: &str,
        row: &Map<String, Value>,
    ) -> Result<Map<String, Value>, EngineError> {
        let columns = self.model(model)?;
        let mut attributes = Map::new();
        for (name, value) in row {
            let decoded = match (columns.get(name), value) {
                (Some(_), Value::Null) => Value::Null,
                (Some(caster), Value::String(stored)) => {
                    caster.deserialize(Some(stored))?.unwrap_or(Value::Null)
                }
                (Some(caster), other) => {
                    return Err(CastError::Malformed(format!(
                        "column '{name}' of model '{model}' ({}) holds a {} instead of text",
                        caster.type_name(),
                        describe(other)
                    ))
                    .into())
                }
                (None, other) => other.clone(),
            };
            attributes.insert(name.clone(), decoded);
        }
        Ok(attributes)
    }
}

fn bind_columns(
    casts: &BTreeMap<String, String>,
    catalog: &Arc<TypeCatalog>,
) -> Result<BTreeMap<String, SchemaCaster>, EngineError> {
    casts
        .iter()
        .map(|(column, directive)| {
            let target = Directive::parse(directive)?.target();
            let caster = SchemaCaster::from_catalog(target, Arc::clone(catalog))
                .map_err(|e| e.with_context(format!("column '{column}'")))?;
            Ok((column.clone(), caster))
        })
        .collect()
}
