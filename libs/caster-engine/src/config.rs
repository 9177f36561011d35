use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::directive::Directive;
use crate::error::EngineError;
use crate::schema::{TypeCatalog, TypeSchema};

/// Root configuration: value types plus per-model column casts.
///
/// ```toml
/// [[types]]
/// name = "Address"
/// fields = [
///   { name = "street", kind = "string" },
///   { name = "moved", kind = "datetime" },
/// ]
///
/// [[models]]
/// name = "users"
/// casts = { address = "Address", addresses = "Address[]" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CasterConfig {
    /// Value type definitions.
    #[serde(default)]
    pub types: Vec<TypeSchema>,

    /// Model definitions.
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    /// Column name → cast directive (`Address`, `Address[]`).
    #[serde(default)]
    pub casts: BTreeMap<String, String>,
}

/// Config file format loader. Picked by file extension.
pub trait ConfigParser: Send + Sync {
    fn extensions(&self) -> &[&str];

    fn parse(&self, content: &str) -> Result<CasterConfig, EngineError>;
}

/// Built-in TOML loader.
pub struct TomlParser;

impl ConfigParser for TomlParser {
    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn parse(&self, content: &str) -> Result<CasterConfig, EngineError> {
        CasterConfig::parse(content)
    }
}

impl CasterConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        Self::load_with(path, &[&TomlParser])
    }

    /// Load configuration, choosing the parser by the file's extension.
    pub fn load_with(
        path: impl AsRef<Path>,
        parsers: &[&dyn ConfigParser],
    ) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let parser = parsers
            .iter()
            .find(|p| p.extensions().contains(&ext))
            .ok_or_else(|| {
                EngineError::Config(format!(
                    "{}: no parser for extension '{ext}'",
                    path.display()
                ))
            })?;

        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        let config = parser
            .parse(&content)
            .map_err(|e| e.with_context(path.display()))?;
        config.validate().map_err(|e| e.with_context(path.display()))?;

        tracing::info!(
            path = %path.display(),
            types = config.types.len(),
            models = config.models.len(),
            "loaded caster configuration"
        );
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Build the type catalog declared by this config.
    pub fn catalog(&self) -> Result<TypeCatalog, EngineError> {
        TypeCatalog::new(self.types.iter().cloned())
    }

    /// Check types, model names and every cast directive.
    pub fn validate(&self) -> Result<(), EngineError> {
        let catalog = self.catalog()?;

        let mut seen: Vec<&str> = Vec::new();
        for model in &self.models {
            if seen.contains(&model.name.as_str()) {
                return Err(EngineError::Config(format!(
                    "model '{}' declared more than once",
                    model.name
                )));
            }
            seen.push(&model.name);

            for (column, directive) in &model.casts {
                let ctx = format!("model '{}', column '{column}'", model.name);
                let parsed = Directive::parse(directive)
                    .map_err(|e| EngineError::Config(format!("{ctx}: {e}")))?;
                if !catalog.contains(parsed.type_name()) {
                    return Err(EngineError::Config(format!(
                        "{ctx}: unknown type '{}'",
                        parsed.type_name()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Declared types that no model column casts to, in declaration order.
    pub fn unused_types(&self) -> Vec<&str> {
        self.types
            .iter()
            .map(|t| t.name.as_str())
            .filter(|name| {
                !self.models.iter().any(|m| {
                    m.casts
                        .values()
                        .any(|d| Directive::parse(d).is_ok_and(|d| d.type_name() == *name))
                })
            })
            .collect()
    }
}
