pub mod caster;
pub mod config;
pub mod directive;
pub mod error;
pub mod model;
pub mod schema;
pub mod stored;

pub use caster::Caster;
pub use config::{CasterConfig, ConfigParser, TomlParser};
pub use directive::Directive;
pub use error::EngineError;
pub use model::ModelCasts;
pub use schema::{SchemaCaster, TypeCatalog, TypeSchema};
