pub mod check;
pub mod codec;
pub mod get;

use std::io::Read;
use std::path::Path;

use caster_config_hcl::HclParser;
use caster_engine::{CasterConfig, ModelCasts, TomlParser};

use crate::error::CliError;

pub fn load_casts(path: &Path) -> Result<ModelCasts, CliError> {
    tracing::info!(config = %path.display(), "loading configuration");
    let config = CasterConfig::load_with(path, &[&TomlParser, &HclParser])?;
    Ok(ModelCasts::from_config(&config)?)
}

/// Contents of `input`, or all of stdin when no file is given.
pub fn read_input(input: Option<&Path>) -> Result<String, CliError> {
    match input {
        Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(CliError::Stdin)?;
            Ok(buf)
        }
    }
}
