use std::path::PathBuf;

use caster_api::CastError;
use caster_engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Cast(#[from] CastError),

    #[error("input is not valid JSON: {0}")]
    Input(#[from] serde_json::Error),

    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("read stdin: {0}")]
    Stdin(std::io::Error),

    #[error("nothing at path '{0}'")]
    PathNotFound(String),
}
