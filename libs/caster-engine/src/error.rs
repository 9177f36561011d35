use caster_api::CastError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid cast directive '{directive}': {reason}")]
    Directive { directive: String, reason: String },

    #[error("cast error: {0}")]
    Cast(#[from] CastError),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("column '{column}' of model '{model}' has no cast")]
    ColumnNotFound { model: String, column: String },
}

impl EngineError {
    pub fn directive(directive: &str, reason: impl Into<String>) -> Self {
        EngineError::Directive {
            directive: directive.to_string(),
            reason: reason.into(),
        }
    }

    /// Add context to the error.
    ///
    /// For `Config` and `ModelNotFound`, context is prepended to the message.
    /// Other variants carry their own location and are returned as-is.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::ModelNotFound(msg) => EngineError::ModelNotFound(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}
