use std::path::Path;

use caster_engine::ModelCasts;
use serde_json::Value;

use crate::config::ColumnArgs;
use crate::error::CliError;

pub fn encode(config: &Path, args: ColumnArgs) -> Result<String, CliError> {
    let casts = super::load_casts(config)?;
    let input = super::read_input(args.input.as_deref())?;
    encode_text(&casts, &args.model, &args.column, &input)
}

pub fn decode(config: &Path, args: ColumnArgs) -> Result<String, CliError> {
    let casts = super::load_casts(config)?;
    let input = super::read_input(args.input.as_deref())?;
    decode_text(&casts, &args.model, &args.column, &input)
}

/// Attributes JSON in, stored column text out. SQL null prints as `null`.
pub fn encode_text(
    casts: &ModelCasts,
    model: &str,
    column: &str,
    input: &str,
) -> Result<String, CliError> {
    let caster = casts.column(model, column)?;
    let value: Value = serde_json::from_str(input)?;
    let stored = caster.serialize(Some(&value))?;
    Ok(stored.unwrap_or_else(|| "null".to_string()))
}

/// Stored column text in, validated pretty JSON out.
pub fn decode_text(
    casts: &ModelCasts,
    model: &str,
    column: &str,
    input: &str,
) -> Result<String, CliError> {
    let caster = casts.column(model, column)?;
    let decoded = caster.deserialize(Some(input.trim()))?;
    Ok(serde_json::to_string_pretty(&decoded.unwrap_or(Value::Null))?)
}
