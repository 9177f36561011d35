use caster_engine::stored;

use crate::config::GetArgs;
use crate::error::CliError;

pub fn run(args: GetArgs) -> Result<String, CliError> {
    let input = super::read_input(args.input.as_deref())?;
    lookup_text(&input, &args.path)
}

/// Pretty JSON of the value at `path` inside stored column text.
pub fn lookup_text(stored_text: &str, path: &str) -> Result<String, CliError> {
    let document = stored::parse(Some(stored_text.trim()))?
        .ok_or_else(|| CliError::PathNotFound(path.to_string()))?;
    let found =
        stored::lookup(&document, path).ok_or_else(|| CliError::PathNotFound(path.to_string()))?;
    Ok(serde_json::to_string_pretty(found)?)
}
