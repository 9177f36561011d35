use std::fmt::Write;
use std::path::Path;

use caster_engine::ModelCasts;

use crate::error::CliError;

pub fn run(config: &Path) -> Result<String, CliError> {
    let casts = super::load_casts(config)?;
    summary(&casts)
}

/// One line per model, one indented line per cast column.
pub fn summary(casts: &ModelCasts) -> Result<String, CliError> {
    let mut out = String::new();
    for name in casts.models() {
        let _ = writeln!(out, "{name}");
        for (column, caster) in casts.model(name)? {
            let _ = writeln!(out, "  {column}: {} ({})", caster.type_name(), caster.mode());
        }
    }
    Ok(out.trim_end().to_string())
}
