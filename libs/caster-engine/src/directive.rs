use caster_api::schema::is_type_name;
use caster_api::{CastTarget, Mode};

use crate::error::EngineError;

const PREFIX: &str = "Caster:";

/// Parsed cast registration directive.
///
/// Accepted forms:
/// - `Address` / `Address[]`
/// - `Caster:App\Models\Address[]` (host form, the `Caster:` prefix is optional)
/// - `app::models::Address`, `app.models.Address`
///
/// The directive is parsed once, at configuration time. Casters themselves
/// only ever see the resulting [`CastTarget`].
///
/// Types bind by bare name. The namespace is validated and kept in
/// [`Directive::path`] but never used for lookup, so `App\Address` and
/// `Other\Address` name the same type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Full type path, segments joined with `::`.
    path: String,
    /// Last path segment.
    name: String,
    mode: Mode,
}

impl Directive {
    pub fn parse(directive: &str) -> Result<Self, EngineError> {
        let raw = directive.trim();
        let body = raw.strip_prefix(PREFIX).unwrap_or(raw).trim();

        let (body, mode) = match body.strip_suffix("[]") {
            Some(inner) => (inner, Mode::List),
            None => (body, Mode::Single),
        };
        if body.contains('[') || body.contains(']') {
            return Err(EngineError::directive(
                directive,
                "only a single trailing '[]' is allowed",
            ));
        }

        let normalized = body.replace("::", "\\").replace('.', "\\");
        let normalized = normalized.strip_prefix('\\').unwrap_or(&normalized);
        if normalized.is_empty() {
            return Err(EngineError::directive(directive, "missing type name"));
        }

        let segments: Vec<&str> = normalized.split('\\').collect();
        if let Some(bad) = segments.iter().find(|s| !is_type_name(s)) {
            return Err(EngineError::directive(
                directive,
                format!("'{bad}' is not a valid type name segment"),
            ));
        }

        let name = segments.last().copied().unwrap_or_default().to_string();
        Ok(Self {
            path: segments.join("::"),
            name,
            mode,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn type_name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Target descriptor naming the type by its bare name.
    pub fn target(&self) -> CastTarget<String> {
        CastTarget::new(self.mode, self.name.clone())
    }
}

impl std::str::FromStr for Directive {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Directive::parse(s)
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mode {
            Mode::Single => write!(f, "{}", self.path),
            Mode::List => write!(f, "{}[]", self.path),
        }
    }
}
