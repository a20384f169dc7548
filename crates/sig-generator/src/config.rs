use std::path::PathBuf;

pub const KEY_FILE_ENV: &str = "HZN_KEY_FILE";

/// Where the signing key path comes from.
///
/// Resolved on every request, never cached, so a missing variable surfaces
/// as a server error at request time rather than a startup failure.
#[derive(Debug, Clone)]
pub enum KeyFileSource {
    /// Read the named process environment variable.
    Environment(String),
    /// Fixed value, as if the variable held it. `None` means unset.
    Fixed(Option<String>),
}

impl Default for KeyFileSource {
    fn default() -> Self {
        KeyFileSource::Environment(KEY_FILE_ENV.to_string())
    }
}

impl KeyFileSource {
    /// The trimmed key path, or `None` when unset or blank.
    pub fn resolve(&self) -> Option<PathBuf> {
        let raw = match self {
            KeyFileSource::Environment(var) => std::env::var(var).ok(),
            KeyFileSource::Fixed(value) => value.clone(),
        }?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    }
}
