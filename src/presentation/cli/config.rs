//! Optional TOML config file for the demo binary's defaults (§10.3).

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub connection: Option<String>,
    pub delay_ms: Option<u64>,
}

impl Config {
    /// Load `path` if it exists; an absent file is not an error, since the
    /// config is entirely optional CLI ergonomics.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&text)
            .map_err(|e| Error::InvalidArgument(format!("invalid config at {}: {e}", path.display())))
    }
}
