//! Site configuration loaded from environment variables.

use std::path::PathBuf;

/// Read-only site settings, injected into the handlers through the app state.
#[derive(Clone, Debug)]
pub struct SiteSettings {
    pub version: String,
    /// Release status shown in the footer, e.g. `beta` (from ECIDADANIA_STATUS).
    pub status: String,
    /// From ECIDADANIA_DEBUG.
    pub debug: bool,
    /// Absolute base URL used for feed links, without trailing slash
    /// (from ECIDADANIA_SITE_URL).
    pub site_url: String,
    /// Database location (from ECIDADANIA_DB). `None` means the platform data dir.
    pub db_path: Option<PathBuf>,
}

impl SiteSettings {
    /// Load settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let status = lookup("ECIDADANIA_STATUS").unwrap_or_else(|| "beta".to_string());

        let debug = lookup("ECIDADANIA_DEBUG")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let site_url = lookup("ECIDADANIA_SITE_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let db_path = lookup("ECIDADANIA_DB").map(PathBuf::from);

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            status,
            debug,
            site_url,
            db_path,
        }
    }

    /// Fixed settings for tests, independent of the environment.
    pub fn for_tests() -> Self {
        Self::from_lookup(|_| None)
    }
}
