//! Configuration management.

use serde::Deserialize;
use std::path::PathBuf;

/// Which lemmatization backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// No backend; every token falls back to its normalized self.
    #[default]
    None,
    /// Local JSON lexicon file.
    Lexicon,
    /// External HTTP lemmatization service.
    Http,
}

impl BackendKind {
    /// Parses a backend kind string. Unknown values mean no backend.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "lexicon" => Self::Lexicon,
            "http" => Self::Http,
            _ => Self::None,
        }
    }
}

/// Lemmatization backend configuration.
#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    /// Backend kind to construct.
    pub kind: BackendKind,
    /// Service URL (HTTP backend).
    pub url: Option<String>,
    /// Lexicon file path (lexicon backend).
    pub lexicon_path: Option<PathBuf>,
    /// Request timeout in seconds (HTTP backend).
    pub timeout_secs: u64,
}

/// Main configuration for hoplite.
#[derive(Debug, Clone)]
pub struct HopliteConfig {
    /// Path to the reference deck export.
    pub export_path: PathBuf,
    /// Path to the per-model field map JSON.
    pub field_map_path: PathBuf,
    /// Where the lemma cache persists, if anywhere.
    pub lemma_cache_path: Option<PathBuf>,
    /// Read-only lemma overrides, if any.
    pub lemma_overrides_path: Option<PathBuf>,
    /// Stop-word resource for lemma selection and cloze scoring.
    pub stopwords_path: Option<PathBuf>,
    /// Lemmatization backend selection.
    pub backend: BackendConfig,
}

impl Default for HopliteConfig {
    fn default() -> Self {
        Self {
            export_path: PathBuf::from("resources/deck-export.txt"),
            field_map_path: PathBuf::from("resources/model_field_map.json"),
            lemma_cache_path: Some(PathBuf::from("out/lemma_cache.json")),
            lemma_overrides_path: Some(PathBuf::from("resources/lemma_overrides.json")),
            stopwords_path: Some(PathBuf::from("resources/greek_stopwords.txt")),
            backend: BackendConfig {
                timeout_secs: 30,
                ..BackendConfig::default()
            },
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Reference export path.
    pub export_path: Option<String>,
    /// Field map path.
    pub field_map_path: Option<String>,
    /// Lemma cache path; empty string disables persistence.
    pub lemma_cache_path: Option<String>,
    /// Lemma overrides path; empty string disables overrides.
    pub lemma_overrides_path: Option<String>,
    /// Stop-word list path; empty string disables stop words.
    pub stopwords_path: Option<String>,
    /// Backend section.
    pub backend: Option<ConfigFileBackend>,
}

/// Backend section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileBackend {
    /// Backend kind: "none", "lexicon", or "http".
    pub kind: Option<String>,
    /// Service URL.
    pub url: Option<String>,
    /// Lexicon file path.
    pub lexicon_path: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl HopliteConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::InvalidInput(format!(
                "invalid config in {}: {e}",
                path.display()
            )))?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir (`~/Library/Application Support/`
    /// on macOS), then `~/.config/hoplite/` for Unix compatibility,
    /// then a `hoplite.toml` in the working directory. Returns the
    /// defaults when no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        if let Some(base_dirs) = directories::BaseDirs::new() {
            let platform_config = base_dirs.config_dir().join("hoplite").join("config.toml");
            if platform_config.exists() {
                if let Ok(config) = Self::load_from_file(&platform_config) {
                    return config;
                }
            }

            let xdg_config = base_dirs
                .home_dir()
                .join(".config")
                .join("hoplite")
                .join("config.toml");
            if xdg_config.exists() {
                if let Ok(config) = Self::load_from_file(&xdg_config) {
                    return config;
                }
            }
        }

        let local = std::path::Path::new("hoplite.toml");
        if local.exists() {
            if let Ok(config) = Self::load_from_file(local) {
                return config;
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `HopliteConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        // An explicitly empty path disables the feature; absence keeps
        // the default.
        let optional_path = |value: Option<String>, default: Option<PathBuf>| match value {
            Some(s) if s.is_empty() => None,
            Some(s) => Some(PathBuf::from(s)),
            None => default,
        };

        if let Some(export_path) = file.export_path {
            config.export_path = PathBuf::from(export_path);
        }
        if let Some(field_map_path) = file.field_map_path {
            config.field_map_path = PathBuf::from(field_map_path);
        }
        config.lemma_cache_path = optional_path(file.lemma_cache_path, config.lemma_cache_path);
        config.lemma_overrides_path =
            optional_path(file.lemma_overrides_path, config.lemma_overrides_path);
        config.stopwords_path = optional_path(file.stopwords_path, config.stopwords_path);

        if let Some(backend) = file.backend {
            if let Some(kind) = backend.kind {
                config.backend.kind = BackendKind::parse(&kind);
            }
            config.backend.url = backend.url;
            config.backend.lexicon_path = backend.lexicon_path.map(PathBuf::from);
            if let Some(timeout) = backend.timeout_secs {
                config.backend.timeout_secs = timeout;
            }
        }

        config
    }

    /// Sets the export path.
    #[must_use]
    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HopliteConfig::default();
        assert_eq!(config.export_path, PathBuf::from("resources/deck-export.txt"));
        assert_eq!(config.backend.kind, BackendKind::None);
        assert_eq!(config.backend.timeout_secs, 30);
        assert!(config.lemma_cache_path.is_some());
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!(BackendKind::parse("lexicon"), BackendKind::Lexicon);
        assert_eq!(BackendKind::parse("HTTP"), BackendKind::Http);
        assert_eq!(BackendKind::parse("none"), BackendKind::None);
        assert_eq!(BackendKind::parse("garbage"), BackendKind::None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"
export_path = "decks/unified-greek.txt"
lemma_cache_path = ""

[backend]
kind = "http"
url = "http://localhost:8800/lemma"
timeout_secs = 5
"#,
        )
        .unwrap();
        std::io::Write::flush(&mut file).unwrap();

        let config = HopliteConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.export_path, PathBuf::from("decks/unified-greek.txt"));
        // Empty string disables cache persistence.
        assert!(config.lemma_cache_path.is_none());
        // Unset paths keep their defaults.
        assert!(config.stopwords_path.is_some());
        assert_eq!(config.backend.kind, BackendKind::Http);
        assert_eq!(config.backend.url.as_deref(), Some("http://localhost:8800/lemma"));
        assert_eq!(config.backend.timeout_secs, 5);
    }

    #[test]
    fn test_invalid_toml_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"export_path = [not toml").unwrap();
        std::io::Write::flush(&mut file).unwrap();

        assert!(HopliteConfig::load_from_file(file.path()).is_err());
    }
}
