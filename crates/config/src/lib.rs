//! Configuration for digestr.
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. Built-in defaults.
//! 2. A config file: TOML, YAML or JSON, picked by extension. Either given
//!    explicitly, or `config.toml` in the platform config directory if it
//!    exists.
//! 3. `DIGESTR_`-prefixed environment variables, with `__` separating
//!    nested keys (`DIGESTR_DATABASE__MAX_CONNECTIONS=8`).
//!
//! ```toml
//! [database]
//! path = "/var/lib/digestr/digests.sqlite"
//! max_connections = 5
//! busy_timeout_ms = 1500
//!
//! [citations]
//! min_context = 50
//! max_context = 300
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use digestr_citation::{CitationParser, CitationResolver, ContextWindow, DEFAULT_MAX_CONTEXT, DEFAULT_MIN_CONTEXT};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Span;

const ENV_PREFIX: &str = "DIGESTR_";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "digests.sqlite";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "digestr")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub citations: CitationConfig,
}

/// The `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file, created if missing.
    pub path: PathBuf,
    pub max_connections: u32,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = match project_dirs() {
            Some(dirs) => dirs.data_dir().join(DATABASE_FILE),
            None => PathBuf::from(DATABASE_FILE),
        };
        Self { path, max_connections: 5, busy_timeout_ms: 1500 }
    }
}
impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// The `[citations]` section: bounds on the text captured around a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationConfig {
    pub min_context: usize,
    pub max_context: usize,
}
impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            min_context: DEFAULT_MIN_CONTEXT,
            max_context: DEFAULT_MAX_CONTEXT,
        }
    }
}
impl CitationConfig {
    pub fn window(&self) -> Result<ContextWindow> {
        ContextWindow::new(self.min_context, self.max_context).or_raise(|| ErrorKind::InvalidValue("citations"))
    }

    /// A parser using these bounds, logging under `span`.
    pub fn parser(&self, span: Span) -> Result<CitationParser> {
        Ok(CitationParser::new(self.window()?, span))
    }

    /// A resolver whose parser uses these bounds; both log under `span`.
    pub fn resolver(&self, span: Span) -> Result<CitationResolver> {
        Ok(CitationResolver::new(self.parser(span.clone())?, span))
    }
}

impl Config {
    /// Where [`load`](Self::load) looks for a config file.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load from defaults, the default config file if there is one, and the
    /// environment.
    pub fn load() -> Result<Self> {
        let file = Self::default_path().filter(|path| path.is_file());
        match &file {
            Some(path) => tracing::debug!(path = %path.display(), "loading config file"),
            None => tracing::debug!("no config file found, using defaults and environment"),
        }
        Self::extract(Self::figment(file.as_deref())?)
    }

    /// Load from defaults, the given config file, and the environment.
    ///
    /// Unlike [`load`](Self::load), a missing file is an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        Self::extract(Self::figment(Some(path))?)
    }

    fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
            figment = match extension.to_ascii_lowercase().as_str() {
                "toml" => figment.merge(Toml::file(path)),
                "yaml" | "yml" => figment.merge(Yaml::file(path)),
                "json" => figment.merge(Json::file(path)),
                other => exn::bail!(ErrorKind::UnsupportedFormat(other.to_string())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but can't be used.
    pub fn validate(&self) -> Result<()> {
        if self.database.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::InvalidValue("database.path"));
        }
        if self.database.max_connections == 0 {
            exn::bail!(ErrorKind::InvalidValue("database.max_connections"));
        }
        self.citations.window()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    /// Loads `contents` as config file `name` inside a jail, which isolates
    /// the process environment from other tests.
    fn load_jailed(name: &str, contents: &str) -> Result<Config> {
        let mut loaded = None;
        Jail::expect_with(|jail| {
            jail.create_file(name, contents)?;
            loaded = Some(Config::load_from(name));
            Ok(())
        });
        // Safety: expect_with panics unless the closure ran to completion.
        loaded.unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.citations.min_context, DEFAULT_MIN_CONTEXT);
        assert_eq!(config.database.busy_timeout(), Duration::from_millis(1500));
    }

    #[rstest]
    #[case("config.toml", "[database]\nmax_connections = 9\n\n[citations]\nmax_context = 120\n")]
    #[case("config.yaml", "database:\n  max_connections: 9\ncitations:\n  max_context: 120\n")]
    #[case("config.json", r#"{"database": {"max_connections": 9}, "citations": {"max_context": 120}}"#)]
    fn test_load_from_file(#[case] name: &str, #[case] contents: &str) {
        let config = load_jailed(name, contents).unwrap();
        assert_eq!(config.database.max_connections, 9);
        assert_eq!(config.citations.max_context, 120);
        // Untouched keys keep their defaults.
        assert_eq!(config.citations.min_context, DEFAULT_MIN_CONTEXT);
        assert_eq!(config.database.busy_timeout_ms, 1500);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_unknown_extension_is_an_error() {
        let err = load_jailed("config.ini", "[database]\n").unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(ext) if ext == "ini"));
    }

    #[rstest]
    #[case("[database]\nmax_connections = 0\n", "database.max_connections")]
    #[case("[citations]\nmin_context = 400\nmax_context = 300\n", "citations")]
    #[case("[citations]\nmin_context = 0\n", "citations")]
    #[case("[database]\npath = \"\"\n", "database.path")]
    fn test_invalid_values_are_rejected(#[case] contents: &str, #[case] field: &str) {
        let err = load_jailed("config.toml", contents).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidValue(f) if *f == field));
    }

    #[test]
    fn test_wrong_type_fails_to_load() {
        let err = load_jailed("config.toml", "[database]\nmax_connections = \"many\"\n").unwrap_err();
        assert!(matches!(*err, ErrorKind::Load));
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[database]\nmax_connections = 9\nbusy_timeout_ms = 10\n")?;
            jail.set_env("DIGESTR_DATABASE__MAX_CONNECTIONS", 3);
            jail.set_env("DIGESTR_CITATIONS__MIN_CONTEXT", 20);
            let config = Config::load_from("config.toml").unwrap();
            assert_eq!(config.database.max_connections, 3);
            assert_eq!(config.database.busy_timeout_ms, 10);
            assert_eq!(config.citations.min_context, 20);
            Ok(())
        });
    }

    #[test]
    fn test_citation_config_builds_parser() {
        let citations = CitationConfig { min_context: 10, max_context: 40 };
        let parser = citations.parser(Span::none()).unwrap();
        assert_eq!(parser.window().min(), 10);
        assert_eq!(parser.window().max(), 40);
        let resolver = citations.resolver(Span::none()).unwrap();
        assert_eq!(resolver.parser().window().max(), 40);
    }
}
