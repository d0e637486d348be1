//! Configuration for scorestats.
//!
//! Values are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A configuration file: either the path given explicitly, or
//!    `config.{toml,yaml,yml,json}` in the platform configuration directory
//!    if one exists. The format is chosen by file extension.
//! 3. Environment variables prefixed with `SCORESTATS_`, using `__` to
//!    separate nested keys (e.g. `SCORESTATS_QUEUE__POLL_INTERVAL_MS=100`).
//!
//! The merged result is validated before it is returned.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "SCORESTATS_";
const FILE_STEM: &str = "config";
const EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "scorestats")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub beatmaps: BeatmapsConfig,
    pub processing: ProcessingConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file, created if missing.
    pub path: PathBuf,
    pub max_connections: Option<u32>,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = project_dirs()
            .map(|dirs| dirs.data_dir().join("scorestats.db"))
            .unwrap_or_else(|| PathBuf::from("scorestats.db"));
        Self { path, max_connections: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Name of the durable queue to consume.
    pub name: String,
    pub poll_interval_ms: u64,
    /// Reject pushes once this many items are in flight or queued.
    pub max_in_flight: Option<usize>,
    /// Exit once the queue is drained instead of waiting for more items.
    pub stop_when_empty: bool,
}
impl QueueConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "score-statistics".to_string(),
            poll_interval_ms: 500,
            max_in_flight: None,
            stop_when_empty: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatmapsConfig {
    /// Calculate difficulty attributes from beatmap files instead of
    /// looking up precomputed ones.
    pub realtime_difficulty: bool,
    /// Directory holding `<beatmap id>.osu` files.
    pub content_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Process scores without writing any results.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
}
impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "info".to_string() }
    }
}

impl Config {
    /// Load configuration from defaults, a file and the environment.
    ///
    /// With `path` set, that file must exist. Without it, the platform
    /// configuration directory is searched and a missing file is fine.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = &file {
            tracing::debug!(path = %file.display(), "loading configuration file");
            figment = Self::merge_file(figment, file)?;
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate a configuration from any figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// First `config.<ext>` found in the platform configuration directory.
    pub fn discover() -> Option<PathBuf> {
        let dirs = project_dirs()?;
        EXTENSIONS
            .iter()
            .map(|ext| dirs.config_dir().join(FILE_STEM).with_extension(ext))
            .find(|candidate| candidate.is_file())
    }

    fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        Ok(match extension.as_deref() {
            Some("toml") => figment.merge(Toml::file(path)),
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue.poll_interval_ms == 0 {
            exn::bail!(ErrorKind::Invalid("queue.poll_interval_ms must be greater than zero"));
        }
        if self.queue.max_in_flight == Some(0) {
            exn::bail!(ErrorKind::Invalid("queue.max_in_flight must be greater than zero"));
        }
        if self.queue.name.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("queue.name must not be empty"));
        }
        if self.database.max_connections == Some(0) {
            exn::bail!(ErrorKind::Invalid("database.max_connections must be greater than zero"));
        }
        if self.beatmaps.realtime_difficulty && self.beatmaps.content_dir.is_none() {
            exn::bail!(ErrorKind::Invalid("beatmaps.realtime_difficulty requires beatmaps.content_dir"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.queue.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.log.filter, "info");
        assert!(!config.processing.dry_run);
    }

    #[rstest]
    #[case(
        "config.toml",
        "[queue]\nname = \"scores\"\npoll_interval_ms = 50\nmax_in_flight = 1\n\n[processing]\ndry_run = true\n"
    )]
    #[case(
        "config.yaml",
        "queue:\n  name: scores\n  poll_interval_ms: 50\n  max_in_flight: 1\nprocessing:\n  dry_run: true\n"
    )]
    #[case(
        "config.json",
        r#"{"queue": {"name": "scores", "poll_interval_ms": 50, "max_in_flight": 1}, "processing": {"dry_run": true}}"#
    )]
    fn test_load_file_formats(#[case] name: &str, #[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), name, contents);
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.queue.name, "scores");
        assert_eq!(config.queue.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.queue.max_in_flight, Some(1));
        assert!(config.processing.dry_run);
        // Untouched sections keep their defaults.
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound(path));
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.ini", "[queue]\n");
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat(path));
    }

    #[test]
    fn test_wrong_type_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.toml", "[queue]\npoll_interval_ms = \"soon\"\n");
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::Load);
    }

    #[rstest]
    #[case("[queue]\npoll_interval_ms = 0\n")]
    #[case("[queue]\nmax_in_flight = 0\n")]
    #[case("[queue]\nname = \" \"\n")]
    #[case("[database]\nmax_connections = 0\n")]
    #[case("[beatmaps]\nrealtime_difficulty = true\n")]
    fn test_validation_rejects(#[case] contents: &str) {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(contents));
        let err = Config::from_figment(figment).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_realtime_with_content_dir_is_valid() {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string("[beatmaps]\nrealtime_difficulty = true\ncontent_dir = \"/srv/beatmaps\"\n"));
        let config = Config::from_figment(figment).unwrap();
        assert_eq!(config.beatmaps.content_dir, Some(PathBuf::from("/srv/beatmaps")));
    }
}
