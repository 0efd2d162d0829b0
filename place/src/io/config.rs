//! Board configuration stored in `place.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::BoardConfig;
use crate::core::palette::{DEFAULT_PALETTE, Palette};
use crate::core::resource::InvalidationTargets;
use crate::io::invalidator::{CommandInvalidator, FanoutInvalidator};

/// Largest accepted `board_size`. Keeps seeding and full-board scans small.
pub const MAX_BOARD_SIZE: u32 = 256;

/// Place configuration (TOML).
///
/// Missing fields default to a 4x4 board with the eight-color
/// palette and no cache invalidation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlaceConfig {
    /// Width and height of the square board.
    pub board_size: u32,

    /// Allowed colors, first one is the default.
    pub palette: Vec<String>,

    /// SQLite database file. Relative paths resolve against the config file's
    /// directory.
    pub database_path: PathBuf,

    pub invalidation: InvalidationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InvalidationConfig {
    /// Prefix for pixel/selected resource identifiers (e.g. the public URL of
    /// the UI server). Empty gives root-relative paths.
    pub base_url: String,

    /// Command run after each mutation with stale resources appended as
    /// arguments. Empty disables command invalidation.
    pub command: Vec<String>,

    /// Wall-clock limit for one purge command.
    pub timeout_secs: u64,

    /// Truncate captured purge output beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Composite resources purged after every paint.
    pub on_paint: Vec<String>,

    /// Composite resources purged after every color selection.
    pub on_select: Vec<String>,
}

impl Default for InvalidationConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            command: Vec::new(),
            timeout_secs: 30,
            output_limit_bytes: 100_000,
            on_paint: Vec::new(),
            on_select: Vec::new(),
        }
    }
}

impl Default for PlaceConfig {
    fn default() -> Self {
        Self {
            board_size: 4,
            palette: DEFAULT_PALETTE.iter().map(|c| (*c).to_string()).collect(),
            database_path: PathBuf::from("place.db"),
            invalidation: InvalidationConfig::default(),
        }
    }
}

impl PlaceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.board_size == 0 || self.board_size > MAX_BOARD_SIZE {
            return Err(anyhow!("board_size must be between 1 and {MAX_BOARD_SIZE}"));
        }
        if let Err(errors) = Palette::new(&self.palette) {
            return Err(anyhow!("invalid palette: {}", errors.join("; ")));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(anyhow!("database_path must not be empty"));
        }
        if self.invalidation.timeout_secs == 0 {
            return Err(anyhow!("invalidation.timeout_secs must be > 0"));
        }
        if self.invalidation.output_limit_bytes == 0 {
            return Err(anyhow!("invalidation.output_limit_bytes must be > 0"));
        }
        if let Some(program) = self.invalidation.command.first()
            && program.trim().is_empty()
        {
            return Err(anyhow!("invalidation.command must start with a program name"));
        }
        Ok(())
    }

    pub fn board_config(&self) -> Result<BoardConfig> {
        let palette = Palette::new(&self.palette)
            .map_err(|errors| anyhow!("invalid palette: {}", errors.join("; ")))?;
        Ok(BoardConfig::new(self.board_size, palette).with_targets(InvalidationTargets {
            base_url: self.invalidation.base_url.clone(),
            on_paint: self.invalidation.on_paint.clone(),
            on_select: self.invalidation.on_select.clone(),
        }))
    }

    /// The configured purge command, if any.
    pub fn command_invalidator(&self) -> Option<CommandInvalidator> {
        CommandInvalidator::new(
            &self.invalidation.command,
            Duration::from_secs(self.invalidation.timeout_secs),
            self.invalidation.output_limit_bytes,
        )
    }

    /// Every invalidator the config asks for, called in order after each
    /// mutation. Empty when nothing is configured.
    pub fn invalidator(&self) -> FanoutInvalidator {
        let mut fanout = FanoutInvalidator::new();
        if let Some(command) = self.command_invalidator() {
            fanout.push(Box::new(command));
        }
        fanout
    }

    /// `database_path`, resolved against the directory holding `config_path`.
    pub fn resolve_database_path(&self, config_path: &Path) -> PathBuf {
        if self.database_path.is_absolute() {
            return self.database_path.clone();
        }
        match config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(&self.database_path),
            _ => self.database_path.clone(),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PlaceConfig::default()`.
pub fn load_config(path: &Path) -> Result<PlaceConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = PlaceConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PlaceConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &PlaceConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, PlaceConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("place.toml");
        let mut cfg = PlaceConfig::default();
        cfg.board_size = 12;
        cfg.invalidation.command = vec!["curl".to_string(), "-X".to_string(), "PURGE".to_string()];
        cfg.invalidation.on_paint = vec!["owner/repo".to_string()];
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("place.toml");
        fs::write(&path, "board_size = 8\n[invalidation]\nbase_url = \"https://p.example\"\n")
            .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.board_size, 8);
        assert_eq!(cfg.palette.len(), DEFAULT_PALETTE.len());
        assert_eq!(cfg.invalidation.base_url, "https://p.example");
        assert_eq!(cfg.invalidation.timeout_secs, 30);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cases: Vec<(PlaceConfig, &str)> = vec![
            (
                PlaceConfig {
                    board_size: 0,
                    ..PlaceConfig::default()
                },
                "board_size",
            ),
            (
                PlaceConfig {
                    board_size: MAX_BOARD_SIZE + 1,
                    ..PlaceConfig::default()
                },
                "board_size",
            ),
            (
                PlaceConfig {
                    palette: vec!["#fff".to_string(), "#FFF".to_string()],
                    ..PlaceConfig::default()
                },
                "listed twice",
            ),
            (
                PlaceConfig {
                    palette: Vec::new(),
                    ..PlaceConfig::default()
                },
                "at least one color",
            ),
            (
                PlaceConfig {
                    database_path: PathBuf::new(),
                    ..PlaceConfig::default()
                },
                "database_path",
            ),
        ];
        for (cfg, needle) in cases {
            let err = cfg.validate().expect_err(needle);
            assert!(err.to_string().contains(needle), "{err} should mention {needle}");
        }

        let mut cfg = PlaceConfig::default();
        cfg.invalidation.timeout_secs = 0;
        assert!(cfg.validate().is_err());
        let mut cfg = PlaceConfig::default();
        cfg.invalidation.command = vec![" ".to_string()];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_reports_invalid_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("place.toml");
        fs::write(&path, "palette = [\"chartreuse\"]\n").expect("write");
        let err = load_config(&path).expect_err("invalid palette");
        assert!(format!("{err:#}").contains("chartreuse"));
    }

    #[test]
    fn database_path_resolves_against_config_dir() {
        let cfg = PlaceConfig::default();
        assert_eq!(
            cfg.resolve_database_path(Path::new("/srv/place/place.toml")),
            PathBuf::from("/srv/place/place.db")
        );
        assert_eq!(
            cfg.resolve_database_path(Path::new("place.toml")),
            PathBuf::from("place.db")
        );
    }

    #[test]
    fn board_config_carries_targets() {
        let mut cfg = PlaceConfig::default();
        cfg.invalidation.on_select = vec!["owner/repo".to_string()];
        let board = cfg.board_config().expect("board config");
        assert_eq!(board.board_size(), 4);
        assert_eq!(board.targets().on_select, vec!["owner/repo".to_string()]);
        assert!(cfg.command_invalidator().is_none());
        assert!(cfg.invalidator().is_empty());

        cfg.invalidation.command = vec!["true".to_string()];
        assert_eq!(cfg.invalidator().len(), 1);
    }
}
