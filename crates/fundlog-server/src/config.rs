//! Runtime configuration.
//!
//! Sources, lowest precedence first: built-in defaults, the optional TOML
//! file, then `FUNDLOG_*` environment variables (`FUNDLOG_PORT=9000`).

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use fundlog_core::history::HISTORY_LIMIT;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:          String,
  #[serde(default = "default_port")]
  pub port:          u16,
  #[serde(default = "default_store_path")]
  pub store_path:    PathBuf,
  /// Snapshots kept per fund.
  #[serde(default = "default_history_limit")]
  pub history_limit: usize,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("fundlog.db") }

fn default_history_limit() -> usize { HISTORY_LIMIT }

impl ServerConfig {
  /// Load from `path` (skipped when the file does not exist) and the
  /// environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("FUNDLOG"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    anyhow::ensure!(cfg.history_limit > 0, "history_limit must be at least 1");
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ServerConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8000);
    assert_eq!(cfg.store_path, PathBuf::from("fundlog.db"));
    assert_eq!(cfg.history_limit, 100);
    assert_eq!(cfg.address(), "127.0.0.1:8000");
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fundlog.toml");
    fs::write(&path, "port = 9100\nhistory_limit = 20\nstore_path = \"/var/lib/fundlog.db\"\n")
      .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.port, 9100);
    assert_eq!(cfg.history_limit, 20);
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/fundlog.db"));
    assert_eq!(cfg.host, "127.0.0.1");
  }

  #[test]
  fn zero_history_limit_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fundlog.toml");
    fs::write(&path, "history_limit = 0\n").unwrap();

    let err = ServerConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("history_limit"), "{err}");
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }
}
