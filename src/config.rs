//! Service configuration from TOML plus environment overrides.
//!
//! The TOML file is optional (`DIFFERENTIE_CONFIG_PATH`); every field has a
//! default. Environment variables win over the file.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

pub const CONFIG_PATH_ENV: &str = "DIFFERENTIE_CONFIG_PATH";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
  pub port: u16,
  /// External service speaking `{message, aiModel}` -> `{response}`.
  /// When unset, OpenAI is used if `OPENAI_API_KEY` is present.
  pub generation_endpoint: Option<String>,
  /// Upper bound for one generation, in seconds.
  pub generation_timeout_secs: u64,
  /// Service that turns `.docx`/`.pdf` uploads into `{content}`.
  pub extraction_endpoint: Option<String>,
  pub max_upload_bytes: usize,
  pub static_dir: String,
  /// Sessions untouched for this long are dropped by the sweeper.
  pub session_ttl_secs: u64,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      port: 3000,
      generation_endpoint: None,
      generation_timeout_secs: 120,
      extraction_endpoint: None,
      max_upload_bytes: 10 * 1024 * 1024,
      static_dir: "./static".into(),
      session_ttl_secs: 60 * 60,
    }
  }
}

impl ServiceConfig {
  pub fn generation_timeout(&self) -> Duration {
    Duration::from_secs(self.generation_timeout_secs)
  }

  pub fn session_ttl(&self) -> Duration {
    Duration::from_secs(self.session_ttl_secs)
  }

  /// File (if any) then env overrides.
  pub fn load() -> Self {
    let mut cfg = load_from_file().unwrap_or_default();
    cfg.apply_env(|k| std::env::var(k).ok());
    cfg
  }

  /// Apply overrides from a variable lookup. Unparsable numbers are ignored.
  pub fn apply_env<F>(&mut self, lookup: F)
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
      self.port = port;
    }
    if let Some(url) = lookup("GENERATION_ENDPOINT").filter(|s| !s.trim().is_empty()) {
      self.generation_endpoint = Some(url);
    }
    if let Some(secs) = lookup("GENERATION_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
      self.generation_timeout_secs = secs;
    }
    if let Some(url) = lookup("EXTRACTION_ENDPOINT").filter(|s| !s.trim().is_empty()) {
      self.extraction_endpoint = Some(url);
    }
    if let Some(dir) = lookup("STATIC_DIR") {
      self.static_dir = dir;
    }
    if let Some(secs) = lookup("SESSION_TTL_SECS").and_then(|s| s.parse::<u64>().ok()) {
      self.session_ttl_secs = secs;
    }
  }
}

/// Attempt to load `ServiceConfig` from the config path. On any parsing/IO error, returns None.
fn load_from_file() -> Option<ServiceConfig> {
  let path = std::env::var(CONFIG_PATH_ENV).ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<ServiceConfig>(&s) {
      Ok(cfg) => {
        info!(target: "differentie_backend", %path, "Loaded service config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "differentie_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "differentie_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  #[test]
  fn partial_toml_keeps_defaults() {
    let cfg: ServiceConfig = toml::from_str(
      r#"
        generation_endpoint = "http://localhost:9000/api/chat"
        generation_timeout_secs = 30
      "#,
    )
    .unwrap();
    assert_eq!(cfg.generation_endpoint.as_deref(), Some("http://localhost:9000/api/chat"));
    assert_eq!(cfg.generation_timeout(), Duration::from_secs(30));
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
    assert!(cfg.extraction_endpoint.is_none());
    assert_eq!(cfg.session_ttl(), Duration::from_secs(3600));
  }

  #[test]
  fn env_overrides_win() {
    let vars: HashMap<&str, &str> = [
      ("PORT", "8080"),
      ("GENERATION_TIMEOUT_SECS", "not-a-number"),
      ("EXTRACTION_ENDPOINT", "http://extract/api"),
      ("GENERATION_ENDPOINT", "  "),
      ("SESSION_TTL_SECS", "900"),
    ]
    .into_iter()
    .collect();

    let mut cfg = ServiceConfig::default();
    cfg.apply_env(|k| vars.get(k).map(|v| v.to_string()));
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.generation_timeout_secs, 120);
    assert_eq!(cfg.extraction_endpoint.as_deref(), Some("http://extract/api"));
    assert!(cfg.generation_endpoint.is_none());
    assert_eq!(cfg.session_ttl_secs, 900);
  }
}
