//! Command handlers -- one module per subcommand

pub mod classify;
pub mod config;
pub mod rules;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use spm_core::config::SpmConfig;
use spm_core::error::{ConfigError, SpmError};
use spm_mapdb::{MapDb, RuleLoader};

use crate::error::CliError;

/// Load the configuration, falling back to defaults (plus env overrides)
/// when the file does not exist.
pub async fn load_config(path: &Path) -> Result<SpmConfig, CliError> {
    match SpmConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(SpmError::Config(ConfigError::FileNotFound { .. })) => {
            debug!(path = %path.display(), "config file not found, using defaults");
            let mut config = SpmConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

/// Rule file given on the command line, or `mapdb.rules_path`.
pub fn rules_path(path: Option<PathBuf>, config: &SpmConfig) -> PathBuf {
    path.unwrap_or_else(|| PathBuf::from(&config.mapdb.rules_path))
}

/// A rule the engine refused while loading a file.
#[derive(Debug, Serialize)]
pub struct RejectedRule {
    pub rule: String,
    pub error: String,
}

/// A fresh rule table populated from a rule file.
pub struct LoadedTable {
    pub db: MapDb,
    pub applied: usize,
    pub rejected: Vec<RejectedRule>,
}

/// Parse `path` and apply every request to a new table built from `config`.
///
/// Rejected requests are collected, not treated as failures.
pub async fn load_table(path: &Path, config: &SpmConfig) -> Result<LoadedTable, CliError> {
    let loader = RuleLoader::new(config.mapdb.rule_max as usize);
    let requests = loader.load_file(path).await?;

    let db = MapDb::from_config(&config.mapdb);
    let mut applied = 0;
    let mut rejected = Vec::new();
    for (key, result) in db.load_requests(&requests) {
        match result {
            Ok(_) => applied += 1,
            Err(e) => {
                warn!(rule = %key, error = %e, "rule rejected");
                rejected.push(RejectedRule {
                    rule: key.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(LoadedTable {
        db,
        applied,
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_path_prefers_argument() {
        let config = SpmConfig::default();
        assert_eq!(
            rules_path(Some(PathBuf::from("a.toml")), &config),
            PathBuf::from("a.toml")
        );
        assert_eq!(
            rules_path(None, &config),
            PathBuf::from(&config.mapdb.rules_path)
        );
    }

    #[tokio::test]
    async fn test_load_config_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/spm.toml"))
            .await
            .expect("missing config should fall back to defaults");
        assert_eq!(config.mapdb.rule_max, SpmConfig::default().mapdb.rule_max);
    }

    #[tokio::test]
    async fn test_load_table_collects_rejections() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("rules.toml");
        std::fs::write(
            &path,
            "[[rules]]\nid = 1\n\n[[rules]]\nid = 2\ntype = \"scs\"\ncommand = \"delete\"\n",
        )
        .expect("should write rules");

        let table = load_table(&path, &SpmConfig::default())
            .await
            .expect("rule file should load");
        assert_eq!(table.applied, 1);
        assert_eq!(table.rejected.len(), 1);
        assert!(table.rejected[0].error.contains("not found"));
        assert_eq!(table.db.count(), 1);
    }
}
