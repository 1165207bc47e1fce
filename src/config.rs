//! Engine configuration (§11.3): replica identity, the on-disk substrate
//! location, and the read-repair retry tunables from §9, loadable from a
//! TOML file with environment-variable overrides.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// This replica's own id (`selfId`).
    pub self_id: u32,

    /// Exclusive upper bound on replica ids; sizes the sequence vector and
    /// any `ReplicaLocks`.
    pub max_replica_id: u32,

    /// Directory backing the `SledStore`.
    pub data_dir: PathBuf,

    #[serde(default = "default_read_retry_cap")]
    pub read_retry_cap: u32,

    #[serde(default = "default_read_retry_backoff_ms")]
    pub read_retry_backoff_ms: u64,
}

fn default_read_retry_cap() -> u32 {
    100
}

fn default_read_retry_backoff_ms() -> u64 {
    100
}

impl EngineConfig {
    pub fn read_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.read_retry_backoff_ms)
    }

    /// Loads configuration from `path` (TOML), then layers environment
    /// variables prefixed `LSEQDB_` on top (e.g. `LSEQDB_SELF_ID=2`),
    /// following the `config` crate's standard layering idiom.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.into()))
            .add_source(config::Environment::with_prefix("LSEQDB").separator("_"))
            .build()?;
        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_retry_constants() {
        assert_eq!(default_read_retry_cap(), 100);
        assert_eq!(default_read_retry_backoff_ms(), 100);
    }

    #[test]
    fn load_from_toml_file_applies_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lseqdb.toml");
        std::fs::write(
            &path,
            r#"
            self_id = 0
            max_replica_id = 8
            data_dir = "/tmp/lseqdb-data"
            "#,
        )
        .unwrap();

        let cfg = EngineConfig::load(path).unwrap();
        assert_eq!(cfg.self_id, 0);
        assert_eq!(cfg.max_replica_id, 8);
        assert_eq!(cfg.read_retry_cap, 100);
        assert_eq!(cfg.read_retry_backoff(), Duration::from_millis(100));
    }
}
