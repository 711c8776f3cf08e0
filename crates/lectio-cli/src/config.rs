use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lectio_core::{DEFAULT_BUCKETS, DEFAULT_MAX_BUCKETS};
use lectio_navigium::ClientConfig;
use serde::Deserialize;

const CONFIG_ENV: &str = "LECTIO_CONFIG";
const LOCAL_CONFIG: &str = "lectio.toml";

/// Runtime settings, read from `lectio.toml`.
///
/// ```toml
/// bind = "127.0.0.1:5000"
/// default_buckets = 50
/// max_buckets = 10000
///
/// [navigium]
/// timeout_secs = 10
/// max_concurrency = 50
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LectioConfig {
    pub bind: SocketAddr,
    pub default_buckets: usize,
    /// Upper bound on a requested bucket count.
    pub max_buckets: usize,
    pub navigium: ClientConfig,
}

impl Default for LectioConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            default_buckets: DEFAULT_BUCKETS,
            max_buckets: DEFAULT_MAX_BUCKETS,
            navigium: ClientConfig::default(),
        }
    }
}

impl LectioConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("invalid config")?;
        anyhow::ensure!(config.default_buckets >= 1, "default_buckets must be at least 1");
        anyhow::ensure!(
            config.default_buckets <= config.max_buckets,
            "default_buckets ({}) exceeds max_buckets ({})",
            config.default_buckets,
            config.max_buckets
        );
        Ok(config)
    }

    /// Reject bucket counts above `max_buckets` before any work is done.
    pub fn check_bucket_count(&self, bucket_count: usize) -> Result<()> {
        anyhow::ensure!(
            bucket_count <= self.max_buckets,
            "bucket count {bucket_count} exceeds the maximum of {}",
            self.max_buckets
        );
        Ok(())
    }

    /// Load from the first config file found, or fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        match config_path(explicit, env_path, Path::new(LOCAL_CONFIG)) {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                tracing::info!("loaded config from {}", path.display());
                Self::from_toml(&content).with_context(|| format!("in {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }
}

/// Priority: explicit flag > `LECTIO_CONFIG` > local file if it exists.
/// Explicit and env paths are returned even when missing so reading them
/// reports the error.
fn config_path(explicit: Option<&Path>, env_path: Option<PathBuf>, local: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_path {
        return Some(path);
    }
    local.is_file().then(|| local.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = LectioConfig::from_toml("").unwrap();
        assert_eq!(config, LectioConfig::default());
        assert_eq!(config.bind.port(), 5000);
        assert_eq!(config.navigium.max_concurrency, 50);
    }

    #[test]
    fn test_partial_override() {
        let config = LectioConfig::from_toml(
            r#"
            bind = "0.0.0.0:8080"

            [navigium]
            timeout_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.navigium.timeout_secs, 3);
        assert_eq!(config.navigium.max_translations, 5);
        assert_eq!(config.default_buckets, DEFAULT_BUCKETS);
    }

    #[test]
    fn test_rejects_zero_buckets() {
        assert!(LectioConfig::from_toml("default_buckets = 0").is_err());
    }

    #[test]
    fn test_default_buckets_within_max() {
        let err = LectioConfig::from_toml("default_buckets = 60\nmax_buckets = 40").unwrap_err();
        assert!(err.to_string().contains("exceeds max_buckets"));
    }

    #[test]
    fn test_check_bucket_count() {
        let config = LectioConfig::from_toml("max_buckets = 100").unwrap();
        assert!(config.check_bucket_count(100).is_ok());
        assert!(config.check_bucket_count(101).is_err());
        assert!(config.check_bucket_count(usize::MAX).is_err());
    }

    #[test]
    fn test_rejects_bad_bind() {
        assert!(LectioConfig::from_toml(r#"bind = "nowhere""#).is_err());
    }

    #[test]
    fn test_config_path_priority() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("lectio.toml");
        let explicit = dir.path().join("explicit.toml");
        let env = dir.path().join("env.toml");

        assert_eq!(config_path(None, None, &local), None);

        std::fs::write(&local, "").unwrap();
        assert_eq!(config_path(None, None, &local), Some(local.clone()));
        assert_eq!(config_path(None, Some(env.clone()), &local), Some(env.clone()));
        assert_eq!(
            config_path(Some(&explicit), Some(env), &local),
            Some(explicit)
        );
    }

    #[test]
    fn test_load_missing_explicit_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(LectioConfig::load(Some(&missing)).is_err());
    }
}
