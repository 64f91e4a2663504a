//! Writer configuration, loadable from the environment.

use envconfig::Envconfig;

/// Default cache-drop chunk: one advisory per MiB appended to a file.
pub const DEFAULT_DROP_CACHE_CHUNK: u64 = 1024 * 1024;

/// Configuration for a [`TargetWriter`](crate::TargetWriter).
///
/// ```ignore
/// // TARGETLOG_ENABLED=false disables every write
/// let config = WriterConfig::init_from_env()?;
/// let config = WriterConfig::default().with_drop_cache_chunk(0);
/// ```
#[derive(Debug, Clone, Envconfig)]
pub struct WriterConfig {
    /// Initial state of the administrative gate.
    #[envconfig(from = "TARGETLOG_ENABLED", default = "true")]
    pub enabled: bool,

    /// Bytes appended to a file between two cache-drop advisories. `0` disables cache-drop.
    #[envconfig(from = "TARGETLOG_DROP_CACHE_CHUNK", default = "1048576")]
    pub drop_cache_chunk: u64,

    /// Create missing parent directories of rotating targets' concrete paths.
    #[envconfig(from = "TARGETLOG_CREATE_DIRS", default = "true")]
    pub create_dirs: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            drop_cache_chunk: DEFAULT_DROP_CACHE_CHUNK,
            create_dirs: true,
        }
    }
}

impl WriterConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_drop_cache_chunk(mut self, drop_cache_chunk: u64) -> Self {
        self.drop_cache_chunk = drop_cache_chunk;
        self
    }

    pub fn with_create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults_match_env_defaults() {
        let from_env = WriterConfig::init_from_hashmap(&HashMap::new()).unwrap();
        let default = WriterConfig::default();

        assert_eq!(from_env.enabled, default.enabled);
        assert_eq!(from_env.drop_cache_chunk, default.drop_cache_chunk);
        assert_eq!(from_env.create_dirs, default.create_dirs);
    }

    #[test]
    fn test_env_overrides() {
        let mut vars = HashMap::new();
        vars.insert("TARGETLOG_ENABLED".to_string(), "false".to_string());
        vars.insert("TARGETLOG_DROP_CACHE_CHUNK".to_string(), "4096".to_string());

        let config = WriterConfig::init_from_hashmap(&vars).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.drop_cache_chunk, 4096);
        assert!(config.create_dirs);
    }

    #[test]
    fn test_malformed_env_is_rejected() {
        let mut vars = HashMap::new();
        vars.insert("TARGETLOG_DROP_CACHE_CHUNK".to_string(), "lots".to_string());

        assert!(WriterConfig::init_from_hashmap(&vars).is_err());
    }
}
