//! Dump configuration.

use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable overriding [`DumpConfig::dir`].
pub const ENV_DIR: &str = "METRICSDUMP_DIR";

/// Where snapshot files are created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpConfig {
    /// Scratch directory snapshots are created in.
    pub dir: PathBuf,
    /// File name prefix; a random suffix is appended.
    pub prefix: String,
    /// Length of the random suffix.
    pub rand_len: usize,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir(),
            prefix: "metricsdump.".to_owned(),
            rand_len: 6,
        }
    }
}

impl DumpConfig {
    /// Defaults, with the directory overridden by [`ENV_DIR`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_DIR).filter(|d| !d.is_empty()) {
            config.dir = PathBuf::from(dir);
        }
        config
    }

    /// Use `dir` as the scratch directory.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Use `prefix` for file names.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}
