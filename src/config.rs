use super::*;

pub(crate) const TEST_CACHE_BYTES: u64 = 1024;
pub(crate) const TEST_DATASET_BYTES: u64 = 32 * 1024;

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Production sizing and externally supplied hash primitive.
    #[default]
    #[display("normal")]
    Normal,
    /// Degenerate artifact sizes so the whole engine runs in milliseconds.
    #[display("test")]
    Test,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Verification caches kept in memory.
    pub caches_in_mem: usize,
    /// Spilled caches kept on disk; `0` disables spilling.
    pub caches_on_disk: usize,
    pub cache_dir: Option<PathBuf>,
    /// Mining datasets kept in memory.
    pub datasets_in_mem: usize,
    /// Spilled datasets kept on disk; `0` disables spilling.
    pub datasets_on_disk: usize,
    pub dataset_dir: Option<PathBuf>,
    /// Epoch ceiling for artifact size growth; `0` leaves growth unclamped.
    /// Seed derivation is unaffected, only sizing freezes.
    pub stunt_epoch: u64,
    /// Local CPU search threads spawned per sealed block; `0` leaves all
    /// solving to remote workers.
    pub miner_threads: usize,
    pub mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            caches_in_mem: 2,
            caches_on_disk: 3,
            cache_dir: None,
            datasets_in_mem: 1,
            datasets_on_disk: 2,
            dataset_dir: None,
            stunt_epoch: 0,
            miner_threads: 0,
            mode: Mode::Normal,
        }
    }
}

impl Config {
    pub fn test() -> Self {
        Self {
            caches_in_mem: 1,
            caches_on_disk: 0,
            datasets_in_mem: 1,
            datasets_on_disk: 0,
            mode: Mode::Test,
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result {
        ensure!(
            self.caches_in_mem > 0,
            error::ConfigSnafu {
                reason: "caches_in_mem must be at least 1",
            }
        );

        ensure!(
            self.datasets_in_mem > 0,
            error::ConfigSnafu {
                reason: "datasets_in_mem must be at least 1",
            }
        );

        ensure!(
            self.caches_on_disk == 0 || self.cache_dir.is_some(),
            error::ConfigSnafu {
                reason: "caches_on_disk requires cache_dir",
            }
        );

        ensure!(
            self.datasets_on_disk == 0 || self.dataset_dir.is_some(),
            error::ConfigSnafu {
                reason: "datasets_on_disk requires dataset_dir",
            }
        );

        Ok(())
    }

    /// Cache size in bytes for `epoch`, after the growth clamp.
    pub(crate) fn cache_bytes(&self, epoch: u64) -> u64 {
        match self.mode {
            Mode::Test => TEST_CACHE_BYTES,
            Mode::Normal => {
                sizes::cache_size_by_epoch(sizes::stunted_epoch(epoch, self.stunt_epoch))
            }
        }
    }

    /// Dataset size in bytes for `epoch`, after the growth clamp.
    pub(crate) fn dataset_bytes(&self, epoch: u64) -> u64 {
        match self.mode {
            Mode::Test => TEST_DATASET_BYTES,
            Mode::Normal => {
                sizes::dataset_size_by_epoch(sizes::stunted_epoch(epoch, self.stunt_epoch))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
        Config::test().validate().unwrap();
    }

    #[test]
    fn zero_memory_bounds_are_rejected() {
        let config = Config {
            caches_in_mem: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        let config = Config {
            datasets_in_mem: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn disk_bound_without_dir_is_rejected() {
        let config = Config {
            caches_on_disk: 2,
            cache_dir: None,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mode_sizes_are_degenerate() {
        let config = Config::test();
        assert_eq!(config.cache_bytes(0), TEST_CACHE_BYTES);
        assert_eq!(config.cache_bytes(9000), TEST_CACHE_BYTES);
        assert_eq!(config.dataset_bytes(9000), TEST_DATASET_BYTES);
    }

    #[test]
    fn stunt_clamps_sizing_only() {
        let config = Config {
            stunt_epoch: 40,
            ..Config::default()
        };
        assert_eq!(config.cache_bytes(42), config.cache_bytes(40));
        assert_eq!(config.dataset_bytes(42), config.dataset_bytes(40));
        assert_ne!(seed_hash(42), seed_hash(40));
    }
}
