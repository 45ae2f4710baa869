//! Replica set configuration.

/// Hard upper bound on the number of replicas attached to one set.
pub const REPLICA_CAPACITY: usize = 5;

/// Chunk size used when streaming two files through the comparator.
pub const DEFAULT_COMPARE_CHUNK_SIZE: usize = 4096;

/// Configuration for replica sets and comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum replicas `add` accepts. Never above [`REPLICA_CAPACITY`].
    pub max_replicas: usize,

    /// Bytes read from each file per comparison step. Never zero.
    pub compare_chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_replicas: REPLICA_CAPACITY,
            compare_chunk_size: DEFAULT_COMPARE_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the replica limit, clamped to [`REPLICA_CAPACITY`].
    #[must_use]
    pub const fn max_replicas(mut self, count: usize) -> Self {
        self.max_replicas = if count > REPLICA_CAPACITY {
            REPLICA_CAPACITY
        } else {
            count
        };
        self
    }

    /// Sets the comparison chunk size; zero becomes one.
    #[must_use]
    pub const fn compare_chunk_size(mut self, size: usize) -> Self {
        self.compare_chunk_size = if size == 0 { 1 } else { size };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.max_replicas, 5);
        assert_eq!(config.compare_chunk_size, 4096);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new().max_replicas(2).compare_chunk_size(512);
        assert_eq!(config.max_replicas, 2);
        assert_eq!(config.compare_chunk_size, 512);
    }

    #[test]
    fn limits_are_clamped() {
        let config = Config::new().max_replicas(9).compare_chunk_size(0);
        assert_eq!(config.max_replicas, REPLICA_CAPACITY);
        assert_eq!(config.compare_chunk_size, 1);
    }
}
