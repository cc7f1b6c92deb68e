//! Server configuration.

/// Configuration for request handling.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Subpartition used when a request names none.
    pub default_subpartition: String,
    /// Pack size used when a request names none.
    pub default_how_many: usize,
    /// Largest pack size a request may ask for.
    pub max_how_many: usize,
}

impl ServerConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            default_subpartition: "0".to_string(),
            default_how_many: 100,
            max_how_many: 10_000,
        }
    }

    /// Sets the default subpartition.
    pub fn with_default_subpartition(mut self, name: impl Into<String>) -> Self {
        self.default_subpartition = name.into();
        self
    }

    /// Sets the default pack size.
    pub fn with_default_how_many(mut self, how_many: usize) -> Self {
        self.default_how_many = how_many;
        self
    }

    /// Sets the maximum pack size.
    pub fn with_max_how_many(mut self, max: usize) -> Self {
        self.max_how_many = max;
        self
    }

    /// Returns the pack size for a request that names none, never above
    /// the maximum.
    pub fn effective_default_how_many(&self) -> usize {
        self.default_how_many.min(self.max_how_many)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.default_subpartition, "0");
        assert_eq!(config.default_how_many, 100);
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new()
            .with_default_subpartition("1")
            .with_default_how_many(10)
            .with_max_how_many(50);

        assert_eq!(config.default_subpartition, "1");
        assert_eq!(config.default_how_many, 10);
        assert_eq!(config.max_how_many, 50);
    }

    #[test]
    fn default_how_many_never_exceeds_max() {
        let config = ServerConfig::new().with_max_how_many(50);
        assert_eq!(config.effective_default_how_many(), 50);

        let config = ServerConfig::new().with_default_how_many(10).with_max_how_many(50);
        assert_eq!(config.effective_default_how_many(), 10);
    }
}
