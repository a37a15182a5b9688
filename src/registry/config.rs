//! Registry configuration

/// Stream registry options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Create an entry when a frame is published for an unknown stream
    ///
    /// When `false`, such writes are dropped silently.
    pub auto_register_on_publish: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            auto_register_on_publish: true,
        }
    }
}

impl RegistryConfig {
    /// Set whether publishing to an unknown stream registers it
    pub fn auto_register_on_publish(mut self, enabled: bool) -> Self {
        self.auto_register_on_publish = enabled;
        self
    }
}
