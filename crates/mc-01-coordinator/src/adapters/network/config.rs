use crate::domain::{DeliveryConfig, RetentionConfig};
use crate::ports::ConfigProvider;

// ============================================================================
// StaticConfigProvider - Hardcoded config for testing/development
// ============================================================================

/// Configuration provider with fixed values.
///
/// The runtime loads its own file-based configuration; this one is for
/// tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    retention: RetentionConfig,
    delivery: DeliveryConfig,
}

impl StaticConfigProvider {
    /// Default retention (60 s) and delivery timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_retention(mut self, retention: RetentionConfig) -> Self {
        self.retention = retention;
        self
    }

    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliveryConfig) -> Self {
        self.delivery = delivery;
        self
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn retention_config(&self) -> RetentionConfig {
        self.retention
    }

    fn delivery_config(&self) -> DeliveryConfig {
        self.delivery
    }
}
