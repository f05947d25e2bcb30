//! Builder configuration.

use kollate_core::CollationData;
use std::sync::Arc;

/// Configuration for a [`CollationDataBuilder`](super::CollationDataBuilder).
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Store long primary ranges as offset data instead of one value per code point
    pub compress_ranges: bool,
    /// Share identical expansion sequences in the stores
    pub deduplicate_expansions: bool,
    /// Data that code points without a mapping here fall back to
    pub base: Option<Arc<CollationData>>,
    /// Which primary lead bytes allow compressed primary weights
    pub compressible_lead_byte: Option<fn(u8) -> bool>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            compress_ranges: true,
            deduplicate_expansions: true,
            base: None,
            compressible_lead_byte: None,
        }
    }
}

impl BuilderConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable range compression.
    pub fn with_compress_ranges(mut self, enabled: bool) -> Self {
        self.compress_ranges = enabled;
        self
    }

    /// Enable or disable expansion sharing.
    pub fn with_deduplicate_expansions(mut self, enabled: bool) -> Self {
        self.deduplicate_expansions = enabled;
        self
    }

    /// Set the predicate for compressible primary lead bytes.
    pub fn with_compressible_lead_byte(mut self, predicate: fn(u8) -> bool) -> Self {
        self.compressible_lead_byte = Some(predicate);
        self
    }

    /// Set the base data.
    pub fn with_base(mut self, base: Arc<CollationData>) -> Self {
        self.base = Some(base);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_setters() {
        let config = BuilderConfig::default();
        assert!(config.compress_ranges);
        assert!(config.deduplicate_expansions);
        assert!(config.base.is_none());
        assert!(config.compressible_lead_byte.is_none());

        let config = BuilderConfig::new()
            .with_compress_ranges(false)
            .with_deduplicate_expansions(false);
        assert!(!config.compress_ranges);
        assert!(!config.deduplicate_expansions);
    }
}
