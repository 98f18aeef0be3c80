// Base trait and utilities for source-specific normalizers
pub mod base;

// Individual normalizer implementations
pub mod national;
pub mod regional;
pub mod severe;

// Re-export the main components
pub use base::{MetricsNormalizer, NormalizerUtils, SourceNormalizer};
pub use national::NationalNormalizer;
pub use regional::RegionalNormalizer;
pub use severe::SevereNormalizer;
