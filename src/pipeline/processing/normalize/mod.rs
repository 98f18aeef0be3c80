//! Source-specific normalization of raw feed tables into the canonical panel.

pub mod normalizers;
pub mod registry;

pub use normalizers::{NationalNormalizer, RegionalNormalizer, SevereNormalizer, SourceNormalizer};
pub use registry::NormalizationRegistry;

/// What to do with a day-over-day increment that cannot be computed
/// (first observation of a region, or a missing cumulative value on either side).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingIncrementPolicy {
    /// Treat an unknown increment as no observed change and record `0`
    #[default]
    TreatAsNoChange,
    /// Leave the row out of the panel and out of the aggregate
    DropRow,
}

impl MissingIncrementPolicy {
    /// Resolve a row's increments, or `None` when the row should be skipped
    pub fn resolve(&self, increments: [Option<f64>; 3]) -> Option<[f64; 3]> {
        match self {
            MissingIncrementPolicy::TreatAsNoChange => Some(increments.map(|v| v.unwrap_or(0.0))),
            MissingIncrementPolicy::DropRow => {
                let [a, b, c] = increments;
                Some([a?, b?, c?])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_change_policy_zero_fills() {
        assert_eq!(
            MissingIncrementPolicy::TreatAsNoChange.resolve([Some(2.0), None, None]),
            Some([2.0, 0.0, 0.0])
        );
    }

    #[test]
    fn test_drop_policy_needs_every_increment() {
        assert_eq!(MissingIncrementPolicy::DropRow.resolve([Some(2.0), None, Some(1.0)]), None);
        assert_eq!(
            MissingIncrementPolicy::DropRow.resolve([Some(2.0), Some(0.0), Some(1.0)]),
            Some([2.0, 0.0, 1.0])
        );
    }
}
