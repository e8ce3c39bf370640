//! Store configuration
//!
//! Promotion thresholds for sparse arrays and how the intrinsic prototypes
//! are built.

/// Minimum slot count before a sparse array is considered for promotion
pub const DEFAULT_PROMOTION_MIN_SLOTS: usize = 1024;

/// Promote once the average gap between stored indices drops below this
pub const DEFAULT_PROMOTION_MAX_GAP: u32 = 8;

/// When a sparse array hands its slots over to a dense representation
///
/// Promotion happens before an insertion when the table already holds at
/// least `min_slots` slots and `highest_index / slot_count < max_average_gap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionPolicy {
    /// Slot count threshold
    pub min_slots: usize,
    /// Average index gap threshold (integer division)
    pub max_average_gap: u32,
}

impl PromotionPolicy {
    /// Create a policy with explicit thresholds
    pub const fn new(min_slots: usize, max_average_gap: u32) -> Self {
        PromotionPolicy {
            min_slots,
            max_average_gap,
        }
    }

    /// A policy that keeps arrays sparse forever
    pub const fn never() -> Self {
        PromotionPolicy {
            min_slots: usize::MAX,
            max_average_gap: 0,
        }
    }
}

impl Default for PromotionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PROMOTION_MIN_SLOTS, DEFAULT_PROMOTION_MAX_GAP)
    }
}

/// Configuration shared by every object a [`crate::Context`] creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Promotion heuristic for sparse arrays
    pub promotion: PromotionPolicy,
    /// Defer building `Object.prototype` and `Array.prototype` until first use
    pub lazy_prototypes: bool,
}

impl StoreConfig {
    /// Replace the promotion policy
    pub fn with_promotion(mut self, promotion: PromotionPolicy) -> Self {
        self.promotion = promotion;
        self
    }

    /// Toggle lazy prototype construction
    pub fn with_lazy_prototypes(mut self, lazy: bool) -> Self {
        self.lazy_prototypes = lazy;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            promotion: PromotionPolicy::default(),
            lazy_prototypes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.promotion.min_slots, 1024);
        assert_eq!(config.promotion.max_average_gap, 8);
        assert!(config.lazy_prototypes);
    }

    #[test]
    fn test_builders() {
        let config = StoreConfig::default()
            .with_promotion(PromotionPolicy::new(4, 2))
            .with_lazy_prototypes(false);
        assert_eq!(config.promotion, PromotionPolicy::new(4, 2));
        assert!(!config.lazy_prototypes);
    }
}
