//! Switching between sparse and dense storage
//!
//! Before a sparse array inserts a new slot it asks [`should_promote`]
//! whether the table, counting the new index, has become large and tightly
//! packed. If so, the slots move into a dense [`ArrayObject`] and the
//! insertion is replayed against it.
//!
//! A dense array asks [`should_demote`] before a write far past its element
//! vector. Such a write hands the elements back to a sparse array instead of
//! growing the vector to the new index.

use tracing::debug;

use crate::config::PromotionPolicy;
use crate::runtime::array::ArrayObject;
use crate::runtime::slots::SlotTable;
use crate::runtime::sparse::SparseArrayObject;

/// Dense writes at or below this index always extend the vector
pub const DENSE_FAR_WRITE_MIN: u32 = 4096;

/// A dense write whose index exceeds this multiple of the element count goes sparse
pub const DENSE_FAR_WRITE_GAP: u32 = 10;

/// Decide whether inserting `index` should switch the table to dense storage
pub fn should_promote(policy: &PromotionPolicy, slots: &SlotTable, index: u32) -> bool {
    let count = slots.len();
    if count == 0 || count < policy.min_slots {
        return false;
    }
    let highest = slots.highest_index().map_or(index, |h| h.max(index));
    u64::from(highest) / (count as u64) < u64::from(policy.max_average_gap)
}

/// Decide whether a dense array holding `present` elements should go back to
/// sparse storage to accept a write at `index`
///
/// The threshold never lies below the promotion gap, so the replayed write
/// cannot promote the array straight back.
pub fn should_demote(policy: &PromotionPolicy, present: usize, index: u32) -> bool {
    if index <= DENSE_FAR_WRITE_MIN {
        return false;
    }
    let gap = DENSE_FAR_WRITE_GAP.max(policy.max_average_gap);
    present == 0 || u64::from(index) / (present as u64) > u64::from(gap)
}

/// Move the contents of a sparse array into a dense one
///
/// The sparse array is left empty; the caller replaces it.
pub fn promote(sparse: &mut SparseArrayObject) -> ArrayObject {
    let slots = std::mem::take(&mut sparse.slots);
    let base = std::mem::take(&mut sparse.base);
    debug!(
        slots = slots.len(),
        highest = ?slots.highest_index(),
        length = sparse.length.get(),
        "promoting sparse array to dense"
    );
    ArrayObject::from_slots(base, slots, sparse.length, sparse.policy())
}

/// Move the contents of a dense array into a sparse one
///
/// The dense array is left empty; the caller replaces it.
pub fn demote(dense: &mut ArrayObject, index: u32) -> SparseArrayObject {
    let (base, slots, length, policy) = dense.take_parts();
    debug!(
        slots = slots.len(),
        index,
        length = length.get(),
        "far write, moving dense array back to sparse"
    );
    SparseArrayObject::from_parts(base, slots, length, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::property::SlotValue;
    use crate::value::Value;

    fn table(indices: impl IntoIterator<Item = u32>) -> SlotTable {
        let mut t = SlotTable::new();
        for i in indices {
            t.store(i, SlotValue::Plain(Value::int(i64::from(i))));
        }
        t
    }

    #[test]
    fn test_default_thresholds() {
        let policy = PromotionPolicy::default();
        // Below the slot threshold
        assert!(!should_promote(&policy, &table(0..1022), 1022));
        // Packed
        assert!(should_promote(&policy, &table(0..1024), 1024));
        // 1024 slots spread with a gap of 8 (highest / count == 7.99..)
        let spread = table((0..1024).map(|i| i * 8));
        assert!(should_promote(&policy, &spread, 1));
        // Gap of 9 is too sparse
        assert!(!should_promote(&policy, &table((0..1024).map(|i| i * 9)), 1));
    }

    #[test]
    fn test_far_index_counts_toward_gap() {
        let policy = PromotionPolicy::default();
        let packed = table(0..1024);
        assert!(should_promote(&policy, &packed, 2000));
        assert!(!should_promote(&policy, &packed, 8192));
    }

    #[test]
    fn test_never_policy() {
        assert!(!should_promote(&PromotionPolicy::never(), &table(0..4096), 4096));
    }

    #[test]
    fn test_decision_is_deterministic() {
        let policy = PromotionPolicy::new(16, 4);
        let slots = table((0..32).map(|i| i * 3));
        let first = should_promote(&policy, &slots, 96);
        for _ in 0..10 {
            assert_eq!(should_promote(&policy, &slots, 96), first);
        }
    }

    #[test]
    fn test_demote_thresholds() {
        let policy = PromotionPolicy::default();
        assert!(!should_demote(&policy, 0, DENSE_FAR_WRITE_MIN));
        assert!(should_demote(&policy, 0, DENSE_FAR_WRITE_MIN + 1));
        assert!(!should_demote(&policy, 1000, 10_000));
        assert!(should_demote(&policy, 1000, 11_000));

        // A wide promotion gap raises the bar so the write stays sparse
        let wide = PromotionPolicy::new(4, 100);
        assert!(!should_demote(&wide, 1000, 50_000));
        assert!(should_demote(&wide, 1000, 101_000));
    }

    #[test]
    fn test_demoted_write_does_not_promote_back() {
        let policy = PromotionPolicy::new(4, 100);
        let slots = table(0..1000);
        assert!(should_demote(&policy, slots.len(), 101_000));
        assert!(!should_promote(&policy, &slots, 101_000));
    }
}
