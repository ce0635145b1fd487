//! Validation and canonicalization of pack-size sets.

use std::collections::HashSet;

use crate::error::{PackSizeIssue, PlanError};
use crate::model::MAX_QUANTITY;

/// Validates pack sizes, removes duplicates, and sorts them descending.
///
/// Larger packs come first so the optimizer tries them first; that order is
/// also what decides between equally short combinations.
///
/// # Errors
/// `PlanError::InvalidPackSizes` naming the first offending value, or the
/// empty-set reason.
///
/// # Examples
/// ```ignore
/// let sizes = normalize_pack_sizes(&[500, 250, 250, 1000])?;
/// assert_eq!(sizes, vec![1000, 500, 250]);
/// ```
pub fn normalize_pack_sizes(raw: &[i64]) -> Result<Vec<u32>, PlanError> {
    if raw.is_empty() {
        return Err(PackSizeIssue::Empty.into());
    }

    let mut seen = HashSet::with_capacity(raw.len());
    let mut normalized = Vec::with_capacity(raw.len());
    for &size in raw {
        let size = validate_pack_size(size)?;
        if seen.insert(size) {
            normalized.push(size);
        }
    }

    if normalized.is_empty() {
        return Err(PackSizeIssue::EmptyAfterDedup.into());
    }

    normalized.sort_unstable_by(|a, b| b.cmp(a));
    Ok(normalized)
}

fn validate_pack_size(size: i64) -> Result<u32, PackSizeIssue> {
    if size <= 0 {
        return Err(PackSizeIssue::NonPositive(size));
    }
    if size > MAX_QUANTITY {
        return Err(PackSizeIssue::ExceedsMaximum(size));
    }
    u32::try_from(size).map_err(|_| PackSizeIssue::ExceedsMaximum(size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sorts_descending_and_removes_duplicates() {
        let sizes = normalize_pack_sizes(&[10, 40, 20, 10]).expect("valid sizes");
        assert_eq!(sizes, vec![40, 20, 10]);
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(
            normalize_pack_sizes(&[]),
            Err(PlanError::InvalidPackSizes(PackSizeIssue::Empty))
        );
    }

    #[test]
    fn rejects_non_positive_values() {
        assert_eq!(
            normalize_pack_sizes(&[0, 250]),
            Err(PlanError::InvalidPackSizes(PackSizeIssue::NonPositive(0)))
        );
        assert_eq!(
            normalize_pack_sizes(&[250, -5]),
            Err(PlanError::InvalidPackSizes(PackSizeIssue::NonPositive(-5)))
        );
    }

    #[test]
    fn rejects_values_above_shared_bound() {
        assert_eq!(
            normalize_pack_sizes(&[MAX_QUANTITY + 1, 250]),
            Err(PlanError::InvalidPackSizes(PackSizeIssue::ExceedsMaximum(
                MAX_QUANTITY + 1
            )))
        );
    }

    #[test]
    fn accepts_the_shared_bound_itself() {
        let sizes = normalize_pack_sizes(&[MAX_QUANTITY, 1]).expect("bound is inclusive");
        assert_eq!(sizes, vec![i32::MAX as u32, 1]);
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in prop::collection::vec(1i64..10_000, 1..16)) {
            let once = normalize_pack_sizes(&raw).expect("positive sizes are valid");
            let widened: Vec<i64> = once.iter().map(|&size| i64::from(size)).collect();
            let twice = normalize_pack_sizes(&widened).expect("normalized sizes are valid");
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn order_and_duplicates_do_not_matter(raw in prop::collection::vec(1i64..500, 1..12)) {
            let mut shuffled = raw.clone();
            shuffled.reverse();
            shuffled.extend_from_slice(&raw);
            prop_assert_eq!(normalize_pack_sizes(&raw), normalize_pack_sizes(&shuffled));
        }

        #[test]
        fn output_is_strictly_descending(raw in prop::collection::vec(1i64..1_000, 1..20)) {
            let sizes = normalize_pack_sizes(&raw).expect("positive sizes are valid");
            prop_assert!(sizes.windows(2).all(|pair| pair[0] > pair[1]));
        }
    }
}
