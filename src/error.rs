//! Error types for pack-size validation and plan computation.

use thiserror::Error;

use crate::model::MAX_QUANTITY;

/// Why a set of pack sizes was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PackSizeIssue {
    #[error("at least one pack size is required")]
    Empty,
    #[error("{0} is not a positive pack size")]
    NonPositive(i64),
    #[error("{0} exceeds the maximum pack size {max}", max = MAX_QUANTITY)]
    ExceedsMaximum(i64),
    #[error("no pack sizes left after removing duplicates")]
    EmptyAfterDedup,
}

/// Why the fulfillment range could not be tabulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeIssue {
    #[error("invalid fulfillment range")]
    InvalidFulfillmentRange,
    #[error("requires {required} table entries (max {max})")]
    TableTooLarge { required: u64, max: usize },
}

/// Failure of a normalization or optimization call.
///
/// The first three kinds are caused by the caller's input. `NoPackingPlan` and
/// `BrokenBacktrack` mean the packing table is inconsistent and should never be
/// observed for validated input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("items_ordered must be between 1 and {max}, got {0}", max = MAX_QUANTITY)]
    InvalidItemsOrdered(i64),
    #[error("invalid pack_sizes: {0}")]
    InvalidPackSizes(#[from] PackSizeIssue),
    #[error("optimization range is too large: {0}")]
    OptimizationTooLarge(#[from] RangeIssue),
    #[error("no valid packing combination found")]
    NoPackingPlan,
    #[error("unable to reconstruct packing combination at total {total}")]
    BrokenBacktrack { total: usize },
}

impl PlanError {
    /// True when the error stems from invalid input rather than a logic defect.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PlanError::InvalidItemsOrdered(_)
                | PlanError::InvalidPackSizes(_)
                | PlanError::OptimizationTooLarge(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_client_errors() {
        assert!(PlanError::InvalidItemsOrdered(0).is_client_error());
        assert!(PlanError::InvalidPackSizes(PackSizeIssue::Empty).is_client_error());
        assert!(
            PlanError::OptimizationTooLarge(RangeIssue::InvalidFulfillmentRange).is_client_error()
        );
    }

    #[test]
    fn consistency_errors_are_not_client_errors() {
        assert!(!PlanError::NoPackingPlan.is_client_error());
        assert!(!PlanError::BrokenBacktrack { total: 7 }.is_client_error());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = PlanError::from(PackSizeIssue::NonPositive(-5));
        assert_eq!(err.to_string(), "invalid pack_sizes: -5 is not a positive pack size");

        let err = PlanError::InvalidItemsOrdered(3_000_000_000);
        assert!(
            err.to_string().contains("3000000000"),
            "Message should contain the rejected quantity: {}",
            err
        );

        let err = PlanError::from(RangeIssue::TableTooLarge {
            required: 2_000_001,
            max: 2_000_000,
        });
        assert_eq!(
            err.to_string(),
            "optimization range is too large: requires 2000001 table entries (max 2000000)"
        );
    }
}
