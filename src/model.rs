//! Data models for pack planning.
//!
//! - `Plan`: the result of an optimization, in the shape served over HTTP
//! - `PackBreakdown`: one (pack size, count) line of a plan
//!
//! Order quantities and pack sizes share the same upper bound so that every
//! total the planner tabulates stays well inside platform integer range.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

/// Largest accepted order quantity or pack size (the signed 32-bit maximum).
pub const MAX_QUANTITY: i64 = i32::MAX as i64;

/// Number of packs of one size in a plan.
///
/// # Fields
/// * `size` - Items per pack
/// * `count` - Packs of this size, always greater than zero
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PackBreakdown {
    pub size: u32,
    pub count: u32,
}

/// Fulfillment plan for one order.
///
/// `packs` is sorted descending by size and only lists sizes that are used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "items_ordered": 501,
        "total_items": 750,
        "total_packs": 2,
        "packs": [
            { "size": 500, "count": 1 },
            { "size": 250, "count": 1 }
        ]
    })
)]
pub struct Plan {
    pub items_ordered: u32,
    pub total_items: u32,
    pub total_packs: u32,
    pub packs: Vec<PackBreakdown>,
}

impl Plan {
    /// Items shipped beyond the ordered quantity, or 0 for an underfilled plan.
    pub fn overfill(&self) -> u32 {
        self.total_items.saturating_sub(self.items_ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> Plan {
        Plan {
            items_ordered: 501,
            total_items: 750,
            total_packs: 2,
            packs: vec![
                PackBreakdown {
                    size: 500,
                    count: 1,
                },
                PackBreakdown {
                    size: 250,
                    count: 1,
                },
            ],
        }
    }

    #[test]
    fn plan_serializes_with_stable_field_names() {
        let value = serde_json::to_value(sample_plan()).expect("Plan should serialize");
        assert_eq!(
            value,
            json!({
                "items_ordered": 501,
                "total_items": 750,
                "total_packs": 2,
                "packs": [
                    { "size": 500, "count": 1 },
                    { "size": 250, "count": 1 }
                ]
            })
        );
    }

    #[test]
    fn overfill_is_shipped_minus_ordered() {
        let plan = sample_plan();
        assert_eq!(plan.overfill(), 249);
    }

    #[test]
    fn overfill_of_underfilled_plan_is_zero() {
        let plan: Plan = serde_json::from_value(json!({
            "items_ordered": 501,
            "total_items": 250,
            "total_packs": 1,
            "packs": [{ "size": 250, "count": 1 }]
        }))
        .expect("Plan should deserialize");
        assert_eq!(plan.overfill(), 0);
    }
}
