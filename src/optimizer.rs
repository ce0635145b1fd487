//! Optimization logic for pack planning.
//!
//! Finds the combination of whole packs that ships at least the ordered
//! quantity, with
//! - no underfill and the least possible overfill
//! - the fewest packs among combinations shipping that same total
//!
//! The search is a bounded coin-change table over every total from zero up to
//! the fulfillment limit `items_ordered + largest_pack - 1`. No total above that
//! limit can be optimal: using only the largest pack already lands inside it.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{PackSizeIssue, PlanError, RangeIssue};
use crate::model::{MAX_QUANTITY, PackBreakdown, Plan};
use crate::normalizer::normalize_pack_sizes;

/// Configuration for the planning algorithm.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlanningConfig {
    /// Largest packing table (number of totals) a single call may allocate
    pub max_table_entries: usize,
}

impl PlanningConfig {
    pub const DEFAULT_MAX_TABLE_ENTRIES: usize = 2_000_000;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PlanningConfigBuilder {
        PlanningConfigBuilder::default()
    }
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            max_table_entries: Self::DEFAULT_MAX_TABLE_ENTRIES,
        }
    }
}

/// Builder for `PlanningConfig`.
#[derive(Clone, Debug, Default)]
pub struct PlanningConfigBuilder {
    config: PlanningConfig,
}

impl PlanningConfigBuilder {
    /// Sets the table size ceiling.
    pub fn max_table_entries(mut self, entries: usize) -> Self {
        self.config.max_table_entries = entries;
        self
    }

    /// Builds the final configuration.
    pub fn build(self) -> PlanningConfig {
        self.config
    }
}

/// Computes the fulfillment plan with the default configuration.
///
/// # Parameters
/// * `items_ordered` - Requested quantity, between 1 and `MAX_QUANTITY`
/// * `pack_sizes` - Available pack sizes in any order, duplicates allowed
///
/// # Returns
/// The optimal `Plan`, or the first validation or consistency error
pub fn optimize(items_ordered: i64, pack_sizes: &[i64]) -> Result<Plan, PlanError> {
    optimize_with_config(items_ordered, pack_sizes, PlanningConfig::default())
}

/// Like `optimize`, but with a custom table size ceiling.
pub fn optimize_with_config(
    items_ordered: i64,
    pack_sizes: &[i64],
    config: PlanningConfig,
) -> Result<Plan, PlanError> {
    let items_ordered = validate_items_ordered(items_ordered)?;
    let pack_sizes = normalize_pack_sizes(pack_sizes)?;

    let mut table = PackingTable::new(items_ordered, pack_sizes, &config)?;
    table.fill();

    let chosen_total = table.choose_fulfillment_total()?;
    let packs = table.breakdown(chosen_total)?;
    let total_packs = table.min_packs[chosen_total];

    debug!(
        items_ordered,
        table_entries = table.min_packs.len(),
        chosen_total,
        total_packs,
        "packing table solved"
    );

    Ok(Plan {
        items_ordered,
        total_items: u32::try_from(chosen_total)
            .map_err(|_| PlanError::from(RangeIssue::InvalidFulfillmentRange))?,
        total_packs,
        packs,
    })
}

fn validate_items_ordered(items_ordered: i64) -> Result<u32, PlanError> {
    if items_ordered <= 0 || items_ordered > MAX_QUANTITY {
        return Err(PlanError::InvalidItemsOrdered(items_ordered));
    }
    u32::try_from(items_ordered).map_err(|_| PlanError::InvalidItemsOrdered(items_ordered))
}

/// Dynamic-programming state for one optimization call.
///
/// All vectors are indexed by total in `0..=fulfillment_limit`.
#[derive(Debug)]
struct PackingTable {
    items_ordered: usize,
    /// Normalized, descending
    pack_sizes: Vec<u32>,
    /// Fewest packs reaching exactly this total, or `unreachable`
    min_packs: Vec<u32>,
    /// Total before the last pack was added
    prev_total: Vec<usize>,
    /// Size of the last pack added; 0 means no predecessor
    prev_pack: Vec<u32>,
    /// Sentinel above any achievable pack count
    unreachable: u32,
}

impl PackingTable {
    fn new(
        items_ordered: u32,
        pack_sizes: Vec<u32>,
        config: &PlanningConfig,
    ) -> Result<Self, PlanError> {
        let (Some(&largest), Some(&smallest)) = (pack_sizes.first(), pack_sizes.last()) else {
            return Err(PackSizeIssue::EmptyAfterDedup.into());
        };

        let limit = i64::from(items_ordered) + i64::from(largest) - 1;
        if limit <= 0 {
            return Err(RangeIssue::InvalidFulfillmentRange.into());
        }
        let required = limit.unsigned_abs() + 1;
        if required > config.max_table_entries as u64 {
            return Err(RangeIssue::TableTooLarge {
                required,
                max: config.max_table_entries,
            }
            .into());
        }
        let limit = usize::try_from(limit).map_err(|_| RangeIssue::InvalidFulfillmentRange)?;

        // Filling every total with the smallest pack is the worst case.
        let unreachable = u32::try_from(limit / smallest as usize + 1)
            .map_err(|_| RangeIssue::InvalidFulfillmentRange)?;

        let mut min_packs = vec![unreachable; limit + 1];
        min_packs[0] = 0;

        Ok(Self {
            items_ordered: items_ordered as usize,
            pack_sizes,
            min_packs,
            prev_total: vec![0; limit + 1],
            prev_pack: vec![0; limit + 1],
            unreachable,
        })
    }

    fn is_reachable(&self, total: usize) -> bool {
        self.min_packs[total] != self.unreachable
    }

    /// Records the fewest packs for every total and how it was reached.
    ///
    /// Only a strictly smaller count replaces an entry, and sizes are tried
    /// largest first, so among equally short combinations the one ending in
    /// the largest pack wins.
    fn fill(&mut self) {
        for total in 1..self.min_packs.len() {
            for &pack in &self.pack_sizes {
                let Some(pred) = total.checked_sub(pack as usize) else {
                    continue;
                };
                if !self.is_reachable(pred) {
                    continue;
                }

                let candidate = self.min_packs[pred] + 1;
                if candidate < self.min_packs[total] {
                    self.min_packs[total] = candidate;
                    self.prev_total[total] = pred;
                    self.prev_pack[total] = pack;
                }
            }
        }
    }

    /// Smallest reachable total that is at least the ordered quantity.
    fn choose_fulfillment_total(&self) -> Result<usize, PlanError> {
        (self.items_ordered..self.min_packs.len())
            .find(|&total| self.is_reachable(total))
            .ok_or(PlanError::NoPackingPlan)
    }

    /// Walks the predecessor chain from `chosen_total` down to zero and counts
    /// the packs used, grouped by size in descending order.
    fn breakdown(&self, chosen_total: usize) -> Result<Vec<PackBreakdown>, PlanError> {
        let mut counts: HashMap<u32, u32> = HashMap::new();
        let mut total = chosen_total;
        while total > 0 {
            let pack = self.prev_pack[total];
            let pred = self.prev_total[total];
            if pack == 0 || pred >= total {
                return Err(PlanError::BrokenBacktrack { total });
            }
            *counts.entry(pack).or_insert(0) += 1;
            total = pred;
        }

        Ok(self
            .pack_sizes
            .iter()
            .filter_map(|&size| {
                counts
                    .get(&size)
                    .map(|&count| PackBreakdown { size, count })
            })
            .collect())
    }
}
