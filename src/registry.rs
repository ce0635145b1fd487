//! Server-wide pack sizes shared between request handlers.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::PlanError;
use crate::normalizer::normalize_pack_sizes;

/// Pack sizes used for every optimization request.
///
/// Built once at startup and handed to the API state. Clones share the same
/// underlying set. Readers get an owned snapshot, so a concurrent update can
/// never change the sizes an optimization is working with.
#[derive(Clone, Debug)]
pub struct PackSizeRegistry {
    pack_sizes: Arc<RwLock<Vec<u32>>>,
}

impl PackSizeRegistry {
    /// Sizes the service starts with when nothing else is configured.
    pub const DEFAULT_PACK_SIZES: [i64; 5] = [250, 500, 1000, 2000, 5000];

    /// Creates a registry holding the normalized `initial` sizes.
    pub fn new(initial: &[i64]) -> Result<Self, PlanError> {
        let normalized = normalize_pack_sizes(initial)?;
        Ok(Self {
            pack_sizes: Arc::new(RwLock::new(normalized)),
        })
    }

    /// Returns a copy of the current pack sizes, descending.
    pub fn pack_sizes(&self) -> Vec<u32> {
        self.pack_sizes.read().clone()
    }

    /// Same snapshot widened to the optimizer's input type.
    pub fn raw_pack_sizes(&self) -> Vec<i64> {
        self.pack_sizes.read().iter().copied().map(i64::from).collect()
    }

    /// Validates and replaces the pack sizes, returning the stored set.
    ///
    /// On error the previous sizes stay in place.
    pub fn set_pack_sizes(&self, raw: &[i64]) -> Result<Vec<u32>, PlanError> {
        let normalized = normalize_pack_sizes(raw)?;
        let mut guard = self.pack_sizes.write();
        guard.clone_from(&normalized);
        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PackSizeIssue;

    #[test]
    fn new_normalizes_initial_sizes() {
        let registry = PackSizeRegistry::new(&[250, 500, 1000]).expect("valid sizes");
        assert_eq!(registry.pack_sizes(), vec![1000, 500, 250]);
        assert_eq!(registry.raw_pack_sizes(), vec![1000, 500, 250]);
    }

    #[test]
    fn new_rejects_invalid_initial_sizes() {
        assert_eq!(
            PackSizeRegistry::new(&[]).map(|registry| registry.pack_sizes()),
            Err(PlanError::InvalidPackSizes(PackSizeIssue::Empty))
        );
    }

    #[test]
    fn snapshots_are_isolated_copies() {
        let registry = PackSizeRegistry::new(&[250, 500, 1000]).expect("valid sizes");
        let mut snapshot = registry.pack_sizes();
        snapshot[0] = 999_999;
        assert_eq!(registry.pack_sizes(), vec![1000, 500, 250]);
    }

    #[test]
    fn set_replaces_sizes() {
        let registry = PackSizeRegistry::new(&[250, 500, 1000]).expect("valid sizes");
        let stored = registry
            .set_pack_sizes(&[10, 40, 20, 10])
            .expect("valid update");
        assert_eq!(stored, vec![40, 20, 10]);
        assert_eq!(registry.pack_sizes(), vec![40, 20, 10]);
    }

    #[test]
    fn invalid_update_keeps_previous_sizes() {
        let registry = PackSizeRegistry::new(&[250, 500, 1000]).expect("valid sizes");
        assert_eq!(
            registry.set_pack_sizes(&[0, 250]),
            Err(PlanError::InvalidPackSizes(PackSizeIssue::NonPositive(0)))
        );
        assert_eq!(registry.pack_sizes(), vec![1000, 500, 250]);
    }

    #[test]
    fn clones_share_state() {
        let registry = PackSizeRegistry::new(&PackSizeRegistry::DEFAULT_PACK_SIZES)
            .expect("default sizes are valid");
        let handle = registry.clone();
        handle.set_pack_sizes(&[7]).expect("valid update");
        assert_eq!(registry.pack_sizes(), vec![7]);
    }

    #[test]
    fn concurrent_readers_and_writers_see_whole_sets() {
        let registry = PackSizeRegistry::new(&[3, 2, 1]).expect("valid sizes");
        let sets: [&[i64]; 2] = [&[3, 2, 1], &[30, 20, 10]];

        std::thread::scope(|scope| {
            for writer in 0..4 {
                let registry = registry.clone();
                scope.spawn(move || {
                    for round in 0..200 {
                        registry
                            .set_pack_sizes(sets[(writer + round) % 2])
                            .expect("valid update");
                    }
                });
            }
            for _ in 0..8 {
                let registry = registry.clone();
                scope.spawn(move || {
                    for _ in 0..500 {
                        let snapshot = registry.pack_sizes();
                        assert!(
                            snapshot == vec![3, 2, 1] || snapshot == vec![30, 20, 10],
                            "Observed a partially updated set: {:?}",
                            snapshot
                        );
                    }
                });
            }
        });
    }
}
