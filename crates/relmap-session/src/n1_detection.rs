//! N+1 load detection.
//!
//! Loading an association one parent at a time in a loop issues one query
//! per parent. The batch loader accepts every parent at once and issues a
//! single query, so repeated single-parent loads of the same association are
//! counted here and reported once they reach a threshold.
//!
//! ```ignore
//! // Counted: one query per user.
//! for user in &mut users {
//!     db.load_association(std::slice::from_mut(user), "posts")?;
//! }
//!
//! // One query for all users.
//! db.load_association(&mut users, "posts")?;
//! ```

use std::collections::HashMap;
use std::panic::Location;
use std::time::Instant;

/// Call sites kept per association.
const MAX_SITES: usize = 5;

/// Where a single-parent load was issued.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct LoadCount {
    loads: usize,
    sites: Vec<CallSite>,
}

/// Summary of recorded single-parent loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct N1Stats {
    /// Single-parent loads recorded.
    pub total_loads: usize,
    /// Distinct `(entity, association)` pairs loaded.
    pub associations: usize,
    /// Pairs at or over the threshold.
    pub potential_n1: usize,
}

/// Counts single-parent association loads per `(entity, association)`.
#[derive(Debug)]
pub struct N1QueryTracker {
    counts: HashMap<(&'static str, &'static str), LoadCount>,
    threshold: usize,
    enabled: bool,
}

impl Default for N1QueryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl N1QueryTracker {
    /// A tracker that warns at the third load.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            threshold: 3,
            enabled: true,
        }
    }

    /// Warn once an association reaches `threshold` loads.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    /// Start with counting on or off.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Loads before a warning is logged.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Whether loads are being counted.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn counting on or off; existing counts are kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Record one single-parent load; warns when the count reaches the threshold.
    #[track_caller]
    pub fn record_load(&mut self, entity: &'static str, association: &'static str) {
        if !self.enabled {
            return;
        }
        let caller = Location::caller();
        let entry = self.counts.entry((entity, association)).or_default();
        entry.loads += 1;
        if entry.sites.len() < MAX_SITES {
            entry.sites.push(CallSite {
                file: caller.file(),
                line: caller.line(),
                at: Instant::now(),
            });
        }

        if entry.loads == self.threshold {
            tracing::warn!(
                target: "relmap::n1",
                entity,
                association,
                loads = entry.loads,
                threshold = self.threshold,
                "Possible N+1 pattern: pass all parents to Database::load_association in one call"
            );
            for (i, site) in entry.sites.iter().enumerate() {
                tracing::debug!(
                    target: "relmap::n1",
                    index = i,
                    file = site.file,
                    line = site.line,
                    "Single-parent load site"
                );
            }
        }
    }

    /// Loads recorded for one association.
    pub fn count_for(&self, entity: &str, association: &str) -> usize {
        self.counts
            .iter()
            .find(|((e, a), _)| *e == entity && *a == association)
            .map_or(0, |(_, c)| c.loads)
    }

    /// Recorded call sites for one association, oldest first.
    pub fn call_sites(&self, entity: &str, association: &str) -> &[CallSite] {
        self.counts
            .iter()
            .find(|((e, a), _)| *e == entity && *a == association)
            .map(|(_, c)| c.sites.as_slice())
            .unwrap_or_default()
    }

    /// A snapshot of the counts so far.
    pub fn stats(&self) -> N1Stats {
        N1Stats {
            total_loads: self.counts.values().map(|c| c.loads).sum(),
            associations: self.counts.len(),
            potential_n1: self
                .counts
                .values()
                .filter(|c| c.loads >= self.threshold)
                .count(),
        }
    }

    /// Forget everything recorded so far.
    pub fn reset(&mut self) {
        self.counts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_defaults() {
        let tracker = N1QueryTracker::new();
        assert_eq!(tracker.threshold(), 3);
        assert!(tracker.is_enabled());
        assert_eq!(tracker.stats(), N1Stats::default());
    }

    #[test]
    fn test_threshold_never_zero() {
        assert_eq!(N1QueryTracker::new().with_threshold(0).threshold(), 1);
    }

    #[test]
    fn test_counts_per_association() {
        let mut tracker = N1QueryTracker::new();
        tracker.record_load("User", "posts");
        tracker.record_load("User", "posts");
        tracker.record_load("User", "roles");
        assert_eq!(tracker.count_for("User", "posts"), 2);
        assert_eq!(tracker.count_for("User", "roles"), 1);
        assert_eq!(tracker.count_for("Group", "users"), 0);
    }

    #[test]
    fn test_disabled_records_nothing() {
        let mut tracker = N1QueryTracker::new().with_enabled(false);
        tracker.record_load("User", "posts");
        assert_eq!(tracker.count_for("User", "posts"), 0);
    }

    #[test]
    fn test_call_sites_bounded_and_located() {
        let mut tracker = N1QueryTracker::new().with_threshold(100);
        for _ in 0..8 {
            tracker.record_load("User", "posts");
        }
        let sites = tracker.call_sites("User", "posts");
        assert_eq!(sites.len(), MAX_SITES);
        assert!(sites[0].file.ends_with("n1_detection.rs"));
        assert!(sites[1].at >= sites[0].at);
        assert_eq!(tracker.count_for("User", "posts"), 8);
    }

    #[test]
    fn test_stats_and_reset() {
        let mut tracker = N1QueryTracker::new().with_threshold(2);
        tracker.record_load("User", "posts");
        tracker.record_load("User", "posts");
        tracker.record_load("User", "roles");
        assert_eq!(
            tracker.stats(),
            N1Stats {
                total_loads: 3,
                associations: 2,
                potential_n1: 1,
            }
        );
        tracker.reset();
        assert_eq!(tracker.stats().total_loads, 0);
        assert!(tracker.call_sites("User", "posts").is_empty());
    }
}
