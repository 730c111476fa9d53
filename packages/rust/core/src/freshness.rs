//! Staleness decision for stored topics.

use chrono::{DateTime, Duration, Utc};

/// Pure decision function over a topic's last-update timestamp.
///
/// The window comes from the `retrieval.staleness_days` config value.
/// Boundary: a topic exactly as old as the window is still fresh; one
/// second older is stale. An absent topic always needs a refresh.
#[derive(Debug, Clone)]
pub struct FreshnessPolicy {
    staleness_window: Duration,
}

impl FreshnessPolicy {
    /// Create a policy with an explicit window.
    pub fn new(staleness_window: Duration) -> Self {
        Self { staleness_window }
    }

    /// Create a policy from a whole-day window.
    pub fn from_days(days: i64) -> Self {
        Self::new(Duration::days(days))
    }

    /// Whether the stored topic (or its absence) warrants a refresh at `now`.
    pub fn needs_refresh(&self, last_update: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_update {
            None => true,
            Some(last_update) => now - last_update > self.staleness_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_topic_needs_refresh() {
        let policy = FreshnessPolicy::from_days(7);
        assert!(policy.needs_refresh(None, Utc::now()));
    }

    #[test]
    fn recent_topic_is_fresh() {
        let policy = FreshnessPolicy::from_days(7);
        let now = Utc::now();
        assert!(!policy.needs_refresh(Some(now - Duration::days(3)), now));
    }

    #[test]
    fn exactly_at_window_is_fresh() {
        let policy = FreshnessPolicy::from_days(7);
        let now = Utc::now();
        assert!(!policy.needs_refresh(Some(now - Duration::days(7)), now));
    }

    #[test]
    fn one_second_past_window_is_stale() {
        let policy = FreshnessPolicy::from_days(7);
        let now = Utc::now();
        let last_update = now - Duration::days(7) - Duration::seconds(1);
        assert!(policy.needs_refresh(Some(last_update), now));
    }

    #[test]
    fn window_is_configurable() {
        let policy = FreshnessPolicy::from_days(1);
        let now = Utc::now();
        assert!(policy.needs_refresh(Some(now - Duration::days(2)), now));
        assert!(!policy.needs_refresh(Some(now - Duration::hours(12)), now));
    }
}
