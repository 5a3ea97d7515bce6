//! Per-client subscription interests.

use std::collections::HashSet;

use hearth_core::frames::STATE_CHANGED;

/// Three independent interest sets for one client. Uniqueness is set
/// semantics; insertion order is irrelevant. The global reverse lookup is
/// implicit — broadcasts iterate clients and test each set.
#[derive(Clone, Debug, Default)]
pub struct Subscriptions {
    /// Exact entity ids.
    pub entities: HashSet<String>,
    /// Entity domains (prefix before the first `.`).
    pub domains: HashSet<String>,
    /// Event type tags.
    pub events: HashSet<String>,
}

impl Subscriptions {
    /// Whether a state change for `entity_id` (in `domain`) interests this
    /// client: entity match OR domain match OR a blanket `state_changed`
    /// event subscription. A client matching several criteria still gets a
    /// single delivery — the predicate is one boolean.
    #[must_use]
    pub fn matches_state_change(&self, entity_id: &str, domain: &str) -> bool {
        self.entities.contains(entity_id)
            || self.domains.contains(domain)
            || self.events.contains(STATE_CHANGED)
    }

    /// Whether a generic event with this type tag interests the client.
    #[must_use]
    pub fn matches_event(&self, event_type: &str) -> bool {
        self.events.contains(event_type)
    }

    /// Total interests across all three sets (statistics input).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len() + self.domains.len() + self.events.len()
    }

    /// Whether no interests are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_match() {
        let mut subs = Subscriptions::default();
        let _ = subs.entities.insert("light.kitchen".into());
        assert!(subs.matches_state_change("light.kitchen", "light"));
        assert!(!subs.matches_state_change("light.hall", "light"));
    }

    #[test]
    fn domain_match() {
        let mut subs = Subscriptions::default();
        let _ = subs.domains.insert("light".into());
        assert!(subs.matches_state_change("light.kitchen", "light"));
        assert!(subs.matches_state_change("light.hall", "light"));
        assert!(!subs.matches_state_change("switch.fan", "switch"));
    }

    #[test]
    fn blanket_state_changed_subscription_matches_all_entities() {
        let mut subs = Subscriptions::default();
        let _ = subs.events.insert(STATE_CHANGED.into());
        assert!(subs.matches_state_change("anything.at_all", "anything"));
    }

    #[test]
    fn event_match_is_exact_tag() {
        let mut subs = Subscriptions::default();
        let _ = subs.events.insert("automation_triggered".into());
        assert!(subs.matches_event("automation_triggered"));
        assert!(!subs.matches_event("script_executed"));
    }

    #[test]
    fn empty_matches_nothing() {
        let subs = Subscriptions::default();
        assert!(!subs.matches_state_change("light.kitchen", "light"));
        assert!(!subs.matches_event("state_changed"));
        assert!(subs.is_empty());
    }

    #[test]
    fn len_sums_all_sets() {
        let mut subs = Subscriptions::default();
        let _ = subs.entities.insert("light.kitchen".into());
        let _ = subs.entities.insert("light.hall".into());
        let _ = subs.domains.insert("climate".into());
        let _ = subs.events.insert("zone_entered".into());
        assert_eq!(subs.len(), 4);
    }

    #[test]
    fn duplicate_insert_is_idempotent() {
        let mut subs = Subscriptions::default();
        let _ = subs.entities.insert("light.kitchen".into());
        let _ = subs.entities.insert("light.kitchen".into());
        assert_eq!(subs.len(), 1);
    }
}
