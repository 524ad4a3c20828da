//! Persona catalog.
//!
//! Each persona variant is a step script over the shared session driver,
//! plus a scheduling profile (weight and wait-time range) consumed by the
//! runner. Variant differences are data and dispatch, not inheritance.

pub mod api_client;
pub mod app_viewer;
pub mod driver;
pub mod power;
pub mod visitor;

use rand::Rng;

use crate::session::PersonaKind;

use self::driver::SessionDriver;

// ─────────────────────────────────────────────────────────────────
// Scheduling profile
// ─────────────────────────────────────────────────────────────────

/// How often a persona kind is spawned and how long it pauses between
/// scheduling rounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonaProfile {
    pub kind: PersonaKind,
    /// Relative spawn weight within a plan
    pub weight: u32,
    /// Wait-time range between rounds, in seconds
    pub wait_secs: (f64, f64),
}

impl PersonaProfile {
    pub const fn new(kind: PersonaKind, weight: u32, wait_secs: (f64, f64)) -> Self {
        Self {
            kind,
            weight,
            wait_secs,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────

/// Run one scheduling round of the given persona kind.
pub async fn run_task<R: Rng>(kind: PersonaKind, driver: &mut SessionDriver<'_>, rng: &mut R) {
    match kind {
        PersonaKind::Visitor => visitor::run_once(driver, rng, false).await,
        PersonaKind::RegisteringVisitor => visitor::run_once(driver, rng, true).await,
        PersonaKind::PowerUser => power::run_once(driver).await,
        PersonaKind::AppViewer => app_viewer::run_once(driver).await,
        PersonaKind::ApiClient => api_client::run_once(driver, rng).await,
    }
}

/// Best-effort teardown when a virtual user stops: log out sessions that
/// are still authenticated and mark the session finished.
pub async fn teardown(driver: &mut SessionDriver<'_>) {
    if driver.session().authenticated() {
        driver.logout().await;
    }
    driver.session().mark_terminal();
}

/// Pick an item from a weighted list. Weights must not all be zero.
pub fn pick_weighted<'a, T, R: Rng>(rng: &mut R, items: &'a [(T, u32)]) -> &'a T {
    let total: u32 = items.iter().map(|(_, weight)| weight).sum();
    let mut roll = rng.gen_range(0..total.max(1));
    for (item, weight) in items {
        if roll < *weight {
            return item;
        }
        roll -= weight;
    }
    // Unreachable for non-empty lists with a positive weight sum
    &items[items.len() - 1].0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_pick_weighted_respects_zero_weight() {
        let mut rng = SmallRng::seed_from_u64(7);
        let items = [("never", 0u32), ("always", 5u32)];
        for _ in 0..100 {
            assert_eq!(*pick_weighted(&mut rng, &items), "always");
        }
    }

    #[test]
    fn test_pick_weighted_covers_all_items() {
        let mut rng = SmallRng::seed_from_u64(42);
        let items = [("a", 1u32), ("b", 1u32), ("c", 1u32)];
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(*pick_weighted(&mut rng, &items));
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_pick_weighted_skews_toward_heavy_items() {
        let mut rng = SmallRng::seed_from_u64(1);
        let items = [("light", 1u32), ("heavy", 9u32)];
        let heavy_hits = (0..1000)
            .filter(|_| *pick_weighted(&mut rng, &items) == "heavy")
            .count();
        assert!(heavy_hits > 700, "heavy item picked only {} times", heavy_hits);
    }

    #[test]
    fn test_profile_construction() {
        let profile = PersonaProfile::new(PersonaKind::PowerUser, 6, (1.0, 2.0));
        assert_eq!(profile.kind, PersonaKind::PowerUser);
        assert_eq!(profile.weight, 6);
        assert_eq!(profile.wait_secs, (1.0, 2.0));
    }
}
