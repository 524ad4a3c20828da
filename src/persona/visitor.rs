//! Visiting user personas.
//!
//! A casual, non-authenticated user browsing the public pages. The
//! registering variant may additionally sign up one new user account per
//! session lifetime, gated by the resource-mutation switch and its own
//! once-only completion flag.

use rand::Rng;

use super::driver::SessionDriver;
use super::pick_weighted;

/// Public pages and their scheduling weights; the homepage dominates.
pub const PUBLIC_PAGES: &[(&str, u32)] = &[
    ("/home/", 3),
    ("/about/", 1),
    ("/apps/", 1),
    ("/models/", 1),
    ("/docs/", 1),
];

/// Scheduling weight of the registration task relative to the browse tasks.
const REGISTER_WEIGHT: u32 = 1;

/// Run one scheduling round: either browse a public page or, for the
/// registering variant, attempt the one-time account registration.
pub async fn run_once<R: Rng>(driver: &mut SessionDriver<'_>, rng: &mut R, may_register: bool) {
    let register_weight = if may_register { REGISTER_WEIGHT } else { 0 };
    let browse_weight: u32 = PUBLIC_PAGES.iter().map(|(_, weight)| weight).sum();

    if rng.gen_range(0..browse_weight + register_weight) >= browse_weight {
        register_once(driver).await;
        return;
    }

    let page = pick_weighted(rng, PUBLIC_PAGES);
    driver.browse(page).await;
}

/// Register a new user account at most once per session.
///
/// The configuration gate is checked before the once-only flag is claimed,
/// so a run with registration disabled leaves the flag unspent.
pub async fn register_once(driver: &mut SessionDriver<'_>) {
    if !driver.settings().create_resources {
        driver.reporter().record_skip(
            "register new user",
            "resource creation disabled by configuration",
        );
        return;
    }

    if !driver.session().flags_mut().try_begin_registration() {
        tracing::debug!(
            individual = driver.session().individual_id(),
            "registration already attempted, skipping"
        );
        return;
    }

    // The signup form issues the token the submission must echo
    driver.register().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homepage_has_highest_weight() {
        let max = PUBLIC_PAGES.iter().max_by_key(|(_, weight)| weight).unwrap();
        assert_eq!(max.0, "/home/");
    }

    #[test]
    fn test_all_pages_are_relative() {
        for (page, weight) in PUBLIC_PAGES {
            assert!(page.starts_with('/'));
            assert!(page.ends_with('/'));
            assert!(*weight >= 1);
        }
    }

    #[test]
    fn test_signup_page_constant() {
        assert_eq!(super::super::driver::SIGNUP_PAGE, "/signup/");
    }
}
