//! API client persona.
//!
//! A client system issuing read-only calls against the public API. No
//! token, no authentication, no state beyond "ready"; the public-apps
//! listing is hit more often than the informational endpoints.

use rand::Rng;

use super::driver::SessionDriver;
use super::pick_weighted;

/// Read-only API endpoints and their scheduling weights.
pub const API_ENDPOINTS: &[(&str, u32)] = &[
    ("/openapi/v1/api-info", 1),
    ("/openapi/v1/system-version", 1),
    ("/openapi/v1/public-apps", 3),
];

/// Run one scheduling round: GET one weighted endpoint.
pub async fn run_once<R: Rng>(driver: &mut SessionDriver<'_>, rng: &mut R) {
    let endpoint = pick_weighted(rng, API_ENDPOINTS);
    driver.browse(endpoint).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_apps_dominates() {
        let max = API_ENDPOINTS.iter().max_by_key(|(_, weight)| weight).unwrap();
        assert_eq!(max.0, "/openapi/v1/public-apps");
    }

    #[test]
    fn test_endpoints_are_versioned() {
        for (endpoint, _) in API_ENDPOINTS {
            assert!(endpoint.starts_with("/openapi/v1/"));
        }
    }
}
