//! Power user persona.
//!
//! An authenticated user that logs in with a pre-provisioned test account,
//! browses the documentation, and, when resource mutation is enabled,
//! creates a project, opens it, creates an app inside it, and tears the
//! project down again. The whole workflow runs at most once per session
//! lifetime regardless of how often the scheduler invokes it; logout runs
//! whenever the session managed to authenticate.

use tracing::{debug, info};

use super::driver::{SessionDriver, LOGIN_PAGE};

/// Run the main power-user workflow once; later invocations are no-ops.
pub async fn run_once(driver: &mut SessionDriver<'_>) {
    if !driver.session().flags_mut().try_begin_workflow() {
        debug!(
            individual = driver.session().individual_id(),
            "power user workflow already run, skipping"
        );
        return;
    }

    info!(
        individual = driver.session().individual_id(),
        "executing power user workflow"
    );

    // Warm up on the home page
    driver.browse("/home/").await;

    // The login form issues the token the credential submission must echo
    if driver.acquire_token(LOGIN_PAGE).await {
        driver.login().await;
    }

    if !driver.session().authenticated() {
        info!("not authenticated after login step, ending workflow");
        driver.logout().await;
        driver.session().mark_terminal();
        return;
    }

    driver.browse("/docs/").await;

    if driver.settings().create_resources {
        // Each step guards on its predecessor's outcome: a failed create
        // leaves nothing to open or delete, and the chain falls through to
        // logout.
        if driver.create_project().await {
            driver.open_project().await;
            driver.create_app().await;
            driver.delete_project().await;
        }
    } else {
        driver.reporter().record_skip(
            "create and delete project",
            "resource creation disabled by configuration",
        );
    }

    driver.logout().await;
    driver.session().mark_terminal();
}
