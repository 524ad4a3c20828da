//! App viewer persona.
//!
//! Opens a hosted user app with a single fire-and-forget GET. The app lives
//! on a per-app subdomain of the configured host, so the target URL is
//! derived by rewriting the host with an environment-specific prefix:
//! development and staging environments carry a dedicated load-test app,
//! production is pointed at a public demo app.

use tracing::{debug, info};

use super::driver::SessionDriver;

/// Which deployment environment a host string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetEnv {
    Development,
    Staging,
    Production,
}

impl TargetEnv {
    /// Classify a host by inspecting its name. Staging hosts nest under the
    /// development domain, so the staging marker wins.
    pub fn detect(host: &str) -> Self {
        if host.contains("staging") {
            TargetEnv::Staging
        } else if host.contains("-dev") {
            TargetEnv::Development
        } else {
            TargetEnv::Production
        }
    }
}

/// Rewrite the configured host into the user-app URL for its environment.
///
/// Example: `https://serve-dev.example` becomes
/// `https://loadtest-shinyproxy.serve-dev.example/app/loadtest-shinyproxy`.
pub fn user_app_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    let (prefix, app) = match TargetEnv::detect(host) {
        TargetEnv::Development | TargetEnv::Staging => ("loadtest-shinyproxy", "loadtest-shinyproxy"),
        TargetEnv::Production => ("adhd-medication-sweden", "adhd-medication-sweden"),
    };
    format!("{}/app/{}", with_subdomain(host, prefix), app)
}

/// Prepend a subdomain label to a URL's host, keeping the scheme.
fn with_subdomain(url: &str, label: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => format!("{}://{}.{}", scheme, label, rest),
        None => format!("{}.{}", label, url),
    }
}

/// Open the user app once. No verification beyond the request completing;
/// response content and timing are the transport's concern.
pub async fn run_once(driver: &mut SessionDriver<'_>) {
    let url = user_app_url(&driver.settings().base_url);
    info!(url = %url, "opening user app");
    debug!(host = %driver.settings().base_url, "rewrote host for user app");
    driver.browse(&url).await;
}
