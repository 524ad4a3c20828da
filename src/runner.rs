//! The run driver.
//!
//! Spawns one tokio task per virtual user. Each task owns its session and
//! its transport (with a private cookie jar), samples its persona kind from
//! the plan's weights, and loops scheduling rounds with sampled wait times
//! until the run deadline or a ctrl-c. On normal completion every user runs
//! its persona teardown; an aborted run may skip teardown, since cleanup is
//! only guaranteed on the normal path.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::LoadConfig;
use crate::error::Result;
use crate::http::HttpTransport;
use crate::identity::IdentityAllocator;
use crate::persona::driver::{DriverSettings, SessionDriver};
use crate::persona::{self, PersonaProfile};
use crate::plan::Plan;
use crate::report::{Reporter, RunSummary};
use crate::session::PersonaSession;
use crate::token::TokenManager;

/// Drives one load test run.
pub struct Runner {
    config: Arc<LoadConfig>,
    plan: Plan,
    allocator: Arc<IdentityAllocator>,
    reporter: Arc<Reporter>,
}

impl Runner {
    pub fn new(config: LoadConfig, plan: Plan) -> Self {
        Self {
            config: Arc::new(config),
            plan,
            allocator: Arc::new(IdentityAllocator::new()),
            reporter: Arc::new(Reporter::new()),
        }
    }

    /// Snapshot of the run outcomes so far.
    pub fn summary(&self) -> RunSummary {
        self.reporter.summary()
    }

    /// Run the plan to completion (deadline or ctrl-c), then tear down.
    pub async fn run(&self) -> Result<()> {
        let users = self.config.run.users;
        let duration = Duration::from_secs(self.config.run.duration_secs);

        info!(
            plan = self.plan.name(),
            users,
            duration_secs = self.config.run.duration_secs,
            target = %self.config.target.base_url,
            create_resources = self.config.features.create_resources,
            "starting load run"
        );

        let settings = Arc::new(DriverSettings::from_config(&self.config));
        let tokens = Arc::new(TokenManager::new(
            self.config.features.token_cookie.clone(),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut spawn_rng = SmallRng::from_entropy();
        let mut handles = Vec::with_capacity(users);

        for _ in 0..users {
            let profile = self.plan.sample_profile(&mut spawn_rng);
            let session =
                PersonaSession::new(profile.kind, self.allocator.next_id(profile.kind));

            // A fresh transport per user keeps cookie state private
            let transport = HttpTransport::new(&self.config)?;

            info!(
                kind = %profile.kind,
                individual = session.individual_id(),
                "spawning virtual user"
            );

            handles.push(tokio::spawn(virtual_user(
                profile,
                session,
                transport,
                Arc::clone(&tokens),
                Arc::clone(&self.reporter),
                Arc::clone(&settings),
                shutdown_rx.clone(),
            )));
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => {
                info!("run deadline reached, stopping virtual users");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping virtual users");
            }
        }

        let _ = shutdown_tx.send(true);
        for handle in handles {
            let _ = handle.await;
        }

        self.reporter.log_summary();
        Ok(())
    }
}

/// One virtual user's lifetime: scheduling rounds with pacing, then
/// best-effort teardown.
async fn virtual_user(
    profile: PersonaProfile,
    mut session: PersonaSession,
    transport: HttpTransport,
    tokens: Arc<TokenManager>,
    reporter: Arc<Reporter>,
    settings: Arc<DriverSettings>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut rng = SmallRng::from_entropy();

    loop {
        if *shutdown.borrow() {
            break;
        }

        {
            let mut driver =
                SessionDriver::new(&transport, &mut session, &tokens, &reporter, &settings);
            persona::run_task(profile.kind, &mut driver, &mut rng).await;
        }

        let wait = rng.gen_range(profile.wait_secs.0..=profile.wait_secs.1);
        debug!(kind = %profile.kind, wait_secs = wait, "pacing");
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs_f64(wait)) => {}
            _ = shutdown.changed() => break,
        }
    }

    let mut driver = SessionDriver::new(&transport, &mut session, &tokens, &reporter, &settings);
    persona::teardown(&mut driver).await;
    debug!(kind = %profile.kind, individual = session.individual_id(), "virtual user stopped");
}
