//! Test plans.
//!
//! A plan is a weighted mix of persona profiles. The weights are declared in
//! code, next to the personas they schedule; the plan name is the only thing
//! configuration selects.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::persona::{pick_weighted, PersonaProfile};
use crate::session::PersonaKind;

/// A named, weighted mix of persona profiles.
#[derive(Debug, Clone)]
pub struct Plan {
    name: &'static str,
    profiles: Vec<PersonaProfile>,
}

impl Plan {
    /// Classroom load: a burst of power users working concurrently, with a
    /// sprinkling of visitors, app viewers and API clients.
    pub fn classroom() -> Self {
        Self {
            name: "classroom",
            profiles: vec![
                PersonaProfile::new(PersonaKind::RegisteringVisitor, 2, (2.0, 3.0)),
                PersonaProfile::new(PersonaKind::PowerUser, 6, (1.0, 2.0)),
                PersonaProfile::new(PersonaKind::AppViewer, 1, (4.0, 8.0)),
                PersonaProfile::new(PersonaKind::ApiClient, 1, (0.5, 2.0)),
            ],
        }
    }

    /// Normal load: mostly browsing visitors, the occasional power user.
    pub fn normal() -> Self {
        Self {
            name: "normal",
            profiles: vec![
                PersonaProfile::new(PersonaKind::RegisteringVisitor, 6, (2.0, 3.0)),
                PersonaProfile::new(PersonaKind::PowerUser, 1, (1.0, 2.0)),
                PersonaProfile::new(PersonaKind::AppViewer, 2, (4.0, 8.0)),
                PersonaProfile::new(PersonaKind::ApiClient, 1, (0.5, 2.0)),
            ],
        }
    }

    /// Setup verification: a single plain visitor hitting the homepage,
    /// used to confirm the tool and host are wired up before a real run.
    pub fn verify() -> Self {
        Self {
            name: "verify",
            profiles: vec![PersonaProfile::new(PersonaKind::Visitor, 1, (1.0, 2.0))],
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn profiles(&self) -> &[PersonaProfile] {
        &self.profiles
    }

    /// Sample a persona profile according to the plan's weights.
    pub fn sample_profile<R: Rng>(&self, rng: &mut R) -> PersonaProfile {
        let weighted: Vec<(PersonaProfile, u32)> = self
            .profiles
            .iter()
            .map(|profile| (*profile, profile.weight))
            .collect();
        *pick_weighted(rng, &weighted)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classroom" => Ok(Plan::classroom()),
            "normal" => Ok(Plan::normal()),
            "verify" => Ok(Plan::verify()),
            _ => Err(format!(
                "Unknown plan '{}'. Valid: classroom, normal, verify",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_plan_lookup() {
        assert_eq!("classroom".parse::<Plan>().unwrap().name(), "classroom");
        assert_eq!("NORMAL".parse::<Plan>().unwrap().name(), "normal");
        assert_eq!("verify".parse::<Plan>().unwrap().name(), "verify");
        assert!("rush-hour".parse::<Plan>().is_err());
    }

    #[test]
    fn test_classroom_weights() {
        let plan = Plan::classroom();
        let power = plan
            .profiles()
            .iter()
            .find(|p| p.kind == PersonaKind::PowerUser)
            .unwrap();
        assert_eq!(power.weight, 6);
    }

    #[test]
    fn test_normal_favors_visitors() {
        let plan = Plan::normal();
        let visitor = plan
            .profiles()
            .iter()
            .find(|p| p.kind == PersonaKind::RegisteringVisitor)
            .unwrap();
        let power = plan
            .profiles()
            .iter()
            .find(|p| p.kind == PersonaKind::PowerUser)
            .unwrap();
        assert!(visitor.weight > power.weight);
    }

    #[test]
    fn test_verify_is_single_visitor() {
        let plan = Plan::verify();
        assert_eq!(plan.profiles().len(), 1);
        assert_eq!(plan.profiles()[0].kind, PersonaKind::Visitor);
    }

    #[test]
    fn test_sampling_follows_weights() {
        let plan = Plan::classroom();
        let mut rng = SmallRng::seed_from_u64(11);
        let power_hits = (0..1000)
            .filter(|_| plan.sample_profile(&mut rng).kind == PersonaKind::PowerUser)
            .count();
        // Weight 6 of 10 total
        assert!(power_hits > 450, "power user sampled only {} times", power_hits);
    }
}
