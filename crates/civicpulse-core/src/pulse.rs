//! Daily civic pulse: one call-to-action picked from whatever is eligible.
//!
//! Eligibility is deterministic. The pick goes through a [`PulseSelector`]
//! so tests can swap the uniform random choice for a fixed one.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::engagement::PermissionTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseKind {
    Quiz,
    Poll,
    Discussion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CivicPulse {
    pub kind: PulseKind,
    pub title: String,
    pub subtitle: String,
    pub action_label: String,
}

/// Picks one entry out of a non-empty eligible set.
pub trait PulseSelector {
    /// Index into `eligible`, or `None` when it is empty.
    fn select(&mut self, eligible: &[CivicPulse]) -> Option<usize>;
}

/// Uniform choice over the eligible set.
pub struct RandomSelector {
    rng: Mcg128Xsl64,
}

impl RandomSelector {
    /// Seeded for reproducible picks, entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self { rng }
    }
}

impl PulseSelector for RandomSelector {
    fn select(&mut self, eligible: &[CivicPulse]) -> Option<usize> {
        if eligible.is_empty() {
            None
        } else {
            Some(self.rng.gen_range(0..eligible.len()))
        }
    }
}

/// Always the first eligible pulse.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstEligible;

impl PulseSelector for FirstEligible {
    fn select(&mut self, eligible: &[CivicPulse]) -> Option<usize> {
        if eligible.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

/// Quiz and poll pulses for the first of each; discussion only at the
/// [`PermissionTier::Discuss`] tier.
pub fn eligible_pulses(catalog: &Catalog, tier: PermissionTier) -> Vec<CivicPulse> {
    let mut pulses = Vec::with_capacity(3);

    if let Some(quiz) = catalog.quizzes.first() {
        pulses.push(CivicPulse {
            kind: PulseKind::Quiz,
            title: "Quick Question".to_string(),
            subtitle: quiz.question.clone(),
            action_label: "Answer".to_string(),
        });
    }

    if let Some(poll) = catalog.polls.first() {
        pulses.push(CivicPulse {
            kind: PulseKind::Poll,
            title: "Cast Your Vote".to_string(),
            subtitle: poll.question.clone(),
            action_label: "Vote".to_string(),
        });
    }

    if tier == PermissionTier::Discuss {
        pulses.push(CivicPulse {
            kind: PulseKind::Discussion,
            title: "Join Discussion".to_string(),
            subtitle: "Share your opinion".to_string(),
            action_label: "Discuss".to_string(),
        });
    }

    pulses
}

pub fn choose_pulse(
    catalog: &Catalog,
    tier: PermissionTier,
    selector: &mut dyn PulseSelector,
) -> Option<CivicPulse> {
    let mut eligible = eligible_pulses(catalog, tier);
    let index = selector.select(&eligible)?;
    if index >= eligible.len() {
        tracing::warn!(index, len = eligible.len(), "pulse selector returned out-of-range index");
        return None;
    }
    Some(eligible.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(usize);

    impl PulseSelector for Fixed {
        fn select(&mut self, _eligible: &[CivicPulse]) -> Option<usize> {
            Some(self.0)
        }
    }

    #[test]
    fn discussion_only_at_discuss_tier() {
        let catalog = Catalog::builtin();
        let kinds = |tier| -> Vec<PulseKind> {
            eligible_pulses(&catalog, tier).iter().map(|p| p.kind).collect()
        };
        assert_eq!(kinds(PermissionTier::Locked), vec![PulseKind::Quiz, PulseKind::Poll]);
        assert_eq!(kinds(PermissionTier::Comment), vec![PulseKind::Quiz, PulseKind::Poll]);
        assert_eq!(
            kinds(PermissionTier::Discuss),
            vec![PulseKind::Quiz, PulseKind::Poll, PulseKind::Discussion]
        );
    }

    #[test]
    fn empty_catalog_yields_nothing_below_discuss() {
        let catalog = Catalog::default();
        assert!(choose_pulse(&catalog, PermissionTier::Comment, &mut RandomSelector::new(Some(1))).is_none());
        let pulse = choose_pulse(&catalog, PermissionTier::Discuss, &mut FirstEligible).unwrap();
        assert_eq!(pulse.kind, PulseKind::Discussion);
    }

    #[test]
    fn first_eligible_is_deterministic() {
        let catalog = Catalog::builtin();
        let pulse = choose_pulse(&catalog, PermissionTier::Discuss, &mut FirstEligible).unwrap();
        assert_eq!(pulse.kind, PulseKind::Quiz);
        assert_eq!(pulse.subtitle, "Who is the head of the Indian State?");
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let catalog = Catalog::builtin();
        let picks = |seed| -> Vec<PulseKind> {
            let mut selector = RandomSelector::new(Some(seed));
            (0..20)
                .map(|_| choose_pulse(&catalog, PermissionTier::Discuss, &mut selector).unwrap().kind)
                .collect()
        };
        assert_eq!(picks(42), picks(42));
    }

    #[test]
    fn random_covers_every_eligible_pulse() {
        let catalog = Catalog::builtin();
        let mut selector = RandomSelector::new(Some(7));
        let mut seen = [false; 3];
        for _ in 0..200 {
            let pulse = choose_pulse(&catalog, PermissionTier::Discuss, &mut selector).unwrap();
            seen[pulse.kind as usize] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let catalog = Catalog::builtin();
        assert!(choose_pulse(&catalog, PermissionTier::Locked, &mut Fixed(5)).is_none());
        let pulse = choose_pulse(&catalog, PermissionTier::Locked, &mut Fixed(1)).unwrap();
        assert_eq!(pulse.kind, PulseKind::Poll);
    }
}
