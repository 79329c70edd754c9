//! Ending classification.
//!
//! Pure functions of the final metrics and participant flags.

use serde::{Deserialize, Serialize};

use crate::metrics::GlobalMetrics;
use crate::participant::{Participant, ParticipantFlags, ParticipantId, Role};

/// How the island ends.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialEnding {
    /// Total silence.
    Collapse,
    /// A brief spring.
    Spring,
    /// Calm on the surface.
    Facade,
    /// Strained but standing.
    Tension,
    /// Light through the cracks.
    Crack,
}

/// How one participant's story ends.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalEnding {
    /// Removed during the game.
    TakenAway,
    /// Signed the declaration.
    MoralCollapse,
    /// Informed or reported.
    MoralCost,
    /// Low risk and never complied.
    Survivor,
    /// Everyone else.
    Ordinary,
}

/// Reference point for the fallback classification.
struct Anchor {
    ending: SocialEnding,
    pressure: f64,
    /// `None` measures pressure distance only.
    circulation: Option<f64>,
}

/// Fallback anchors. Ties resolve to the earlier entry.
const ANCHORS: [Anchor; 5] = [
    Anchor {
        ending: SocialEnding::Collapse,
        pressure: 6.0,
        circulation: None,
    },
    Anchor {
        ending: SocialEnding::Facade,
        pressure: 5.0,
        circulation: Some(0.5),
    },
    Anchor {
        ending: SocialEnding::Tension,
        pressure: 5.0,
        circulation: Some(2.5),
    },
    Anchor {
        ending: SocialEnding::Spring,
        pressure: 0.0,
        circulation: Some(4.0),
    },
    Anchor {
        ending: SocialEnding::Crack,
        pressure: 1.0,
        circulation: Some(3.0),
    },
];

/// Classifies the final metrics. Total: every input yields exactly one ending.
#[must_use]
pub fn classify_social(metrics: GlobalMetrics) -> SocialEnding {
    let GlobalMetrics {
        pressure: p,
        circulation: c,
    } = metrics;

    if p >= 6 {
        SocialEnding::Collapse
    } else if p == 0 && c >= 4 {
        SocialEnding::Spring
    } else if p >= 4 && c <= 1 {
        SocialEnding::Facade
    } else if p >= 4 && (2..=3).contains(&c) {
        SocialEnding::Tension
    } else if p <= 2 && c >= 2 {
        SocialEnding::Crack
    } else {
        nearest_anchor(metrics)
    }
}

fn nearest_anchor(metrics: GlobalMetrics) -> SocialEnding {
    let p = f64::from(metrics.pressure);
    let c = f64::from(metrics.circulation);

    let mut best = SocialEnding::Facade;
    let mut best_distance = f64::INFINITY;
    for anchor in &ANCHORS {
        let distance = match anchor.circulation {
            None => (p - anchor.pressure).abs(),
            Some(ac) => (p - anchor.pressure).hypot(c - ac),
        };
        if distance < best_distance {
            best_distance = distance;
            best = anchor.ending;
        }
    }
    best
}

/// Classifies one participant.
#[must_use]
pub fn classify_personal(participant: &Participant) -> PersonalEnding {
    let flags = participant.flags();
    if participant.is_removed() {
        PersonalEnding::TakenAway
    } else if flags.contains(ParticipantFlags::MORAL_COLLAPSE) {
        PersonalEnding::MoralCollapse
    } else if flags.contains(ParticipantFlags::MORAL_COST) {
        PersonalEnding::MoralCost
    } else if participant.risk() <= 2 && !flags.contains(ParticipantFlags::EVER_COMPLIED) {
        PersonalEnding::Survivor
    } else {
        PersonalEnding::Ordinary
    }
}

/// Ending of one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonalOutcome {
    /// Participant.
    pub participant: ParticipantId,
    /// Display name.
    pub name: String,
    /// Role, if dealt.
    pub role: Option<Role>,
    /// Final risk.
    pub risk: u32,
    /// Ending.
    pub ending: PersonalEnding,
}

/// Result of the ending resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndingResult {
    /// Social ending.
    pub social: SocialEnding,
    /// Final metrics.
    pub metrics: GlobalMetrics,
    /// Personal endings in join order.
    pub personal: Vec<PersonalOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn social(p: u32, c: u32) -> SocialEnding {
        classify_social(GlobalMetrics::new(p, c))
    }

    #[test]
    fn predicates_in_priority_order() {
        assert_eq!(social(6, 0), SocialEnding::Collapse);
        assert_eq!(social(9, 9), SocialEnding::Collapse);
        assert_eq!(social(0, 4), SocialEnding::Spring);
        assert_eq!(social(4, 1), SocialEnding::Facade);
        assert_eq!(social(5, 3), SocialEnding::Tension);
        assert_eq!(social(2, 2), SocialEnding::Crack);
        // Spring wins over crack for pressure 0.
        assert_eq!(social(0, 5), SocialEnding::Spring);
    }

    #[test]
    fn fallback_uses_nearest_anchor() {
        // (0, 0): facade 5.02, tension 5.59, spring 4.0, crack 3.16
        assert_eq!(social(0, 0), SocialEnding::Crack);
        // (3, 0): collapse 3, facade 2.06
        assert_eq!(social(3, 0), SocialEnding::Facade);
        // (3, 3): collapse 3, facade 3.20, tension 2.06, crack 2.0
        assert_eq!(social(3, 3), SocialEnding::Crack);
        // (4, 5): tension 2.69, collapse 2.0
        assert_eq!(social(4, 5), SocialEnding::Collapse);
    }

    #[test]
    fn personal_chain() {
        let id = ParticipantId::new(1);

        let mut p = Participant::new(id, "A");
        assert_eq!(classify_personal(&p), PersonalEnding::Survivor);

        p.mark(ParticipantFlags::EVER_COMPLIED);
        assert_eq!(classify_personal(&p), PersonalEnding::Ordinary);

        p.mark(ParticipantFlags::MORAL_COST);
        assert_eq!(classify_personal(&p), PersonalEnding::MoralCost);

        p.mark(ParticipantFlags::MORAL_COLLAPSE);
        assert_eq!(classify_personal(&p), PersonalEnding::MoralCollapse);

        p.apply_risk(10);
        p.check_removal(10);
        p.apply_risk(-10);
        assert_eq!(classify_personal(&p), PersonalEnding::TakenAway);
    }

    #[test]
    fn survivor_needs_low_risk() {
        let mut p = Participant::new(ParticipantId::new(1), "A");
        p.apply_risk(3);
        assert_eq!(classify_personal(&p), PersonalEnding::Ordinary);
    }
}
