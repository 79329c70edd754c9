//! Voting strategies for simulated participants.

use clap::ValueEnum;
use rand::seq::SliceRandom;
use rand::Rng;
use silent_island_core::rules::ChoiceCategory;
use silent_island_core::ChoiceOption;

/// How simulated participants vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Any enabled choice; abilities fire now and then.
    Random,
    /// Comply where possible.
    Comply,
    /// Resist where allowed.
    Resist,
    /// Always evade.
    Evade,
}

impl Strategy {
    /// Picks a choice key among the enabled options.
    ///
    /// Falls back to the evade choice when the preferred category is absent
    /// or disabled.
    pub fn pick<R: Rng + ?Sized>(
        self,
        choices: &[ChoiceOption],
        rng: &mut R,
    ) -> Option<&'static str> {
        let enabled: Vec<&ChoiceOption> = choices.iter().filter(|c| !c.disabled).collect();
        let preferred = match self {
            Self::Random => return enabled.choose(rng).map(|c| c.key),
            Self::Comply => ChoiceCategory::Comply,
            Self::Resist => ChoiceCategory::Resist,
            Self::Evade => ChoiceCategory::Evade,
        };
        enabled
            .iter()
            .find(|c| c.category == preferred)
            .or_else(|| enabled.iter().find(|c| c.category == ChoiceCategory::Evade))
            .map(|c| c.key)
    }

    /// True if participants spend their abilities.
    pub fn uses_abilities(self) -> bool {
        self == Self::Random
    }
}
