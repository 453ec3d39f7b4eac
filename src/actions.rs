//! Character actions the player can order outside the turn loop.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    components::{Character, Role},
    dialogue::ConversationEngine,
    rng::RandomSource,
    world::Civilization,
};

/// Charm below this cannot attempt a speech at all.
const SPEECH_CHARM_FLOOR: i32 = -30;
const SPEECH_SUCCESS: i32 = 80;
const SPEECH_BASE: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Political,
    Military,
    Economic,
    Personal,
    Psychic,
    IntelOps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterAction {
    pub id: String,
    pub name: String,
    pub category: ActionCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub viceroy_valid: bool,
    #[serde(default)]
    pub system_governor_valid: bool,
    #[serde(default)]
    pub province_governor_valid: bool,
    #[serde(default)]
    pub prime_valid: bool,
    #[serde(default)]
    pub inquisitor_valid: bool,
    /// Overrides every other rule.
    #[serde(default)]
    pub all_valid: bool,
    /// The target must be on the same planet as the civilization's leader.
    #[serde(default)]
    pub emperor_near_valid: bool,
    #[serde(default)]
    pub emperor_action: bool,
}

impl CharacterAction {
    pub fn praising_speech() -> Self {
        Self {
            id: "A1".into(),
            name: "Give Praising Speech".into(),
            category: ActionCategory::Political,
            description: "Publicly praise the character to win their trust.".into(),
            viceroy_valid: true,
            system_governor_valid: true,
            province_governor_valid: true,
            prime_valid: true,
            inquisitor_valid: true,
            all_valid: false,
            emperor_near_valid: true,
            emperor_action: false,
        }
    }

    pub fn is_valid_for(&self, character: &Character, civ: &Civilization) -> bool {
        if self.all_valid {
            return true;
        }
        let role_allowed = match character.role {
            Role::Emperor => self.emperor_action,
            Role::Viceroy => self.viceroy_valid,
            Role::SystemGovernor => self.system_governor_valid,
            Role::ProvinceGovernor => self.province_governor_valid,
            Role::DomesticPrime => self.prime_valid,
            Role::Inquisitor => self.inquisitor_valid,
            Role::None => true,
        };
        if !role_allowed {
            return false;
        }
        if self.emperor_near_valid {
            return civ
                .leader
                .as_ref()
                .is_some_and(|leader| leader.planet == character.planet);
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOutcome {
    pub effectiveness: i32,
    pub successful: bool,
    pub response: String,
}

/// The emperor praises `target`. Effectiveness is a charm draw plus an
/// intelligence draw and doubles as the response index for the reply.
pub fn give_praising_speech(
    emperor: &Character,
    target: &Character,
    action: &CharacterAction,
    dialogue: &ConversationEngine,
    rng: &mut dyn RandomSource,
) -> SpeechOutcome {
    let effectiveness = if emperor.charm >= SPEECH_CHARM_FLOOR {
        rng.range(SPEECH_BASE, emperor.charm) + rng.range(0, emperor.intelligence)
    } else {
        0
    };
    let successful = effectiveness > SPEECH_SUCCESS;
    info!(
        emperor = %emperor.name,
        target = %target.name,
        effectiveness,
        successful,
        "praising speech given"
    );
    let response = dialogue.generate_response(target, action, f64::from(effectiveness), false);
    SpeechOutcome {
        effectiveness,
        successful,
        response,
    }
}
