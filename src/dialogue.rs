//! Template-driven character dialogue.

use std::{fs, path::Path};

use tracing::{debug, warn};

use crate::{actions::CharacterAction, components::Character, rng::RandomSource, world::World};

pub const GREETING_FILE: &str = "IntroGreetingSentences.txt";
pub const GENERIC_FILE: &str = "IntroGenericSentences.txt";
pub const NO_DIALOGUE: &str = "No applicable string found.";

const COLORS: [&str; 5] = ["Blue", "Green", "Orange", "Yellow", "White"];
const POSITIVE_ADJECTIVES: [&str; 3] = ["awesome", "amazing", "wonderful"];
const NEGATIVE_ADJECTIVES: [&str; 3] = ["terrible", "horrible", "awful"];
const SPORTS_TEAMS: [&str; 4] = ["Bombers", "Crushers", "Demolishers", "Devestators"];

/// Upper bound (exclusive) on generic sentences following the greeting.
const SENTENCE_MAX: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseTone {
    Affirmative,
    Undecided,
    Decline,
    Positive,
    Neutral,
    Negative,
}

impl ResponseTone {
    pub fn classify(response_index: f64, requires_decision: bool) -> Self {
        match (requires_decision, response_index) {
            (true, index) if index > 65.0 => ResponseTone::Affirmative,
            (true, index) if index > 35.0 => ResponseTone::Undecided,
            (true, _) => ResponseTone::Decline,
            (false, index) if index > 65.0 => ResponseTone::Positive,
            (false, index) if index > 35.0 => ResponseTone::Neutral,
            (false, _) => ResponseTone::Negative,
        }
    }

    pub fn line(self) -> &'static str {
        match self {
            ResponseTone::Affirmative => "I will do that, Your Excellence.",
            ResponseTone::Undecided => "I can't decide at this time, Your Excellence.",
            ResponseTone::Decline => "I refuse to do that, Your Excellence.",
            ResponseTone::Positive => "That sounds great, Your Excellence.",
            ResponseTone::Neutral => "I guess that sounds OK, Your Excellence.",
            ResponseTone::Negative => "That is outrageous, Your Excellence!",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationEngine {
    greetings: Vec<String>,
    generic: Vec<String>,
}

fn read_sentences(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(contents) => contents
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not read sentence templates");
            Vec::new()
        }
    }
}

impl ConversationEngine {
    /// Reads both template files from `dir`. A file that cannot be read is
    /// logged and leaves its list empty.
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            greetings: read_sentences(&dir.join(GREETING_FILE)),
            generic: read_sentences(&dir.join(GENERIC_FILE)),
        }
    }

    pub fn with_templates(greetings: Vec<String>, generic: Vec<String>) -> Self {
        Self { greetings, generic }
    }

    pub fn greetings(&self) -> &[String] {
        &self.greetings
    }

    pub fn generic(&self) -> &[String] {
        &self.generic
    }

    pub fn generate_response(
        &self,
        character: &Character,
        action: &CharacterAction,
        response_index: f64,
        requires_decision: bool,
    ) -> String {
        let tone = ResponseTone::classify(response_index, requires_decision);
        debug!(speaker = %character.name, action = %action.name, response_index, ?tone, "response chosen");
        tone.line().to_string()
    }

    /// A greeting followed by one or two distinct generic sentences, with
    /// placeholders filled in for `speaker`.
    pub fn initial_dialogue(
        &self,
        speaker: &Character,
        world: &World,
        rng: &mut dyn RandomSource,
    ) -> String {
        let Some(greeting) = rng.pick(self.greetings.len()).map(|i| &self.greetings[i]) else {
            return NO_DIALOGUE.to_string();
        };
        let mut sentences = vec![self.fill(greeting, speaker, world, rng)];

        let count = rng.range(1, SENTENCE_MAX) as usize;
        let mut pool: Vec<usize> = (0..self.generic.len()).collect();
        for _ in 0..count {
            let Some(slot) = rng.pick(pool.len()) else {
                return NO_DIALOGUE.to_string();
            };
            let choice = pool.swap_remove(slot);
            sentences.push(self.fill(&self.generic[choice], speaker, world, rng));
        }
        sentences.join(" ")
    }

    fn fill(
        &self,
        template: &str,
        speaker: &Character,
        world: &World,
        rng: &mut dyn RandomSource,
    ) -> String {
        let mut text = template.to_string();

        if text.contains("[EMPEROR]") {
            let civ = speaker
                .planet
                .and_then(|id| world.planet(id))
                .and_then(|planet| planet.owner)
                .and_then(|owner| world.civilization(owner))
                .or_else(|| world.player());
            let emperor = civ
                .and_then(|civ| civ.leader.as_ref())
                .map(|leader| format!("Emperor {}", leader.name))
                .unwrap_or_else(|| "the Emperor".to_string());
            text = text.replace("[EMPEROR]", &emperor);
        }
        if text.contains("[PLANET]") {
            let planet = speaker
                .planet
                .and_then(|id| world.planet(id))
                .map(|planet| planet.name.as_str())
                .unwrap_or("this world");
            text = text.replace("[PLANET]", planet);
        }
        if text.contains("[HOUSE]") {
            let house = speaker.house.as_deref().unwrap_or("my house");
            text = text.replace("[HOUSE]", house);
        }

        if text.contains("[SPORTSTEAM]") {
            text = text.replace("[SPORTSTEAM]", pick_word(&SPORTS_TEAMS, rng));
            let mut won = false;
            if text.contains("[SPORTSRESULT]") {
                let roll = rng.range(0, 100);
                let result = match roll {
                    r if r < 40 => "WON",
                    r if r < 80 => "LOST",
                    _ => "TIED",
                };
                won = result == "WON";
                text = text.replace("[SPORTSRESULT]", result);
            }
            if text.contains("[ADJECTIVE]") {
                let words: &[&str] = if won {
                    &POSITIVE_ADJECTIVES
                } else {
                    &NEGATIVE_ADJECTIVES
                };
                text = text.replace("[ADJECTIVE]", pick_word(words, rng));
            }
        }

        if text.contains("[ADJECTIVE]") {
            let words: &[&str] = if rng.range(0, 100) > 50 {
                &NEGATIVE_ADJECTIVES
            } else {
                &POSITIVE_ADJECTIVES
            };
            text = text.replace("[ADJECTIVE]", pick_word(words, rng));
        }
        if text.contains("[COLOR]") {
            text = text.replace("[COLOR]", pick_word(&COLORS, rng));
        }
        text
    }
}

fn pick_word(words: &[&'static str], rng: &mut dyn RandomSource) -> &'static str {
    rng.pick(words.len()).map(|i| words[i]).unwrap_or_default()
}
