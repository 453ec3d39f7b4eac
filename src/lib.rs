pub mod actions;
pub mod components;
pub mod config;
pub mod dialogue;
pub mod economy;
pub mod engine;
pub mod events;
pub mod rng;
pub mod scenario;
pub mod systems;
pub mod trade;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, TurnSummary};
pub use scenario::{Scenario, ScenarioLoader};
pub use world::World;
