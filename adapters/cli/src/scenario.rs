//! TOML scenario files describing the arena, its players and their input.

use std::{
    fs,
    path::{Path, PathBuf},
};

use battle_arena_core::{InputSnapshot, Key, MouseButton, PlayerColor, PlayerId};
use battle_arena_system_unit_control::UnitKind;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use thiserror::Error;

/// Scenario used when no file is supplied on the command line.
pub(crate) const DEFAULT_SCENARIO: &str = include_str!("../scenarios/duel.toml");

const DEFAULT_TICKS: u64 = 600;
const DEFAULT_RANDOM_SEED: u64 = 0x5eed_ba77_1e00_0001;
const RANDOM_HOLD_TICKS: u64 = 15;

/// Reasons a scenario could not be loaded.
#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("scenario declares no players")]
    NoPlayers,
    #[error("player {0} is declared more than once")]
    DuplicatePlayer(u32),
    #[error("arena bounds are empty: min {min:?} must be below max {max:?}")]
    EmptyArena { min: Vec2, max: Vec2 },
    #[error("player {0} spawns outside the arena or inside an obstacle")]
    BlockedSpawn(u32),
    #[error("player {0} has negative speed or damage scale")]
    NegativeScale(u32),
    #[error("input phases of player {0} must start at strictly increasing ticks")]
    UnorderedPhases(u32),
}

/// Complete description of a headless match.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(default = "default_ticks")]
    pub(crate) ticks: u64,
    #[serde(default)]
    pub(crate) arena: ArenaConfig,
    #[serde(default)]
    pub(crate) obstacles: Vec<ObstacleConfig>,
    pub(crate) players: Vec<PlayerConfig>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ArenaConfig {
    pub(crate) min: Vec2,
    pub(crate) max: Vec2,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            min: Vec2::splat(-50.0),
            max: Vec2::splat(50.0),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ObstacleConfig {
    pub(crate) min: Vec2,
    pub(crate) max: Vec2,
}

impl ObstacleConfig {
    fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min.min(self.max)).all() && point.cmple(self.max.max(self.min)).all()
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlayerConfig {
    pub(crate) id: u32,
    pub(crate) color: [u8; 3],
    pub(crate) unit: UnitKind,
    pub(crate) position: Vec2,
    #[serde(default)]
    pub(crate) rotation: f32,
    #[serde(default = "unit_scale")]
    pub(crate) speed_scale: f32,
    #[serde(default = "unit_scale")]
    pub(crate) damage_scale: f32,
    #[serde(default)]
    pub(crate) disconnect_at_tick: Option<u64>,
    #[serde(default)]
    pub(crate) driver: DriverConfig,
}

impl PlayerConfig {
    pub(crate) fn player_id(&self) -> PlayerId {
        PlayerId::new(self.id)
    }

    pub(crate) fn player_color(&self) -> PlayerColor {
        let [red, green, blue] = self.color;
        PlayerColor::from_rgb(red, green, blue)
    }
}

/// How a player's input is produced each tick.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum DriverConfig {
    /// No keys pressed, cursor parked at the origin.
    #[default]
    Idle,
    /// Fixed input phases, each active from its start tick until the next one.
    Scripted { phases: Vec<InputPhase> },
    /// Seeded random input, re-rolled every few ticks.
    Random {
        #[serde(default)]
        seed: Option<u64>,
    },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct InputPhase {
    pub(crate) from_tick: u64,
    #[serde(default)]
    pub(crate) keys: Vec<Key>,
    #[serde(default)]
    pub(crate) mouse_buttons: Vec<MouseButton>,
    #[serde(default)]
    pub(crate) cursor: Vec2,
}

impl InputPhase {
    fn snapshot(&self) -> InputSnapshot {
        let snapshot = self
            .keys
            .iter()
            .fold(InputSnapshot::new(), |snapshot, key| snapshot.with_key(*key));
        self.mouse_buttons
            .iter()
            .fold(snapshot, |snapshot, button| snapshot.with_mouse_button(*button))
            .with_cursor(self.cursor)
    }
}

fn default_ticks() -> u64 {
    DEFAULT_TICKS
}

fn unit_scale() -> f32 {
    1.0
}

impl Scenario {
    /// Reads and validates a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parses and validates scenario contents.
    pub(crate) fn parse(contents: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        if self.players.is_empty() {
            return Err(ScenarioError::NoPlayers);
        }

        let ArenaConfig { min, max } = self.arena;
        if !min.cmplt(max).all() {
            return Err(ScenarioError::EmptyArena { min, max });
        }

        let mut seen: Vec<u32> = Vec::with_capacity(self.players.len());
        for player in &self.players {
            if seen.contains(&player.id) {
                return Err(ScenarioError::DuplicatePlayer(player.id));
            }
            seen.push(player.id);

            let inside = player.position.cmpge(min).all() && player.position.cmple(max).all();
            if !inside
                || self
                    .obstacles
                    .iter()
                    .any(|obstacle| obstacle.contains(player.position))
            {
                return Err(ScenarioError::BlockedSpawn(player.id));
            }

            if player.speed_scale < 0.0 || player.damage_scale < 0.0 {
                return Err(ScenarioError::NegativeScale(player.id));
            }

            if let DriverConfig::Scripted { phases } = &player.driver {
                let ordered = phases
                    .windows(2)
                    .all(|pair| pair[0].from_tick < pair[1].from_tick);
                if !ordered {
                    return Err(ScenarioError::UnorderedPhases(player.id));
                }
            }
        }

        Ok(())
    }
}

/// Runtime input source for a single player.
#[derive(Debug)]
pub(crate) enum InputDriver {
    Idle,
    Scripted { phases: Vec<InputPhase> },
    Random {
        rng: ChaCha8Rng,
        bounds: ArenaConfig,
        current: InputSnapshot,
    },
}

impl InputDriver {
    /// Builds the runtime driver; `fallback_seed` feeds random drivers without their own seed.
    pub(crate) fn from_config(
        config: &DriverConfig,
        bounds: ArenaConfig,
        fallback_seed: u64,
    ) -> Self {
        match config {
            DriverConfig::Idle => Self::Idle,
            DriverConfig::Scripted { phases } => Self::Scripted {
                phases: phases.clone(),
            },
            DriverConfig::Random { seed } => Self::Random {
                rng: ChaCha8Rng::seed_from_u64(seed.unwrap_or(fallback_seed)),
                bounds,
                current: InputSnapshot::new(),
            },
        }
    }

    /// Produces the input snapshot observed during `tick`.
    pub(crate) fn input_for(&mut self, tick: u64) -> InputSnapshot {
        match self {
            Self::Idle => InputSnapshot::new(),
            Self::Scripted { phases } => phases
                .iter()
                .take_while(|phase| phase.from_tick <= tick)
                .last()
                .map_or_else(InputSnapshot::new, InputPhase::snapshot),
            Self::Random {
                rng,
                bounds,
                current,
            } => {
                if tick % RANDOM_HOLD_TICKS == 0 {
                    *current = random_input(rng, *bounds);
                }
                *current
            }
        }
    }
}

/// Seed used for random drivers when neither the scenario nor the command line provides one.
pub(crate) const fn default_random_seed() -> u64 {
    DEFAULT_RANDOM_SEED
}

fn random_input(rng: &mut ChaCha8Rng, bounds: ArenaConfig) -> InputSnapshot {
    let mut input = InputSnapshot::new();
    for key in [Key::W, Key::A, Key::S, Key::D] {
        if rng.gen_bool(0.3) {
            input = input.with_key(key);
        }
    }
    if rng.gen_bool(0.05) {
        input = input.with_key(Key::F);
    }
    if rng.gen_bool(0.4) {
        input = input.with_mouse_button(MouseButton::Left);
    }
    let cursor = Vec2::new(
        rng.gen_range(bounds.min.x..=bounds.max.x),
        rng.gen_range(bounds.min.y..=bounds.max.y),
    );
    input.with_cursor(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_is_valid() {
        let scenario = Scenario::parse(DEFAULT_SCENARIO).expect("built-in scenario parses");

        assert_eq!(scenario.players.len(), 2);
        assert_eq!(scenario.players[0].unit, UnitKind::Kugelpanzer);
        assert_eq!(scenario.players[1].disconnect_at_tick, Some(450));
        assert_eq!(scenario.players[1].damage_scale, 1.5);
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let scenario = Scenario::parse(
            r#"
            [[players]]
            id = 3
            color = [1, 2, 3]
            unit = "kugelpanzer"
            position = [0.0, 0.0]
            "#,
        )
        .expect("minimal scenario parses");

        assert_eq!(scenario.ticks, DEFAULT_TICKS);
        assert_eq!(scenario.arena.max, Vec2::splat(50.0));
        let player = &scenario.players[0];
        assert_eq!(player.speed_scale, 1.0);
        assert!(matches!(player.driver, DriverConfig::Idle));
        assert_eq!(player.player_color(), PlayerColor::from_rgb(1, 2, 3));
    }

    #[test]
    fn duplicate_players_are_rejected() {
        let error = Scenario::parse(
            r#"
            [[players]]
            id = 1
            color = [0, 0, 0]
            unit = "kugelpanzer"
            position = [0.0, 0.0]

            [[players]]
            id = 1
            color = [0, 0, 0]
            unit = "kugelpanzer"
            position = [2.0, 0.0]
            "#,
        )
        .expect_err("duplicate id must be rejected");

        assert!(matches!(error, ScenarioError::DuplicatePlayer(1)));
    }

    #[test]
    fn spawn_inside_obstacle_is_rejected() {
        let error = Scenario::parse(
            r#"
            [[obstacles]]
            min = [-1.0, -1.0]
            max = [1.0, 1.0]

            [[players]]
            id = 1
            color = [0, 0, 0]
            unit = "kugelpanzer"
            position = [0.0, 0.0]
            "#,
        )
        .expect_err("blocked spawn must be rejected");

        assert!(matches!(error, ScenarioError::BlockedSpawn(1)));
    }

    #[test]
    fn unknown_unit_kind_fails_to_parse() {
        let error = Scenario::parse(
            r#"
            [[players]]
            id = 1
            color = [0, 0, 0]
            unit = "zeppelin"
            position = [0.0, 0.0]
            "#,
        )
        .expect_err("unknown unit must be rejected");

        assert!(matches!(error, ScenarioError::Parse(_)));
    }

    #[test]
    fn scripted_driver_holds_each_phase_until_the_next() {
        let scenario = Scenario::parse(DEFAULT_SCENARIO).expect("built-in scenario parses");
        let mut driver = InputDriver::from_config(
            &scenario.players[0].driver,
            scenario.arena,
            default_random_seed(),
        );

        assert!(driver.input_for(0).is_key_down(Key::W));
        assert!(driver.input_for(119).is_key_down(Key::W));
        let turning = driver.input_for(120);
        assert!(turning.is_key_down(Key::A));
        assert!(!turning.is_key_down(Key::W));
        assert!(turning.is_mouse_button_down(MouseButton::Left));
        assert!(driver.input_for(245).is_key_down(Key::F));
    }

    #[test]
    fn random_driver_is_deterministic_per_seed() {
        let bounds = ArenaConfig::default();
        let config = DriverConfig::Random { seed: Some(11) };
        let mut first = InputDriver::from_config(&config, bounds, 0);
        let mut second = InputDriver::from_config(&config, bounds, 0);

        for tick in 0..90 {
            let input = first.input_for(tick);
            assert_eq!(input, second.input_for(tick));
            let cursor = input.cursor_world();
            assert!(cursor.cmpge(bounds.min).all() && cursor.cmple(bounds.max).all());
        }
    }
}
