#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the battle arena simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and unit controllers. Controllers read the world
//! through the immutable [`GameView`] trait and answer exclusively with
//! [`Command`] values describing the mutations they would like to see. The
//! world executes those commands via its `apply` entry point and broadcasts
//! [`Event`] values describing what actually happened.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Number of simulation ticks executed per simulated second.
pub const TICKS_PER_SECOND: u32 = 60;

/// Duration of a single simulation tick measured in seconds.
pub const SECONDS_PER_TICK: f32 = 1.0 / TICKS_PER_SECOND as f32;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by a single tick.
    Tick,
    /// Registers a player session with the world.
    ConnectPlayer {
        /// Identifier of the player joining the arena.
        player: PlayerId,
        /// Tint applied to every unit owned by the player.
        color: PlayerColor,
    },
    /// Removes a player session; units owned by the player stay in the arena.
    DisconnectPlayer {
        /// Identifier of the player leaving the arena.
        player: PlayerId,
    },
    /// Replaces the input snapshot captured for a player.
    SetPlayerInput {
        /// Identifier of the player whose input changed.
        player: PlayerId,
        /// Snapshot that controllers observe until the next replacement.
        input: InputSnapshot,
    },
    /// Requests that the world create a new unit owned by a player.
    SpawnUnit {
        /// Player that owns the unit.
        player: PlayerId,
        /// Initial world position of the unit.
        position: Vec2,
        /// Initial hull rotation in radians.
        rotation: f32,
    },
    /// Requests removal of a unit from the arena.
    DespawnUnit {
        /// Identifier of the unit to remove.
        unit: UnitId,
    },
    /// Replaces the runtime modifiers applied to a unit.
    SetUnitModifiers {
        /// Identifier of the unit receiving the modifiers.
        unit: UnitId,
        /// Multiplier applied to movement and rotation speed.
        speed_scale: f32,
        /// Multiplier applied to damage carried by the unit's projectiles.
        damage_scale: f32,
    },
    /// Proposes a new world position for a unit.
    MoveUnit {
        /// Identifier of the unit attempting to move.
        unit: UnitId,
        /// Proposed world position.
        position: Vec2,
    },
    /// Proposes a new hull rotation for a unit.
    RotateUnit {
        /// Identifier of the unit attempting to rotate.
        unit: UnitId,
        /// Proposed hull rotation in radians.
        rotation: f32,
    },
    /// Requests that the world instantiate a moving projectile.
    SpawnProjectile {
        /// Unit credited with firing the projectile.
        owner: UnitId,
        /// Kind of projectile to instantiate.
        kind: ProjectileKind,
        /// Spawn position in world units.
        position: Vec2,
        /// Heading of the projectile in radians.
        heading: f32,
        /// Damage multiplier inherited from the firing unit.
        damage_scale: f32,
        /// Velocity in world units per second.
        velocity: Vec2,
    },
    /// Reports that a projectile struck a unit and must be removed.
    ResolveProjectileHit {
        /// Projectile that struck the unit.
        projectile: ProjectileId,
        /// Unit that was struck.
        target: UnitId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Index of the tick that just completed.
        tick: u64,
    },
    /// Confirms that a player session was registered.
    PlayerConnected {
        /// Identifier of the player that joined.
        player: PlayerId,
    },
    /// Confirms that a player session was removed.
    PlayerDisconnected {
        /// Identifier of the player that left.
        player: PlayerId,
    },
    /// Confirms that a unit entered the arena.
    UnitSpawned {
        /// Identifier allocated to the unit by the world.
        unit: UnitId,
        /// Player owning the unit.
        player: PlayerId,
        /// Position the unit occupies after spawning.
        position: Vec2,
    },
    /// Confirms that a unit left the arena.
    UnitDespawned {
        /// Identifier of the removed unit.
        unit: UnitId,
    },
    /// Confirms that a move proposal was accepted.
    UnitMoved {
        /// Identifier of the unit that moved.
        unit: UnitId,
        /// Position before the move.
        from: Vec2,
        /// Position after the move.
        to: Vec2,
    },
    /// Confirms that a rotation proposal was accepted.
    UnitRotated {
        /// Identifier of the unit that rotated.
        unit: UnitId,
        /// Hull rotation after the change, in radians.
        rotation: f32,
    },
    /// Reports that a move proposal was refused during arbitration.
    MoveRejected {
        /// Identifier of the unit named in the proposal.
        unit: UnitId,
        /// Specific reason the move was refused.
        reason: MoveRejection,
    },
    /// Confirms that a projectile was instantiated.
    ProjectileSpawned {
        /// Identifier allocated to the projectile.
        projectile: ProjectileId,
        /// Unit credited with firing it.
        owner: UnitId,
    },
    /// Reports that a projectile ran out of lifetime or hit an obstacle.
    ProjectileExpired {
        /// Identifier of the removed projectile.
        projectile: ProjectileId,
    },
    /// Reports that a projectile struck a unit.
    ProjectileHit {
        /// Identifier of the removed projectile.
        projectile: ProjectileId,
        /// Unit credited with firing it.
        owner: UnitId,
        /// Unit that was struck.
        target: UnitId,
        /// Damage multiplier carried by the projectile.
        damage_scale: f32,
    },
}

/// Reasons the world may refuse a move proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRejection {
    /// The proposed position lies inside an obstacle or outside the arena.
    Blocked,
    /// No unit with the provided identifier exists.
    MissingUnit,
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a player session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Kinds of projectiles the world knows how to instantiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Plain ballistic shell.
    CannonBall,
}

/// Keyboard keys observed by unit controllers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Drive forward.
    W,
    /// Turn counter-clockwise.
    A,
    /// Drive backward.
    S,
    /// Turn clockwise.
    D,
    /// Secondary fire.
    F,
}

const KEY_COUNT: usize = 5;

impl Key {
    const fn index(self) -> usize {
        match self {
            Key::W => 0,
            Key::A => 1,
            Key::S => 2,
            Key::D => 3,
            Key::F => 4,
        }
    }
}

/// Mouse buttons observed by unit controllers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Wheel button.
    Middle,
}

const MOUSE_BUTTON_COUNT: usize = 3;

impl MouseButton {
    const fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
        }
    }
}

/// Per-tick immutable record of a player's keyboard and mouse state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    keys_down: [bool; KEY_COUNT],
    mouse_buttons_down: [bool; MOUSE_BUTTON_COUNT],
    cursor_world: Vec2,
}

impl InputSnapshot {
    /// Creates a snapshot with no keys or buttons pressed and the cursor at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the snapshot with the provided key held down.
    #[must_use]
    pub fn with_key(mut self, key: Key) -> Self {
        self.keys_down[key.index()] = true;
        self
    }

    /// Returns a copy of the snapshot with the provided mouse button held down.
    #[must_use]
    pub fn with_mouse_button(mut self, button: MouseButton) -> Self {
        self.mouse_buttons_down[button.index()] = true;
        self
    }

    /// Returns a copy of the snapshot with the cursor placed at a world position.
    #[must_use]
    pub fn with_cursor(mut self, cursor_world: Vec2) -> Self {
        self.cursor_world = cursor_world;
        self
    }

    /// Reports whether the key is held down.
    #[must_use]
    pub const fn is_key_down(&self, key: Key) -> bool {
        self.keys_down[key.index()]
    }

    /// Reports whether the mouse button is held down.
    #[must_use]
    pub const fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down[button.index()]
    }

    /// Cursor position expressed in world units.
    #[must_use]
    pub const fn cursor_world(&self) -> Vec2 {
        self.cursor_world
    }
}

/// Tint assigned to a player's units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl PlayerColor {
    /// Creates a new player color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Immutable representation of a single unit's canonical state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Identifier allocated to the unit by the world.
    pub id: UnitId,
    /// Player owning the unit.
    pub player: PlayerId,
    /// World position of the unit.
    pub position: Vec2,
    /// Hull rotation in radians.
    pub rotation: f32,
    /// Multiplier applied to movement and rotation speed.
    pub speed_scale: f32,
    /// Multiplier applied to projectile damage.
    pub damage_scale: f32,
}

/// Immutable representation of a single projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile by the world.
    pub id: ProjectileId,
    /// Unit credited with firing the projectile.
    pub owner: UnitId,
    /// Kind of projectile.
    pub kind: ProjectileKind,
    /// Current world position.
    pub position: Vec2,
    /// Heading in radians.
    pub heading: f32,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Damage multiplier carried by the projectile.
    pub damage_scale: f32,
    /// Ticks left before the projectile expires.
    pub remaining_ticks: u32,
}

/// Read-only access to the world consumed by unit controllers.
///
/// Implementors never expose mutable state; controllers respond to what they
/// observe by pushing [`Command`] values for the world to arbitrate.
pub trait GameView {
    /// Canonical snapshot of a unit, or `None` once it left the arena.
    fn unit(&self, unit: UnitId) -> Option<UnitSnapshot>;

    /// Current input of a connected player, or `None` when the player is absent.
    fn player_input(&self, player: PlayerId) -> Option<&InputSnapshot>;

    /// Tint of a connected player, or `None` when the player is absent.
    fn player_color(&self, player: PlayerId) -> Option<PlayerColor>;

    /// Reports whether a unit placed at the position would overlap an obstacle.
    fn is_blocked_by_obstacles(&self, position: Vec2) -> bool;
}

#[cfg(test)]
mod tests {
    use super::{InputSnapshot, Key, MouseButton, MoveRejection, PlayerId, ProjectileKind, UnitId};
    use glam::Vec2;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn default_snapshot_reports_nothing_pressed() {
        let input = InputSnapshot::new();
        for key in [Key::W, Key::A, Key::S, Key::D, Key::F] {
            assert!(!input.is_key_down(key));
        }
        assert!(!input.is_mouse_button_down(MouseButton::Left));
        assert_eq!(input.cursor_world(), Vec2::ZERO);
    }

    #[test]
    fn builder_sets_only_requested_inputs() {
        let input = InputSnapshot::new()
            .with_key(Key::W)
            .with_mouse_button(MouseButton::Left)
            .with_cursor(Vec2::new(3.0, -2.0));

        assert!(input.is_key_down(Key::W));
        assert!(!input.is_key_down(Key::S));
        assert!(input.is_mouse_button_down(MouseButton::Left));
        assert!(!input.is_mouse_button_down(MouseButton::Right));
        assert_eq!(input.cursor_world(), Vec2::new(3.0, -2.0));
    }

    #[test]
    fn input_snapshot_round_trips_through_bincode() {
        let input = InputSnapshot::new()
            .with_key(Key::F)
            .with_cursor(Vec2::new(1.5, 2.5));
        assert_round_trip(&input);
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&UnitId::new(7));
        assert_round_trip(&PlayerId::new(3));
        assert_round_trip(&ProjectileKind::CannonBall);
        assert_round_trip(&MoveRejection::Blocked);
    }

    #[test]
    fn tick_duration_matches_tick_rate() {
        let second = super::SECONDS_PER_TICK * super::TICKS_PER_SECOND as f32;
        assert!((second - 1.0).abs() < 1e-6);
    }
}
