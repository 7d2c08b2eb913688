#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the battle arena.
//!
//! The world is the single writer of canonical unit, player and projectile
//! state. Controllers observe it through [`query::arena_view`] and propose
//! changes as [`Command`] values; [`apply`] arbitrates each proposal and
//! reports the outcome as [`Event`] values.

use battle_arena_core::{
    Command, Event, InputSnapshot, MoveRejection, PlayerColor, PlayerId, ProjectileId,
    ProjectileKind, UnitId, SECONDS_PER_TICK, TICKS_PER_SECOND,
};
use glam::Vec2;
use tracing::{debug, trace};

const DEFAULT_HALF_EXTENT: f32 = 50.0;
const PROJECTILE_LIFETIME_TICKS: u32 = 3 * TICKS_PER_SECOND;

/// Axis-aligned rectangle that units and projectiles cannot enter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    min: Vec2,
    max: Vec2,
}

impl Obstacle {
    /// Creates an obstacle spanning the rectangle between two corners.
    ///
    /// The corners may be supplied in any order.
    #[must_use]
    pub fn new(corner: Vec2, opposite: Vec2) -> Self {
        Self {
            min: corner.min(opposite),
            max: corner.max(opposite),
        }
    }

    /// Lower-left corner of the obstacle.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper-right corner of the obstacle.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Reports whether the point lies inside the obstacle, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Playable rectangle; every point outside it counts as blocked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArenaBounds {
    min: Vec2,
    max: Vec2,
}

impl ArenaBounds {
    /// Creates arena bounds spanning the rectangle between two corners.
    #[must_use]
    pub fn new(corner: Vec2, opposite: Vec2) -> Self {
        Self {
            min: corner.min(opposite),
            max: corner.max(opposite),
        }
    }

    /// Lower-left corner of the arena.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper-right corner of the arena.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self::new(
            Vec2::splat(-DEFAULT_HALF_EXTENT),
            Vec2::splat(DEFAULT_HALF_EXTENT),
        )
    }
}

/// Represents the authoritative battle arena state.
#[derive(Debug)]
pub struct World {
    bounds: ArenaBounds,
    obstacles: Vec<Obstacle>,
    players: Vec<Player>,
    units: Vec<Unit>,
    projectiles: Vec<Projectile>,
    next_unit_id: u32,
    next_projectile_id: u32,
    tick_index: u64,
}

impl World {
    /// Creates an empty arena using the default bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::with_bounds(ArenaBounds::default())
    }

    /// Creates an empty arena using the provided bounds.
    #[must_use]
    pub fn with_bounds(bounds: ArenaBounds) -> Self {
        Self {
            bounds,
            obstacles: Vec::new(),
            players: Vec::new(),
            units: Vec::new(),
            projectiles: Vec::new(),
            next_unit_id: 0,
            next_projectile_id: 0,
            tick_index: 0,
        }
    }

    /// Adds a static obstacle to the arena.
    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    fn is_blocked(&self, position: Vec2) -> bool {
        !self.bounds.contains(position)
            || self
                .obstacles
                .iter()
                .any(|obstacle| obstacle.contains(position))
    }

    fn player(&self, player: PlayerId) -> Option<&Player> {
        self.players
            .binary_search_by_key(&player, |entry| entry.id)
            .ok()
            .map(|index| &self.players[index])
    }

    fn player_mut(&mut self, player: PlayerId) -> Option<&mut Player> {
        self.players
            .binary_search_by_key(&player, |entry| entry.id)
            .ok()
            .map(|index| &mut self.players[index])
    }

    fn unit(&self, unit: UnitId) -> Option<&Unit> {
        self.units.iter().find(|entry| entry.id == unit)
    }

    fn unit_mut(&mut self, unit: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|entry| entry.id == unit)
    }

    fn advance_projectiles(&mut self, out_events: &mut Vec<Event>) {
        let bounds = self.bounds;
        let obstacles = &self.obstacles;
        self.projectiles.retain_mut(|projectile| {
            projectile.position += projectile.velocity * SECONDS_PER_TICK;
            projectile.remaining_ticks = projectile.remaining_ticks.saturating_sub(1);

            let blocked = !bounds.contains(projectile.position)
                || obstacles
                    .iter()
                    .any(|obstacle| obstacle.contains(projectile.position));
            if projectile.remaining_ticks == 0 || blocked {
                out_events.push(Event::ProjectileExpired {
                    projectile: projectile.id,
                });
                return false;
            }
            true
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced {
                tick: world.tick_index,
            });
            world.advance_projectiles(out_events);
        }
        Command::ConnectPlayer { player, color } => {
            match world
                .players
                .binary_search_by_key(&player, |entry| entry.id)
            {
                Ok(index) => {
                    debug!(player = player.get(), "player reconnected; refreshing color");
                    world.players[index].color = color;
                }
                Err(index) => {
                    world.players.insert(
                        index,
                        Player {
                            id: player,
                            color,
                            input: InputSnapshot::default(),
                        },
                    );
                    out_events.push(Event::PlayerConnected { player });
                }
            }
        }
        Command::DisconnectPlayer { player } => {
            if let Ok(index) = world
                .players
                .binary_search_by_key(&player, |entry| entry.id)
            {
                let _ = world.players.remove(index);
                out_events.push(Event::PlayerDisconnected { player });
            } else {
                debug!(player = player.get(), "ignoring disconnect of unknown player");
            }
        }
        Command::SetPlayerInput { player, input } => match world.player_mut(player) {
            Some(entry) => entry.input = input,
            None => debug!(player = player.get(), "dropping input for unknown player"),
        },
        Command::SpawnUnit {
            player,
            position,
            rotation,
        } => {
            let unit = UnitId::new(world.next_unit_id);
            world.next_unit_id = world.next_unit_id.saturating_add(1);
            world.units.push(Unit {
                id: unit,
                player,
                position,
                rotation,
                speed_scale: 1.0,
                damage_scale: 1.0,
            });
            trace!(unit = unit.get(), player = player.get(), "unit spawned");
            out_events.push(Event::UnitSpawned {
                unit,
                player,
                position,
            });
        }
        Command::DespawnUnit { unit } => {
            if let Some(index) = world.units.iter().position(|entry| entry.id == unit) {
                let _ = world.units.remove(index);
                out_events.push(Event::UnitDespawned { unit });
            } else {
                debug!(unit = unit.get(), "ignoring despawn of unknown unit");
            }
        }
        Command::SetUnitModifiers {
            unit,
            speed_scale,
            damage_scale,
        } => match world.unit_mut(unit) {
            Some(entry) => {
                entry.speed_scale = speed_scale.max(0.0);
                entry.damage_scale = damage_scale.max(0.0);
            }
            None => debug!(unit = unit.get(), "ignoring modifiers for unknown unit"),
        },
        Command::MoveUnit { unit, position } => {
            let blocked = world.is_blocked(position);
            let Some(entry) = world.unit_mut(unit) else {
                debug!(unit = unit.get(), "rejecting move of unknown unit");
                out_events.push(Event::MoveRejected {
                    unit,
                    reason: MoveRejection::MissingUnit,
                });
                return;
            };

            if blocked {
                debug!(unit = unit.get(), x = position.x, y = position.y, "rejecting blocked move");
                out_events.push(Event::MoveRejected {
                    unit,
                    reason: MoveRejection::Blocked,
                });
                return;
            }

            let from = entry.position;
            entry.position = position;
            out_events.push(Event::UnitMoved {
                unit,
                from,
                to: position,
            });
        }
        Command::RotateUnit { unit, rotation } => match world.unit_mut(unit) {
            Some(entry) => {
                entry.rotation = rotation;
                out_events.push(Event::UnitRotated { unit, rotation });
            }
            None => debug!(unit = unit.get(), "ignoring rotation of unknown unit"),
        },
        Command::SpawnProjectile {
            owner,
            kind,
            position,
            heading,
            damage_scale,
            velocity,
        } => {
            let projectile = ProjectileId::new(world.next_projectile_id);
            world.next_projectile_id = world.next_projectile_id.saturating_add(1);
            world.projectiles.push(Projectile {
                id: projectile,
                owner,
                kind,
                position,
                heading,
                velocity,
                damage_scale,
                remaining_ticks: PROJECTILE_LIFETIME_TICKS,
            });
            out_events.push(Event::ProjectileSpawned { projectile, owner });
        }
        Command::ResolveProjectileHit { projectile, target } => {
            let Some(index) = world
                .projectiles
                .iter()
                .position(|entry| entry.id == projectile)
            else {
                debug!(
                    projectile = projectile.get(),
                    "ignoring hit of projectile no longer in flight"
                );
                return;
            };

            let removed = world.projectiles.remove(index);
            out_events.push(Event::ProjectileHit {
                projectile,
                owner: removed.owner,
                target,
                damage_scale: removed.damage_scale,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use battle_arena_core::{
        GameView, InputSnapshot, PlayerColor, PlayerId, ProjectileSnapshot, UnitId, UnitSnapshot,
    };
    use glam::Vec2;

    use super::{ArenaBounds, Obstacle, World};

    /// Index of the most recently completed tick.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Provides read-only access to the arena bounds.
    #[must_use]
    pub fn bounds(world: &World) -> ArenaBounds {
        world.bounds
    }

    /// Provides read-only access to the static obstacles.
    #[must_use]
    pub fn obstacles(world: &World) -> &[Obstacle] {
        &world.obstacles
    }

    /// Captures a read-only view of the units inhabiting the arena.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        let mut snapshots: Vec<UnitSnapshot> =
            world.units.iter().map(super::Unit::snapshot).collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        UnitView { snapshots }
    }

    /// Captures a read-only view of the projectiles currently in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        let mut snapshots: Vec<ProjectileSnapshot> = world
            .projectiles
            .iter()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                owner: projectile.owner,
                kind: projectile.kind,
                position: projectile.position,
                heading: projectile.heading,
                velocity: projectile.velocity,
                damage_scale: projectile.damage_scale,
                remaining_ticks: projectile.remaining_ticks,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        ProjectileView { snapshots }
    }

    /// Borrows the world as a [`GameView`] for unit controllers.
    #[must_use]
    pub fn arena_view(world: &World) -> ArenaView<'_> {
        ArenaView { world }
    }

    /// Read-only snapshot describing all units within the arena.
    #[derive(Clone, Debug)]
    pub struct UnitView {
        snapshots: Vec<UnitSnapshot>,
    }

    impl UnitView {
        /// Iterator over the captured unit snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<UnitSnapshot> {
            self.snapshots
        }
    }

    /// Read-only snapshot describing all projectiles in flight.
    #[derive(Clone, Debug)]
    pub struct ProjectileView {
        snapshots: Vec<ProjectileSnapshot>,
    }

    impl ProjectileView {
        /// Iterator over the captured projectile snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
            self.snapshots.iter()
        }

        /// Number of projectiles captured by the view.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether no projectile is in flight.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
            self.snapshots
        }
    }

    /// Borrowed [`GameView`] over the authoritative world.
    #[derive(Clone, Copy, Debug)]
    pub struct ArenaView<'a> {
        world: &'a World,
    }

    impl GameView for ArenaView<'_> {
        fn unit(&self, unit: UnitId) -> Option<UnitSnapshot> {
            self.world.unit(unit).map(super::Unit::snapshot)
        }

        fn player_input(&self, player: PlayerId) -> Option<&InputSnapshot> {
            self.world.player(player).map(|entry| &entry.input)
        }

        fn player_color(&self, player: PlayerId) -> Option<PlayerColor> {
            self.world.player(player).map(|entry| entry.color)
        }

        fn is_blocked_by_obstacles(&self, position: Vec2) -> bool {
            self.world.is_blocked(position)
        }
    }
}

#[derive(Clone, Debug)]
struct Player {
    id: PlayerId,
    color: PlayerColor,
    input: InputSnapshot,
}

#[derive(Clone, Debug)]
struct Unit {
    id: UnitId,
    player: PlayerId,
    position: Vec2,
    rotation: f32,
    speed_scale: f32,
    damage_scale: f32,
}

impl Unit {
    fn snapshot(&self) -> battle_arena_core::UnitSnapshot {
        battle_arena_core::UnitSnapshot {
            id: self.id,
            player: self.player,
            position: self.position,
            rotation: self.rotation,
            speed_scale: self.speed_scale,
            damage_scale: self.damage_scale,
        }
    }
}

#[derive(Clone, Debug)]
struct Projectile {
    id: ProjectileId,
    owner: UnitId,
    kind: ProjectileKind,
    position: Vec2,
    heading: f32,
    velocity: Vec2,
    damage_scale: f32,
    remaining_ticks: u32,
}
