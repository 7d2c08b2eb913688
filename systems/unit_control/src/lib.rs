#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick unit controllers that turn player input into world commands.
//!
//! A controller reads canonical state through [`GameView`] and never writes
//! it: movement and rotation are proposed as [`Command::MoveUnit`] and
//! [`Command::RotateUnit`], projectiles are requested with
//! [`Command::SpawnProjectile`]. Only private controller state such as turret
//! aim and weapon cooldown is mutated in place.

pub mod geometry;
mod kugelpanzer;

pub use kugelpanzer::{Kugelpanzer, KugelpanzerModels, KugelpanzerTuning};

use battle_arena_core::{Command, GameView, PlayerId, UnitId, UnitSnapshot};
use battle_arena_rendering::{ModelRegistry, RenderSubmission};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability shared by every controllable unit type.
pub trait Unit: fmt::Debug {
    /// Identifier allocated to the unit by the world.
    fn id(&self) -> UnitId;

    /// Player owning the unit.
    fn player_id(&self) -> PlayerId;

    /// Runs one tick of decision logic, pushing proposals into `out`.
    fn update(&mut self, view: &dyn GameView, out: &mut Vec<Command>);

    /// Submits the draw calls for the unit's current state.
    fn render(&self, view: &dyn GameView, renderer: &mut dyn RenderSubmission);

    /// Reports whether the world point lies within the unit's footprint.
    fn is_hit(&self, view: &dyn GameView, point: Vec2) -> bool;

    /// Display name of the unit type.
    fn unit_name(&self) -> &'static str;

    /// Credited author of the unit type.
    fn author(&self) -> &'static str;
}

/// Unit types that can be spawned into the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Round tank with an independently aimed turret and a radial burst.
    Kugelpanzer,
}

impl UnitKind {
    /// Creates a controller of this kind for a unit already spawned by the world.
    pub fn instantiate(
        self,
        id: UnitId,
        player: PlayerId,
        registry: &mut dyn ModelRegistry,
    ) -> Box<dyn Unit> {
        match self {
            Self::Kugelpanzer => Box::new(Kugelpanzer::new(id, player, registry)),
        }
    }
}

/// Transforms a world point into the unit's local frame.
///
/// The inverse applies translation then rotation; no scaling is involved.
#[must_use]
pub fn world_to_local(unit: &UnitSnapshot, point: Vec2) -> Vec2 {
    Vec2::from_angle(-unit.rotation).rotate(point - unit.position)
}

/// Reports whether the world point lies within the hull circle of the unit.
#[must_use]
pub fn hit_test(unit: &UnitSnapshot, point: Vec2) -> bool {
    let local = world_to_local(unit, point);
    local.length_squared() <= geometry::HULL_RADIUS * geometry::HULL_RADIUS
}
