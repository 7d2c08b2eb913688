use battle_arena_core::{
    Command, GameView, Key, MouseButton, PlayerId, ProjectileKind, UnitId, SECONDS_PER_TICK,
    TICKS_PER_SECOND,
};
use battle_arena_rendering::{
    Color, ModelCache, ModelHandle, ModelRegistry, RenderSubmission, TextureId,
};
use glam::Vec2;
use std::f32::consts::{FRAC_PI_2, PI};
use tracing::{info, trace};

use crate::{geometry, hit_test, Unit};

const UNIT_NAME: &str = "Kugelpanzer";
const AUTHOR: &str = "Sylvia";

/// Cursor offsets shorter than this leave the turret aligned with the hull.
const AIM_EPSILON: f32 = 1e-4;

static MODELS: ModelCache<KugelpanzerModels> = ModelCache::new();

/// Handles of the meshes shared by every Kugelpanzer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KugelpanzerModels {
    /// Hull mesh, drawn with the unit's transform.
    pub hull: ModelHandle,
    /// Turret mesh, drawn with the turret's rotation override.
    pub turret: ModelHandle,
}

/// Movement and weapon parameters of a Kugelpanzer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KugelpanzerTuning {
    /// Hull speed in world units per second.
    pub move_speed: f32,
    /// Hull turn rate in radians per second.
    pub rotate_angular_speed: f32,
    /// Projectile speed in world units per second.
    pub projectile_speed: f32,
    /// Distance from the unit center to the barrel tip.
    pub muzzle_offset: f32,
    /// Ticks the primary weapon stays silent after firing.
    pub fire_interval_ticks: u32,
    /// Projectiles released by one secondary-fire tick.
    pub burst_count: u32,
    /// Angle between neighbouring burst projectiles, in radians.
    pub burst_spacing: f32,
}

impl Default for KugelpanzerTuning {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            rotate_angular_speed: PI,
            projectile_speed: 36.0,
            muzzle_offset: 1.2,
            // One sixth of a second, not the full second older notes mention.
            fire_interval_ticks: TICKS_PER_SECOND / 6,
            burst_count: 12,
            burst_spacing: 30.0_f32.to_radians(),
        }
    }
}

/// Round tank with an independently aimed turret.
///
/// `W`/`S` drive along the hull's forward axis, `A`/`D` turn the hull, the
/// turret follows the cursor, the left mouse button fires a single shell on a
/// cooldown, and `F` releases a radial burst every tick it is held.
#[derive(Debug)]
pub struct Kugelpanzer {
    id: UnitId,
    player: PlayerId,
    tuning: KugelpanzerTuning,
    models: KugelpanzerModels,
    turret_rotation: Option<f32>,
    fire_count_down: u32,
}

impl Kugelpanzer {
    /// Creates a controller with default tuning, registering the shared meshes on first use.
    pub fn new(id: UnitId, player: PlayerId, registry: &mut dyn ModelRegistry) -> Self {
        Self::with_tuning(id, player, KugelpanzerTuning::default(), registry)
    }

    /// Creates a controller with explicit tuning.
    pub fn with_tuning(
        id: UnitId,
        player: PlayerId,
        tuning: KugelpanzerTuning,
        registry: &mut dyn ModelRegistry,
    ) -> Self {
        Self {
            id,
            player,
            tuning,
            models: Self::models(registry),
            turret_rotation: None,
            fire_count_down: 0,
        }
    }

    /// Returns the shared mesh handles, building and registering them once per process.
    pub fn models(registry: &mut dyn ModelRegistry) -> KugelpanzerModels {
        *MODELS.get_or_build(|| {
            let hull = geometry::hull_mesh();
            let turret = geometry::turret_mesh();
            let models = KugelpanzerModels {
                hull: registry.register_model(&hull.vertices, &hull.indices),
                turret: registry.register_model(&turret.vertices, &turret.indices),
            };
            info!(
                hull = models.hull.get(),
                turret = models.turret.get(),
                "registered kugelpanzer models"
            );
            models
        })
    }

    /// Tuning applied by this controller.
    #[must_use]
    pub fn tuning(&self) -> &KugelpanzerTuning {
        &self.tuning
    }

    /// Ticks left before the primary weapon can fire again.
    #[must_use]
    pub fn fire_count_down(&self) -> u32 {
        self.fire_count_down
    }

    /// Turret heading, falling back to the hull rotation until an aim is resolved.
    #[must_use]
    pub fn turret_rotation(&self, hull_rotation: f32) -> f32 {
        self.turret_rotation.unwrap_or(hull_rotation)
    }

    /// Proposes this tick's hull translation and rotation.
    ///
    /// Both are derived from the pre-tick heading. A translation into an
    /// obstacle is dropped; the rotation proposal is always emitted.
    pub fn tank_move(
        &self,
        view: &dyn GameView,
        move_speed: f32,
        rotate_angular_speed: f32,
        out: &mut Vec<Command>,
    ) {
        let Some(input) = view.player_input(self.player) else {
            return;
        };
        let Some(unit) = view.unit(self.id) else {
            return;
        };

        let mut offset = Vec2::ZERO;
        if input.is_key_down(Key::W) {
            offset.y += 1.0;
        }
        if input.is_key_down(Key::S) {
            offset.y -= 1.0;
        }
        offset *= SECONDS_PER_TICK * move_speed * unit.speed_scale;

        let new_position = unit.position + rotate(offset, unit.rotation);
        if !view.is_blocked_by_obstacles(new_position) {
            out.push(Command::MoveUnit {
                unit: self.id,
                position: new_position,
            });
        }

        let mut rotation_offset = 0.0;
        if input.is_key_down(Key::A) {
            rotation_offset += 1.0;
        }
        if input.is_key_down(Key::D) {
            rotation_offset -= 1.0;
        }
        rotation_offset *= SECONDS_PER_TICK * rotate_angular_speed * unit.speed_scale;
        out.push(Command::RotateUnit {
            unit: self.id,
            rotation: unit.rotation + rotation_offset,
        });
    }

    /// Points the turret at the owning player's cursor.
    pub fn turret_rotate(&mut self, view: &dyn GameView) {
        let Some(input) = view.player_input(self.player) else {
            return;
        };
        let Some(unit) = view.unit(self.id) else {
            return;
        };

        let diff = input.cursor_world() - unit.position;
        self.turret_rotation = if diff.length() < AIM_EPSILON {
            Some(unit.rotation)
        } else {
            // Angles are measured from +x while the barrel points along local +y.
            Some(diff.y.atan2(diff.x) - FRAC_PI_2)
        };
    }

    /// Advances the weapon cooldown and requests projectiles for pressed triggers.
    pub fn fire(&mut self, view: &dyn GameView, out: &mut Vec<Command>) {
        let cooling_down = self.fire_count_down > 0;
        if cooling_down {
            self.fire_count_down -= 1;
        }

        let Some(input) = view.player_input(self.player) else {
            return;
        };
        let Some(unit) = view.unit(self.id) else {
            return;
        };
        let turret = self.turret_rotation(unit.rotation);
        let forward = Vec2::new(0.0, self.tuning.projectile_speed);

        if !cooling_down && input.is_mouse_button_down(MouseButton::Left) {
            out.push(Command::SpawnProjectile {
                owner: self.id,
                kind: ProjectileKind::CannonBall,
                position: unit.position + rotate(Vec2::new(0.0, self.tuning.muzzle_offset), turret),
                heading: turret,
                damage_scale: unit.damage_scale,
                velocity: rotate(forward, turret),
            });
            self.fire_count_down = self.tuning.fire_interval_ticks;
            trace!(unit = self.id.get(), heading = turret, "primary fire");
        }

        if input.is_key_down(Key::F) {
            for i in 0..self.tuning.burst_count {
                let heading = turret + self.tuning.burst_spacing * i as f32;
                out.push(Command::SpawnProjectile {
                    owner: self.id,
                    kind: ProjectileKind::CannonBall,
                    position: unit.position,
                    heading,
                    damage_scale: unit.damage_scale,
                    velocity: rotate(forward, heading),
                });
            }
            trace!(
                unit = self.id.get(),
                count = self.tuning.burst_count,
                "secondary burst"
            );
        }
    }
}

impl Unit for Kugelpanzer {
    fn id(&self) -> UnitId {
        self.id
    }

    fn player_id(&self) -> PlayerId {
        self.player
    }

    fn update(&mut self, view: &dyn GameView, out: &mut Vec<Command>) {
        let tuning = self.tuning;
        self.tank_move(view, tuning.move_speed, tuning.rotate_angular_speed, out);
        self.turret_rotate(view);
        self.fire(view, out);
    }

    fn render(&self, view: &dyn GameView, renderer: &mut dyn RenderSubmission) {
        let Some(unit) = view.unit(self.id) else {
            return;
        };
        let tint = view
            .player_color(self.player)
            .map_or(Color::WHITE, Color::from);

        renderer.set_transformation(unit.position, unit.rotation);
        renderer.set_texture(TextureId::UNTEXTURED);
        renderer.set_color(tint);
        renderer.draw_model(self.models.hull);
        renderer.set_rotation(self.turret_rotation(unit.rotation));
        renderer.draw_model(self.models.turret);
    }

    fn is_hit(&self, view: &dyn GameView, point: Vec2) -> bool {
        view.unit(self.id)
            .is_some_and(|unit| hit_test(&unit, point))
    }

    fn unit_name(&self) -> &'static str {
        UNIT_NAME
    }

    fn author(&self) -> &'static str {
        AUTHOR
    }
}

fn rotate(vector: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(vector)
}
