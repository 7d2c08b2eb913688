//! Headless match loop wiring input drivers, unit controllers and the world.

use battle_arena_core::{Command, Event, GameView, PlayerId, ProjectileId, UnitId, UnitSnapshot};
use battle_arena_rendering::RecordingRenderer;
use battle_arena_system_unit_control::Unit;
use battle_arena_world::{self as world, query, ArenaBounds, Obstacle, World};
use tracing::{debug, info, warn};

use crate::scenario::{InputDriver, Scenario};

/// Aggregated outcome of a headless run.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SimulationReport {
    pub(crate) ticks: u64,
    pub(crate) moves: usize,
    pub(crate) rejected_moves: usize,
    pub(crate) projectiles_fired: usize,
    pub(crate) projectiles_expired: usize,
    pub(crate) hits: Vec<HitRecord>,
    pub(crate) draw_calls: usize,
}

/// A single projectile impact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct HitRecord {
    pub(crate) tick: u64,
    pub(crate) owner: UnitId,
    pub(crate) target: UnitId,
    pub(crate) damage_scale: f32,
}

/// One line of the roster printed after a run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RosterEntry {
    pub(crate) player: PlayerId,
    pub(crate) unit_name: &'static str,
    pub(crate) author: &'static str,
    pub(crate) snapshot: Option<UnitSnapshot>,
}

#[derive(Debug)]
struct Seat {
    player: PlayerId,
    driver: InputDriver,
    disconnect_at_tick: Option<u64>,
    connected: bool,
}

/// World plus every controller taking part in the match.
#[derive(Debug)]
pub(crate) struct Arena {
    world: World,
    seats: Vec<Seat>,
    units: Vec<Box<dyn Unit>>,
    renderer: RecordingRenderer,
    report: SimulationReport,
}

impl Arena {
    /// Connects every player, spawns their units and instantiates the controllers.
    pub(crate) fn from_scenario(scenario: &Scenario, seed: u64) -> Self {
        let mut world = World::with_bounds(ArenaBounds::new(scenario.arena.min, scenario.arena.max));
        for obstacle in &scenario.obstacles {
            world.add_obstacle(Obstacle::new(obstacle.min, obstacle.max));
        }

        let mut renderer = RecordingRenderer::new();
        let mut seats = Vec::with_capacity(scenario.players.len());
        let mut units = Vec::with_capacity(scenario.players.len());
        let mut events = Vec::new();

        for config in &scenario.players {
            let player = config.player_id();
            world::apply(
                &mut world,
                Command::ConnectPlayer {
                    player,
                    color: config.player_color(),
                },
                &mut events,
            );

            events.clear();
            world::apply(
                &mut world,
                Command::SpawnUnit {
                    player,
                    position: config.position,
                    rotation: config.rotation,
                },
                &mut events,
            );
            let Some(unit) = events.iter().find_map(|event| match event {
                Event::UnitSpawned { unit, .. } => Some(*unit),
                _ => None,
            }) else {
                warn!(player = player.get(), "world refused to spawn unit");
                continue;
            };

            world::apply(
                &mut world,
                Command::SetUnitModifiers {
                    unit,
                    speed_scale: config.speed_scale,
                    damage_scale: config.damage_scale,
                },
                &mut events,
            );

            units.push(config.unit.instantiate(unit, player, &mut renderer));
            seats.push(Seat {
                player,
                driver: InputDriver::from_config(
                    &config.driver,
                    scenario.arena,
                    seed.wrapping_add(u64::from(config.id)),
                ),
                disconnect_at_tick: config.disconnect_at_tick,
                connected: true,
            });
            info!(
                player = player.get(),
                unit = unit.get(),
                kind = ?config.unit,
                "unit entered the arena"
            );
        }

        Self {
            world,
            seats,
            units,
            renderer,
            report: SimulationReport::default(),
        }
    }

    /// Runs the requested number of ticks and returns the accumulated report.
    pub(crate) fn run(&mut self, ticks: u64) -> &SimulationReport {
        for _ in 0..ticks {
            self.step();
        }
        &self.report
    }

    /// Advances the match by a single tick.
    pub(crate) fn step(&mut self) {
        let tick = query::tick_index(&self.world);
        let mut events = Vec::new();

        self.feed_input(tick, &mut events);

        let mut commands = Vec::new();
        {
            let view = query::arena_view(&self.world);
            for unit in &mut self.units {
                unit.update(&view, &mut commands);
            }
        }
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        world::apply(&mut self.world, Command::Tick, &mut events);

        for command in self.detect_hits() {
            world::apply(&mut self.world, command, &mut events);
        }

        {
            let view = query::arena_view(&self.world);
            for unit in &self.units {
                unit.render(&view, &mut self.renderer);
            }
        }
        self.report.draw_calls += self.renderer.take_commands().len();

        self.tally(tick, &events);
    }

    /// Units paired with their owners and latest canonical state.
    pub(crate) fn roster(&self) -> Vec<RosterEntry> {
        let view = query::arena_view(&self.world);
        self.units
            .iter()
            .map(|unit| RosterEntry {
                player: unit.player_id(),
                unit_name: unit.unit_name(),
                author: unit.author(),
                snapshot: view.unit(unit.id()),
            })
            .collect()
    }

    fn feed_input(&mut self, tick: u64, events: &mut Vec<Event>) {
        for seat in &mut self.seats {
            if !seat.connected {
                continue;
            }
            if seat.disconnect_at_tick.is_some_and(|at| at <= tick) {
                seat.connected = false;
                info!(player = seat.player.get(), tick, "player left the match");
                world::apply(
                    &mut self.world,
                    Command::DisconnectPlayer {
                        player: seat.player,
                    },
                    events,
                );
                continue;
            }
            world::apply(
                &mut self.world,
                Command::SetPlayerInput {
                    player: seat.player,
                    input: seat.driver.input_for(tick),
                },
                events,
            );
        }
    }

    /// First unit, other than the shooter, whose footprint contains the projectile.
    fn detect_hits(&self) -> Vec<Command> {
        let view = query::arena_view(&self.world);
        query::projectile_view(&self.world)
            .iter()
            .filter_map(|projectile| {
                self.units
                    .iter()
                    .filter(|unit| unit.id() != projectile.owner)
                    .find(|unit| unit.is_hit(&view, projectile.position))
                    .map(|unit| hit_command(projectile.id, unit.id()))
            })
            .collect()
    }

    fn tally(&mut self, tick: u64, events: &[Event]) {
        let report = &mut self.report;
        report.ticks = tick + 1;
        for event in events {
            match event {
                Event::UnitMoved { .. } => report.moves += 1,
                Event::MoveRejected { unit, reason } => {
                    debug!(unit = unit.get(), ?reason, "move rejected");
                    report.rejected_moves += 1;
                }
                Event::ProjectileSpawned { .. } => report.projectiles_fired += 1,
                Event::ProjectileExpired { .. } => report.projectiles_expired += 1,
                Event::ProjectileHit {
                    owner,
                    target,
                    damage_scale,
                    ..
                } => {
                    debug!(
                        tick,
                        owner = owner.get(),
                        target = target.get(),
                        damage_scale,
                        "projectile hit"
                    );
                    report.hits.push(HitRecord {
                        tick,
                        owner: *owner,
                        target: *target,
                        damage_scale: *damage_scale,
                    });
                }
                _ => {}
            }
        }
    }
}

fn hit_command(projectile: ProjectileId, target: UnitId) -> Command {
    Command::ResolveProjectileHit { projectile, target }
}
