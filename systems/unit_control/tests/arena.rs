use battle_arena_core::{
    Command, Event, GameView, InputSnapshot, Key, MouseButton, PlayerColor, PlayerId, UnitId,
    SECONDS_PER_TICK,
};
use battle_arena_rendering::RecordingRenderer;
use battle_arena_system_unit_control::{Kugelpanzer, Unit};
use battle_arena_world::{self as world, query, Obstacle, World};
use glam::Vec2;

const PLAYER: PlayerId = PlayerId::new(1);

fn arena_with_tank(position: Vec2) -> (World, Kugelpanzer) {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConnectPlayer {
            player: PLAYER,
            color: PlayerColor::from_rgb(0x2f, 0x95, 0x32),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::SpawnUnit {
            player: PLAYER,
            position,
            rotation: 0.0,
        },
        &mut events,
    );
    let unit = events
        .iter()
        .find_map(|event| match event {
            Event::UnitSpawned { unit, .. } => Some(*unit),
            _ => None,
        })
        .expect("unit spawned");

    let mut registry = RecordingRenderer::new();
    let tank = Kugelpanzer::new(unit, PLAYER, &mut registry);
    (world, tank)
}

fn set_input(world: &mut World, input: InputSnapshot) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SetPlayerInput {
            player: PLAYER,
            input,
        },
        &mut events,
    );
}

fn step(world: &mut World, tank: &mut Kugelpanzer) -> Vec<Event> {
    let mut commands = Vec::new();
    tank.update(&query::arena_view(world), &mut commands);

    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    world::apply(world, Command::Tick, &mut events);
    events
}

fn position_of(world: &World, unit: UnitId) -> Vec2 {
    query::arena_view(world)
        .unit(unit)
        .map(|snapshot| snapshot.position)
        .expect("unit present")
}

#[test]
fn held_forward_key_drives_the_tank_along_its_heading() {
    let (mut world, mut tank) = arena_with_tank(Vec2::ZERO);
    set_input(&mut world, InputSnapshot::new().with_key(Key::W));

    for _ in 0..60 {
        let _ = step(&mut world, &mut tank);
    }

    let position = position_of(&world, tank.id());
    assert!((position - Vec2::new(0.0, 3.0)).length() < 1e-3);
}

#[test]
fn obstacle_stops_the_tank_without_sliding() {
    let (mut world, mut tank) = arena_with_tank(Vec2::ZERO);
    world.add_obstacle(Obstacle::new(Vec2::new(-5.0, 0.5), Vec2::new(5.0, 2.0)));
    set_input(&mut world, InputSnapshot::new().with_key(Key::W).with_key(Key::A));

    let mut moved_ticks = 0;
    for _ in 0..30 {
        let events = step(&mut world, &mut tank);
        if events
            .iter()
            .any(|event| matches!(event, Event::UnitMoved { .. }))
        {
            moved_ticks += 1;
        }
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::UnitRotated { .. })));
    }

    let position = position_of(&world, tank.id());
    assert!(moved_ticks < 30);
    assert!(!query::arena_view(&world).is_blocked_by_obstacles(position));
    let rotation = query::arena_view(&world)
        .unit(tank.id())
        .map(|snapshot| snapshot.rotation)
        .expect("unit present");
    assert!((rotation - 30.0 * SECONDS_PER_TICK * std::f32::consts::PI).abs() < 1e-4);
}

#[test]
fn moves_are_not_applied_until_the_world_processes_them() {
    let (mut world, mut tank) = arena_with_tank(Vec2::ZERO);
    set_input(&mut world, InputSnapshot::new().with_key(Key::W));

    let mut commands = Vec::new();
    tank.update(&query::arena_view(&world), &mut commands);

    assert_eq!(position_of(&world, tank.id()), Vec2::ZERO);
    assert!(commands
        .iter()
        .any(|command| matches!(command, Command::MoveUnit { .. })));

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    assert!(position_of(&world, tank.id()).y > 0.0);
}

#[test]
fn burst_fills_the_world_with_projectiles() {
    let (mut world, mut tank) = arena_with_tank(Vec2::new(1.0, 1.0));
    set_input(&mut world, InputSnapshot::new().with_key(Key::F));

    let events = step(&mut world, &mut tank);

    let spawned = events
        .iter()
        .filter(|event| matches!(event, Event::ProjectileSpawned { .. }))
        .count();
    assert_eq!(spawned, 12);
    assert_eq!(query::projectile_view(&world).len(), 12);
}

#[test]
fn primary_fire_respects_cooldown_in_the_world() {
    let (mut world, mut tank) = arena_with_tank(Vec2::ZERO);
    set_input(
        &mut world,
        InputSnapshot::new()
            .with_mouse_button(MouseButton::Left)
            .with_cursor(Vec2::new(0.0, 20.0)),
    );

    let mut shots = 0;
    for _ in 0..30 {
        shots += step(&mut world, &mut tank)
            .iter()
            .filter(|event| matches!(event, Event::ProjectileSpawned { .. }))
            .count();
    }

    let interval = tank.tuning().fire_interval_ticks as usize;
    assert_eq!(shots, 30usize.div_ceil(interval + 1));
}

#[test]
fn hit_test_tracks_the_canonical_transform() {
    let (mut world, tank) = arena_with_tank(Vec2::new(4.0, 4.0));
    let view = query::arena_view(&world);
    assert!(tank.is_hit(&view, Vec2::new(4.5, 4.5)));
    assert!(!tank.is_hit(&view, Vec2::ZERO));

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::MoveUnit {
            unit: tank.id(),
            position: Vec2::new(-4.0, 0.0),
        },
        &mut events,
    );

    let view = query::arena_view(&world);
    assert!(tank.is_hit(&view, Vec2::new(-4.0, 0.9)));
    assert!(!tank.is_hit(&view, Vec2::new(4.5, 4.5)));
}

#[test]
fn despawned_unit_is_inert() {
    let (mut world, mut tank) = arena_with_tank(Vec2::ZERO);
    set_input(&mut world, InputSnapshot::new().with_key(Key::W).with_key(Key::F));
    let mut events = Vec::new();
    world::apply(&mut world, Command::DespawnUnit { unit: tank.id() }, &mut events);

    let mut commands = Vec::new();
    tank.update(&query::arena_view(&world), &mut commands);

    assert!(commands.is_empty());
    assert!(!tank.is_hit(&query::arena_view(&world), Vec2::ZERO));
}
