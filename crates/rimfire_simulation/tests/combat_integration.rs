//! Combat integration tests
//!
//! Headless app с ручным шагом времени: один update = ровно один fixed tick
//! (60Hz), поэтому сценарии по тикам воспроизводимы бит-в-бит.
//!
//! Проверяем:
//! - fire-rate гейт и ammo инварианты на потоке intents
//! - reload последовательность
//! - hitscan filter chain + color feedback против макетной сцены
//! - remote projectile → урон local игроку ровно один раз
//!
//! Детерминизм — в tests/determinism.rs.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rimfire_simulation::combat::spawn_projectile;
use rimfire_simulation::*;

/// Ровно один fixed tick на update
const STEP: Duration = Duration::from_micros(16_667);

fn create_combat_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(Time::<Fixed>::from_duration(STEP));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(STEP));
    app
}

/// Helper: spawn local игрока со штатной винтовкой
/// (required components дают Health/MoveState/BodyCenter/pose автоматически)
fn spawn_player(app: &mut App) -> Entity {
    app.world_mut()
        .spawn((
            LocalPlayer,
            WeaponState::rifle(),
            ViewPoint {
                position: Vec3::new(0.0, 1.0, 0.0),
                forward: Vec3::NEG_Z,
            },
        ))
        .id()
}

fn send<E: Event>(app: &mut App, event: E) {
    let _ = app.world_mut().send_event(event);
}

fn ammo(app: &App, player: Entity) -> u32 {
    app.world().get::<WeaponState>(player).unwrap().ammo
}

fn health(app: &App, entity: Entity) -> u32 {
    app.world().get::<Health>(entity).unwrap().current
}

fn projectile_count(app: &mut App) -> usize {
    let mut query = app.world_mut().query::<&Projectile>();
    query.iter(app.world()).count()
}

// --- Recording sink для outbound уведомлений ---

#[derive(Debug, Clone, PartialEq)]
enum SinkCall {
    Shot(Vec3),
    Hit(RemoteId, u32),
}

#[derive(Clone, Default)]
struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    fn shots(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, SinkCall::Shot(_)))
            .count()
    }

    fn hits(&self) -> Vec<(RemoteId, u32)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                SinkCall::Hit(target, damage) => Some((*target, *damage)),
                _ => None,
            })
            .collect()
    }
}

impl NetworkSink for RecordingSink {
    fn shot_fired(&self, direction: Vec3) {
        self.calls.lock().unwrap().push(SinkCall::Shot(direction));
    }

    fn hit_scored(&self, target: RemoteId, damage: u32) {
        self.calls.lock().unwrap().push(SinkCall::Hit(target, damage));
    }
}

fn install_sink(app: &mut App) -> RecordingSink {
    let sink = RecordingSink::default();
    app.world_mut()
        .resource_mut::<NetworkBridge>()
        .set_sink(Box::new(sink.clone()));
    sink
}

// --- Макетная сцена с фиксированным списком пересечений ---

struct FixedScene {
    hits: Vec<RayHit>,
}

impl SceneRaycast for FixedScene {
    fn cast(&self, _origin: Vec3, _direction: Vec3) -> Vec<RayHit> {
        self.hits.clone()
    }
}

fn install_scene(app: &mut App, hits: Vec<RayHit>) {
    app.insert_resource(SceneView::new(Box::new(FixedScene { hits })));
}

// --- Tests ---

/// Spam FireIntent каждый tick 0.5 сек: cooldown 0.1s пропускает ровно 5,
/// ammo никогда не уходит ниже нуля и не прыгает больше чем на 1
#[test]
fn test_fire_cooldown_limits_rate() {
    let mut app = create_combat_app(42);
    let sink = install_sink(&mut app);
    let player = spawn_player(&mut app);

    let mut previous_ammo = ammo(&app, player);
    for _ in 0..30 {
        send(&mut app, FireIntent { shooter: player });
        app.update();

        let current = ammo(&app, player);
        assert!(previous_ammo - current <= 1, "ammo упал больше чем на 1");
        previous_ammo = current;
    }

    // Приняты tick'и 1, 7, 13, 19, 25
    assert_eq!(ammo(&app, player), 25);
    // onShoot ровно один раз на принятый выстрел
    assert_eq!(sink.shots(), 5);
}

#[test]
fn test_second_fire_within_cooldown_rejected() {
    let mut app = create_combat_app(42);
    let sink = install_sink(&mut app);
    let player = spawn_player(&mut app);

    send(&mut app, FireIntent { shooter: player });
    app.update();
    send(&mut app, FireIntent { shooter: player });
    app.update(); // 16.7ms после первого — внутри cooldown

    assert_eq!(ammo(&app, player), 29);
    assert_eq!(sink.shots(), 1);
}

#[test]
fn test_muzzle_flash_window() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app);

    send(&mut app, FireIntent { shooter: player });
    app.update();

    let flash = app.world().get::<MuzzleFlash>(player).unwrap();
    assert!(flash.visible);
    assert!(flash.roll >= 0.0 && flash.roll < std::f32::consts::PI);

    // 50ms окно: на tick 3 ещё видно, на tick 4 погасло
    app.update();
    app.update();
    assert!(app.world().get::<MuzzleFlash>(player).unwrap().visible);

    app.update();
    assert!(!app.world().get::<MuzzleFlash>(player).unwrap().visible);
}

#[test]
fn test_reload_blocks_fire_then_refills() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app);

    send(&mut app, FireIntent { shooter: player });
    app.update();
    assert_eq!(ammo(&app, player), 29);

    send(&mut app, ReloadIntent { shooter: player });
    app.update();
    assert!(app.world().get::<WeaponState>(player).unwrap().is_reloading);

    // Выстрел во время перезарядки отклонён, ammo не тронут
    send(&mut app, FireIntent { shooter: player });
    app.update();
    assert_eq!(ammo(&app, player), 29);

    // 1.5 сек спустя магазин полон, флаг снят
    for _ in 0..95 {
        app.update();
    }
    let weapon = app.world().get::<WeaponState>(player).unwrap();
    assert_eq!(weapon.ammo, weapon.max_ammo);
    assert!(!weapon.is_reloading);

    // И оружие снова стреляет
    send(&mut app, FireIntent { shooter: player });
    app.update();
    assert_eq!(ammo(&app, player), 29);
}

#[test]
fn test_reload_rejected_when_full() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app);

    send(&mut app, ReloadIntent { shooter: player });
    app.update();

    let weapon = app.world().get::<WeaponState>(player).unwrap();
    assert!(!weapon.is_reloading);
    assert_eq!(weapon.ammo, weapon.max_ammo);
}

/// Сценарий: spawnRemoteProjectile((0,1,5), (0,0,-1)), body center (0,0.5,0).
/// Попадание около t≈0.29s, takeDamage ровно один раз, projectile исчезает.
#[test]
fn test_remote_projectile_hits_player_once() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app);

    send(
        &mut app,
        RemoteShot {
            origin: Vec3::new(0.0, 1.0, 5.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
        },
    );

    // 0.2 сек полёта: ещё далеко (дистанция > 0.8)
    for _ in 0..12 {
        app.update();
    }
    assert_eq!(health(&app, player), 100);
    assert_eq!(projectile_count(&mut app), 1);

    // К 40 tick'ам попадание состоялось, урон применён один раз
    for _ in 0..28 {
        app.update();
    }
    assert_eq!(health(&app, player), 90);
    assert_eq!(projectile_count(&mut app), 0);
}

#[test]
fn test_projectile_expires_by_lifetime() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app);

    // Мимо игрока: улетает в +z
    send(
        &mut app,
        RemoteShot {
            origin: Vec3::new(0.0, 1.0, 5.0),
            direction: Vec3::new(0.0, 0.0, 1.0),
        },
    );

    for _ in 0..60 {
        app.update();
    }
    assert_eq!(projectile_count(&mut app), 1);

    // maxLifetime 2 сек: после истечения удалён без попадания
    for _ in 0..70 {
        app.update();
    }
    assert_eq!(projectile_count(&mut app), 0);
    assert_eq!(health(&app, player), 100);
}

/// Non-hostile tracer безвреден даже на траектории сквозь игрока
#[test]
fn test_tracer_never_damages_player() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app);

    let now = app.world().resource::<Time<Fixed>>().elapsed_secs_f64();
    {
        let mut commands = app.world_mut().commands();
        spawn_projectile(
            &mut commands,
            Vec3::new(0.0, 0.5, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            10,
            false,
            now,
        );
    }

    for _ in 0..130 {
        app.update();
    }
    assert_eq!(health(&app, player), 100);
    assert_eq!(projectile_count(&mut app), 0); // Ушёл по lifetime
}

/// Локальный выстрел порождает cosmetic tracer
#[test]
fn test_local_fire_spawns_tracer() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app);

    send(&mut app, FireIntent { shooter: player });
    app.update();

    assert_eq!(projectile_count(&mut app), 1);
    let mut query = app.world_mut().query::<&Projectile>();
    let tracer = query.iter(app.world()).next().unwrap();
    assert!(!tracer.hostile);
}

#[test]
fn test_hitscan_damages_local_target_with_feedback() {
    let mut app = create_combat_app(42);
    let sink = install_sink(&mut app);
    let player = spawn_player(&mut app);
    let dummy = app.world_mut().spawn(Health::new(100)).id();

    // Сцена: ствол своего оружия (0.5), grid helper (1.0), мишень (4.0), стена (10.0)
    {
        let mut index = app.world_mut().resource_mut::<SceneIndex>();
        index.tag_weapon_owned(SurfaceId(1));
        index.tag_non_solid(SurfaceId(2));
        index.tag_damageable(SurfaceId(3), TargetRef::Local(dummy));
        index.set_color(SurfaceId(3), 0xff0000);
        index.set_color(SurfaceId(4), 0x888888);
    }
    install_scene(
        &mut app,
        vec![
            RayHit { surface: SurfaceId(1), distance: 0.5 },
            RayHit { surface: SurfaceId(2), distance: 1.0 },
            RayHit { surface: SurfaceId(3), distance: 4.0 },
            RayHit { surface: SurfaceId(4), distance: 10.0 },
        ],
    );

    send(&mut app, FireIntent { shooter: player });
    app.update();

    // Filter chain пропустил оружие и helper, урон по мишени
    assert_eq!(health(&app, dummy), 80);
    // Подсветка применена
    assert_eq!(
        app.world().resource::<SceneIndex>().color(SurfaceId(3)),
        Some(0xffffff)
    );
    // Стена не тронута
    assert_eq!(
        app.world().resource::<SceneIndex>().color(SurfaceId(4)),
        Some(0x888888)
    );
    assert_eq!(sink.shots(), 1);
    assert!(sink.hits().is_empty()); // Локальная цель — в сеть не репортим

    // 50ms спустя revert вернул исходный цвет
    for _ in 0..4 {
        app.update();
    }
    assert_eq!(
        app.world().resource::<SceneIndex>().color(SurfaceId(3)),
        Some(0xff0000)
    );
}

#[test]
fn test_hit_proxy_reports_remote_and_redirects_feedback() {
    let mut app = create_combat_app(42);
    let sink = install_sink(&mut app);
    let player = spawn_player(&mut app);

    // Hitbox proxy remote игрока: feedback на visual, урон — владельцу
    {
        let mut index = app.world_mut().resource_mut::<SceneIndex>();
        index.link_proxy(
            SurfaceId(5),
            ProxyLink {
                visual: SurfaceId(6),
                owner: TargetRef::Remote(RemoteId(7)),
            },
        );
        index.set_color(SurfaceId(6), 0x3366ff);
    }
    install_scene(
        &mut app,
        vec![RayHit { surface: SurfaceId(5), distance: 2.0 }],
    );

    send(&mut app, FireIntent { shooter: player });
    app.update();

    assert_eq!(sink.hits(), vec![(RemoteId(7), 20)]);
    assert_eq!(sink.shots(), 1);
    // Подсветка ушла на visual поверхность
    assert_eq!(
        app.world().resource::<SceneIndex>().color(SurfaceId(6)),
        Some(0xffffff)
    );

    for _ in 0..4 {
        app.update();
    }
    assert_eq!(
        app.world().resource::<SceneIndex>().color(SurfaceId(6)),
        Some(0x3366ff)
    );
}

/// Поверхность исчезла между flash и revert — протухший revert игнорируется
#[test]
fn test_stale_feedback_revert_is_ignored() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app);
    let dummy = app.world_mut().spawn(Health::new(100)).id();

    {
        let mut index = app.world_mut().resource_mut::<SceneIndex>();
        index.tag_damageable(SurfaceId(3), TargetRef::Local(dummy));
        index.set_color(SurfaceId(3), 0xff0000);
    }
    install_scene(
        &mut app,
        vec![RayHit { surface: SurfaceId(3), distance: 4.0 }],
    );

    send(&mut app, FireIntent { shooter: player });
    app.update();

    // Мишень уничтожена world layer'ом до revert'а
    app.world_mut()
        .resource_mut::<SceneIndex>()
        .remove_surface(SurfaceId(3));

    for _ in 0..6 {
        app.update();
    }
    assert_eq!(app.world().resource::<SceneIndex>().color(SurfaceId(3)), None);
}

#[test]
fn test_aim_blend_converges_in_app() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app);

    send(&mut app, AimIntent { shooter: player, aiming: true });
    for _ in 0..90 {
        app.update();
    }
    let pose = app.world().get::<WeaponPose>(player).unwrap();
    assert!(pose.ads_blend > 0.95);
    assert!((pose.fov - 50.0).abs() < 1.0);

    send(&mut app, AimIntent { shooter: player, aiming: false });
    for _ in 0..90 {
        app.update();
    }
    let pose = app.world().get::<WeaponPose>(player).unwrap();
    assert!(pose.ads_blend < 0.05);
    assert!((pose.fov - 75.0).abs() < 1.0);
}

