//! Headless демо combat core
//!
//! Один local игрок, макетная стрельбищная сцена, скриптованные intents и
//! один remote выстрел. Рендера нет — прогресс печатается в лог.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use rimfire_simulation::*;

/// Один update = ровно один fixed tick
const STEP: Duration = Duration::from_micros(16_667);

/// Макетная сцена: grid helper перед мишенью по центру экрана
struct RangeScene;

impl SceneRaycast for RangeScene {
    fn cast(&self, _origin: Vec3, _direction: Vec3) -> Vec<RayHit> {
        vec![
            RayHit {
                surface: SurfaceId(1),
                distance: 2.0,
            },
            RayHit {
                surface: SurfaceId(2),
                distance: 8.0,
            },
        ]
    }
}

struct LoggingSink;

impl NetworkSink for LoggingSink {
    fn shot_fired(&self, direction: Vec3) {
        log_info(&format!("net <- shoot {:?}", direction));
    }

    fn hit_scored(&self, target: RemoteId, damage: u32) {
        log_info(&format!("net <- hit {:?} for {}", target, damage));
    }
}

fn main() {
    let seed = 42;
    println!("Starting RIMFIRE headless combat demo (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(Time::<Fixed>::from_duration(STEP));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(STEP));

    // Сцена: мишень damageable + colorable, grid helper non-solid
    let dummy = app.world_mut().spawn(Health::new(100)).id();
    {
        let mut index = app.world_mut().resource_mut::<SceneIndex>();
        index.tag_non_solid(SurfaceId(1));
        index.tag_damageable(SurfaceId(2), TargetRef::Local(dummy));
        index.set_color(SurfaceId(2), 0xff0000);
    }
    app.insert_resource(SceneView::new(Box::new(RangeScene)));
    app.world_mut()
        .resource_mut::<NetworkBridge>()
        .set_sink(Box::new(LoggingSink));

    let player = app
        .world_mut()
        .spawn((
            LocalPlayer,
            WeaponState::rifle(),
            ViewPoint {
                position: Vec3::new(0.0, 1.0, 0.0),
                forward: Vec3::NEG_Z,
            },
        ))
        .id();

    // Скрипт: очередь по мишени, перезарядка, один входящий remote выстрел
    for tick in 0..240 {
        if tick < 120 && tick % 12 == 0 {
            app.world_mut().send_event(FireIntent { shooter: player });
        }
        if tick == 120 {
            app.world_mut().send_event(ReloadIntent { shooter: player });
        }
        if tick == 90 {
            app.world_mut().send_event(RemoteShot {
                origin: Vec3::new(0.0, 1.0, 5.0),
                direction: Vec3::NEG_Z,
            });
        }

        app.update();

        if tick % 60 == 59 {
            let ammo = app
                .world()
                .get::<WeaponState>(player)
                .map(|w| w.ammo)
                .unwrap_or(0);
            let player_hp = app
                .world()
                .get::<Health>(player)
                .map(|h| h.current)
                .unwrap_or(0);
            let dummy_hp = app
                .world()
                .get::<Health>(dummy)
                .map(|h| h.current)
                .unwrap_or(0);
            let mut projectiles = app.world_mut().query::<&Projectile>();
            let in_flight = projectiles.iter(app.world()).count();
            println!(
                "Tick {}: ammo={} player_hp={} target_hp={} projectiles={}",
                tick + 1,
                ammo,
                player_hp,
                dummy_hp,
                in_flight
            );
        }
    }

    println!("Demo complete");
}
