//! Projectile simulation — летящие выстрелы
//!
//! Два источника спавна:
//! - remote выстрел через network bridge → hostile projectile, может попасть
//!   по local игроку (sphere-distance тест против body center)
//! - принятый локальный выстрел → non-hostile cosmetic tracer, никого не ранит
//!
//! Столкновения со стенами не моделируются: projectile живёт до maxLifetime
//! или до попадания по игроку. Уничтожение выставляет alive=false сразу,
//! despawn откладывается до command flush после pass'а — коллекция не
//! мутируется посреди итерации.

use bevy::prelude::*;

use crate::combat::damage::{DamageSource, HitLanded};
use crate::combat::weapon::WeaponFired;
use crate::components::{BodyCenter, LocalPlayer, ViewPoint};
use crate::net::RemoteShot;

/// Скорость полёта (м/с)
pub const PROJECTILE_SPEED: f32 = 15.0;
/// Время жизни (сек)
pub const PROJECTILE_LIFETIME: f32 = 2.0;
/// Радиус попадания по игроку (м)
pub const PLAYER_HIT_RADIUS: f32 = 0.8;
/// Урон remote выстрела
pub const REMOTE_SHOT_DAMAGE: u32 = 10;

/// Tracer спавнится чуть впереди и ниже точки взгляда
pub const TRACER_FORWARD_OFFSET: f32 = 1.0;
pub const TRACER_DROP: f32 = 0.2;

/// Летящий выстрел; позиция — в Transform
///
/// Инвариант: после alive=false projectile не двигается и не хит-тестится,
/// entity уходит в despawn на ближайшем command flush.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Projectile {
    /// normalize(direction) × PROJECTILE_SPEED
    pub velocity: Vec3,
    pub spawned_at: f64,
    pub max_lifetime: f32,
    pub damage: u32,
    /// Только hostile projectile ранит local игрока
    pub hostile: bool,
    pub alive: bool,
}

impl Projectile {
    pub fn new(direction: Vec3, damage: u32, hostile: bool, now: f64) -> Self {
        Self {
            velocity: direction.normalize_or_zero() * PROJECTILE_SPEED,
            spawned_at: now,
            max_lifetime: PROJECTILE_LIFETIME,
            damage,
            hostile,
            alive: true,
        }
    }

    pub fn expired(&self, now: f64) -> bool {
        now - self.spawned_at > self.max_lifetime as f64
    }
}

/// Спавн projectile; визуальное представление render layer вешает на entity
pub fn spawn_projectile(
    commands: &mut Commands,
    origin: Vec3,
    direction: Vec3,
    damage: u32,
    hostile: bool,
    now: f64,
) -> Entity {
    commands
        .spawn((
            Projectile::new(direction, damage, hostile, now),
            Transform::from_translation(origin),
        ))
        .id()
}

/// Принятый локальный выстрел → cosmetic tracer
pub fn spawn_local_tracers(
    mut commands: Commands,
    mut fired: EventReader<WeaponFired>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs_f64();
    for shot in fired.read() {
        let mut origin = shot.origin + shot.direction * TRACER_FORWARD_OFFSET;
        origin.y -= TRACER_DROP;
        spawn_projectile(&mut commands, origin, shot.direction, shot.damage, false, now);
    }
}

/// Inbound операция bridge'а: remote выстрел → hostile projectile.
/// Попадание remote выстрела локально НЕ ревалидируется.
pub fn ingest_remote_shots(
    mut commands: Commands,
    mut shots: EventReader<RemoteShot>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs_f64();
    for shot in shots.read() {
        spawn_projectile(
            &mut commands,
            shot.origin,
            shot.direction,
            REMOTE_SHOT_DAMAGE,
            true,
            now,
        );
        crate::log(&format!(
            "Remote shot ingested: origin={:?} direction={:?}",
            shot.origin, shot.direction
        ));
    }
}

/// Per-tick: движение, expiry, proximity тест против local игрока
pub fn update_projectiles(
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform)>,
    player: Query<(Entity, &ViewPoint, &BodyCenter), With<LocalPlayer>>,
    mut landed: EventWriter<HitLanded>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs_f64();
    let delta = time.delta_secs();
    let target = player
        .iter()
        .next()
        .map(|(entity, view, center)| (entity, center.world_point(view)));

    for (entity, mut projectile, mut transform) in projectiles.iter_mut() {
        if !projectile.alive {
            continue; // Уничтожен, ждёт despawn flush
        }

        transform.translation += projectile.velocity * delta;

        if projectile.expired(now) {
            projectile.alive = false;
            commands.entity(entity).despawn();
            continue;
        }

        let Some((player_entity, body_center)) = target else {
            continue;
        };
        if projectile.hostile && transform.translation.distance(body_center) < PLAYER_HIT_RADIUS {
            landed.write(HitLanded {
                target: player_entity,
                damage: projectile.damage,
                source: DamageSource::Projectile,
            });
            projectile.alive = false;
            commands.entity(entity).despawn();
        }
    }
}
