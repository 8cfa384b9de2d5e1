//! Combat core — weapon gating, instant hits, projectiles, damage
//!
//! ECS ответственность:
//! - Game state: WeaponState, Health, Projectile
//! - Combat rules: fire/reload гейты, ray filter chain, proximity тесты
//! - Events: WeaponFired, HitLanded, DamageDealt, EntityDied
//!
//! Внешние layers (вне ядра):
//! - Render: читает WeaponPose/MuzzleFlash/Projectile entities
//! - Input/Camera: пишет FireIntent/ReloadIntent/AimIntent, ViewPoint, MoveState
//! - Transport: NetworkSink + RemoteShot events (см. crate::net)

use bevy::prelude::*;

pub mod damage;
pub mod hitscan;
pub mod projectile;
pub mod timers;
pub mod weapon;

// Re-export основных типов
pub use damage::{apply_damage, DamageDealt, DamageSource, Dead, EntityDied, HitLanded};
pub use hitscan::{
    FeedbackTimers, ProxyLink, RayHit, SceneIndex, SceneRaycast, SceneView, SurfaceId, TargetRef,
};
pub use projectile::{
    spawn_projectile, Projectile, PLAYER_HIT_RADIUS, PROJECTILE_LIFETIME, PROJECTILE_SPEED,
    REMOTE_SHOT_DAMAGE,
};
pub use timers::{TimerEntry, TimerQueue};
pub use weapon::{
    AimIntent, AudioCue, AudioCueKind, FireIntent, FireResult, MuzzleFlash, ReloadCompleted,
    ReloadIntent, WeaponFired, WeaponPose, WeaponState, WeaponTimers,
};

use crate::net;

/// Combat Plugin — регистрирует события и FixedUpdate системы (60Hz)
///
/// Порядок выполнения фиксированный (.chain()):
/// 1. Weapon state: таймеры → intents → pose
/// 2. Resolution: hitscan → tracers → remote ingest → projectiles →
///    feedback reverts → damage
/// 3. Network flush: уведомления в sink после локальных эффектов
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<FireIntent>()
            .add_event::<ReloadIntent>()
            .add_event::<AimIntent>()
            .add_event::<WeaponFired>()
            .add_event::<ReloadCompleted>()
            .add_event::<AudioCue>()
            .add_event::<HitLanded>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<net::RemoteShot>()
            .add_event::<net::HitReported>();

        // Ресурсы-seam'ы; world layer заменяет SceneView/SceneIndex,
        // транспорт регистрирует sink в NetworkBridge
        app.init_resource::<SceneView>()
            .init_resource::<SceneIndex>()
            .init_resource::<FeedbackTimers>()
            .init_resource::<net::NetworkBridge>()
            .init_resource::<crate::DeterministicRng>();

        // Регистрация систем в FixedUpdate
        app.add_systems(
            FixedUpdate,
            (
                // Фаза 1: weapon state
                weapon::fire_weapon_timers,
                weapon::process_aim_intents,
                weapon::process_reload_intents,
                weapon::process_fire_intents,
                weapon::update_weapon_pose,
                // Фаза 2: hit/projectile resolution
                hitscan::resolve_instant_hits,
                projectile::spawn_local_tracers,
                projectile::ingest_remote_shots,
                projectile::update_projectiles,
                hitscan::fire_feedback_reverts,
                damage::apply_damage,
                // Фаза 3: network flush
                net::flush_outbound,
            )
                .chain(), // Последовательное выполнение
        );
    }
}
