//! RIMFIRE Simulation Core
//!
//! Headless ECS-симуляция combat core для FPS прототипа (Bevy 0.16)
//!
//! HYBRID ARCHITECTURE:
//! - ECS = authoritative combat state (weapon gating, instant hits,
//!   projectiles, damage)
//! - Внешние layers = rendering, camera/input, audio, UI, transport —
//!   за narrow seams (компоненты ViewPoint/MoveState, события intents/cues,
//!   ресурсы SceneView/SceneIndex/NetworkBridge)

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod combat;
pub mod components;
pub mod logger;
pub mod net;

// Re-export базовых типов для удобства
pub use combat::{
    AimIntent, AudioCue, AudioCueKind, CombatPlugin, DamageDealt, DamageSource, Dead, EntityDied,
    FeedbackTimers, FireIntent, FireResult, HitLanded, MuzzleFlash, Projectile, ProxyLink, RayHit,
    ReloadCompleted, ReloadIntent, SceneIndex, SceneRaycast, SceneView, SurfaceId, TargetRef,
    WeaponFired, WeaponPose, WeaponState, WeaponTimers,
};
pub use components::*;
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel,
    LogPrinter,
};
pub use net::{HitReported, NetworkBridge, NetworkSink, RemoteId, RemoteShot};

/// Главный plugin симуляции
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Детерминистичный RNG для косметических roll'ов
            // (init_resource не перетирает seed, выбранный create_headless_app)
            .init_resource::<DeterministicRng>()
            .add_plugins(CombatPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Snapshot компонентов мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
