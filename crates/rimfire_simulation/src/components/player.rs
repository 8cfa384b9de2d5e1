//! Local player seam components
//!
//! Architecture:
//! - ViewPoint и MoveState пишут внешние layers (camera, input) каждый кадр —
//!   ядро их только читает
//! - WeaponPose / MuzzleFlash (см. combat::weapon) ядро пишет, render layer читает
//! - Remote игроки НЕ существуют как entity: их выстрелы приходят через
//!   network bridge и живут локально как hostile projectiles

use bevy::prelude::*;

use super::actor::Health;

/// Marker: entity локального игрока
///
/// Required components дают полный набор seam-компонентов при спавне:
/// ```ignore
/// commands.spawn((LocalPlayer, WeaponState::rifle()));
/// ```
#[derive(Component, Debug, Clone, Copy, Default)]
#[require(Health, ViewPoint, MoveState, BodyCenter)]
pub struct LocalPlayer;

/// Позиция и направление взгляда (пишет camera layer)
///
/// Единственный источник origin/direction для выстрелов и proximity тестов.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct ViewPoint {
    pub position: Vec3,
    /// Нормализованное направление взгляда
    pub forward: Vec3,
}

impl Default for ViewPoint {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
        }
    }
}

/// Флаг движения (пишет input layer) — включает weapon sway
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct MoveState {
    pub moving: bool,
}

/// Приближение центра тела: offset вниз от view point
///
/// Проекция "камера минус полроста" вместо честного hurtbox — достаточно
/// для sphere-distance теста projectile'ов.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct BodyCenter {
    pub offset: Vec3,
}

impl Default for BodyCenter {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, -0.5, 0.0),
        }
    }
}

impl BodyCenter {
    /// Мировая точка центра тела для данного взгляда
    pub fn world_point(&self, view: &ViewPoint) -> Vec3 {
        view.position + self.offset
    }
}
