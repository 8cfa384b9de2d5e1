//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: здоровье целей (Health)
//! - player: local player seam (LocalPlayer, ViewPoint, MoveState, BodyCenter)
//!
//! Боевые компоненты (WeaponState, WeaponPose, Projectile) живут в crate::combat.

pub mod actor;
pub mod player;

// Re-exports для удобного импорта
pub use actor::*;
pub use player::*;
