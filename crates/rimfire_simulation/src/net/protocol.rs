//! Wire DTOs combat bridge'а — форма payload'а для транспорта
//!
//! Транспорт сериализует как хочет (json, bincode); ядро фиксирует только
//! состав полей и tagged-представление.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{HitReported, RemoteId, RemoteShot};

/// Vec3 в сериализуемой форме
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for WireVec3 {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<WireVec3> for Vec3 {
    fn from(v: WireVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Сообщения combat bridge'а
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatMessage {
    /// Outbound: локальный выстрел (направление взгляда на момент выстрела)
    Shoot { direction: WireVec3 },
    /// Outbound: локально разрешённый hit по remote цели
    Hit { target: RemoteId, damage: u32 },
    /// Inbound: выстрел remote игрока
    RemoteShot {
        origin: WireVec3,
        direction: WireVec3,
    },
}

impl CombatMessage {
    pub fn shoot(direction: Vec3) -> Self {
        Self::Shoot {
            direction: direction.into(),
        }
    }

    pub fn hit(report: &HitReported) -> Self {
        Self::Hit {
            target: report.target,
            damage: report.damage,
        }
    }

    pub fn remote_shot(origin: Vec3, direction: Vec3) -> Self {
        Self::RemoteShot {
            origin: origin.into(),
            direction: direction.into(),
        }
    }

    /// Inbound маршрутизация: сообщение → event ядра
    /// (None для outbound-only типов)
    pub fn into_remote_shot(self) -> Option<RemoteShot> {
        match self {
            Self::RemoteShot { origin, direction } => Some(RemoteShot {
                origin: origin.into(),
                direction: direction.into(),
            }),
            _ => None,
        }
    }
}
