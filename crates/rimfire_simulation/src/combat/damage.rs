//! Damage pipeline — применение локально разрешённых hit'ов к Health
//!
//! Вход: HitLanded (hitscan resolver, projectile simulator).
//! Выход: DamageDealt (UI, звук, эффекты), EntityDied + маркер Dead.
//! Урон remote целям сюда не попадает — он только репортится через bridge.

use bevy::prelude::*;

use crate::components::Health;

/// Источник урона
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Hitscan,
    Projectile,
}

/// Локально разрешённый hit, ждёт применения к Health
#[derive(Event, Debug, Clone)]
pub struct HitLanded {
    pub target: Entity,
    pub damage: u32,
    pub source: DamageSource,
}

/// Урон применён (для UI, звуков, эффектов)
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub target: Entity,
    pub damage: u32,
    pub source: DamageSource,
    pub target_died: bool,
}

/// Entity умер (health == 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
}

/// Маркер: entity мертв. Деспавн не автоматический.
#[derive(Component, Debug)]
pub struct Dead;

/// Применение урона из HitLanded событий
///
/// Цель без Health (уже убрана world layer'ом) пропускается молча —
/// это нормальный исход, не ошибка.
pub fn apply_damage(
    mut commands: Commands,
    mut hits: EventReader<HitLanded>,
    mut targets: Query<&mut Health>,
    mut dealt: EventWriter<DamageDealt>,
    mut died: EventWriter<EntityDied>,
) {
    for hit in hits.read() {
        let Ok(mut health) = targets.get_mut(hit.target) else {
            crate::log_warning(&format!(
                "HitLanded: target {:?} has no Health component",
                hit.target
            ));
            continue;
        };

        let was_alive = health.is_alive();
        health.take_damage(hit.damage);
        let target_died = was_alive && !health.is_alive();

        dealt.write(DamageDealt {
            target: hit.target,
            damage: hit.damage,
            source: hit.source,
            target_died,
        });

        if target_died {
            died.write(EntityDied { entity: hit.target });
            if let Ok(mut entity_commands) = commands.get_entity(hit.target) {
                entity_commands.insert(Dead);
            }
            crate::log_info(&format!(
                "Entity {:?} died ({:?}, {} damage)",
                hit.target, hit.source, hit.damage
            ));
        }
    }
}
