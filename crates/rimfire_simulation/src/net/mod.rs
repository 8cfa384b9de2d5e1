//! Combat network bridge — контрактная граница, транспорт живёт снаружи
//!
//! Outbound: NetworkSink trait — транспорт получает уведомления ПОСЛЕ
//! локальных эффектов (flush — последняя фаза tick'а). Уведомление о
//! выстреле информационное, не запрос разрешения: hit-scan для стрелявшего
//! local-authoritative.
//!
//! Inbound: RemoteShot event — единственная операция, которую транспорт
//! вызывает в ядро; маршрутизируется напрямую в projectile simulator
//! (hostile, фиксированный урон).
//!
//! Payload shape: protocol::CombatMessage (serde DTOs). Формат и транспорт
//! вне scope.

pub mod protocol;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::weapon::WeaponFired;
use crate::components::LocalPlayer;

/// Id remote игрока в терминах транспорта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteId(pub u64);

/// Outbound contract, реализует транспорт
pub trait NetworkSink: Send + Sync {
    /// Ровно один вызов на принятый локальный выстрел
    fn shot_fired(&self, direction: Vec3);
    /// Локально разрешённый hit по remote-идентифицированной цели.
    /// Подтверждения от сервера ядро не ждёт и не потребляет.
    fn hit_scored(&self, target: RemoteId, damage: u32);
}

/// Слот sink'а; None = не-сетевая сессия, уведомления просто стекают
#[derive(Resource, Default)]
pub struct NetworkBridge {
    sink: Option<Box<dyn NetworkSink>>,
}

impl NetworkBridge {
    pub fn with_sink(sink: Box<dyn NetworkSink>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn set_sink(&mut self, sink: Box<dyn NetworkSink>) {
        self.sink = Some(sink);
    }

    pub fn sink(&self) -> Option<&dyn NetworkSink> {
        self.sink.as_deref()
    }
}

/// Inbound: remote выстрел, локально реплицируется как hostile projectile
#[derive(Event, Debug, Clone)]
pub struct RemoteShot {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Outbound очередь: hit по remote цели (decoupled от локального рендера)
#[derive(Event, Debug, Clone)]
pub struct HitReported {
    pub target: RemoteId,
    pub damage: u32,
}

/// Фаза network flush: уведомления уходят в sink после локальных эффектов.
/// Выстрелы не-локальных entity в сеть не уходят.
pub fn flush_outbound(
    bridge: Res<NetworkBridge>,
    local: Query<(), With<LocalPlayer>>,
    mut fired: EventReader<WeaponFired>,
    mut hits: EventReader<HitReported>,
) {
    let Some(sink) = bridge.sink() else {
        fired.clear();
        hits.clear();
        return;
    };

    for shot in fired.read() {
        if local.get(shot.shooter).is_ok() {
            sink.shot_fired(shot.direction);
        }
    }
    for hit in hits.read() {
        sink.hit_scored(hit.target, hit.damage);
    }
}
