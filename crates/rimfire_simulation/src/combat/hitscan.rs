//! Instant-hit resolution — ray walk, filter chain, урон и color feedback
//!
//! Архитектура:
//! - SceneRaycast — consumed capability: world layer отдаёт ordered
//!   intersections (ближайшее первым) по opaque SurfaceId
//! - SceneIndex — таблицы тегов и linkage, заполняет world layer при
//!   построении сцены; weapon-self filter = identity set с прямым lookup,
//!   никакого parent-chain walking по scene graph
//! - Hit-proxy: feedback идёт на linked visual поверхность, урон — на
//!   linked logical owner
//! - Color revert — запись в FeedbackTimers, гасится внутри FixedUpdate pass;
//!   протухший revert (поверхность исчезла) молча пропускается

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::combat::damage::{DamageSource, HitLanded};
use crate::combat::timers::TimerQueue;
use crate::combat::weapon::WeaponFired;
use crate::net::{HitReported, RemoteId};

/// Цвет подсветки попадания
pub const HIT_HIGHLIGHT: u32 = 0xffffff;
/// Длительность подсветки до revert (сек)
pub const HIT_FLASH_SECS: f64 = 0.05;

/// Opaque handle поверхности сцены (выдаёт world layer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Пересечение луча с поверхностью
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub surface: SurfaceId,
    pub distance: f32,
}

/// Consumed capability: пересечения луча со сценой, ближайшее первым
pub trait SceneRaycast: Send + Sync {
    fn cast(&self, origin: Vec3, direction: Vec3) -> Vec<RayHit>;
}

/// Пустая сцена — default, чтобы headless app работал без world layer
struct EmptyScene;

impl SceneRaycast for EmptyScene {
    fn cast(&self, _origin: Vec3, _direction: Vec3) -> Vec<RayHit> {
        Vec::new()
    }
}

#[derive(Resource)]
pub struct SceneView {
    raycaster: Box<dyn SceneRaycast>,
}

impl Default for SceneView {
    fn default() -> Self {
        Self::new(Box::new(EmptyScene))
    }
}

impl SceneView {
    pub fn new(raycaster: Box<dyn SceneRaycast>) -> Self {
        Self { raycaster }
    }

    pub fn cast(&self, origin: Vec3, direction: Vec3) -> Vec<RayHit> {
        self.raycaster.cast(origin, direction)
    }
}

/// Кому атрибуцировать урон попадания
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRef {
    /// Локальная цель (тренировочная мишень) — урон применяется in-process
    Local(Entity),
    /// Remote игрок — урон только репортится через network bridge
    Remote(RemoteId),
}

/// Linkage hit-proxy: урон — owner'у, feedback — visual поверхности
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyLink {
    pub visual: SurfaceId,
    pub owner: TargetRef,
}

/// Теги и linkage поверхностей; заполняет world layer при построении сцены
#[derive(Resource, Debug, Default)]
pub struct SceneIndex {
    /// Helper-геометрия (grid, дебаг-линии) — луч проходит насквозь
    non_solid: HashSet<SurfaceId>,
    /// Поверхности собственного оружия (identity set, прямой lookup)
    weapon_owned: HashSet<SurfaceId>,
    /// Hit-proxy → {visual, owner}
    proxies: HashMap<SurfaceId, ProxyLink>,
    /// Обычная damageable геометрия → цель
    damageable: HashMap<SurfaceId, TargetRef>,
    /// Colorable поверхности: текущий цвет (hex)
    colors: HashMap<SurfaceId, u32>,
}

impl SceneIndex {
    pub fn tag_non_solid(&mut self, surface: SurfaceId) {
        self.non_solid.insert(surface);
    }

    /// Регистрация геометрии собственного оружия (при спавне игрока)
    pub fn tag_weapon_owned(&mut self, surface: SurfaceId) {
        self.weapon_owned.insert(surface);
    }

    pub fn link_proxy(&mut self, proxy: SurfaceId, link: ProxyLink) {
        self.proxies.insert(proxy, link);
    }

    pub fn tag_damageable(&mut self, surface: SurfaceId, target: TargetRef) {
        self.damageable.insert(surface, target);
    }

    pub fn set_color(&mut self, surface: SurfaceId, hex: u32) {
        self.colors.insert(surface, hex);
    }

    pub fn color(&self, surface: SurfaceId) -> Option<u32> {
        self.colors.get(&surface).copied()
    }

    /// Полная выписка поверхности (despawn геометрии world layer'ом)
    pub fn remove_surface(&mut self, surface: SurfaceId) {
        self.non_solid.remove(&surface);
        self.weapon_owned.remove(&surface);
        self.proxies.remove(&surface);
        self.damageable.remove(&surface);
        self.colors.remove(&surface);
    }

    /// Filter chain: первый survivor упорядоченного списка пересечений.
    /// Скипаем non-solid helpers и собственное оружие.
    pub fn first_valid_hit(&self, hits: &[RayHit]) -> Option<SurfaceId> {
        hits.iter()
            .map(|hit| hit.surface)
            .find(|surface| !self.non_solid.contains(surface) && !self.weapon_owned.contains(surface))
    }

    /// Атрибуция попадания: (поверхность для feedback, цель для урона)
    pub fn attribution(&self, surface: SurfaceId) -> (SurfaceId, Option<TargetRef>) {
        match self.proxies.get(&surface) {
            Some(link) => (link.visual, Some(link.owner)),
            None => (surface, self.damageable.get(&surface).copied()),
        }
    }
}

/// Отложенные color reverts. При повторном flash одной поверхности запись
/// заменяется, но original цвет сохраняется от ПЕРВОГО flash — иначе revert
/// вернул бы цвет подсветки.
#[derive(Resource, Debug, Default)]
pub struct FeedbackTimers {
    queue: TimerQueue<SurfaceId>,
    originals: HashMap<SurfaceId, u32>,
}

impl FeedbackTimers {
    pub fn schedule_revert(&mut self, surface: SurfaceId, original: u32, due_at: f64) {
        self.originals.entry(surface).or_insert(original);
        self.queue.supersede(due_at, surface);
    }

    pub fn pop_due(&mut self, now: f64) -> Option<(SurfaceId, u32)> {
        while let Some(entry) = self.queue.pop_due(now) {
            if let Some(original) = self.originals.remove(&entry.key) {
                return Some((entry.key, original));
            }
        }
        None
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Разрешение instant hit для каждого принятого выстрела
pub fn resolve_instant_hits(
    mut fired: EventReader<WeaponFired>,
    scene: Res<SceneView>,
    mut index: ResMut<SceneIndex>,
    mut feedback: ResMut<FeedbackTimers>,
    mut landed: EventWriter<HitLanded>,
    mut reported: EventWriter<HitReported>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs_f64();
    for shot in fired.read() {
        let hits = scene.cast(shot.origin, shot.direction);
        let Some(surface) = index.first_valid_hit(&hits) else {
            continue; // Outcome: no hit
        };

        let (feedback_surface, owner) = index.attribution(surface);
        match owner {
            Some(TargetRef::Local(target)) => {
                landed.write(HitLanded {
                    target,
                    damage: shot.damage,
                    source: DamageSource::Hitscan,
                });
            }
            Some(TargetRef::Remote(id)) => {
                reported.write(HitReported {
                    target: id,
                    damage: shot.damage,
                });
            }
            // Нет damageable linkage — только feedback
            None => {}
        }

        // Transient подсветка, если поверхность colorable
        if let Some(original) = index.color(feedback_surface) {
            index.set_color(feedback_surface, HIT_HIGHLIGHT);
            feedback.schedule_revert(feedback_surface, original, now + HIT_FLASH_SECS);
        }
    }
}

/// Гашение подсветки внутри tick'а. Поверхность могла исчезнуть между
/// flash и revert — протухшая запись пропускается, не крашит.
pub fn fire_feedback_reverts(
    mut index: ResMut<SceneIndex>,
    mut feedback: ResMut<FeedbackTimers>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs_f64();
    while let Some((surface, original)) = feedback.pop_due(now) {
        if index.color(surface).is_some() {
            index.set_color(surface, original);
        }
    }
}
