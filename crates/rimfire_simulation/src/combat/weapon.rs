//! Weapon controller — fire gating, reload sequencing, aim/recoil blending
//!
//! Архитектура:
//! - ECS хранит: WeaponState (ammo, cooldown, reload, aim) + WeaponPose (косметика)
//! - Внешние layers: input пишет intents (FireIntent/ReloadIntent/AimIntent),
//!   render читает WeaponPose/MuzzleFlash, audio читает AudioCue
//! - Отложенные эффекты (flash hide, reload finish) — записи в WeaponTimers,
//!   срабатывают внутри FixedUpdate pass, не через host timers
//!
//! Принятый выстрел порождает РОВНО ОДНО событие WeaponFired; его читают
//! hitscan resolver (local-authoritative урон), tracer spawner и network flush
//! (информационное уведомление) — всегда вместе.

use bevy::prelude::*;
use rand::Rng;

use crate::combat::timers::TimerQueue;
use crate::components::{MoveState, ViewPoint};
use crate::DeterministicRng;

// === Тюнинг прототипа ===

/// Hip-fire позиция оружия относительно камеры
pub const HIP_POSITION: Vec3 = Vec3::new(0.25, -0.3, -0.5);
/// ADS позиция (по центру, мушка под прицелом)
pub const ADS_POSITION: Vec3 = Vec3::new(0.0, -0.165, -0.4);

/// Скорость сходимости ADS blend (1/сек)
pub const ADS_RATE: f32 = 15.0;
/// Скорость восстановления recoil offset'ов к rest pose (1/сек)
pub const RECOVERY_RATE: f32 = 10.0;

/// Recoil impulse: kick назад по z
pub const RECOIL_KICK: f32 = 0.15;
/// Recoil impulse: muzzle climb по x (радианы)
pub const RECOIL_CLIMB: f32 = 0.1;

/// Наклон оружия во время перезарядки (радианы)
pub const RELOAD_TILT_X: f32 = std::f32::consts::FRAC_PI_4;
pub const RELOAD_TILT_Z: f32 = -std::f32::consts::FRAC_PI_4;

/// Sway ходьбы: период фазы (сек) и амплитуда; фаза привязана к wall-clock
pub const SWAY_PERIOD: f32 = 0.15;
pub const SWAY_AMPLITUDE: f32 = 0.005;

/// Magazine bob во время перезарядки (косметика)
pub const MAG_BOB_PERIOD: f32 = 0.1;
pub const MAG_BOB_AMPLITUDE: f32 = 0.05;

/// FOV: hip / ADS, скорость сходимости, epsilon отсечки
pub const BASE_FOV: f32 = 75.0;
pub const ADS_FOV: f32 = 50.0;
pub const FOV_RATE: f32 = 15.0;
pub const FOV_EPSILON: f32 = 0.1;

/// Окно видимости muzzle flash (сек)
pub const MUZZLE_FLASH_SECS: f64 = 0.05;

/// Результат try_fire: отказ — тихий no-op, код причины для вызывающего
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireResult {
    Fired,
    /// Перезарядка в процессе (запрос отклонён, не поставлен в очередь)
    Reloading,
    /// Магазин пуст
    Empty,
    /// fire_cooldown ещё не истёк
    CoolingDown,
}

impl FireResult {
    pub fn accepted(self) -> bool {
        self == FireResult::Fired
    }
}

/// Состояние оружия local игрока
///
/// Инварианты:
/// - ammo уменьшается только на принятом выстреле, сбрасывается в max_ammo
///   только по завершению перезарядки
/// - fire/reload запросы во время перезарядки отклоняются, не queue'ятся
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(WeaponPose, MuzzleFlash, WeaponTimers)]
pub struct WeaponState {
    pub ammo: u32,
    pub max_ammo: u32,
    /// Минимум секунд между принятыми выстрелами
    pub fire_cooldown: f64,
    /// Полная длительность перезарядки (сек)
    pub reload_duration: f64,
    /// Урон одного instant hit
    pub hitscan_damage: u32,
    pub is_reloading: bool,
    pub is_aiming: bool,
    /// Timestamp последнего принятого выстрела (монотонные секунды)
    pub last_fire_at: f64,
}

impl Default for WeaponState {
    fn default() -> Self {
        Self::rifle()
    }
}

impl WeaponState {
    /// Автомат прототипа: 30 патронов, 10 выстрелов/сек, 1.5 сек перезарядка
    pub fn rifle() -> Self {
        Self {
            ammo: 30,
            max_ammo: 30,
            fire_cooldown: 0.1,
            reload_duration: 1.5,
            hitscan_damage: 20,
            is_reloading: false,
            is_aiming: false,
            last_fire_at: f64::NEG_INFINITY,
        }
    }

    /// Гейт выстрела. Порядок проверок: reload → ammo → cooldown.
    /// На принятии уменьшает ammo и штампует last_fire_at.
    pub fn try_fire(&mut self, now: f64) -> FireResult {
        if self.is_reloading {
            return FireResult::Reloading;
        }
        if self.ammo == 0 {
            return FireResult::Empty;
        }
        if now - self.last_fire_at < self.fire_cooldown {
            return FireResult::CoolingDown;
        }

        self.ammo -= 1;
        self.last_fire_at = now;
        FireResult::Fired
    }

    /// Начать перезарядку. false если уже перезаряжается или магазин полон.
    /// Завершение планирует система через WeaponTimers.
    pub fn start_reload(&mut self) -> bool {
        if self.is_reloading || self.ammo == self.max_ammo {
            return false;
        }
        self.is_reloading = true;
        true
    }

    /// Завершение перезарядки (вызывает timer система)
    pub fn finish_reload(&mut self) {
        self.ammo = self.max_ammo;
        self.is_reloading = false;
    }
}

/// Косметический выход контроллера: поза оружия относительно камеры
///
/// Render layer читает как есть; все поля сходятся экспоненциальным
/// blend'ом `value += (target - value) * rate * delta` (frame-rate independent).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct WeaponPose {
    /// Текущая позиция (hip ↔ ADS + recoil kick + sway)
    pub position: Vec3,
    /// Euler offsets (x: muzzle climb / reload tilt, z: reload tilt)
    pub rotation: Vec3,
    /// 0 = hip fire, 1 = полный ADS
    pub ads_blend: f32,
    /// Текущий FOV камеры (camera layer применяет к проекции)
    pub fov: f32,
    /// Смещение магазина вниз во время перезарядки (косметика)
    pub magazine_drop: f32,
}

impl Default for WeaponPose {
    fn default() -> Self {
        Self {
            position: HIP_POSITION,
            rotation: Vec3::ZERO,
            ads_blend: 0.0,
            fov: BASE_FOV,
            magazine_drop: 0.0,
        }
    }
}

impl WeaponPose {
    /// Per-tick сходимость позы.
    ///
    /// `now` — wall-clock секунды (фаза sway и mag bob привязаны к нему,
    /// не к накопленному delta — частота не плывёт с frame rate).
    pub fn tick(&mut self, weapon: &WeaponState, delta: f32, now: f32, moving: bool) {
        // ADS blend
        let ads_target = if weapon.is_aiming { 1.0 } else { 0.0 };
        self.ads_blend += (ads_target - self.ads_blend) * ADS_RATE * delta;

        // Recoil recovery: rest pose = hip ↔ ADS по текущему blend
        let rest = HIP_POSITION.lerp(ADS_POSITION, self.ads_blend);
        self.position += (rest - self.position) * RECOVERY_RATE * delta;

        // Rotation recovery; во время перезарядки цель — tilt pose
        let (target_x, target_z) = if weapon.is_reloading {
            (RELOAD_TILT_X, RELOAD_TILT_Z)
        } else {
            (0.0, 0.0)
        };
        self.rotation.x += (target_x - self.rotation.x) * RECOVERY_RATE * delta;
        self.rotation.y += (0.0 - self.rotation.y) * RECOVERY_RATE * delta;
        self.rotation.z += (target_z - self.rotation.z) * RECOVERY_RATE * delta;

        // Walking sway — только hip fire в движении
        if moving && !weapon.is_aiming && !weapon.is_reloading {
            let phase = now / SWAY_PERIOD;
            self.position.x += phase.sin() * SWAY_AMPLITUDE;
            self.position.y += (phase * 2.0).sin().abs() * SWAY_AMPLITUDE;
        }

        // Magazine bob (косметика перезарядки)
        self.magazine_drop = if weapon.is_reloading {
            (now / MAG_BOB_PERIOD).sin() * MAG_BOB_AMPLITUDE
        } else {
            0.0
        };

        // FOV: epsilon отсекает бесконечное дописывание возле цели
        let fov_target = if weapon.is_aiming { ADS_FOV } else { BASE_FOV };
        if (self.fov - fov_target).abs() > FOV_EPSILON {
            self.fov += (fov_target - self.fov) * FOV_RATE * delta;
        }
    }
}

/// Окно muzzle flash; roll рандомизируется на каждый выстрел
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct MuzzleFlash {
    pub visible: bool,
    /// Поворот flash-спрайта вокруг ствола (радианы)
    pub roll: f32,
}

/// Отложенные эффекты оружия (flash hide, reload finish)
#[derive(Component, Debug, Clone, Default)]
pub struct WeaponTimers(pub TimerQueue<WeaponTimerKind>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponTimerKind {
    HideFlash,
    FinishReload,
}

// === Intents (пишет input layer) ===

#[derive(Event, Debug, Clone)]
pub struct FireIntent {
    pub shooter: Entity,
}

#[derive(Event, Debug, Clone)]
pub struct ReloadIntent {
    pub shooter: Entity,
}

/// Чистый toggle, идемпотентен
#[derive(Event, Debug, Clone)]
pub struct AimIntent {
    pub shooter: Entity,
    pub aiming: bool,
}

// === Исходящие события ===

/// Принятый локальный выстрел (ровно одно на выстрел)
#[derive(Event, Debug, Clone)]
pub struct WeaponFired {
    pub shooter: Entity,
    /// Позиция взгляда на момент выстрела
    pub origin: Vec3,
    /// Направление взгляда на момент выстрела
    pub direction: Vec3,
    pub damage: u32,
}

#[derive(Event, Debug, Clone)]
pub struct ReloadCompleted {
    pub shooter: Entity,
}

/// Звуковая подсказка для audio layer
#[derive(Event, Debug, Clone)]
pub struct AudioCue {
    pub shooter: Entity,
    pub kind: AudioCueKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCueKind {
    Shot,
    Reload,
}

// === Системы ===

/// Срабатывание отложенных эффектов оружия внутри tick'а
pub fn fire_weapon_timers(
    mut weapons: Query<(Entity, &mut WeaponState, &mut MuzzleFlash, &mut WeaponTimers)>,
    mut completed: EventWriter<ReloadCompleted>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs_f64();
    for (entity, mut weapon, mut flash, mut timers) in weapons.iter_mut() {
        while let Some(entry) = timers.0.pop_due(now) {
            match entry.key {
                WeaponTimerKind::HideFlash => flash.visible = false,
                WeaponTimerKind::FinishReload => {
                    weapon.finish_reload();
                    completed.write(ReloadCompleted { shooter: entity });
                    crate::log(&format!(
                        "Reload complete: {:?} ({}/{} rounds)",
                        entity, weapon.ammo, weapon.max_ammo
                    ));
                }
            }
        }
    }
}

pub fn process_aim_intents(
    mut intents: EventReader<AimIntent>,
    mut weapons: Query<&mut WeaponState>,
) {
    for intent in intents.read() {
        if let Ok(mut weapon) = weapons.get_mut(intent.shooter) {
            weapon.is_aiming = intent.aiming;
        }
    }
}

pub fn process_reload_intents(
    mut intents: EventReader<ReloadIntent>,
    mut weapons: Query<(&mut WeaponState, &mut WeaponTimers)>,
    mut cues: EventWriter<AudioCue>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs_f64();
    for intent in intents.read() {
        let Ok((mut weapon, mut timers)) = weapons.get_mut(intent.shooter) else {
            continue;
        };
        // Отказ (уже перезаряжается / магазин полон) — тихий no-op
        if !weapon.start_reload() {
            continue;
        }

        timers
            .0
            .supersede(now + weapon.reload_duration, WeaponTimerKind::FinishReload);
        cues.write(AudioCue {
            shooter: intent.shooter,
            kind: AudioCueKind::Reload,
        });
        crate::log(&format!("Reload started: {:?}", intent.shooter));
    }
}

pub fn process_fire_intents(
    mut intents: EventReader<FireIntent>,
    mut shooters: Query<(
        &mut WeaponState,
        &mut WeaponPose,
        &mut MuzzleFlash,
        &mut WeaponTimers,
        &ViewPoint,
    )>,
    mut fired: EventWriter<WeaponFired>,
    mut cues: EventWriter<AudioCue>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs_f64();
    for intent in intents.read() {
        let Ok((mut weapon, mut pose, mut flash, mut timers, view)) =
            shooters.get_mut(intent.shooter)
        else {
            continue;
        };
        // Отказ — тихий no-op; причину вызывающий читает из состояния
        if !weapon.try_fire(now).accepted() {
            continue;
        }

        // Recoil impulse; recovery — в update_weapon_pose
        pose.position.z += RECOIL_KICK;
        pose.rotation.x += RECOIL_CLIMB;

        // Muzzle flash window со случайным roll
        flash.visible = true;
        flash.roll = rng.rng.gen_range(0.0..std::f32::consts::PI);
        timers
            .0
            .supersede(now + MUZZLE_FLASH_SECS, WeaponTimerKind::HideFlash);

        cues.write(AudioCue {
            shooter: intent.shooter,
            kind: AudioCueKind::Shot,
        });
        fired.write(WeaponFired {
            shooter: intent.shooter,
            origin: view.position,
            direction: view.forward,
            damage: weapon.hitscan_damage,
        });
    }
}

/// Per-tick сходимость позы (ADS, recoil recovery, sway, FOV)
pub fn update_weapon_pose(
    mut weapons: Query<(&WeaponState, &mut WeaponPose, Option<&MoveState>)>,
    time: Res<Time>,
) {
    let delta = time.delta_secs();
    let now = time.elapsed_secs();
    for (weapon, mut pose, motion) in weapons.iter_mut() {
        let moving = motion.map(|m| m.moving).unwrap_or(false);
        pose.tick(weapon, delta, now, moving);
    }
}
