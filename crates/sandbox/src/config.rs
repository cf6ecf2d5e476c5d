//! Sandbox configuration (timing, pools, ammo, weapons, platform). Loaded
//! from sandbox.ron at startup.

use combat::{AmmoProfile, AmmoTable, AmmoType, ImpactSettings};
use glam::Vec3;
use motion::{MotionCurve, PidSettings, PlatformSettings, RampSettings};
use pooling::{PrototypeId, PrototypeSpec};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::weapons::{WeaponConfig, WeaponKind};

/// Multipliers for one ammo letter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmmoOverride {
    pub ammo: char,
    #[serde(default = "default_multiplier")]
    pub damage_multiplier: f32,
    #[serde(default = "default_multiplier")]
    pub impact_multiplier: f32,
}

fn default_multiplier() -> f32 {
    1.0
}

/// Settings for the headless sandbox run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Number of fixed steps to simulate.
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    /// Step rate in Hz.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: f64,
    /// Seed for decal selection and spin.
    #[serde(default = "default_seed")]
    pub seed: u32,
    /// One pool per decal variant.
    #[serde(default = "default_decal_pools")]
    pub decal_pools: Vec<PrototypeSpec>,
    #[serde(default = "default_effect_pool")]
    pub effect_pool: PrototypeSpec,
    /// Visual for beam weapons, moved along with the beam while it fires.
    #[serde(default = "default_beam_pool")]
    pub beam_pool: PrototypeSpec,
    #[serde(default)]
    pub impact: ImpactSettings,
    #[serde(default)]
    pub ammo: Vec<AmmoOverride>,
    #[serde(default = "default_weapons")]
    pub weapons: Vec<WeaponConfig>,
    #[serde(default = "default_platform")]
    pub platform: PlatformSettings,
    /// Controller for the cart that follows the platform.
    #[serde(default = "default_follower_pid")]
    pub follower_pid: PidSettings,
    #[serde(default)]
    pub follower_ramp: RampSettings,
}

fn default_ticks() -> u32 {
    600
}
fn default_tick_rate() -> f64 {
    60.0
}
fn default_seed() -> u32 {
    1
}
fn default_decal_pools() -> Vec<PrototypeSpec> {
    (0..3)
        .map(|i| PrototypeSpec::new(PrototypeId(100 + i), 4, 16).with_despawn_after(4.0))
        .collect()
}
fn default_effect_pool() -> PrototypeSpec {
    PrototypeSpec::new(PrototypeId(200), 4, 8).with_despawn_after(0.5)
}
fn default_beam_pool() -> PrototypeSpec {
    PrototypeSpec::new(PrototypeId(300), 1, 2).with_despawn_after(0.25)
}
fn default_weapons() -> Vec<WeaponConfig> {
    vec![
        WeaponConfig {
            name: "rifle".into(),
            kind: WeaponKind::Projectile,
            base_damage: 25.0,
            base_impulse: 4.0,
            damage_per_second: 0.0,
            range: 100.0,
            spread_degrees: 1.5,
            fire_rate: 8.0,
            ammo: 'A',
        },
        WeaponConfig {
            name: "cutter".into(),
            kind: WeaponKind::Beam,
            base_damage: 0.0,
            base_impulse: 0.0,
            damage_per_second: 40.0,
            range: 30.0,
            spread_degrees: 0.0,
            fire_rate: 60.0,
            ammo: 'B',
        },
    ]
}
fn default_platform() -> PlatformSettings {
    PlatformSettings {
        waypoints: vec![Vec3::new(-6.0, 0.5, -12.0), Vec3::new(6.0, 0.5, -12.0)],
        average_speed: 3.0,
        start_wait_time: 0.5,
        end_wait_time: 0.5,
        curve: MotionCurve::EaseInOut,
        spin_speed: 45.0,
        ..Default::default()
    }
}
fn default_follower_pid() -> PidSettings {
    PidSettings {
        p_gain: 0.8,
        i_gain: 0.05,
        d_gain: 0.6,
        ..Default::default()
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            tick_rate: default_tick_rate(),
            seed: default_seed(),
            decal_pools: default_decal_pools(),
            effect_pool: default_effect_pool(),
            beam_pool: default_beam_pool(),
            impact: ImpactSettings::default(),
            ammo: Vec::new(),
            weapons: default_weapons(),
            platform: default_platform(),
            follower_pid: default_follower_pid(),
            follower_ramp: RampSettings::default(),
        }
    }
}

impl SandboxConfig {
    /// Load config from `sandbox.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(data) => Self::parse(&data).unwrap_or_else(|e| {
                log::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                Self::default()
            }),
            Err(_) => {
                log::info!("No config at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    pub fn parse(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    /// Save current config to `sandbox.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(&path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }

    /// Ammo table with the configured overrides. Unknown letters are logged
    /// and skipped.
    pub fn ammo_table(&self) -> AmmoTable {
        let overrides: Vec<(AmmoType, AmmoProfile)> = self
            .ammo
            .iter()
            .filter_map(|o| match AmmoType::from_letter(o.ammo) {
                Some(ammo_type) => Some((
                    ammo_type,
                    AmmoProfile {
                        damage_multiplier: o.damage_multiplier,
                        impact_multiplier: o.impact_multiplier,
                    },
                )),
                None => {
                    log::warn!("Ignoring ammo override for unknown type {:?}", o.ammo);
                    None
                }
            })
            .collect();
        AmmoTable::from_overrides(&overrides)
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("sandbox.ron")
}
