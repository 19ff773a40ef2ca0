//! Work/break durations and presets.
//!
//! Durations are configured as independent hour/minute/second fields per
//! mode. Bad input never raises: a negative or non-numeric field simply
//! contributes 0.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{DatabaseError, ValidationError};
use crate::storage::keys;
use crate::storage::SettingsStore;

/// The two interval kinds the timer cycles between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    #[default]
    Work,
    Break,
}

impl TimerMode {
    pub fn as_key(&self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::Break => "break",
        }
    }

    /// Anything other than "break" is treated as work.
    pub fn from_setting(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("break") {
            TimerMode::Break
        } else {
            TimerMode::Work
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for TimerMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(TimerMode::Work),
            "break" => Ok(TimerMode::Break),
            _ => Err(ValidationError::InvalidValue {
                field: "timer_mode",
                value: s.to_string(),
            }),
        }
    }
}

/// One mode's duration as separately configured fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DurationParts {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl DurationParts {
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    pub fn minutes(minutes: u32) -> Self {
        Self::new(0, minutes, 0)
    }

    /// Build from raw text fields, degrading each bad field to 0.
    pub fn parse_lenient(hours: &str, minutes: &str, seconds: &str) -> Self {
        Self::new(
            lenient_field(hours),
            lenient_field(minutes),
            lenient_field(seconds),
        )
    }

    /// `hours*3600 + minutes*60 + seconds`.
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }
}

fn lenient_field(raw: &str) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(v) if v > 0 => u32::try_from(v).unwrap_or(u32::MAX),
        _ => 0,
    }
}

/// Named presets. Applying one overwrites only the minute fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    /// 25 min focus / 5 min break
    Classic,
    /// 50 min focus / 10 min break
    Extended,
}

impl Preset {
    /// (work minutes, break minutes)
    pub fn minutes(&self) -> (u32, u32) {
        match self {
            Preset::Classic => (25, 5),
            Preset::Extended => (50, 10),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Preset::Classic => "25 min focus / 5 min break",
            Preset::Extended => "50 min focus / 10 min break",
        }
    }
}

impl FromStr for Preset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "25-5" | "25/5" | "classic" => Ok(Preset::Classic),
            "50-10" | "50/10" | "extended" => Ok(Preset::Extended),
            other => Err(ValidationError::InvalidValue {
                field: "preset",
                value: other.to_string(),
            }),
        }
    }
}

/// Work and break durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub work: DurationParts,
    /// Break-mode duration.
    pub rest: DurationParts,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work: DurationParts::minutes(25),
            rest: DurationParts::minutes(10),
        }
    }
}

impl TimerConfig {
    pub fn new(work: DurationParts, rest: DurationParts) -> Self {
        Self { work, rest }
    }

    pub fn duration(&self, mode: TimerMode) -> DurationParts {
        match mode {
            TimerMode::Work => self.work,
            TimerMode::Break => self.rest,
        }
    }

    pub fn duration_mut(&mut self, mode: TimerMode) -> &mut DurationParts {
        match mode {
            TimerMode::Work => &mut self.work,
            TimerMode::Break => &mut self.rest,
        }
    }

    pub fn duration_seconds(&self, mode: TimerMode) -> u64 {
        self.duration(mode).total_seconds()
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        let (work, rest) = preset.minutes();
        self.work.minutes = work;
        self.rest.minutes = rest;
    }

    /// Read the six duration settings, using `defaults` for unset keys.
    ///
    /// Store failures are logged and fall back to the default for that field.
    pub fn load<S: SettingsStore + ?Sized>(store: &S, defaults: TimerConfig) -> Self {
        let field = |key: &str, default: u32| -> String {
            store
                .get_setting(key, &default.to_string())
                .unwrap_or_else(|e| {
                    warn!(key, error = %e, "failed to read duration setting");
                    default.to_string()
                })
        };
        let read = |[h, m, s]: [&str; 3], d: DurationParts| {
            DurationParts::parse_lenient(
                &field(h, d.hours),
                &field(m, d.minutes),
                &field(s, d.seconds),
            )
        };
        Self {
            work: read(keys::WORK_FIELDS, defaults.work),
            rest: read(keys::BREAK_FIELDS, defaults.rest),
        }
    }

    /// Persist all six duration fields.
    pub fn save<S: SettingsStore + ?Sized>(&self, store: &S) -> Result<(), DatabaseError> {
        for (fields, parts) in [(keys::WORK_FIELDS, self.work), (keys::BREAK_FIELDS, self.rest)] {
            let [h, m, s] = fields;
            store.set_setting(h, &parts.hours.to_string())?;
            store.set_setting(m, &parts.minutes.to_string())?;
            store.set_setting(s, &parts.seconds.to_string())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn total_seconds_is_exact(h in 0u32..1000, m in 0u32..10_000, s in 0u32..100_000) {
            let parts = DurationParts::parse_lenient(&h.to_string(), &m.to_string(), &s.to_string());
            prop_assert_eq!(
                parts.total_seconds(),
                u64::from(h) * 3600 + u64::from(m) * 60 + u64::from(s)
            );
        }

        #[test]
        fn unparseable_field_contributes_zero(m in 0u32..10_000, junk in "[a-z]{1,6}") {
            let parts = DurationParts::parse_lenient(&junk, &m.to_string(), "");
            prop_assert_eq!(parts.total_seconds(), u64::from(m) * 60);
        }
    }

    #[test]
    fn negative_fields_degrade_to_zero() {
        let parts = DurationParts::parse_lenient("-1", "5", "-30");
        assert_eq!(parts.total_seconds(), 300);
    }

    #[test]
    fn preset_overwrites_minutes_only() {
        let mut cfg = TimerConfig::new(DurationParts::new(1, 7, 30), DurationParts::new(0, 3, 15));
        cfg.apply_preset(Preset::Extended);
        assert_eq!(cfg.work, DurationParts::new(1, 50, 30));
        assert_eq!(cfg.rest, DurationParts::new(0, 10, 15));
    }

    #[test]
    fn load_uses_defaults_for_missing_and_zero_for_garbage() {
        let store = MemoryStore::default();
        store.set_setting("work_m", "40").unwrap();
        store.set_setting("break_s", "soon").unwrap();

        let cfg = TimerConfig::load(&store, TimerConfig::default());
        assert_eq!(cfg.work, DurationParts::minutes(40));
        assert_eq!(cfg.rest, DurationParts::minutes(10));
        assert_eq!(cfg.duration_seconds(TimerMode::Break), 600);
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryStore::default();
        let cfg = TimerConfig::new(DurationParts::new(0, 45, 10), DurationParts::new(0, 7, 0));
        cfg.save(&store).unwrap();
        assert_eq!(TimerConfig::load(&store, TimerConfig::default()), cfg);
    }

    #[test]
    fn mode_from_setting_defaults_to_work() {
        assert_eq!(TimerMode::from_setting("break"), TimerMode::Break);
        assert_eq!(TimerMode::from_setting("nap"), TimerMode::Work);
        assert!("nap".parse::<TimerMode>().is_err());
    }
}
