//! User preferences.
//!
//! Stored as a JSON blob under [`keys::SETTINGS`]. Durations are clamped to
//! 1..=90 minutes on every write, never rejected.

pub mod catalog;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::gateway::Entitlement;
use crate::storage::{keys, load_json, try_save_json, KeyValueStore};
use crate::timer::Mode;

pub const MIN_DURATION_MIN: u32 = 1;
pub const MAX_DURATION_MIN: u32 = 90;
pub const MIN_POMODOROS_UNTIL_LONG_BREAK: u32 = 1;
pub const MAX_POMODOROS_UNTIL_LONG_BREAK: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    System,
}

impl Default for ThemeMode {
    fn default() -> Self {
        ThemeMode::System
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_pomodoros_until_long_break")]
    pub pomodoros_until_long_break: u32,
    #[serde(default)]
    pub auto_start_next: bool,
    #[serde(default = "default_alarm_sound")]
    pub alarm_sound: String,
    #[serde(default = "default_ambient_sound")]
    pub ambient_sound: String,
    #[serde(default = "default_ambient_volume")]
    pub ambient_volume: f32,
    #[serde(default)]
    pub theme_mode: ThemeMode,
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
    /// Category for focus sessions recorded without a task.
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Client-side mirror of the entitlement. Not user-settable.
    #[serde(default)]
    pub is_premium: bool,
}

/// The slice of [`Settings`] the timer reads.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSettings {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub pomodoros_until_long_break: u32,
    pub auto_start_next: bool,
    pub alarm_sound: String,
    pub ambient_sound: String,
    pub ambient_volume: f32,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_pomodoros_until_long_break() -> u32 {
    4
}
fn default_alarm_sound() -> String {
    "bell".into()
}
fn default_ambient_sound() -> String {
    "rain".into()
}
fn default_ambient_volume() -> f32 {
    0.5
}
fn default_accent_color() -> String {
    catalog::ACCENT_PALETTE[0].into()
}
fn default_category() -> String {
    "work".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            pomodoros_until_long_break: default_pomodoros_until_long_break(),
            auto_start_next: false,
            alarm_sound: default_alarm_sound(),
            ambient_sound: default_ambient_sound(),
            ambient_volume: default_ambient_volume(),
            theme_mode: ThemeMode::default(),
            accent_color: default_accent_color(),
            default_category: default_category(),
            is_premium: false,
        }
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Settings::default().timer()
    }
}

pub fn clamp_duration(minutes: u32) -> u32 {
    minutes.clamp(MIN_DURATION_MIN, MAX_DURATION_MIN)
}

pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        default_ambient_volume()
    } else {
        volume.clamp(0.0, 1.0)
    }
}

impl TimerSettings {
    pub fn duration_minutes(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Focus => self.work_minutes,
            Mode::ShortBreak => self.short_break_minutes,
            Mode::LongBreak => self.long_break_minutes,
        }
    }

    pub fn duration_secs(&self, mode: Mode) -> u32 {
        self.duration_minutes(mode).saturating_mul(60)
    }
}

impl Settings {
    /// Load from the store, falling back to defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        load_json::<Settings>(store, keys::SETTINGS)
            .map(Settings::normalized)
            .unwrap_or_default()
    }

    /// Persist to the store.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        try_save_json(store, keys::SETTINGS, self)
    }

    /// Copy with every clamp applied.
    pub fn normalized(mut self) -> Self {
        self.work_minutes = clamp_duration(self.work_minutes);
        self.short_break_minutes = clamp_duration(self.short_break_minutes);
        self.long_break_minutes = clamp_duration(self.long_break_minutes);
        self.pomodoros_until_long_break = self
            .pomodoros_until_long_break
            .clamp(MIN_POMODOROS_UNTIL_LONG_BREAK, MAX_POMODOROS_UNTIL_LONG_BREAK);
        self.ambient_volume = clamp_volume(self.ambient_volume);
        if self.default_category.trim().is_empty() {
            self.default_category = default_category();
        }
        self
    }

    pub fn timer(&self) -> TimerSettings {
        TimerSettings {
            work_minutes: self.work_minutes,
            short_break_minutes: self.short_break_minutes,
            long_break_minutes: self.long_break_minutes,
            pomodoros_until_long_break: self.pomodoros_until_long_break,
            auto_start_next: self.auto_start_next,
            alarm_sound: self.alarm_sound.clone(),
            ambient_sound: self.ambient_sound.clone(),
            ambient_volume: self.ambient_volume,
        }
    }

    pub fn set_work_minutes(&mut self, minutes: u32) {
        self.work_minutes = clamp_duration(minutes);
    }

    pub fn set_short_break_minutes(&mut self, minutes: u32) {
        self.short_break_minutes = clamp_duration(minutes);
    }

    pub fn set_long_break_minutes(&mut self, minutes: u32) {
        self.long_break_minutes = clamp_duration(minutes);
    }

    /// Mirror the entitlement. Premium-only choices made earlier fall back
    /// to defaults when premium lapses.
    pub fn sync_entitlement(&mut self, entitlement: &Entitlement) {
        self.is_premium = entitlement.is_premium;
        if self.is_premium {
            return;
        }
        if catalog::alarm(&self.alarm_sound).map_or(true, |s| s.premium) {
            self.alarm_sound = default_alarm_sound();
        }
        if catalog::ambient(&self.ambient_sound).map_or(true, |s| s.premium) {
            self.ambient_sound = default_ambient_sound();
        }
        if !catalog::is_palette_accent(&self.accent_color) {
            self.accent_color = default_accent_color();
        }
    }

    /// Check sound and colour choices against the catalog and entitlement.
    pub fn validate(&self) -> Result<()> {
        let alarm = catalog::alarm(&self.alarm_sound).ok_or_else(|| invalid(
            "alarm_sound",
            format!("unknown alarm sound '{}'", self.alarm_sound),
        ))?;
        if alarm.premium && !self.is_premium {
            return Err(premium_required(format!("alarm sound '{}'", alarm.id)));
        }

        let ambient = catalog::ambient(&self.ambient_sound).ok_or_else(|| invalid(
            "ambient_sound",
            format!("unknown ambient sound '{}'", self.ambient_sound),
        ))?;
        if ambient.premium && !self.is_premium {
            return Err(premium_required(format!("ambient sound '{}'", ambient.id)));
        }

        if !catalog::is_hex_color(&self.accent_color) {
            return Err(invalid(
                "accent_color",
                format!("'{}' is not a #rrggbb colour", self.accent_color),
            ));
        }
        if !self.is_premium && !catalog::is_palette_accent(&self.accent_color) {
            return Err(premium_required("custom accent colour".to_string()));
        }
        Ok(())
    }

    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let unknown = || invalid(key, "unknown settings key".to_string());
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ValidationError::Empty("settings key").into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(key, format!("cannot parse '{value}' as bool")))?,
                ),
                serde_json::Value::Number(n) if n.is_u64() => {
                    // Out-of-range counts saturate; `normalized` applies the real bounds.
                    let n = value
                        .trim()
                        .parse::<i128>()
                        .map_err(|_| invalid(key, format!("cannot parse '{value}' as integer")))?;
                    let n = u32::try_from(n.max(0)).unwrap_or(u32::MAX);
                    serde_json::Value::Number(n.into())
                }
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<i64>() {
                        serde_json::Value::Number(n.into())
                    } else {
                        value
                            .parse::<f64>()
                            .ok()
                            .and_then(serde_json::Number::from_f64)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(key, format!("cannot parse '{value}' as number")))?
                    }
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Get a value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by key, applying clamps and premium checks.
    ///
    /// Leaves `self` untouched on error.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or read-only, the value cannot
    /// be parsed, or the choice requires premium.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if key == "is_premium" {
            return Err(invalid(key, "managed by the entitlement".to_string()));
        }
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Settings = serde_json::from_value(json)
            .map_err(|e| invalid(key, e.to_string()))?;
        let updated = updated.normalized();
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn invalid(field: &str, message: String) -> CoreError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message,
    }
    .into()
}

fn premium_required(feature: String) -> CoreError {
    CoreError::PremiumRequired { feature }
}
