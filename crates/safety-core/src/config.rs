//! Engine settings.

use std::env;

use crate::clock::DayPolicy;

/// Tunable limits for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Emergency pings allowed per ordered pair per calendar day.
    pub emergency_daily_limit: u32,
    /// Where calendar days start for quota purposes.
    pub day_policy: DayPolicy,
    /// Rows returned by ping history.
    pub history_limit: i64,
    /// Check-in duration used when the caller gives none.
    pub default_checkin_minutes: i64,
    /// Rows returned by user search.
    pub search_limit: i64,
    /// Sessions handled per expiry sweep.
    pub sweep_batch_size: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            emergency_daily_limit: 3,
            day_policy: DayPolicy::utc(),
            history_limit: 50,
            default_checkin_minutes: 30,
            search_limit: 20,
            sweep_batch_size: 500,
        }
    }
}

impl EngineConfig {
    /// Load settings from environment variables, falling back to defaults.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SAFETY_EMERGENCY_DAILY_LIMIT` | 3 |
    /// | `SAFETY_DAY_OFFSET_MINUTES` | 0 (UTC) |
    /// | `SAFETY_HISTORY_LIMIT` | 50 |
    /// | `SAFETY_CHECKIN_DEFAULT_MINUTES` | 30 |
    /// | `SAFETY_SEARCH_LIMIT` | 20 |
    /// | `SAFETY_SWEEP_BATCH_SIZE` | 500 |
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(value) = env_parse::<u32>("SAFETY_EMERGENCY_DAILY_LIMIT") {
            config.emergency_daily_limit = value;
        }
        if let Some(minutes) = env_parse::<i32>("SAFETY_DAY_OFFSET_MINUTES") {
            match DayPolicy::with_offset_minutes(minutes) {
                Some(policy) => config.day_policy = policy,
                None => tracing::warn!(minutes, "Ignoring out-of-range SAFETY_DAY_OFFSET_MINUTES"),
            }
        }
        if let Some(value) = env_parse::<i64>("SAFETY_HISTORY_LIMIT") {
            if value > 0 {
                config.history_limit = value;
            }
        }
        if let Some(value) = env_parse::<i64>("SAFETY_CHECKIN_DEFAULT_MINUTES") {
            if value > 0 {
                config.default_checkin_minutes = value;
            }
        }
        if let Some(value) = env_parse::<i64>("SAFETY_SEARCH_LIMIT") {
            if value > 0 {
                config.search_limit = value;
            }
        }
        if let Some(value) = env_parse::<i64>("SAFETY_SWEEP_BATCH_SIZE") {
            if value > 0 {
                config.sweep_batch_size = value;
            }
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
    }
    parsed
}
