use std::fmt::Formatter;
use std::time::Duration;

use serde::de::Visitor;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use tracing::warn;

use crate::Result;

/// Periodic task intervals. Zero disables a task.
///
/// Values are read leniently: a number of milliseconds, a numeric string, or
/// a duration string such as `500ms`, `10s`, `2m`, `1h` or `1m30s`. Anything
/// else is treated as zero and kept in [`SchedulerConfig::rejected`], so a bad
/// value never aborts startup. [`SchedulerConfig::validate`] logs the rejects;
/// call it once logging is up.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(from = "RawSchedulerConfig")]
pub struct SchedulerConfig {
    /// Default: 0 (disabled)
    pub snapshot_interval_in_ms: u64,

    /// Default: 0 (disabled)
    pub broadcast_interval_in_ms: u64,

    /// `(field, raw value)` of every interval that could not be parsed
    #[serde(skip)]
    pub rejected: Vec<(String, String)>,
}

impl SchedulerConfig {
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_in_ms)
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_in_ms)
    }

    /// Keeps rejects from an earlier load whose field is still disabled, so a
    /// later override layer does not hide them.
    pub(super) fn carry_rejected(
        &mut self,
        previous: &SchedulerConfig,
    ) {
        for (field, raw) in &previous.rejected {
            let still_disabled = match field.as_str() {
                "snapshot_interval_in_ms" => self.snapshot_interval_in_ms == 0,
                "broadcast_interval_in_ms" => self.broadcast_interval_in_ms == 0,
                _ => false,
            };
            if still_disabled && !self.rejected.iter().any(|(f, _)| f == field) {
                self.rejected.push((field.clone(), raw.clone()));
            }
        }
    }

    /// Never fails; reports rejected intervals.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in &self.rejected {
            warn!(field = %field, value = %value, "invalid interval, task disabled");
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawSchedulerConfig {
    #[serde(default)]
    snapshot_interval_in_ms: IntervalSetting,
    #[serde(default)]
    broadcast_interval_in_ms: IntervalSetting,
}

impl From<RawSchedulerConfig> for SchedulerConfig {
    fn from(raw: RawSchedulerConfig) -> Self {
        let mut config = SchedulerConfig::default();
        config.snapshot_interval_in_ms = raw
            .snapshot_interval_in_ms
            .resolve("snapshot_interval_in_ms", &mut config.rejected);
        config.broadcast_interval_in_ms = raw
            .broadcast_interval_in_ms
            .resolve("broadcast_interval_in_ms", &mut config.rejected);
        config
    }
}

/// One interval as written by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum IntervalSetting {
    #[default]
    Unset,
    Millis(u64),
    Invalid(String),
}

impl IntervalSetting {
    fn resolve(
        self,
        field: &str,
        rejected: &mut Vec<(String, String)>,
    ) -> u64 {
        match self {
            IntervalSetting::Unset => 0,
            IntervalSetting::Millis(ms) => ms,
            IntervalSetting::Invalid(raw) => {
                rejected.push((field.to_string(), raw));
                0
            }
        }
    }
}

/// Parses `500`, `500ms`, `10s`, `2m`, `1h`, `1m30s` into milliseconds.
/// A bare number is milliseconds.
pub fn parse_interval_ms(input: &str) -> Option<u64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(ms) = input.parse::<u64>() {
        return Some(ms);
    }

    let mut total: u64 = 0;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let amount: u64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let factor = match rest[..unit_len].trim() {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            _ => return None,
        };
        rest = &rest[unit_len..];

        total = total.checked_add(amount.checked_mul(factor)?)?;
    }
    Some(total)
}

impl<'de> Deserialize<'de> for IntervalSetting {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(IntervalVisitor)
    }
}

struct IntervalVisitor;

impl<'de> Visitor<'de> for IntervalVisitor {
    type Value = IntervalSetting;

    fn expecting(
        &self,
        f: &mut Formatter,
    ) -> std::fmt::Result {
        write!(f, "milliseconds or a duration string like \"10s\"")
    }

    fn visit_u64<E>(
        self,
        v: u64,
    ) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(IntervalSetting::Millis(v))
    }

    fn visit_i64<E>(
        self,
        v: i64,
    ) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(match u64::try_from(v) {
            Ok(ms) => IntervalSetting::Millis(ms),
            Err(_) => IntervalSetting::Invalid(v.to_string()),
        })
    }

    fn visit_f64<E>(
        self,
        v: f64,
    ) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        if v.is_finite() && v >= 0.0 {
            Ok(IntervalSetting::Millis(v as u64))
        } else {
            Ok(IntervalSetting::Invalid(v.to_string()))
        }
    }

    fn visit_str<E>(
        self,
        v: &str,
    ) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(match parse_interval_ms(v) {
            Some(ms) => IntervalSetting::Millis(ms),
            None => IntervalSetting::Invalid(v.to_string()),
        })
    }

    fn visit_bool<E>(
        self,
        v: bool,
    ) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(IntervalSetting::Invalid(v.to_string()))
    }

    fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(IntervalSetting::Unset)
    }

    fn visit_none<E>(self) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(IntervalSetting::Unset)
    }
}
