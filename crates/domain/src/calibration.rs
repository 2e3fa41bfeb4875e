//! Per-equipment calibration parsed from host properties.
//!
//! Battery voltages and radio levels come back from the vendor as raw
//! integers. Turning them into a percentage or a signal bucket requires
//! thresholds the host stores as string properties on each thing.

use crate::error::ValidationError;

/// Property holding the voltage of an empty battery.
pub const PROPERTY_BATTERY_MIN: &str = "batteryMin";
/// Property holding the voltage of a fresh battery.
pub const PROPERTY_BATTERY_MAX: &str = "batteryMax";
/// Property holding the voltage under which the battery is reported low.
pub const PROPERTY_BATTERY_LOW: &str = "batteryLow";
/// Property holding comma-separated signal thresholds.
pub const PROPERTY_SIGNAL_LEVELS: &str = "signalLevels";

/// Battery voltage range of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryCalibration {
    pub min: i64,
    pub max: i64,
    pub low: i64,
}

impl BatteryCalibration {
    /// Parse the calibration from the three battery properties.
    ///
    /// Returns `Ok(None)` when any property is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidProperty`] when a property is not an
    /// integer.
    pub fn from_properties<'a>(
        get: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<Option<Self>, ValidationError> {
        let (Some(min), Some(max), Some(low)) = (
            get(PROPERTY_BATTERY_MIN),
            get(PROPERTY_BATTERY_MAX),
            get(PROPERTY_BATTERY_LOW),
        ) else {
            return Ok(None);
        };
        Ok(Some(Self {
            min: parse_int(PROPERTY_BATTERY_MIN, min)?,
            max: parse_int(PROPERTY_BATTERY_MAX, max)?,
            low: parse_int(PROPERTY_BATTERY_LOW, low)?,
        }))
    }

    /// Battery level in percent, in `[0, 100]`.
    ///
    /// Freshly changed batteries may report more than `max`, so the raw value
    /// is clamped into `[min, max]` first. Returns `None` for a degenerate
    /// range (`max <= min`).
    #[must_use]
    pub fn percent(&self, raw: i64) -> Option<i64> {
        if self.max <= self.min {
            return None;
        }
        let corrected = i128::from(raw.clamp(self.min, self.max));
        let (min, max) = (i128::from(self.min), i128::from(self.max));
        i64::try_from(100 * (corrected - min) / (max - min)).ok()
    }

    #[must_use]
    pub fn is_low(&self, raw: i64) -> bool {
        raw < self.low
    }
}

/// Thresholds used to bucket a raw radio/wifi level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalThresholds(Vec<i64>);

impl SignalThresholds {
    #[must_use]
    pub fn new(levels: Vec<i64>) -> Self {
        Self(levels)
    }

    /// Parse the comma-separated `signalLevels` property.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidProperty`] when an entry is not an
    /// integer.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| parse_int(PROPERTY_SIGNAL_LEVELS, part))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Bucket of `raw`: the index of the first threshold `raw` is strictly
    /// greater than, or the number of thresholds when there is none.
    #[must_use]
    pub fn bucket(&self, raw: i64) -> usize {
        self.0
            .iter()
            .position(|threshold| raw > *threshold)
            .unwrap_or(self.0.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn parse_int(property: &str, value: &str) -> Result<i64, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidProperty {
            property: property.to_string(),
            value: value.to_string(),
        })
}
