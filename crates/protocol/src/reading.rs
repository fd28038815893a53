use core::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::Unit;

/// A single scalar measurement, produced fresh on every poll. Nothing
/// is stored beyond what the report schedules need for debouncing.
#[derive(strum::Display, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Reading {
    /// Offset-corrected temperature in Fahrenheit.
    Temperature(f32),
    /// Relative humidity.
    Humidity(f32),
    /// Pir tripped or not.
    Motion(bool),
    Lpg(u32),
    Co(u32),
    Smoke(u32),
    /// Last level applied to the dimmer output, in percent.
    DimmerLevel(u8),
}

impl Reading {
    #[must_use]
    pub fn unit(&self) -> Unit {
        match self {
            Reading::Temperature(_) => Unit::F,
            Reading::Humidity(_) => Unit::RH,
            Reading::Motion(_) => Unit::None,
            Reading::Lpg(_) | Reading::Co(_) | Reading::Smoke(_) => Unit::Ppm,
            Reading::DimmerLevel(_) => Unit::Percent,
        }
    }

    /// Domain the sensor can physically produce. Values outside it
    /// mean a misread, not an extreme measurement.
    #[must_use]
    pub fn range(&self) -> RangeInclusive<f32> {
        match self {
            Reading::Temperature(_) => -40.0..=176.0,
            Reading::Humidity(_) => 0.0..=100.0,
            Reading::Motion(_) => 0.0..=1.0,
            Reading::Lpg(_) | Reading::Co(_) | Reading::Smoke(_) => 0.0..=10_000.0,
            Reading::DimmerLevel(_) => 0.0..=100.0,
        }
    }

    /// NaN or out-of-range values fail here and must never be
    /// reported or fed into a report schedule.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match *self {
            Reading::Temperature(value) | Reading::Humidity(value) => {
                self.range().contains(&value)
            }
            Reading::Motion(_) => true,
            Reading::Lpg(ppm) | Reading::Co(ppm) | Reading::Smoke(ppm) => {
                self.range().contains(&(ppm as f32))
            }
            Reading::DimmerLevel(percent) => self.range().contains(&f32::from(percent)),
        }
    }

    /// The raw value as a float, for diagnostics.
    #[must_use]
    pub fn value(&self) -> f32 {
        match *self {
            Reading::Temperature(value) | Reading::Humidity(value) => value,
            Reading::Motion(tripped) => f32::from(u8::from(tripped)),
            Reading::Lpg(ppm) | Reading::Co(ppm) | Reading::Smoke(ppm) => ppm as f32,
            Reading::DimmerLevel(percent) => f32::from(percent),
        }
    }
}
