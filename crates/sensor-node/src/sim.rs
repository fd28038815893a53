use rand::rngs::ThreadRng;
use rand::Rng;
use tracing::debug;

use crate::sensors::dht::{DhtDriver, DhtSample};
use crate::sensors::dimmer::DimmerOutput;
use crate::sensors::gas::{GasDriver, GasSample};
use crate::sensors::motion::MotionDriver;

/// Stand ins for the real drivers so the node runs on a development
/// host. Wiring real hardware means implementing the driver traits
/// over the board's hal instead of these.
pub struct SimDht {
    rng: ThreadRng,
}

impl SimDht {
    #[must_use]
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for SimDht {
    fn default() -> Self {
        Self::new()
    }
}

impl DhtDriver for SimDht {
    fn sample(&mut self) -> DhtSample {
        // the real sensor occasionally fails a read and returns NaN
        if self.rng.random_bool(0.01) {
            return DhtSample {
                temperature: f32::NAN,
                humidity: f32::NAN,
            };
        }

        DhtSample {
            temperature: 68.0 + self.rng.random_range(-1.5..1.5),
            humidity: 42.0 + self.rng.random_range(-3.0..3.0),
        }
    }
}

pub struct SimPir {
    rng: ThreadRng,
    tripped: bool,
}

impl SimPir {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: rand::rng(),
            tripped: false,
        }
    }
}

impl Default for SimPir {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionDriver for SimPir {
    fn tripped(&mut self) -> bool {
        if self.rng.random_bool(0.05) {
            self.tripped = !self.tripped;
        }
        self.tripped
    }
}

pub struct SimMq {
    rng: ThreadRng,
}

impl SimMq {
    #[must_use]
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for SimMq {
    fn default() -> Self {
        Self::new()
    }
}

impl GasDriver for SimMq {
    fn sample(&mut self) -> GasSample {
        GasSample {
            lpg: self.rng.random_range(8..16),
            co: self.rng.random_range(0..4),
            smoke: self.rng.random_range(0..3),
        }
    }
}

/// Logs instead of driving a pwm pin.
pub struct SimDimmerPin;

impl DimmerOutput for SimDimmerPin {
    fn set_pwm(&mut self, value: u8) {
        debug!("pwm output now {value}");
    }
}
