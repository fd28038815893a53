#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

use core::fmt::Display;

mod channel;
mod msg;
mod reading;

pub use channel::Channel;
pub use msg::{DecodeMsgError, Msg, SetLevel, Update};
pub use reading::Reading;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    F,
    RH,
    Ppm,
    Percent,
    None, // for motion
}

impl Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Unit::F => f.write_str("°F"),
            Unit::RH => f.write_str("%RH"),
            Unit::Ppm => f.write_str("ppm"),
            Unit::Percent => f.write_str("%"),
            Unit::None => f.write_str(""),
        }
    }
}
