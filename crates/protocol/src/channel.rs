use serde::{Deserialize, Serialize};

/// One physical quantity monitored or actuated on the node. Ids are
/// assigned by the node's wiring configuration and stay stable across
/// restarts, the gateway keys everything on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel(pub u8);

impl Channel {
    /// Marks a quantity that is not wired up on this node. Adapters
    /// skip it without reading or reporting anything.
    pub const NOT_CONFIGURED: Channel = Channel(255);

    #[must_use]
    pub fn is_configured(self) -> bool {
        self != Self::NOT_CONFIGURED
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_configured() {
            write!(f, "channel {}", self.0)
        } else {
            f.write_str("unconfigured channel")
        }
    }
}
