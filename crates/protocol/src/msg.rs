use serde::{Deserialize, Serialize};

use crate::{Channel, Reading};

/// One sensor value bound for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub channel: Channel,
    pub reading: Reading,
}

/// Gateway order to move the dimmer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetLevel {
    pub channel: Channel,
    pub percent: u8,
}

/// Everything that crosses the radio link, one byte of message type
/// followed by the postcard encoded body.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Update(Update),
    Ack,
    SetLevel(SetLevel),
}

impl Msg {
    pub const UPDATE: u8 = 1;
    pub const ACK: u8 = 2;
    pub const SET_LEVEL: u8 = 3;

    #[must_use]
    pub fn header(&self) -> u8 {
        match self {
            Msg::Update(_) => Self::UPDATE,
            Msg::Ack => Self::ACK,
            Msg::SetLevel(_) => Self::SET_LEVEL,
        }
    }

    /// Whether this frame acknowledges a previously transmitted
    /// update. The sender only ever inspects incoming frames through
    /// this.
    #[must_use]
    pub fn is_ack(&self) -> bool {
        matches!(self, Msg::Ack)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeMsgError> {
        let [msg_type, body @ ..] = bytes else {
            return Err(DecodeMsgError::EmptyFrame);
        };

        match *msg_type {
            Self::UPDATE => postcard::from_bytes(body)
                .map(Self::Update)
                .map_err(DecodeMsgError::CorruptEncoding),
            Self::ACK => Ok(Self::Ack),
            Self::SET_LEVEL => postcard::from_bytes(body)
                .map(Self::SetLevel)
                .map_err(DecodeMsgError::CorruptEncoding),
            other => Err(DecodeMsgError::IncorrectMsgType(other)),
        }
    }

    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = match self {
            Msg::Update(update) => {
                postcard::to_allocvec(update).expect("vec backed serialization can not fail")
            }
            Msg::Ack => Vec::new(),
            Msg::SetLevel(order) => {
                postcard::to_allocvec(order).expect("vec backed serialization can not fail")
            }
        };

        bytes.insert(0, self.header());
        bytes
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeMsgError {
    #[error("Can not decode an empty frame")]
    EmptyFrame,
    #[error("Could not decode message body: {0}")]
    CorruptEncoding(postcard::Error),
    #[error("Got an unknown message type: {0}")]
    IncorrectMsgType(u8),
}
