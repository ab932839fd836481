// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Bool,
    Str,
    Count,
}

impl WireType {
    pub(super) fn tag(&self) -> u8 {
        match self {
            WireType::Bool => 0x01,
            WireType::Str => 0x02,
            WireType::Count => 0x03,
        }
    }
}

impl Display for WireType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WireType::Bool => write!(f, "bool"),
            WireType::Str => write!(f, "string"),
            WireType::Count => write!(f, "count"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DecodeError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Expected a {expected} field, found tag {found:#04x}")]
    UnexpectedWireType { expected: WireType, found: u8 },
    #[error("Invalid boolean value {0:#04x}")]
    InvalidBool(u8),
    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,
    #[error("Invalid JID: {0}")]
    InvalidJid(#[from] jid::Error),
    #[error("Invalid enum value '{0}'")]
    InvalidEnumValue(String),
    #[error("Occupant {0} collides with another occupant of the room")]
    DuplicateOccupant(String),
}
