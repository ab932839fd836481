// prose-conference/conference-xmpp
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use minidom::Element;

use crate::ns;
use crate::util::{ElementExt, ParseError};

/// https://xmpp.org/extensions/xep-0045.html#registrar-statuscodes
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Status {
    /// Any occupant is allowed to see the user's full JID.
    NonAnonymousRoom,
    /// A room configuration change occurred which is not privacy-related.
    ConfigNonPrivacyRelated,
    /// The presence refers to the receiving user itself.
    SelfPresence,
    /// The room is now non-anonymous.
    ConfigRoomNonAnonymous,
    /// The room is now semi-anonymous.
    ConfigRoomSemiAnonymous,
    /// A new room has been created.
    RoomHasBeenCreated,
    /// The service has assigned or modified the occupant's roomnick.
    AssignedNick,
    /// The user has been banned from the room.
    Banned,
    /// The occupant is leaving the room or changed its nickname.
    NewNick,
    /// The user has been kicked from the room.
    Kicked,
    /// The user is being removed from the room because of an affiliation change.
    RemovalFromRoom,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::NonAnonymousRoom => 100,
            Status::ConfigNonPrivacyRelated => 104,
            Status::SelfPresence => 110,
            Status::ConfigRoomNonAnonymous => 172,
            Status::ConfigRoomSemiAnonymous => 173,
            Status::RoomHasBeenCreated => 201,
            Status::AssignedNick => 210,
            Status::Banned => 301,
            Status::NewNick => 303,
            Status::Kicked => 307,
            Status::RemovalFromRoom => 321,
        }
    }
}

impl TryFrom<u16> for Status {
    type Error = ParseError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Ok(match code {
            100 => Status::NonAnonymousRoom,
            104 => Status::ConfigNonPrivacyRelated,
            110 => Status::SelfPresence,
            172 => Status::ConfigRoomNonAnonymous,
            173 => Status::ConfigRoomSemiAnonymous,
            201 => Status::RoomHasBeenCreated,
            210 => Status::AssignedNick,
            301 => Status::Banned,
            303 => Status::NewNick,
            307 => Status::Kicked,
            321 => Status::RemovalFromRoom,
            _ => {
                return Err(ParseError::Generic {
                    msg: format!("Unsupported status code {}", code),
                })
            }
        })
    }
}

impl From<Status> for Element {
    fn from(value: Status) -> Self {
        Element::builder("status", ns::MUC_USER)
            .attr("code", value.code().to_string())
            .build()
    }
}

impl TryFrom<Element> for Status {
    type Error = ParseError;

    fn try_from(root: Element) -> Result<Self, Self::Error> {
        root.expect_is("status", ns::MUC_USER)?;
        Status::try_from(root.attr_req("code")?.parse::<u16>()?)
    }
}
