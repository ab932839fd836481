// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use jid::{BareJid, FullJid};

use conference_xmpp::stanza::muc::{Affiliation, Role};

use crate::domain::rooms::codec::{BinaryCodec, DecodeError, Decoder, Encoder};
use crate::domain::shared::models::OccupantId;

/// A user's live membership in a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Occupant {
    /// The in-room address `room@host/nickname`.
    pub id: OccupantId,
    /// The connected session owning this occupancy.
    pub real_id: FullJid,
    pub affiliation: Affiliation,
    pub role: Role,
}

impl Occupant {
    pub fn new(id: OccupantId, real_id: FullJid, affiliation: Affiliation, role: Role) -> Self {
        Occupant {
            id,
            real_id,
            affiliation,
            role,
        }
    }

    pub fn nickname(&self) -> &str {
        self.id.nickname()
    }

    pub fn real_bare_id(&self) -> BareJid {
        self.real_id.to_bare()
    }

    pub fn is_owner(&self) -> bool {
        self.affiliation == Affiliation::Owner
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }

    /// Admins and owners.
    pub fn is_privileged(&self) -> bool {
        self.affiliation.rank() >= Affiliation::Admin.rank()
    }

    pub fn has_voice(&self) -> bool {
        self.role.rank() >= Role::Participant.rank()
    }
}

impl BinaryCodec for Occupant {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.put_str(&self.id.to_string());
        encoder.put_str(&self.real_id.to_string());
        encoder.put_str(&self.affiliation.to_string());
        encoder.put_str(&self.role.to_string());
    }

    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Occupant {
            id: decoder.parsed::<OccupantId, _>()?,
            real_id: decoder.parsed::<FullJid, _>()?,
            affiliation: decoder.parsed::<Affiliation, _>()?,
            role: decoder.parsed::<Role, _>()?,
        })
    }
}
