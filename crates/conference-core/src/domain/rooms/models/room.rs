// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::{BTreeMap, HashMap, HashSet};

use jid::BareJid;

use conference_xmpp::stanza::muc::{Affiliation, Role};

use crate::domain::rooms::codec::{BinaryCodec, DecodeError, Decoder, Encoder};
use crate::domain::rooms::models::{MucError, Occupant, RoomConfig};
use crate::domain::shared::models::{OccupantId, RoomId};

/// A chat room together with its live occupants and durable affiliations.
///
/// Occupants are indexed twice, by nickname and by the real bare JID of the user. Both indices
/// always contain the same set of occupants, which is why they are only mutated through the
/// methods below.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    pub subject: Option<String>,
    pub config: RoomConfig,
    /// Set between creation and the completion of the initial configuration.
    pub locked: bool,
    occupants_by_nickname: BTreeMap<String, Occupant>,
    nicknames_by_user: HashMap<BareJid, String>,
    affiliations: HashMap<BareJid, Affiliation>,
    invited: HashSet<BareJid>,
}

impl Room {
    pub fn new(
        id: RoomId,
        name: impl Into<String>,
        description: impl Into<String>,
        config: RoomConfig,
        locked: bool,
    ) -> Self {
        Room {
            id,
            name: name.into(),
            description: description.into(),
            subject: None,
            config,
            locked,
            occupants_by_nickname: Default::default(),
            nicknames_by_user: Default::default(),
            affiliations: Default::default(),
            invited: Default::default(),
        }
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants_by_nickname.len()
    }

    /// Number of entries in the index keyed by the occupants' real bare JIDs.
    pub fn member_index_count(&self) -> usize {
        self.nicknames_by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants_by_nickname.is_empty()
    }

    pub fn occupants(&self) -> impl Iterator<Item = &Occupant> {
        self.occupants_by_nickname.values()
    }

    pub fn occupant(&self, nickname: &str) -> Option<&Occupant> {
        self.occupants_by_nickname.get(nickname)
    }

    pub fn occupant_by_user(&self, user: &BareJid) -> Option<&Occupant> {
        self.nicknames_by_user
            .get(user)
            .and_then(|nickname| self.occupants_by_nickname.get(nickname))
    }

    pub fn contains_occupant(&self, id: &OccupantId) -> bool {
        self.occupant(id.nickname())
            .map(|occupant| &occupant.id == id)
            .unwrap_or(false)
    }

    /// Adds `occupant` to both indices.
    pub fn insert_occupant(&mut self, occupant: Occupant) -> Result<(), MucError> {
        if occupant.affiliation == Affiliation::Outcast {
            return Err(MucError::PermissionDenied(format!(
                "{} is banned from {}",
                occupant.real_bare_id(),
                self.id
            )));
        }
        if self.occupants_by_nickname.contains_key(occupant.nickname()) {
            return Err(MucError::Conflict(format!(
                "Nickname {} is already in use in {}",
                occupant.nickname(),
                self.id
            )));
        }
        let user = occupant.real_bare_id();
        if self.nicknames_by_user.contains_key(&user) {
            return Err(MucError::Conflict(format!(
                "{} already occupies {}",
                user, self.id
            )));
        }

        self.nicknames_by_user
            .insert(user, occupant.nickname().to_string());
        self.occupants_by_nickname
            .insert(occupant.nickname().to_string(), occupant);
        Ok(())
    }

    /// Removes the occupant with `nickname` from both indices.
    pub fn remove_occupant(&mut self, nickname: &str) -> Option<Occupant> {
        let occupant = self.occupants_by_nickname.remove(nickname)?;
        self.nicknames_by_user.remove(&occupant.real_bare_id());
        Some(occupant)
    }

    /// Moves the occupant with `nickname` to `new_id`, keeping everything else.
    pub fn rename_occupant(
        &mut self,
        nickname: &str,
        new_id: OccupantId,
    ) -> Result<&Occupant, MucError> {
        if self.occupants_by_nickname.contains_key(new_id.nickname()) {
            return Err(MucError::Conflict(format!(
                "Nickname {} is already in use in {}",
                new_id.nickname(),
                self.id
            )));
        }
        let Some(mut occupant) = self.occupants_by_nickname.remove(nickname) else {
            return Err(MucError::NotFound(format!(
                "No occupant {} in {}",
                nickname, self.id
            )));
        };

        let new_nickname = new_id.nickname().to_string();
        occupant.id = new_id;
        self.nicknames_by_user
            .insert(occupant.real_bare_id(), new_nickname.clone());
        Ok(&*self
            .occupants_by_nickname
            .entry(new_nickname)
            .or_insert(occupant))
    }

    pub fn set_role(&mut self, nickname: &str, role: Role) -> Option<&Occupant> {
        let occupant = self.occupants_by_nickname.get_mut(nickname)?;
        occupant.role = role;
        Some(occupant)
    }

    /// The durable affiliation of `user`, which outlives their occupancy.
    pub fn affiliation_of(&self, user: &BareJid) -> Affiliation {
        self.affiliations.get(user).copied().unwrap_or_default()
    }

    pub fn affiliations(&self) -> impl Iterator<Item = (&BareJid, &Affiliation)> {
        self.affiliations.iter()
    }

    pub fn owner_count(&self) -> usize {
        self.affiliations
            .values()
            .filter(|affiliation| **affiliation == Affiliation::Owner)
            .count()
    }

    /// Records `affiliation` for `user` and mirrors it onto the user's live occupant, if any.
    pub fn set_affiliation(&mut self, user: &BareJid, affiliation: Affiliation) {
        if affiliation == Affiliation::None {
            self.affiliations.remove(user);
        } else {
            self.affiliations.insert(user.clone(), affiliation);
        }

        if let Some(nickname) = self.nicknames_by_user.get(user) {
            if let Some(occupant) = self.occupants_by_nickname.get_mut(nickname) {
                occupant.affiliation = affiliation;
            }
        }
    }

    /// Drops the durable affiliation of `user` without touching a live occupant.
    pub fn forget_affiliation(&mut self, user: &BareJid) {
        self.affiliations.remove(user);
    }

    /// The role a user with `affiliation` receives when entering the room.
    pub fn default_role(&self, affiliation: Affiliation) -> Role {
        match affiliation {
            Affiliation::Owner | Affiliation::Admin => Role::Moderator,
            Affiliation::Member => Role::Participant,
            Affiliation::None if self.config.moderated => Role::Visitor,
            Affiliation::None => Role::Participant,
            Affiliation::Outcast => Role::None,
        }
    }

    pub fn invite(&mut self, user: BareJid) {
        self.invited.insert(user);
    }

    pub fn is_invited(&self, user: &BareJid) -> bool {
        self.invited.contains(user)
    }

    /// Removes a pending invitation and returns whether there was one.
    pub fn consume_invitation(&mut self, user: &BareJid) -> bool {
        self.invited.remove(user)
    }
}

impl BinaryCodec for Room {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.put_str(&self.id.to_string());
        encoder.put_str(&self.name);
        encoder.put_str(&self.description);
        encoder.put_opt_str(self.subject.as_deref());
        self.config.encode(encoder);
        encoder.put_bool(self.locked);

        encoder.put_count(self.occupants_by_nickname.len());
        for occupant in self.occupants_by_nickname.values() {
            occupant.encode(encoder);
        }

        let mut affiliations = self
            .affiliations
            .iter()
            .map(|(user, affiliation)| (user.to_string(), affiliation))
            .collect::<Vec<_>>();
        affiliations.sort_by(|lhs, rhs| lhs.0.cmp(&rhs.0));
        encoder.put_count(affiliations.len());
        for (user, affiliation) in affiliations {
            encoder.put_str(&user);
            encoder.put_str(&affiliation.to_string());
        }

        let mut invited = self
            .invited
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        invited.sort();
        encoder.put_count(invited.len());
        for user in invited {
            encoder.put_str(&user);
        }
    }

    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let id = decoder.parsed::<RoomId, _>()?;
        let name = decoder.string()?;
        let description = decoder.string()?;
        let subject = decoder.opt_string()?;
        let config = RoomConfig::decode(decoder)?;
        let locked = decoder.bool()?;

        let mut room = Room::new(id, name, description, config, locked);
        room.subject = subject;

        for _ in 0..decoder.count()? {
            let occupant = Occupant::decode(decoder)?;
            let user = occupant.real_bare_id();
            if room.occupants_by_nickname.contains_key(occupant.nickname())
                || room.nicknames_by_user.contains_key(&user)
            {
                return Err(DecodeError::DuplicateOccupant(occupant.id.to_string()));
            }
            room.nicknames_by_user
                .insert(user, occupant.nickname().to_string());
            room.occupants_by_nickname
                .insert(occupant.nickname().to_string(), occupant);
        }

        for _ in 0..decoder.count()? {
            let user = decoder.parsed::<BareJid, _>()?;
            let affiliation = decoder.parsed::<Affiliation, _>()?;
            room.affiliations.insert(user, affiliation);
        }

        for _ in 0..decoder.count()? {
            room.invited.insert(decoder.parsed::<BareJid, _>()?);
        }

        Ok(room)
    }
}
