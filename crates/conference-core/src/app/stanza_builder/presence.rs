// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use jid::{FullJid, Jid};
use minidom::Element;
use xmpp_parsers::presence::{Presence, Type as PresenceType};
use xmpp_parsers::stanza_error::StanzaError;

use conference_xmpp::stanza::muc::{Affiliation, Destroy, Item, MucUser, Role, Status};

use crate::domain::rooms::models::Occupant;
use crate::domain::shared::models::OccupantId;

/// Reply to the creator of a new room, granting ownership (110, 210).
pub fn room_created_ack(occupant_id: &OccupantId, to: &FullJid, id: String) -> Presence {
    muc_presence(
        PresenceType::None,
        occupant_id,
        to,
        Some(id),
        MucUser::new()
            .with_item(Item::new(Affiliation::Owner, Role::Moderator))
            .with_status(vec![Status::SelfPresence, Status::AssignedNick]),
    )
}

/// The joining occupant's own presence (110, plus 100 in non-anonymous rooms).
pub fn self_presence(occupant: &Occupant, non_anonymous: bool, id: String) -> Presence {
    let mut status = vec![Status::SelfPresence];
    if non_anonymous {
        status.push(Status::NonAnonymousRoom);
    }

    muc_presence(
        PresenceType::None,
        &occupant.id,
        &occupant.real_id,
        Some(id),
        MucUser::new()
            .with_item(Item::new(occupant.affiliation, occupant.role))
            .with_status(status),
    )
}

/// Announces the current affiliation and role of `occupant` to `to`. The copy sent to the
/// occupant itself carries 110.
pub fn occupant_status(
    occupant: &Occupant,
    to: &FullJid,
    self_notifying: bool,
    include_real_jid: bool,
    id: String,
) -> Presence {
    muc_presence(
        PresenceType::None,
        &occupant.id,
        to,
        Some(id),
        MucUser::new()
            .with_item(occupant_item(occupant, include_real_jid, false))
            .with_status(self_notifying.then_some(Status::SelfPresence)),
    )
}

/// A role or affiliation change, mentioning the nickname and an optional reason.
pub fn occupant_change(
    occupant: &Occupant,
    to: &FullJid,
    reason: Option<String>,
    id: String,
) -> Presence {
    muc_presence(
        PresenceType::None,
        &occupant.id,
        to,
        Some(id),
        MucUser::new().with_item(occupant_item(occupant, false, true).with_reason(reason)),
    )
}

/// The occupant left the room (303, plus 110 for the self copy).
pub fn occupant_unavailable(
    occupant: &Occupant,
    to: &FullJid,
    self_notifying: bool,
    include_real_jid: bool,
    id: String,
) -> Presence {
    let mut item = occupant_item(occupant, include_real_jid, true);
    item.role = Some(Role::None);
    unavailable_with_new_nick(occupant, item, to, self_notifying, id)
}

/// The occupant is about to reappear as `new_nickname` (303, plus 110 for the self copy).
pub fn nickname_changed(
    occupant: &Occupant,
    new_nickname: &str,
    to: &FullJid,
    self_notifying: bool,
    include_real_jid: bool,
    id: String,
) -> Presence {
    let item = occupant_item(occupant, include_real_jid, false).with_nick(new_nickname);
    unavailable_with_new_nick(occupant, item, to, self_notifying, id)
}

/// The occupant was kicked by `actor` (307, plus 110 for the self copy).
pub fn kicked(
    occupant_id: &OccupantId,
    to: &FullJid,
    actor: &str,
    reason: Option<String>,
    self_notifying: bool,
    id: String,
) -> Presence {
    let mut status = vec![Status::Kicked];
    if self_notifying {
        status.push(Status::SelfPresence);
    }

    muc_presence(
        PresenceType::Unavailable,
        occupant_id,
        to,
        Some(id),
        MucUser::new()
            .with_item(
                Item::new(Affiliation::None, Role::None)
                    .with_actor_nick(actor)
                    .with_reason(reason),
            )
            .with_status(status),
    )
}

/// The occupant was banned by `actor` (301).
pub fn banned(
    occupant_id: &OccupantId,
    to: &FullJid,
    actor: &str,
    reason: Option<String>,
    id: String,
) -> Presence {
    muc_presence(
        PresenceType::Unavailable,
        occupant_id,
        to,
        Some(id),
        MucUser::new()
            .with_item(
                Item::new(Affiliation::Outcast, Role::None)
                    .with_actor_nick(actor)
                    .with_reason(reason),
            )
            .with_status(vec![Status::Banned]),
    )
}

/// The occupant lost its membership of a members-only room (321).
pub fn membership_revoked(
    occupant_id: &OccupantId,
    to: &FullJid,
    actor: &str,
    reason: Option<String>,
    id: String,
) -> Presence {
    muc_presence(
        PresenceType::Unavailable,
        occupant_id,
        to,
        Some(id),
        MucUser::new()
            .with_item(
                Item::new(Affiliation::None, Role::None)
                    .with_actor_nick(actor)
                    .with_reason(reason),
            )
            .with_status(vec![Status::RemovalFromRoom]),
    )
}

/// The room was destroyed by its owner.
pub fn room_destroyed(
    occupant_id: &OccupantId,
    to: &FullJid,
    destroy: Destroy,
    id: String,
) -> Presence {
    muc_presence(
        PresenceType::Unavailable,
        occupant_id,
        to,
        Some(id),
        MucUser::new()
            .with_item(Item::new(Affiliation::None, Role::None))
            .with_destroy(destroy),
    )
}

/// Bounces `request` back to its sender with `error`.
pub fn presence_error(request: &Presence, error: StanzaError) -> Presence {
    let mut presence = Presence::new(PresenceType::Error);
    presence.from = request.to.clone();
    presence.to = request.from.clone();
    presence.id = request.id.clone();
    presence.payloads = vec![Element::from(error)];
    presence
}

fn occupant_item(occupant: &Occupant, include_real_jid: bool, include_nick: bool) -> Item {
    let mut item = Item::new(occupant.affiliation, occupant.role);
    if include_real_jid {
        item = item.with_jid(occupant.real_bare_id());
    }
    if include_nick {
        item = item.with_nick(occupant.nickname());
    }
    item
}

fn unavailable_with_new_nick(
    occupant: &Occupant,
    item: Item,
    to: &FullJid,
    self_notifying: bool,
    id: String,
) -> Presence {
    let mut status = vec![Status::NewNick];
    if self_notifying {
        status.push(Status::SelfPresence);
    }

    muc_presence(
        PresenceType::Unavailable,
        &occupant.id,
        to,
        Some(id),
        MucUser::new().with_item(item).with_status(status),
    )
}

fn muc_presence(
    type_: PresenceType,
    from: &OccupantId,
    to: &FullJid,
    id: Option<String>,
    payload: MucUser,
) -> Presence {
    let mut presence = Presence::new(type_);
    presence.from = Some(Jid::from(from.as_ref().clone()));
    presence.to = Some(Jid::from(to.clone()));
    presence.id = id;
    presence.payloads = vec![Element::from(payload)];
    presence
}
