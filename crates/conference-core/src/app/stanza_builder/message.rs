// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use jid::{BareJid, FullJid, Jid};
use minidom::Element;
use xmpp_parsers::message::{Message, MessageType, Subject};
use xmpp_parsers::stanza_error::StanzaError;

use conference_xmpp::stanza::muc::{Decline, Invite, MediatedInvite, MucUser, Status};

use crate::domain::rooms::models::Room;
use crate::domain::shared::models::{OccupantId, RoomId};

/// One-time notice that the room configuration changed (104), with 172 or 173 when the
/// room became non-anonymous or semi-anonymous.
pub fn room_config_changed(
    room_id: &RoomId,
    to: &FullJid,
    non_anonymous: bool,
    anonymity_changed: bool,
    id: String,
) -> Message {
    let mut status = vec![Status::ConfigNonPrivacyRelated];
    if anonymity_changed {
        status.push(if non_anonymous {
            Status::ConfigRoomNonAnonymous
        } else {
            Status::ConfigRoomSemiAnonymous
        });
    }

    let mut message = Message::new(Some(Jid::from(to.clone())));
    message.from = Some(Jid::from(room_id.clone().into_inner()));
    message.id = Some(id);
    message.type_ = MessageType::Groupchat;
    message.payloads = vec![Element::from(MucUser::new().with_status(status))];
    message
}

/// Carries the room subject, sent from the occupant who changed it or from the room itself.
pub fn subject(from: Jid, to: &FullJid, subject: &str, id: String) -> Message {
    let mut message = Message::new(Some(Jid::from(to.clone())));
    message.from = Some(from);
    message.id = Some(id);
    message.type_ = MessageType::Groupchat;
    message
        .subjects
        .insert(String::new(), Subject(subject.to_string()));
    message
}

/// Relays a groupchat message of `from` to a single occupant. The sender's id is kept when
/// present.
pub fn groupchat_message(
    from: &OccupantId,
    to: &FullJid,
    original: &Message,
    fallback_id: String,
) -> Message {
    let mut message = original.clone();
    message.from = Some(Jid::from(from.as_ref().clone()));
    message.to = Some(Jid::from(to.clone()));
    message.id = Some(original.id.clone().unwrap_or(fallback_id));
    message.type_ = MessageType::Groupchat;
    message
}

/// Relays a private message to the real session of the recipient. The empty muc#user payload
/// lets the recipient's client attribute it to the room.
pub fn private_message(
    from: &OccupantId,
    to: &FullJid,
    original: &Message,
    fallback_id: String,
) -> Message {
    let mut message = original.clone();
    message.from = Some(Jid::from(from.as_ref().clone()));
    message.to = Some(Jid::from(to.clone()));
    message.id = Some(original.id.clone().unwrap_or(fallback_id));
    message.type_ = MessageType::Chat;
    message.payloads.push(Element::from(MucUser::new()));
    message
}

/// Relays the invitation of `inviter` from the room to the invitee. The room password is
/// included only for password protected rooms. Yields `None` when the invite names no
/// recipient.
pub fn invitation(
    room: &Room,
    inviter: &Jid,
    invite: &Invite,
    id: String,
) -> Option<Message> {
    let to = invite.to.clone()?;

    let mut message = Message::new(Some(to));
    message.from = Some(Jid::from(room.id.clone().into_inner()));
    message.id = Some(id);
    message.payloads = vec![Element::from(MediatedInvite {
        invites: vec![Invite {
            from: Some(inviter.clone()),
            to: None,
            reason: invite.reason.clone(),
        }],
        decline: None,
        password: room
            .config
            .required_password()
            .map(ToString::to_string),
    })];
    Some(message)
}

/// Relays the decline of `decliner` from the room back to the inviter. Yields `None` when the
/// decline names no recipient.
pub fn decline(
    room_id: &RoomId,
    decliner: &BareJid,
    decline: &Decline,
    id: String,
) -> Option<Message> {
    let to = decline.to.clone()?;

    let mut message = Message::new(Some(to));
    message.from = Some(Jid::from(room_id.clone().into_inner()));
    message.id = Some(id);
    message.payloads = vec![Element::from(MediatedInvite {
        invites: vec![],
        decline: Some(Decline {
            from: Some(Jid::from(decliner.clone())),
            to: None,
            reason: decline.reason.clone(),
        }),
        password: None,
    })];
    Some(message)
}

/// Bounces `request` back to its sender with `error`.
pub fn message_error(request: &Message, error: StanzaError) -> Message {
    let mut message = Message::new(request.from.clone());
    message.from = request.to.clone();
    message.id = request.id.clone();
    message.type_ = MessageType::Error;
    message.payloads = vec![Element::from(error)];
    message
}
