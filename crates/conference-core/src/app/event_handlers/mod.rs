// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use jid::{FullJid, Jid};
use tracing::{debug, error, info};

pub use iq_handler::IqHandler;
pub(crate) use iq_handler::is_muc_query;
pub use message_handler::MessageHandler;
pub(crate) use outbox::Outbox;
pub use presence_handler::PresenceHandler;
pub(crate) use room_access::{LockedRoom, RoomAccess};

use crate::domain::rooms::models::MucError;
use crate::domain::shared::models::{OccupantId, RoomId};

mod iq_handler;
mod message_handler;
mod outbox;
mod presence_handler;
mod room_access;

/// Logs a failed request and returns whether the requester should receive an error reply.
/// Cancelled requests are dropped silently.
fn should_reply_with_error(error: &MucError, kind: &str, from: Option<&Jid>) -> bool {
    let from = from.map(ToString::to_string).unwrap_or_default();

    match error {
        MucError::Cancelled => {
            debug!("Dropping cancelled {} from {}", kind, from);
            false
        }
        MucError::PersistenceFailure(err) => {
            error!("Failed to persist {} from {}. {:?}", kind, from, err);
            true
        }
        _ => {
            info!("Rejecting {} from {}. {}", kind, from, error);
            true
        }
    }
}

/// The session address of the sender. Every stanza handed to the service has been stamped
/// with the full JID of the sending session.
fn sender(from: Option<&Jid>) -> Result<FullJid, MucError> {
    match from {
        Some(Jid::Full(jid)) => Ok(jid.clone()),
        Some(Jid::Bare(jid)) => Err(MucError::MalformedRequest(format!(
            "Sender {} is missing a resource",
            jid
        ))),
        None => Err(MucError::MalformedRequest("Missing sender".to_string())),
    }
}

/// The room a stanza is addressed to, with or without nickname. Only rooms on `muc_host` are
/// served.
fn addressed_room(to: Option<&Jid>, muc_host: &str) -> Result<RoomId, MucError> {
    let to = to.ok_or_else(|| MucError::MalformedRequest("Missing recipient".to_string()))?;
    if to.domain_str() != muc_host {
        return Err(MucError::NotFound(format!(
            "{} is not served by {}",
            to, muc_host
        )));
    }
    let room_id = RoomId::from(to.to_bare());
    if room_id.node_str().is_none() {
        return Err(MucError::MalformedRequest(format!(
            "{} does not address a room",
            to
        )));
    }
    Ok(room_id)
}

/// The occupant a stanza is addressed to, i.e. `room@host/nickname`.
fn addressed_occupant(to: Option<&Jid>, muc_host: &str) -> Result<OccupantId, MucError> {
    let room_id = addressed_room(to, muc_host)?;
    match to {
        Some(Jid::Full(jid)) => Ok(OccupantId::from(jid.clone())),
        _ => Err(MucError::MalformedRequest(format!(
            "Missing nickname in address of {}",
            room_id
        ))),
    }
}
