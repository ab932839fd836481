// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use jid::{FullJid, Jid};
use tracing::{debug, info};
use xmpp_parsers::message::{Message, MessageType};

use conference_xmpp::ns;
use conference_xmpp::stanza::muc::MediatedInvite;

use crate::app::deps::{
    AppDependencies, DynIDProvider, DynMucConfig, DynRouter, RequestContext,
};
use crate::app::event_handlers::{
    addressed_room, sender, should_reply_with_error, LockedRoom, Outbox, RoomAccess,
};
use crate::app::stanza_builder::message as builder;
use crate::domain::rooms::models::{MucError, Occupant, Room};
use crate::domain::shared::models::OccupantId;

/// Handles messages addressed to rooms and occupants: groupchat broadcasts, subject changes,
/// private messages and mediated invitations.
pub struct MessageHandler {
    config: DynMucConfig,
    id_provider: DynIDProvider,
    rooms: RoomAccess,
    router: DynRouter,
}

impl From<&AppDependencies> for MessageHandler {
    fn from(deps: &AppDependencies) -> Self {
        MessageHandler {
            config: deps.config.clone(),
            id_provider: deps.id_provider.clone(),
            rooms: RoomAccess::from(deps),
            router: deps.router.clone(),
        }
    }
}

impl MessageHandler {
    pub async fn handle_message(&self, ctx: &RequestContext, message: Message) {
        let mut outbox = Outbox::default();

        if let Err(error) = self.process_message(ctx, &message, &mut outbox).await {
            if should_reply_with_error(&error, "message", message.from.as_ref()) {
                outbox.push(builder::message_error(
                    &message,
                    error.to_stanza_error(&self.config.language),
                ));
            }
        }

        outbox.deliver(&self.router).await
    }

    async fn process_message(
        &self,
        ctx: &RequestContext,
        message: &Message,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        if message.type_ == MessageType::Error {
            return Ok(());
        }

        let from = sender(message.from.as_ref())?;
        let room_id = addressed_room(message.to.as_ref(), &self.config.muc_host)?;
        let mut locked = self.rooms.open(&room_id).await?;

        let result = match &message.to {
            Some(Jid::Full(to)) => {
                let recipient_id = OccupantId::from(to.clone());
                self.relay_private_message(&locked, message, &from, recipient_id, outbox)
            }
            _ => {
                self.process_room_message(ctx, &mut locked, message, &from, outbox)
                    .await
            }
        };

        self.rooms.close(locked);
        result
    }

    async fn process_room_message(
        &self,
        ctx: &RequestContext,
        locked: &mut LockedRoom,
        message: &Message,
        from: &FullJid,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let mediated_invite = message
            .payloads
            .iter()
            .find(|payload| payload.is("x", ns::MUC_USER))
            .cloned()
            .map(MediatedInvite::try_from)
            .transpose()?
            .filter(|invite| !invite.is_empty());

        if let Some(mediated_invite) = mediated_invite {
            return self
                .relay_mediated_invite(ctx, locked, message, from, mediated_invite, outbox)
                .await;
        }

        if message.type_ != MessageType::Groupchat {
            debug!(
                "Ignoring {:?} message from {} to {}",
                message.type_,
                from,
                locked.room_id()
            );
            return Ok(());
        }

        let room = locked.require_room()?;
        let sender = sending_occupant(room, from)?.clone();

        if message.bodies.is_empty() && !message.subjects.is_empty() {
            return self
                .change_subject(ctx, locked, message, &sender, outbox)
                .await;
        }

        if !sender.has_voice() {
            return Err(MucError::PermissionDenied(format!(
                "Visitors may not send messages to {}",
                room.id
            )));
        }

        let id = message.id.clone().unwrap_or_else(|| self.id_provider.new_id());
        for occupant in room.occupants() {
            outbox.push(builder::groupchat_message(
                &sender.id,
                &occupant.real_id,
                message,
                id.clone(),
            ));
        }
        Ok(())
    }

    async fn change_subject(
        &self,
        ctx: &RequestContext,
        locked: &mut LockedRoom,
        message: &Message,
        sender: &Occupant,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let mut room = locked.require_room()?.clone();

        let may_change_subject =
            sender.is_moderator() || (!room.config.moderated && sender.has_voice());
        if !may_change_subject {
            return Err(MucError::PermissionDenied(format!(
                "{} may not change the subject of {}",
                sender.nickname(),
                room.id
            )));
        }

        let subject = message
            .subjects
            .get("")
            .or_else(|| message.subjects.values().next())
            .map(|subject| subject.0.clone())
            .unwrap_or_default();
        room.subject = (!subject.is_empty()).then(|| subject.clone());

        self.rooms.commit(ctx, locked, Some(room)).await?;
        let room = locked.require_room()?;

        let id = message.id.clone().unwrap_or_else(|| self.id_provider.new_id());
        for occupant in room.occupants() {
            outbox.push(builder::subject(
                Jid::from(sender.id.as_ref().clone()),
                &occupant.real_id,
                &subject,
                id.clone(),
            ));
        }

        info!("{} changed the subject of {}", sender.id, room.id);
        Ok(())
    }

    fn relay_private_message(
        &self,
        locked: &LockedRoom,
        message: &Message,
        from: &FullJid,
        recipient_id: OccupantId,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let room = locked.require_room()?;
        let sender = sending_occupant(room, from)?;

        if message.type_ == MessageType::Groupchat {
            return Err(MucError::MalformedRequest(
                "Groupchat messages must be addressed to the room".to_string(),
            ));
        }

        let Some(recipient) = room.occupant(recipient_id.nickname()) else {
            return Err(MucError::NotFound(format!(
                "No occupant {} in {}",
                recipient_id.nickname(),
                room.id
            )));
        };

        outbox.push(builder::private_message(
            &sender.id,
            &recipient.real_id,
            message,
            self.id_provider.new_id(),
        ));
        Ok(())
    }

    async fn relay_mediated_invite(
        &self,
        ctx: &RequestContext,
        locked: &mut LockedRoom,
        message: &Message,
        from: &FullJid,
        mediated_invite: MediatedInvite,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let mut room = locked.require_room()?.clone();

        if let Some(decline) = mediated_invite.decline {
            let decliner = from.to_bare();
            if room.consume_invitation(&decliner) {
                self.rooms.commit(ctx, locked, Some(room)).await?;
            }
            let id = message.id.clone().unwrap_or_else(|| self.id_provider.new_id());
            outbox.push_opt(
                builder::decline(locked.room_id(), &decliner, &decline, id),
                "decline without recipient",
            );
            info!("{} declined the invitation to {}", decliner, locked.room_id());
            return Ok(());
        }

        sending_occupant(&room, from)?;

        let mut invitees = Vec::with_capacity(mediated_invite.invites.len());
        for invite in &mediated_invite.invites {
            let Some(invitee) = &invite.to else {
                return Err(MucError::MalformedRequest(
                    "An invitation needs a recipient".to_string(),
                ));
            };
            room.invite(invitee.to_bare());
            invitees.push(invitee.to_bare());
        }

        self.rooms.commit(ctx, locked, Some(room)).await?;
        let room = locked.require_room()?;

        let inviter = Jid::from(from.clone());
        for invite in &mediated_invite.invites {
            let id = message.id.clone().unwrap_or_else(|| self.id_provider.new_id());
            outbox.push_opt(
                builder::invitation(room, &inviter, invite, id),
                "invitation without recipient",
            );
        }

        info!(
            "{} invited {} to {}",
            from,
            invitees
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            room.id
        );
        Ok(())
    }
}

/// The occupant the room knows under the session `from`.
fn sending_occupant<'a>(room: &'a Room, from: &FullJid) -> Result<&'a Occupant, MucError> {
    room.occupant_by_user(&from.to_bare())
        .filter(|occupant| &occupant.real_id == from)
        .ok_or_else(|| {
            MucError::NotAcceptable(format!("{} is not an occupant of {}", from, room.id))
        })
}
