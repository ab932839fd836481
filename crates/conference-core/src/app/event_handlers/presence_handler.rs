// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use jid::{FullJid, Jid};
use tracing::info;
use xmpp_parsers::presence::{Presence, Type as PresenceType};

use conference_xmpp::ns;
use conference_xmpp::stanza::muc::{Affiliation, MucJoin};

use crate::app::deps::{
    AppDependencies, DynIDProvider, DynMucConfig, DynRouter, RequestContext,
};
use crate::app::event_handlers::{
    addressed_occupant, sender, should_reply_with_error, LockedRoom, Outbox, RoomAccess,
};
use crate::app::stanza_builder::{message, presence as builder};
use crate::domain::rooms::models::{MucError, Occupant, Room};
use crate::domain::shared::models::OccupantId;

/// Handles presence stanzas addressed to occupants, i.e. joins, presence updates, nickname
/// changes and leaves.
pub struct PresenceHandler {
    config: DynMucConfig,
    id_provider: DynIDProvider,
    rooms: RoomAccess,
    router: DynRouter,
}

impl From<&AppDependencies> for PresenceHandler {
    fn from(deps: &AppDependencies) -> Self {
        PresenceHandler {
            config: deps.config.clone(),
            id_provider: deps.id_provider.clone(),
            rooms: RoomAccess::from(deps),
            router: deps.router.clone(),
        }
    }
}

impl PresenceHandler {
    pub async fn handle_presence(&self, ctx: &RequestContext, presence: Presence) {
        let mut outbox = Outbox::default();

        if let Err(error) = self.process_presence(ctx, &presence, &mut outbox).await {
            if should_reply_with_error(&error, "presence", presence.from.as_ref()) {
                outbox.push(builder::presence_error(
                    &presence,
                    error.to_stanza_error(&self.config.language),
                ));
            }
        }

        outbox.deliver(&self.router).await
    }

    async fn process_presence(
        &self,
        ctx: &RequestContext,
        presence: &Presence,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        match presence.type_ {
            PresenceType::None | PresenceType::Unavailable => (),
            // Errors bounced by clients and subscription requests are not meant for the room.
            _ => return Ok(()),
        }

        let from = sender(presence.from.as_ref())?;
        let occupant_id = addressed_occupant(presence.to.as_ref(), &self.config.muc_host)?;
        let mut locked = self.rooms.open(&occupant_id.room_id()).await?;

        let result = if presence.type_ == PresenceType::Unavailable {
            self.leave(ctx, &mut locked, presence, &from, &occupant_id, outbox)
                .await
        } else {
            self.enter(ctx, &mut locked, presence, from, occupant_id, outbox)
                .await
        };

        self.rooms.close(locked);
        result
    }

    /// Dispatches an available presence to a join, a presence update or a nickname change,
    /// depending on whether and under which nickname the user occupies the room already.
    async fn enter(
        &self,
        ctx: &RequestContext,
        locked: &mut LockedRoom,
        presence: &Presence,
        from: FullJid,
        occupant_id: OccupantId,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let existing = locked
            .room()
            .and_then(|room| room.occupant_by_user(&from.to_bare()))
            .cloned();

        let Some(existing) = existing else {
            return self
                .join(ctx, locked, presence, from, occupant_id, outbox)
                .await;
        };

        if existing.real_id != from {
            return Err(MucError::Conflict(format!(
                "{} occupies {} from another session",
                from.to_bare(),
                locked.room_id()
            )));
        }

        if existing.id == occupant_id {
            self.update_presence(locked.require_room()?, &existing, presence, outbox);
            return Ok(());
        }

        self.change_nickname(ctx, locked, &existing, occupant_id, presence, outbox)
            .await
    }

    async fn join(
        &self,
        ctx: &RequestContext,
        locked: &mut LockedRoom,
        presence: &Presence,
        from: FullJid,
        occupant_id: OccupantId,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let muc_join = presence
            .payloads
            .iter()
            .find(|payload| payload.is("x", ns::MUC))
            .cloned()
            .map(MucJoin::try_from)
            .transpose()?;
        let user = from.to_bare();

        let (mut room, created) = match locked.room() {
            Some(room) => {
                let mut room = room.clone();
                self.check_admission(&mut room, &occupant_id, &user, muc_join.as_ref())?;
                (room, false)
            }
            None => {
                let room_id = occupant_id.room_id();
                let mut room = Room::new(
                    room_id.clone(),
                    room_id.local_name(),
                    self.config.default_room_description.clone(),
                    self.config.default_room_config.clone(),
                    // Legacy groupchat joins skip the initial configuration.
                    muc_join.is_some(),
                );
                room.set_affiliation(&user, Affiliation::Owner);
                (room, true)
            }
        };

        let affiliation = room.affiliation_of(&user);
        let occupant = Occupant::new(
            occupant_id,
            from,
            affiliation,
            room.default_role(affiliation),
        );
        room.insert_occupant(occupant.clone())?;

        self.rooms.commit(ctx, locked, Some(room)).await?;
        let room = locked.require_room()?;

        if created {
            info!(
                "Created {} room {} for {}",
                if room.locked { "locked" } else { "unlocked" },
                room.id,
                user
            );
            outbox.push(builder::room_created_ack(
                &occupant.id,
                &occupant.real_id,
                presence.id.clone().unwrap_or_else(|| self.id_provider.new_id()),
            ));
            return Ok(());
        }

        for other in room.occupants().filter(|other| other.id != occupant.id) {
            outbox.push(builder::occupant_status(
                other,
                &occupant.real_id,
                false,
                room.config.non_anonymous || occupant.is_moderator(),
                self.id_provider.new_id(),
            ));
        }

        for other in room.occupants().filter(|other| other.id != occupant.id) {
            outbox.push(with_availability(
                builder::occupant_status(
                    &occupant,
                    &other.real_id,
                    false,
                    room.config.non_anonymous || other.is_moderator(),
                    self.id_provider.new_id(),
                ),
                presence,
            ));
        }

        outbox.push(with_availability(
            builder::self_presence(
                &occupant,
                room.config.non_anonymous,
                presence.id.clone().unwrap_or_else(|| self.id_provider.new_id()),
            ),
            presence,
        ));

        if let Some(subject) = &room.subject {
            outbox.push(message::subject(
                Jid::from(room.id.clone().into_inner()),
                &occupant.real_id,
                subject,
                self.id_provider.new_id(),
            ));
        }

        info!("{} joined {}", occupant.real_id, occupant.id);
        Ok(())
    }

    /// Applies the admission rules of an existing room to a joining user. Consumes a pending
    /// invitation of a members-only room.
    fn check_admission(
        &self,
        room: &mut Room,
        occupant_id: &OccupantId,
        user: &jid::BareJid,
        muc_join: Option<&MucJoin>,
    ) -> Result<(), MucError> {
        let affiliation = room.affiliation_of(user);

        if room.locked && affiliation != Affiliation::Owner {
            return Err(MucError::NotFound(format!(
                "Room {} is locked",
                room.id
            )));
        }
        if room.occupant(occupant_id.nickname()).is_some() {
            return Err(MucError::Conflict(format!(
                "Nickname {} is already in use in {}",
                occupant_id.nickname(),
                room.id
            )));
        }
        if affiliation == Affiliation::Outcast {
            return Err(MucError::PermissionDenied(format!(
                "{} is banned from {}",
                user, room.id
            )));
        }
        if !room.config.open
            && affiliation == Affiliation::None
            && !room.consume_invitation(user)
        {
            return Err(MucError::RegistrationRequired(format!(
                "{} is members-only",
                room.id
            )));
        }
        if let Some(required) = room.config.required_password() {
            let password = muc_join.and_then(|join| join.password.as_deref());
            if password != Some(required) {
                return Err(MucError::AuthenticationFailed(format!(
                    "A password is required to enter {}",
                    room.id
                )));
            }
        }
        if let Some(max) = self.config.max_occupants_per_room {
            let is_exempt = affiliation.rank() >= Affiliation::Admin.rank();
            if room.occupant_count() >= max as usize && !is_exempt {
                return Err(MucError::ServiceUnavailable(format!(
                    "{} is full",
                    room.id
                )));
            }
        }
        Ok(())
    }

    /// Rebroadcasts the availability of an occupant who stays under the same nickname.
    fn update_presence(
        &self,
        room: &Room,
        occupant: &Occupant,
        presence: &Presence,
        outbox: &mut Outbox,
    ) {
        for other in room.occupants() {
            let is_self = other.id == occupant.id;
            let id = match (&presence.id, is_self) {
                (Some(id), true) => id.clone(),
                _ => self.id_provider.new_id(),
            };

            outbox.push(with_availability(
                builder::occupant_status(
                    occupant,
                    &other.real_id,
                    is_self,
                    room.config.non_anonymous || other.is_moderator(),
                    id,
                ),
                presence,
            ));
        }
    }

    async fn change_nickname(
        &self,
        ctx: &RequestContext,
        locked: &mut LockedRoom,
        occupant: &Occupant,
        new_id: OccupantId,
        presence: &Presence,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let mut room = locked.require_room()?.clone();
        let renamed = room.rename_occupant(occupant.nickname(), new_id)?.clone();

        self.rooms.commit(ctx, locked, Some(room)).await?;
        let room = locked.require_room()?;

        for other in room.occupants() {
            let is_self = other.id == renamed.id;
            outbox.push(builder::nickname_changed(
                occupant,
                renamed.nickname(),
                &other.real_id,
                is_self,
                room.config.non_anonymous || other.is_moderator(),
                self.id_provider.new_id(),
            ));
        }

        for other in room.occupants() {
            let is_self = other.id == renamed.id;
            let id = match (&presence.id, is_self) {
                (Some(id), true) => id.clone(),
                _ => self.id_provider.new_id(),
            };

            outbox.push(with_availability(
                builder::occupant_status(
                    &renamed,
                    &other.real_id,
                    is_self,
                    room.config.non_anonymous || other.is_moderator(),
                    id,
                ),
                presence,
            ));
        }

        info!("{} is now known as {}", occupant.id, renamed.id);
        Ok(())
    }

    async fn leave(
        &self,
        ctx: &RequestContext,
        locked: &mut LockedRoom,
        presence: &Presence,
        from: &FullJid,
        occupant_id: &OccupantId,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let Some(room) = locked.room() else {
            return Ok(());
        };
        let Some(occupant) = room
            .occupant(occupant_id.nickname())
            .filter(|occupant| &occupant.real_id == from)
            .cloned()
        else {
            return Ok(());
        };

        let mut room = room.clone();
        room.remove_occupant(occupant.nickname());
        if !self
            .config
            .retains_affiliation(occupant.affiliation, &room.config)
        {
            room.forget_affiliation(&occupant.real_bare_id());
        }

        let destroy = room.is_empty() && !room.config.persistent;
        let recipients = room.occupants().cloned().collect::<Vec<_>>();
        let non_anonymous = room.config.non_anonymous;

        self.rooms
            .commit(ctx, locked, if destroy { None } else { Some(room) })
            .await?;

        for other in recipients {
            outbox.push(with_availability(
                builder::occupant_unavailable(
                    &occupant,
                    &other.real_id,
                    false,
                    non_anonymous || other.is_moderator(),
                    self.id_provider.new_id(),
                ),
                presence,
            ));
        }
        outbox.push(with_availability(
            builder::occupant_unavailable(
                &occupant,
                &occupant.real_id,
                true,
                non_anonymous,
                presence.id.clone().unwrap_or_else(|| self.id_provider.new_id()),
            ),
            presence,
        ));

        info!("{} left {}", occupant.real_id, occupant.id);
        if destroy {
            info!(
                "Destroyed room {} after its last occupant left",
                occupant.id.room_id()
            );
        }
        Ok(())
    }
}

/// Copies show, status texts and priority of the occupant's own presence onto a broadcast.
fn with_availability(mut broadcast: Presence, origin: &Presence) -> Presence {
    broadcast.show = origin.show.clone();
    broadcast.statuses = origin.statuses.clone();
    broadcast.priority = origin.priority;
    broadcast
}
