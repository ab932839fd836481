// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::Arc;

use jid::FullJid;
use minidom::Element;
use tracing::{error, info};
use xmpp_parsers::iq::{Iq, IqType};
use xmpp_parsers::message::Message;
use xmpp_parsers::presence::Presence;

use conference_xmpp::stanza::muc::Affiliation;
use conference_xmpp::{ns, ParseError};

use crate::app::deps::{AppDependencies, MucConfig, RequestContext};
use crate::app::event_handlers::{
    is_muc_query, IqHandler, LockedRoom, MessageHandler, PresenceHandler, RoomAccess,
};
use crate::domain::rooms::models::{MucError, Occupant, Room};
use crate::domain::shared::models::{OccupantId, RoomId};
use crate::muc_service_builder::{MucServiceBuilder, UndefinedRepository, UndefinedRouter};

/// The Multi-User Chat service of a conference host. It consumes the presences, messages and
/// queries addressed to the host and routes the resulting stanzas through the configured
/// router.
#[derive(Clone)]
pub struct MucService {
    inner: Arc<MucServiceInner>,
}

pub(crate) struct MucServiceInner {
    deps: AppDependencies,
    rooms: RoomAccess,
    presence_handler: PresenceHandler,
    message_handler: MessageHandler,
    iq_handler: IqHandler,
}

impl MucService {
    pub fn builder() -> MucServiceBuilder<UndefinedRepository, UndefinedRouter> {
        MucServiceBuilder::new()
    }

    pub(crate) fn new(deps: AppDependencies) -> Self {
        MucService {
            inner: Arc::new(MucServiceInner {
                rooms: RoomAccess::from(&deps),
                presence_handler: PresenceHandler::from(&deps),
                message_handler: MessageHandler::from(&deps),
                iq_handler: IqHandler::from(&deps),
                deps,
            }),
        }
    }

    pub fn config(&self) -> &MucConfig {
        &self.inner.deps.config
    }
}

impl MucService {
    pub async fn process_presence(&self, ctx: &RequestContext, presence: Presence) {
        self.inner
            .presence_handler
            .handle_presence(ctx, presence)
            .await
    }

    pub async fn process_message(&self, ctx: &RequestContext, message: Message) {
        self.inner.message_handler.handle_message(ctx, message).await
    }

    pub async fn process_iq(&self, ctx: &RequestContext, iq: Iq) {
        self.inner.iq_handler.handle_iq(ctx, iq).await
    }

    /// Whether `iq` is a room administration request this service is responsible for. Every
    /// other IQ is left to the surrounding dispatcher.
    pub fn matches_iq(&self, iq: &Iq) -> bool {
        let addressed_to_host = iq
            .to
            .as_ref()
            .map(|to| to.domain_str() == self.inner.deps.config.muc_host)
            .unwrap_or(false);

        let payload = match &iq.payload {
            IqType::Get(payload) | IqType::Set(payload) => payload,
            IqType::Result(_) | IqType::Error(_) => return false,
        };

        addressed_to_host && is_muc_query(payload)
    }

    /// Parses a raw stanza and hands it to the matching entry point.
    pub async fn process_element(
        &self,
        ctx: &RequestContext,
        element: Element,
    ) -> Result<(), ParseError> {
        if element.ns() != ns::JABBER_CLIENT {
            return Err(ParseError::Generic {
                msg: format!("Unexpected namespace {} of stanza", element.ns()),
            });
        }

        match element.name() {
            "presence" => self.process_presence(ctx, Presence::try_from(element)?).await,
            "message" => self.process_message(ctx, Message::try_from(element)?).await,
            "iq" => self.process_iq(ctx, Iq::try_from(element)?).await,
            name => {
                return Err(ParseError::Generic {
                    msg: format!("Unexpected stanza {}", name),
                })
            }
        }
        Ok(())
    }

    /// Creates the room of `occupant_id` with `owner` as its only occupant. Fails with
    /// [`MucError::Conflict`] if the room exists already and with [`MucError::NotFound`] if it
    /// does not belong to this host. No stanzas are sent.
    pub async fn create_room(
        &self,
        ctx: &RequestContext,
        owner: &FullJid,
        occupant_id: &OccupantId,
        locked: bool,
    ) -> Result<Room, MucError> {
        let room_id = occupant_id.room_id();
        let muc_host = &self.inner.deps.config.muc_host;
        if room_id.domain_str() != muc_host {
            return Err(MucError::NotFound(format!(
                "{} is not served by {}",
                room_id, muc_host
            )));
        }

        let mut locked_room = self.inner.rooms.open(&room_id).await?;
        let result = self
            .insert_new_room(ctx, &mut locked_room, owner, occupant_id, locked)
            .await;
        self.inner.rooms.close(locked_room);
        result
    }

    /// A snapshot of the room `room_id`, loaded from the repository if needed.
    pub async fn room(&self, room_id: &RoomId) -> Option<Room> {
        let locked = match self.inner.rooms.open(room_id).await {
            Ok(locked) => locked,
            Err(err) => {
                error!("Failed to load room {}. {}", room_id, err);
                return None;
            }
        };

        let room = locked.room().cloned();
        self.inner.rooms.close(locked);
        room
    }
}

impl MucService {
    async fn insert_new_room(
        &self,
        ctx: &RequestContext,
        locked_room: &mut LockedRoom,
        owner: &FullJid,
        occupant_id: &OccupantId,
        locked: bool,
    ) -> Result<Room, MucError> {
        let room_id = locked_room.room_id().clone();
        if locked_room.room().is_some() {
            return Err(MucError::Conflict(format!(
                "Room {} exists already",
                room_id
            )));
        }

        let config = &self.inner.deps.config;
        let mut room = Room::new(
            room_id.clone(),
            room_id.local_name(),
            config.default_room_description.clone(),
            config.default_room_config.clone(),
            locked,
        );
        room.set_affiliation(&owner.to_bare(), Affiliation::Owner);
        room.insert_occupant(Occupant::new(
            occupant_id.clone(),
            owner.clone(),
            Affiliation::Owner,
            room.default_role(Affiliation::Owner),
        ))?;

        self.inner
            .rooms
            .commit(ctx, locked_room, Some(room.clone()))
            .await?;
        info!("Created room {} for {}", room_id, owner);
        Ok(room)
    }
}
