// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use jid::{BareJid, FullJid};
use minidom::{Element, NSChoice};
use tracing::info;
use xmpp_parsers::iq::{Iq, IqType};
use xmpp_parsers::presence::Presence;

use conference_xmpp::ns;
use conference_xmpp::stanza::muc::{Affiliation, Destroy, Item, MucQuery, QueryKind, Role};
use conference_xmpp::stanza::{DataForm, DataFormType};

use crate::app::deps::{
    AppDependencies, DynIDProvider, DynMucConfig, DynRouter, RequestContext,
};
use crate::app::event_handlers::{
    addressed_room, sender, should_reply_with_error, LockedRoom, Outbox, RoomAccess,
};
use crate::app::stanza_builder::{config_form, iq as builder, message, presence};
use crate::domain::rooms::models::{MucError, Occupant, Room};
use crate::domain::rooms::services::{authorize_affiliation_change, authorize_role_change};

/// Handles the muc#owner and muc#admin queries of a room: configuration, destruction and the
/// administration of roles and affiliations.
pub struct IqHandler {
    config: DynMucConfig,
    id_provider: DynIDProvider,
    rooms: RoomAccess,
    router: DynRouter,
}

impl From<&AppDependencies> for IqHandler {
    fn from(deps: &AppDependencies) -> Self {
        IqHandler {
            config: deps.config.clone(),
            id_provider: deps.id_provider.clone(),
            rooms: RoomAccess::from(deps),
            router: deps.router.clone(),
        }
    }
}

impl IqHandler {
    pub async fn handle_iq(&self, ctx: &RequestContext, iq: Iq) {
        let mut outbox = Outbox::default();

        if let Err(error) = self.process_iq(ctx, &iq, &mut outbox).await {
            if should_reply_with_error(&error, "iq", iq.from.as_ref()) {
                outbox.push(builder::iq_error(
                    &iq,
                    error.to_stanza_error(&self.config.language),
                ));
            }
        }

        outbox.deliver(&self.router).await
    }

    async fn process_iq(
        &self,
        ctx: &RequestContext,
        iq: &Iq,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let (payload, is_set) = match &iq.payload {
            IqType::Get(payload) => (payload, false),
            IqType::Set(payload) => (payload, true),
            IqType::Result(_) | IqType::Error(_) => return Ok(()),
        };

        let query = MucQuery::try_from(payload.clone())?;
        let from = sender(iq.from.as_ref())?;
        let room_id = addressed_room(iq.to.as_ref(), &self.config.muc_host)?;
        let mut locked = self.rooms.open(&room_id).await?;

        let result = match (query.kind, is_set) {
            (QueryKind::Owner, false) => self.send_config_form(&locked, iq, &from, outbox),
            (QueryKind::Owner, true) => {
                self.configure(ctx, &mut locked, iq, &from, query, outbox)
                    .await
            }
            (QueryKind::Admin, false) => self.list_occupants(&locked, iq, &from, query, outbox),
            (QueryKind::Admin, true) => {
                self.administer(ctx, &mut locked, iq, &from, query, outbox)
                    .await
            }
        };

        self.rooms.close(locked);
        result
    }

    fn send_config_form(
        &self,
        locked: &LockedRoom,
        iq: &Iq,
        from: &FullJid,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let room = locked.require_room()?;
        require_owner(requesting_occupant(room, from)?)?;

        outbox.push(builder::config_form_result(
            iq,
            config_form::room_config_form(room, &self.config),
        ));
        Ok(())
    }

    async fn configure(
        &self,
        ctx: &RequestContext,
        locked: &mut LockedRoom,
        iq: &Iq,
        from: &FullJid,
        query: MucQuery,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let room = locked.require_room()?;
        require_owner(requesting_occupant(room, from)?)?;

        if let Some(destroy) = query.destroy {
            return self.destroy_room(ctx, locked, iq, destroy, outbox).await;
        }

        let Some(form) = query.form else {
            return Err(MucError::MalformedRequest(
                "Expected a configuration form or a destroy request".to_string(),
            ));
        };

        match form.type_ {
            DataFormType::Cancel if room.locked => {
                info!("Initial configuration of {} was cancelled", room.id);
                let destroy = Destroy {
                    jid: None,
                    reason: None,
                };
                self.destroy_room(ctx, locked, iq, destroy, outbox).await
            }
            DataFormType::Cancel => {
                outbox.push(builder::iq_result(iq, None));
                Ok(())
            }
            DataFormType::Submit if is_instant_room_submission(&form) => {
                if room.locked {
                    let mut room = room.clone();
                    room.locked = false;
                    self.rooms.commit(ctx, locked, Some(room)).await?;
                    info!("Unlocked instant room {}", locked.room_id());
                }
                outbox.push(builder::iq_result(iq, None));
                Ok(())
            }
            DataFormType::Submit => {
                let mut room = room.clone();
                let anonymity_changed = config_form::apply_config_submission(&form, &mut room)?;
                room.locked = false;

                self.rooms.commit(ctx, locked, Some(room)).await?;
                let room = locked.require_room()?;

                outbox.push(builder::iq_result(iq, None));
                for occupant in room.occupants() {
                    outbox.push(message::room_config_changed(
                        &room.id,
                        &occupant.real_id,
                        room.config.non_anonymous,
                        anonymity_changed,
                        self.id_provider.new_id(),
                    ));
                }
                info!("Applied new configuration to {}", room.id);
                Ok(())
            }
            DataFormType::Form | DataFormType::Result => Err(MucError::MalformedRequest(
                format!("Unexpected form of type {}", form.type_),
            )),
        }
    }

    async fn destroy_room(
        &self,
        ctx: &RequestContext,
        locked: &mut LockedRoom,
        iq: &Iq,
        destroy: Destroy,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let occupants = locked
            .require_room()?
            .occupants()
            .cloned()
            .collect::<Vec<_>>();

        self.rooms.commit(ctx, locked, None).await?;

        for occupant in occupants {
            outbox.push(presence::room_destroyed(
                &occupant.id,
                &occupant.real_id,
                destroy.clone(),
                self.id_provider.new_id(),
            ));
        }
        outbox.push(builder::iq_result(iq, None));

        info!("Destroyed room {}", locked.room_id());
        Ok(())
    }

    fn list_occupants(
        &self,
        locked: &LockedRoom,
        iq: &Iq,
        from: &FullJid,
        query: MucQuery,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let room = locked.require_room()?;
        let requester = requesting_occupant(room, from)?;

        let Some(filter) = query.items.into_iter().next() else {
            return Err(MucError::MalformedRequest(
                "Expected an item with a role or an affiliation".to_string(),
            ));
        };

        let items = match (filter.role, filter.affiliation) {
            (Some(role), _) => {
                if !requester.is_moderator() {
                    return Err(MucError::PermissionDenied(
                        "Only moderators may list roles".to_string(),
                    ));
                }
                room.occupants()
                    .filter(|occupant| occupant.role == role)
                    .map(|occupant| roster_item(occupant, true))
                    .collect::<Vec<_>>()
            }
            (None, Some(affiliation)) => {
                if !requester.is_privileged() {
                    return Err(MucError::PermissionDenied(
                        "Only admins and owners may list affiliations".to_string(),
                    ));
                }
                affiliation_list(room, affiliation)
            }
            (None, None) => {
                return Err(MucError::MalformedRequest(
                    "Expected an item with a role or an affiliation".to_string(),
                ))
            }
        };

        outbox.push(builder::occupant_list_result(iq, items));
        Ok(())
    }

    /// Applies every item of the request or none of them.
    async fn administer(
        &self,
        ctx: &RequestContext,
        locked: &mut LockedRoom,
        iq: &Iq,
        from: &FullJid,
        query: MucQuery,
        outbox: &mut Outbox,
    ) -> Result<(), MucError> {
        let mut room = locked.require_room()?.clone();
        requesting_occupant(&room, from)?;

        if query.items.is_empty() {
            return Err(MucError::MalformedRequest(
                "Expected at least one item".to_string(),
            ));
        }

        let mut notifications = vec![];
        for item in query.items {
            let requester = requesting_occupant(&room, from)?.clone();

            match item {
                Item {
                    nick: Some(nick),
                    role: Some(role),
                    ..
                } => self.change_role(
                    &mut room,
                    &requester,
                    &nick,
                    role,
                    item.reason,
                    &mut notifications,
                )?,
                Item {
                    jid: Some(jid),
                    affiliation: Some(affiliation),
                    ..
                } => self.change_affiliation(
                    &mut room,
                    &requester,
                    &jid.to_bare(),
                    affiliation,
                    item.reason,
                    &mut notifications,
                )?,
                _ => {
                    return Err(MucError::MalformedRequest(
                        "Items need either a nick and a role or a jid and an affiliation"
                            .to_string(),
                    ))
                }
            }
        }

        let next = (!room.is_empty() || room.config.persistent).then_some(room);
        self.rooms.commit(ctx, locked, next).await?;

        outbox.push(builder::iq_result(iq, None));
        for notification in notifications {
            outbox.push(notification);
        }
        Ok(())
    }

    fn change_role(
        &self,
        room: &mut Room,
        requester: &Occupant,
        nickname: &str,
        role: Role,
        reason: Option<String>,
        notifications: &mut Vec<Presence>,
    ) -> Result<(), MucError> {
        let target = room
            .occupant(nickname)
            .cloned()
            .ok_or_else(|| MucError::NotFound(format!("No occupant {} in {}", nickname, room.id)))?;
        authorize_role_change(requester, &target, role)?;

        if role == Role::None {
            room.remove_occupant(target.nickname());
            for other in room.occupants() {
                notifications.push(presence::kicked(
                    &target.id,
                    &other.real_id,
                    requester.nickname(),
                    reason.clone(),
                    false,
                    self.id_provider.new_id(),
                ));
            }
            notifications.push(presence::kicked(
                &target.id,
                &target.real_id,
                requester.nickname(),
                reason,
                true,
                self.id_provider.new_id(),
            ));
            info!("{} kicked {}", requester.id, target.id);
            return Ok(());
        }

        let Some(changed) = room.set_role(nickname, role).cloned() else {
            return Ok(());
        };
        self.notify_occupant_change(room, &changed, reason, notifications);
        info!("{} changed the role of {} to {}", requester.id, changed.id, role);
        Ok(())
    }

    fn change_affiliation(
        &self,
        room: &mut Room,
        requester: &Occupant,
        user: &BareJid,
        affiliation: Affiliation,
        reason: Option<String>,
        notifications: &mut Vec<Presence>,
    ) -> Result<(), MucError> {
        let current = room.affiliation_of(user);
        authorize_affiliation_change(requester, current, affiliation)?;

        if current == Affiliation::Owner
            && affiliation != Affiliation::Owner
            && room.owner_count() <= 1
        {
            return Err(MucError::Conflict(format!(
                "{} is the last owner of {}",
                user, room.id
            )));
        }

        room.set_affiliation(user, affiliation);
        info!(
            "{} changed the affiliation of {} in {} to {}",
            requester.id, user, room.id, affiliation
        );

        let Some(target) = room.occupant_by_user(user).cloned() else {
            return Ok(());
        };

        let removed_from_room = affiliation == Affiliation::Outcast
            || (affiliation == Affiliation::None && !room.config.open);
        if !removed_from_room {
            let role = room.default_role(affiliation);
            if let Some(changed) = room.set_role(target.nickname(), role).cloned() {
                self.notify_occupant_change(room, &changed, reason, notifications);
            }
            return Ok(());
        }

        room.remove_occupant(target.nickname());
        let recipients = room
            .occupants()
            .map(|occupant| occupant.real_id.clone())
            .chain(std::iter::once(target.real_id.clone()));

        for to in recipients {
            let id = self.id_provider.new_id();
            notifications.push(if affiliation == Affiliation::Outcast {
                presence::banned(&target.id, &to, requester.nickname(), reason.clone(), id)
            } else {
                presence::membership_revoked(
                    &target.id,
                    &to,
                    requester.nickname(),
                    reason.clone(),
                    id,
                )
            });
        }
        Ok(())
    }

    fn notify_occupant_change(
        &self,
        room: &Room,
        changed: &Occupant,
        reason: Option<String>,
        notifications: &mut Vec<Presence>,
    ) {
        for other in room.occupants() {
            notifications.push(presence::occupant_change(
                changed,
                &other.real_id,
                reason.clone(),
                self.id_provider.new_id(),
            ));
        }
    }
}

/// Whether `payload` is a query of the muc#owner or muc#admin namespace.
pub(crate) fn is_muc_query(payload: &Element) -> bool {
    payload.is("query", NSChoice::AnyOf(&[ns::MUC_OWNER, ns::MUC_ADMIN]))
}

/// The occupant the room knows for the user behind `from`. Administrative requests presume
/// membership.
fn requesting_occupant<'a>(room: &'a Room, from: &FullJid) -> Result<&'a Occupant, MucError> {
    room.occupant_by_user(&from.to_bare()).ok_or_else(|| {
        MucError::MalformedRequest(format!("{} is not an occupant of {}", from, room.id))
    })
}

fn require_owner(occupant: &Occupant) -> Result<(), MucError> {
    if !occupant.is_owner() {
        return Err(MucError::PermissionDenied(format!(
            "{} is not an owner",
            occupant.nickname()
        )));
    }
    Ok(())
}

/// An instant room is requested by submitting a form without any configuration field.
fn is_instant_room_submission(form: &DataForm) -> bool {
    form.fields
        .iter()
        .all(|field| field.var.as_deref() == Some("FORM_TYPE"))
}

fn roster_item(occupant: &Occupant, include_real_jid: bool) -> Item {
    let item = Item::new(occupant.affiliation, occupant.role).with_nick(occupant.nickname());
    if include_real_jid {
        return item.with_jid(occupant.real_bare_id());
    }
    item
}

/// Users holding `affiliation`, either durably or as live occupants, ordered by JID.
fn affiliation_list(room: &Room, affiliation: Affiliation) -> Vec<Item> {
    let mut users = room
        .affiliations()
        .filter(|(_, a)| **a == affiliation)
        .map(|(user, _)| user.clone())
        .collect::<Vec<_>>();

    for occupant in room.occupants() {
        let user = occupant.real_bare_id();
        if occupant.affiliation == affiliation && !users.contains(&user) {
            users.push(user);
        }
    }
    users.sort_by_key(|user| user.to_string());

    users
        .into_iter()
        .map(|user| match room.occupant_by_user(&user) {
            Some(occupant) => roster_item(occupant, true),
            None => Item::new(affiliation, Role::None).with_jid(user),
        })
        .collect()
}
