// prose-conference
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use anyhow::Result;
use pretty_assertions::assert_eq;

use conference_core::domain::rooms::models::MucError;
use conference_core::{occupant_id, room_id};
use conference_xmpp::full;
use conference_xmpp::stanza::muc::{Affiliation, Role};

use crate::tests::helpers::{affiliation_and_role, StanzaExt, TestService};

const JULIET: &str = "juliet@capulet.lit/balcony";
const ROMEO: &str = "romeo@montague.lit/orchard";
const ROOM: &str = "garden@chat.shakespeare.lit";

#[tokio::test]
async fn test_muc_join_creates_locked_room() -> Result<()> {
    let t = TestService::new();

    t.muc_join(JULIET, "garden@chat.shakespeare.lit/juliet", None)
        .await;

    let received = t.received();
    assert_eq!(received.len(), 1);

    let ack = &received[0];
    assert_eq!(ack.name(), "presence");
    assert_eq!(ack.to_attr(), JULIET);
    assert_eq!(ack.from_attr(), "garden@chat.shakespeare.lit/juliet");
    assert_eq!(ack.status_codes(), vec![110, 210]);
    assert_eq!(
        affiliation_and_role(ack),
        (Some(Affiliation::Owner), Some(Role::Moderator))
    );

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert!(room.locked);
    assert_eq!(room.occupant_count(), 1);
    assert_eq!(room.affiliation_of(&full!(JULIET).to_bare()), Affiliation::Owner);
    assert_eq!(t.repository.room_count(), 1);
    assert_eq!(t.repository.occupant_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_locked_room_rejects_other_users() -> Result<()> {
    let t = TestService::new();

    t.muc_join(JULIET, "garden@chat.shakespeare.lit/juliet", None)
        .await;
    t.received();

    t.join(ROMEO, "garden@chat.shakespeare.lit/romeo").await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].to_attr(), ROMEO);
    assert_eq!(received[0].type_attr(), Some("error"));
    assert_eq!(
        received[0].error_condition().as_deref(),
        Some("item-not-found")
    );

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert_eq!(room.occupant_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_legacy_join_creates_unlocked_room() -> Result<()> {
    let t = TestService::new();

    t.join(JULIET, "garden@chat.shakespeare.lit/juliet").await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].status_codes(), vec![110, 210]);

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert!(!room.locked);

    t.join(ROMEO, "garden@chat.shakespeare.lit/romeo").await;
    assert_eq!(t.received().len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_instant_room_submission_unlocks_room() -> Result<()> {
    let t = TestService::new();

    t.muc_join(JULIET, "garden@chat.shakespeare.lit/juliet", None)
        .await;
    t.received();

    t.submit_config(JULIET, ROOM, "").await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].name(), "iq");
    assert_eq!(received[0].type_attr(), Some("result"));
    assert_eq!(received[0].id_attr(), Some("config"));
    assert_eq!(received[0].to_attr(), JULIET);

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert!(!room.locked);

    t.join(ROMEO, "garden@chat.shakespeare.lit/romeo").await;

    let received = t.received();
    assert_eq!(received.len(), 3);

    // The existing occupant is announced to the newcomer first.
    assert_eq!(received[0].to_attr(), ROMEO);
    assert_eq!(received[0].from_attr(), "garden@chat.shakespeare.lit/juliet");
    assert!(received[0].status_codes().is_empty());

    assert_eq!(received[1].to_attr(), JULIET);
    assert_eq!(received[1].from_attr(), "garden@chat.shakespeare.lit/romeo");

    assert_eq!(received[2].to_attr(), ROMEO);
    assert_eq!(received[2].from_attr(), "garden@chat.shakespeare.lit/romeo");
    assert_eq!(received[2].status_codes(), vec![110]);
    assert_eq!(
        affiliation_and_role(&received[2]),
        (Some(Affiliation::None), Some(Role::Participant))
    );

    Ok(())
}

#[tokio::test]
async fn test_config_form_is_restricted_to_owners() -> Result<()> {
    let t = TestService::new();
    t.create_instant_room(JULIET, "garden@chat.shakespeare.lit/juliet")
        .await;
    t.join(ROMEO, "garden@chat.shakespeare.lit/romeo").await;
    t.received();

    let request = |from: &str| {
        format!(
            r#"<iq xmlns="jabber:client" from="{from}" to="{ROOM}" id="form" type="get">
                <query xmlns="http://jabber.org/protocol/muc#owner"/>
            </iq>"#
        )
    };

    t.send(request(JULIET)).await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].type_attr(), Some("result"));
    let form = received[0].config_form().expect("Configuration form");
    assert_eq!(form.fields.len(), 23);
    assert_eq!(
        form.form_type(),
        Some("http://jabber.org/protocol/muc#roomconfig")
    );

    t.send(request(ROMEO)).await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].to_attr(), ROMEO);
    assert_eq!(received[0].error_condition().as_deref(), Some("forbidden"));

    Ok(())
}

#[tokio::test]
async fn test_config_submission_notifies_occupants() -> Result<()> {
    let t = TestService::new();
    t.create_instant_room(JULIET, "garden@chat.shakespeare.lit/juliet")
        .await;
    t.join(ROMEO, "garden@chat.shakespeare.lit/romeo").await;
    t.received();

    t.submit_config(
        JULIET,
        ROOM,
        r#"<field var="muc#roomconfig_roomname"><value>Capulet Garden</value></field>
        <field var="muc#roomconfig_persistentroom"><value>1</value></field>
        <field var="muc#roomconfig_whois"><value>anyone</value></field>"#,
    )
    .await;

    let received = t.received();
    assert_eq!(received.len(), 3);

    assert_eq!(received[0].name(), "iq");
    assert_eq!(received[0].type_attr(), Some("result"));

    let mut recipients = vec![];
    for message in &received[1..] {
        assert_eq!(message.name(), "message");
        assert_eq!(message.type_attr(), Some("groupchat"));
        assert_eq!(message.from_attr(), ROOM);
        assert_eq!(message.status_codes(), vec![104, 172]);
        recipients.push(message.to_attr().to_string());
    }
    recipients.sort();
    assert_eq!(recipients, vec![JULIET.to_string(), ROMEO.to_string()]);

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert_eq!(room.name, "Capulet Garden");
    assert!(room.config.persistent);
    assert!(room.config.non_anonymous);

    Ok(())
}

#[tokio::test]
async fn test_invalid_config_submission_changes_nothing() -> Result<()> {
    let t = TestService::new();
    t.create_instant_room(JULIET, "garden@chat.shakespeare.lit/juliet")
        .await;

    t.submit_config(
        JULIET,
        ROOM,
        r#"<field var="muc#roomconfig_persistentroom"><value>1</value></field>
        <field var="muc#roomconfig_passwordprotectedroom"><value>1</value></field>"#,
    )
    .await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].error_condition().as_deref(), Some("bad-request"));

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert!(!room.config.persistent);
    assert!(!room.config.password_protected);

    Ok(())
}

#[tokio::test]
async fn test_cancelling_initial_configuration_destroys_room() -> Result<()> {
    let t = TestService::new();

    t.muc_join(JULIET, "garden@chat.shakespeare.lit/juliet", None)
        .await;
    t.received();

    t.send(format!(
        r#"<iq xmlns="jabber:client" from="{JULIET}" to="{ROOM}" id="cancel" type="set">
            <query xmlns="http://jabber.org/protocol/muc#owner">
                <x xmlns="jabber:x:data" type="cancel"/>
            </query>
        </iq>"#
    ))
    .await;

    let received = t.received();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].name(), "presence");
    assert_eq!(received[0].type_attr(), Some("unavailable"));
    assert_eq!(received[1].name(), "iq");
    assert_eq!(received[1].type_attr(), Some("result"));

    assert!(t.service.room(&room_id!(ROOM)).await.is_none());
    assert_eq!(t.repository.room_count(), 0);
    assert_eq!(t.repository.occupant_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_destroy_room() -> Result<()> {
    let t = TestService::new();
    t.create_instant_room(JULIET, "garden@chat.shakespeare.lit/juliet")
        .await;
    t.join(ROMEO, "garden@chat.shakespeare.lit/romeo").await;
    t.received();

    t.send(format!(
        r#"<iq xmlns="jabber:client" from="{JULIET}" to="{ROOM}" id="destroy" type="set">
            <query xmlns="http://jabber.org/protocol/muc#owner">
                <destroy jid="orchard@chat.shakespeare.lit">
                    <reason>Macbeth doth come.</reason>
                </destroy>
            </query>
        </iq>"#
    ))
    .await;

    let received = t.received();
    assert_eq!(received.len(), 3);

    let presences = received
        .iter()
        .filter(|stanza| stanza.name() == "presence")
        .collect::<Vec<_>>();
    assert_eq!(presences.len(), 2);
    for presence in presences {
        assert_eq!(presence.type_attr(), Some("unavailable"));
        assert_eq!(
            affiliation_and_role(presence),
            (Some(Affiliation::None), Some(Role::None))
        );
    }

    let result = received.last().expect("IQ result");
    assert_eq!(result.id_attr(), Some("destroy"));
    assert_eq!(result.type_attr(), Some("result"));

    assert!(t.service.room(&room_id!(ROOM)).await.is_none());
    assert_eq!(t.repository.room_count(), 0);
    assert_eq!(t.repository.occupant_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_last_leave_destroys_temporary_room() -> Result<()> {
    let t = TestService::new();
    t.create_instant_room(JULIET, "garden@chat.shakespeare.lit/juliet")
        .await;

    t.leave(JULIET, "garden@chat.shakespeare.lit/juliet").await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].type_attr(), Some("unavailable"));
    assert_eq!(received[0].status_codes(), vec![303, 110]);

    assert!(t.service.room(&room_id!(ROOM)).await.is_none());
    assert_eq!(t.repository.room_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_persistent_room_survives_last_leave() -> Result<()> {
    let t = TestService::new();
    t.create_instant_room(JULIET, "garden@chat.shakespeare.lit/juliet")
        .await;
    t.submit_config(
        JULIET,
        ROOM,
        r#"<field var="muc#roomconfig_persistentroom"><value>true</value></field>"#,
    )
    .await;

    t.leave(JULIET, "garden@chat.shakespeare.lit/juliet").await;
    t.received();

    assert_eq!(t.repository.room_count(), 1);
    assert_eq!(t.repository.occupant_count(), 0);

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert!(room.is_empty());

    // Owners keep their affiliation.
    t.join(JULIET, "garden@chat.shakespeare.lit/juliet").await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].status_codes(), vec![110]);
    assert_eq!(
        affiliation_and_role(&received[0]),
        (Some(Affiliation::Owner), Some(Role::Moderator))
    );

    Ok(())
}

#[tokio::test]
async fn test_create_room_fails_for_existing_room() -> Result<()> {
    let t = TestService::new();

    let room = t
        .service
        .create_room(
            &t.ctx,
            &full!(JULIET),
            &occupant_id!("garden@chat.shakespeare.lit/juliet"),
            false,
        )
        .await?;
    assert!(!room.locked);
    assert_eq!(room.occupant_count(), 1);

    let result = t
        .service
        .create_room(
            &t.ctx,
            &full!(ROMEO),
            &occupant_id!("garden@chat.shakespeare.lit/romeo"),
            true,
        )
        .await;
    assert!(matches!(result, Err(MucError::Conflict(_))));

    assert!(t.received().is_empty());
    assert_eq!(t.repository.room_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_rooms_on_other_hosts_are_not_served() -> Result<()> {
    let t = TestService::new();

    t.join(JULIET, "garden@evil.example/juliet").await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].to_attr(), JULIET);
    assert_eq!(received[0].type_attr(), Some("error"));
    assert_eq!(
        received[0].error_condition().as_deref(),
        Some("item-not-found")
    );

    t.submit_config(JULIET, "garden@evil.example", "").await;
    assert_eq!(
        t.received()[0].error_condition().as_deref(),
        Some("item-not-found")
    );

    t.groupchat(JULIET, "garden@evil.example", "Is anybody there?")
        .await;
    assert_eq!(
        t.received()[0].error_condition().as_deref(),
        Some("item-not-found")
    );

    let result = t
        .service
        .create_room(
            &t.ctx,
            &full!(JULIET),
            &occupant_id!("garden@evil.example/juliet"),
            true,
        )
        .await;
    assert!(matches!(result, Err(MucError::NotFound(_))));

    assert!(t
        .service
        .room(&room_id!("garden@evil.example"))
        .await
        .is_none());
    assert_eq!(t.repository.room_count(), 0);
    assert_eq!(t.repository.occupant_count(), 0);

    Ok(())
}
