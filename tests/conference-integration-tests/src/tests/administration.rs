// prose-conference
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use anyhow::Result;
use pretty_assertions::assert_eq;

use conference_core::room_id;
use conference_xmpp::bare;
use conference_xmpp::stanza::muc::{Affiliation, Role};

use crate::tests::helpers::{affiliation_and_role, StanzaExt, TestService};

const JULIET: &str = "juliet@capulet.lit/balcony";
const ROMEO: &str = "romeo@montague.lit/orchard";
const BENVOLIO: &str = "benvolio@montague.lit/street";
const ROOM: &str = "garden@chat.shakespeare.lit";

async fn room_with_romeo() -> TestService {
    let t = TestService::new();
    t.create_instant_room(JULIET, "garden@chat.shakespeare.lit/juliet")
        .await;
    t.join(ROMEO, "garden@chat.shakespeare.lit/romeo").await;
    t.received();
    t
}

#[tokio::test]
async fn test_kick_occupant() -> Result<()> {
    let t = room_with_romeo().await;

    t.admin_set(
        JULIET,
        ROOM,
        r#"<item nick="romeo" role="none"><reason>Avaunt, you cullion!</reason></item>"#,
    )
    .await;

    let received = t.received();
    assert_eq!(received.len(), 3);

    assert_eq!(received[0].name(), "iq");
    assert_eq!(received[0].type_attr(), Some("result"));
    assert_eq!(received[0].id_attr(), Some("admin"));

    assert_eq!(received[1].to_attr(), JULIET);
    assert_eq!(received[1].from_attr(), "garden@chat.shakespeare.lit/romeo");
    assert_eq!(received[1].type_attr(), Some("unavailable"));
    assert_eq!(received[1].status_codes(), vec![307]);

    assert_eq!(received[2].to_attr(), ROMEO);
    assert_eq!(received[2].status_codes(), vec![307, 110]);

    let item = received[2].muc_items().remove(0);
    assert_eq!(item.role, Some(Role::None));
    assert_eq!(item.reason.as_deref(), Some("Avaunt, you cullion!"));
    assert_eq!(
        item.actor.and_then(|actor| actor.nick).as_deref(),
        Some("juliet")
    );

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert_eq!(room.occupant_count(), 1);
    assert_eq!(room.occupant_count(), room.member_index_count());
    assert_eq!(t.repository.occupant_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_ban_user() -> Result<()> {
    let t = room_with_romeo().await;

    t.admin_set(
        JULIET,
        ROOM,
        r#"<item affiliation="outcast" jid="romeo@montague.lit"><reason>Treason</reason></item>"#,
    )
    .await;

    let received = t.received();
    assert_eq!(received.len(), 3);
    assert_eq!(received[0].type_attr(), Some("result"));

    let mut recipients = vec![];
    for presence in &received[1..] {
        assert_eq!(presence.type_attr(), Some("unavailable"));
        assert_eq!(presence.from_attr(), "garden@chat.shakespeare.lit/romeo");
        assert_eq!(presence.status_codes(), vec![301]);
        assert_eq!(
            affiliation_and_role(presence),
            (Some(Affiliation::Outcast), Some(Role::None))
        );
        recipients.push(presence.to_attr().to_string());
    }
    recipients.sort();
    assert_eq!(recipients, vec![JULIET.to_string(), ROMEO.to_string()]);

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert_eq!(
        room.affiliation_of(&bare!("romeo@montague.lit")),
        Affiliation::Outcast
    );
    assert!(room.occupant("romeo").is_none());

    t.join(ROMEO, "garden@chat.shakespeare.lit/romeo").await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].error_condition().as_deref(), Some("forbidden"));

    Ok(())
}

#[tokio::test]
async fn test_revoke_membership_in_members_only_room() -> Result<()> {
    let t = room_with_romeo().await;

    t.admin_set(
        JULIET,
        ROOM,
        r#"<item affiliation="member" jid="romeo@montague.lit"/>"#,
    )
    .await;
    t.submit_config(
        JULIET,
        ROOM,
        r#"<field var="muc#roomconfig_membersonly"><value>1</value></field>"#,
    )
    .await;
    t.received();

    t.admin_set(
        JULIET,
        ROOM,
        r#"<item affiliation="none" jid="romeo@montague.lit"/>"#,
    )
    .await;

    let received = t.received();
    assert_eq!(received.len(), 3);
    for presence in &received[1..] {
        assert_eq!(presence.type_attr(), Some("unavailable"));
        assert_eq!(presence.status_codes(), vec![321]);
        assert_eq!(
            affiliation_and_role(presence),
            (Some(Affiliation::None), Some(Role::None))
        );
    }

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert!(room.occupant("romeo").is_none());
    assert_eq!(
        room.affiliation_of(&bare!("romeo@montague.lit")),
        Affiliation::None
    );

    Ok(())
}

#[tokio::test]
async fn test_participant_cannot_kick_owner() -> Result<()> {
    let t = room_with_romeo().await;

    t.admin_set(ROMEO, ROOM, r#"<item nick="juliet" role="none"/>"#)
        .await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].to_attr(), ROMEO);
    assert_eq!(received[0].type_attr(), Some("error"));
    assert_eq!(received[0].error_condition().as_deref(), Some("forbidden"));

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert_eq!(room.occupant_count(), 2);

    Ok(())
}

#[tokio::test]
async fn test_grant_moderator_role() -> Result<()> {
    let t = room_with_romeo().await;

    t.admin_set(JULIET, ROOM, r#"<item nick="romeo" role="moderator"/>"#)
        .await;

    let received = t.received();
    assert_eq!(received.len(), 3);
    assert_eq!(received[0].type_attr(), Some("result"));

    for presence in &received[1..] {
        assert_eq!(presence.from_attr(), "garden@chat.shakespeare.lit/romeo");
        assert_eq!(presence.type_attr(), None);
        assert_eq!(
            affiliation_and_role(presence),
            (Some(Affiliation::None), Some(Role::Moderator))
        );
    }

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert_eq!(
        room.occupant("romeo").map(|occupant| occupant.role),
        Some(Role::Moderator)
    );

    Ok(())
}

#[tokio::test]
async fn test_occupant_lists() -> Result<()> {
    let t = room_with_romeo().await;

    t.admin_set(
        JULIET,
        ROOM,
        r#"<item affiliation="member" jid="romeo@montague.lit"/>"#,
    )
    .await;
    t.received();

    let request = |from: &str, filter: &str| {
        format!(
            r#"<iq xmlns="jabber:client" from="{from}" to="{ROOM}" id="list" type="get">
                <query xmlns="http://jabber.org/protocol/muc#admin"><item {filter}/></query>
            </iq>"#
        )
    };

    t.send(request(JULIET, r#"affiliation="member""#)).await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].type_attr(), Some("result"));
    let items = received[0].muc_items();
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].jid.as_ref().map(ToString::to_string),
        Some("romeo@montague.lit".to_string())
    );
    assert_eq!(items[0].affiliation, Some(Affiliation::Member));

    t.send(request(JULIET, r#"role="moderator""#)).await;

    let items = t.received().remove(0).muc_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].nick.as_deref(), Some("juliet"));

    // Members may neither list affiliations nor roles.
    t.send(request(ROMEO, r#"affiliation="member""#)).await;
    assert_eq!(
        t.received()[0].error_condition().as_deref(),
        Some("forbidden")
    );

    t.send(request(ROMEO, r#"role="participant""#)).await;
    assert_eq!(
        t.received()[0].error_condition().as_deref(),
        Some("forbidden")
    );

    Ok(())
}

#[tokio::test]
async fn test_last_owner_cannot_step_down() -> Result<()> {
    let t = room_with_romeo().await;

    t.admin_set(
        JULIET,
        ROOM,
        r#"<item affiliation="admin" jid="juliet@capulet.lit"/>"#,
    )
    .await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].error_condition().as_deref(), Some("conflict"));

    // A second owner allows the first one to leave the post.
    t.admin_set(
        JULIET,
        ROOM,
        r#"<item affiliation="owner" jid="romeo@montague.lit"/>"#,
    )
    .await;
    assert_eq!(t.received()[0].type_attr(), Some("result"));

    t.admin_set(
        JULIET,
        ROOM,
        r#"<item affiliation="admin" jid="juliet@capulet.lit"/>"#,
    )
    .await;
    assert_eq!(t.received()[0].type_attr(), Some("result"));

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert_eq!(room.owner_count(), 1);
    assert_eq!(
        room.affiliation_of(&bare!("juliet@capulet.lit")),
        Affiliation::Admin
    );

    Ok(())
}

#[tokio::test]
async fn test_admin_cannot_appoint_owners() -> Result<()> {
    let t = room_with_romeo().await;

    t.admin_set(
        JULIET,
        ROOM,
        r#"<item affiliation="admin" jid="romeo@montague.lit"/>"#,
    )
    .await;
    t.received();

    t.admin_set(
        ROMEO,
        ROOM,
        r#"<item affiliation="owner" jid="benvolio@montague.lit"/>"#,
    )
    .await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].error_condition().as_deref(), Some("forbidden"));

    // Admins may manage members though.
    t.admin_set(
        ROMEO,
        ROOM,
        r#"<item affiliation="member" jid="benvolio@montague.lit"/>"#,
    )
    .await;
    assert_eq!(t.received()[0].type_attr(), Some("result"));

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert_eq!(
        room.affiliation_of(&bare!("benvolio@montague.lit")),
        Affiliation::Member
    );

    Ok(())
}

#[tokio::test]
async fn test_malformed_admin_requests() -> Result<()> {
    let t = room_with_romeo().await;

    t.admin_set(BENVOLIO, ROOM, r#"<item nick="romeo" role="none"/>"#)
        .await;
    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].to_attr(), BENVOLIO);
    assert_eq!(received[0].error_condition().as_deref(), Some("bad-request"));

    t.admin_set(JULIET, ROOM, "").await;
    assert_eq!(
        t.received()[0].error_condition().as_deref(),
        Some("bad-request")
    );

    t.admin_set(JULIET, ROOM, r#"<item nick="romeo"/>"#).await;
    assert_eq!(
        t.received()[0].error_condition().as_deref(),
        Some("bad-request")
    );

    Ok(())
}

#[tokio::test]
async fn test_admin_request_is_applied_completely_or_not_at_all() -> Result<()> {
    let t = room_with_romeo().await;

    t.admin_set(
        JULIET,
        ROOM,
        r#"<item nick="romeo" role="moderator"/><item nick="tybalt" role="none"/>"#,
    )
    .await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0].error_condition().as_deref(),
        Some("item-not-found")
    );

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert_eq!(
        room.occupant("romeo").map(|occupant| occupant.role),
        Some(Role::Participant)
    );

    Ok(())
}
