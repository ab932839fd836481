// prose-conference
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use anyhow::Result;
use pretty_assertions::assert_eq;

use conference_core::room_id;
use conference_xmpp::bare;

use crate::tests::helpers::{StanzaExt, TestService};

const JULIET: &str = "juliet@capulet.lit/balcony";
const ROMEO: &str = "romeo@montague.lit/orchard";
const BENVOLIO: &str = "benvolio@montague.lit/street";
const ROOM: &str = "garden@chat.shakespeare.lit";

const MUC_USER: &str = "http://jabber.org/protocol/muc#user";

async fn room_with_romeo() -> TestService {
    let t = TestService::new();
    t.create_instant_room(JULIET, "garden@chat.shakespeare.lit/juliet")
        .await;
    t.join(ROMEO, "garden@chat.shakespeare.lit/romeo").await;
    t.received();
    t
}

#[tokio::test]
async fn test_groupchat_message_is_broadcast() -> Result<()> {
    let t = room_with_romeo().await;

    t.groupchat(ROMEO, ROOM, "But soft, what light through yonder window breaks?")
        .await;

    let received = t.received();
    assert_eq!(received.len(), 2);

    let mut recipients = vec![];
    for message in &received {
        assert_eq!(message.name(), "message");
        assert_eq!(message.type_attr(), Some("groupchat"));
        assert_eq!(message.from_attr(), "garden@chat.shakespeare.lit/romeo");
        assert_eq!(message.id_attr(), Some("msg"));
        assert_eq!(
            message.body().as_deref(),
            Some("But soft, what light through yonder window breaks?")
        );
        recipients.push(message.to_attr().to_string());
    }
    recipients.sort();
    assert_eq!(recipients, vec![JULIET.to_string(), ROMEO.to_string()]);

    Ok(())
}

#[tokio::test]
async fn test_groupchat_message_from_non_occupant_is_rejected() -> Result<()> {
    let t = room_with_romeo().await;

    t.groupchat(BENVOLIO, ROOM, "Here comes the furious Tybalt back again.")
        .await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].to_attr(), BENVOLIO);
    assert_eq!(received[0].type_attr(), Some("error"));
    assert_eq!(
        received[0].error_condition().as_deref(),
        Some("not-acceptable")
    );

    Ok(())
}

#[tokio::test]
async fn test_visitors_cannot_send_groupchat_messages() -> Result<()> {
    let t = TestService::new();
    t.create_instant_room(JULIET, "garden@chat.shakespeare.lit/juliet")
        .await;
    t.submit_config(
        JULIET,
        ROOM,
        r#"<field var="muc#roomconfig_moderatedroom"><value>1</value></field>"#,
    )
    .await;
    t.join(ROMEO, "garden@chat.shakespeare.lit/romeo").await;
    t.received();

    t.groupchat(ROMEO, ROOM, "Parting is such sweet sorrow.").await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].error_condition().as_deref(), Some("forbidden"));

    // Visitors may neither change the subject of a moderated room.
    t.send(format!(
        r#"<message xmlns="jabber:client" from="{ROMEO}" to="{ROOM}" type="groupchat">
            <subject>Sorrow</subject>
        </message>"#
    ))
    .await;
    assert_eq!(
        t.received()[0].error_condition().as_deref(),
        Some("forbidden")
    );

    Ok(())
}

#[tokio::test]
async fn test_change_subject() -> Result<()> {
    let t = room_with_romeo().await;

    t.send(format!(
        r#"<message xmlns="jabber:client" from="{ROMEO}" to="{ROOM}" id="subject" type="groupchat">
            <subject>Fire Burn and Cauldron Bubble!</subject>
        </message>"#
    ))
    .await;

    let received = t.received();
    assert_eq!(received.len(), 2);
    for message in &received {
        assert_eq!(message.from_attr(), "garden@chat.shakespeare.lit/romeo");
        assert_eq!(message.type_attr(), Some("groupchat"));
        assert_eq!(
            message.subject().as_deref(),
            Some("Fire Burn and Cauldron Bubble!")
        );
        assert_eq!(message.body(), None);
    }

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert_eq!(
        room.subject.as_deref(),
        Some("Fire Burn and Cauldron Bubble!")
    );

    // Newcomers receive the subject after their own presence.
    t.join(BENVOLIO, "garden@chat.shakespeare.lit/benvolio").await;

    let received = t.received();
    assert_eq!(received.len(), 6);

    let subject = received.last().expect("Subject");
    assert_eq!(subject.name(), "message");
    assert_eq!(subject.to_attr(), BENVOLIO);
    assert_eq!(subject.from_attr(), ROOM);
    assert_eq!(
        subject.subject().as_deref(),
        Some("Fire Burn and Cauldron Bubble!")
    );

    Ok(())
}

#[tokio::test]
async fn test_private_message() -> Result<()> {
    let t = room_with_romeo().await;

    t.send(format!(
        r#"<message xmlns="jabber:client" from="{ROMEO}" to="garden@chat.shakespeare.lit/juliet" id="pm" type="chat">
            <body>I take thee at thy word.</body>
        </message>"#
    ))
    .await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].to_attr(), JULIET);
    assert_eq!(received[0].from_attr(), "garden@chat.shakespeare.lit/romeo");
    assert_eq!(received[0].type_attr(), Some("chat"));
    assert_eq!(received[0].id_attr(), Some("pm"));
    assert_eq!(received[0].body().as_deref(), Some("I take thee at thy word."));
    assert!(received[0].get_child("x", MUC_USER).is_some());

    Ok(())
}

#[tokio::test]
async fn test_invalid_private_messages() -> Result<()> {
    let t = room_with_romeo().await;

    let message = |from: &str, to: &str, type_: &str| {
        format!(
            r#"<message xmlns="jabber:client" from="{from}" to="{to}" type="{type_}">
                <body>What's in a name?</body>
            </message>"#
        )
    };

    t.send(message(ROMEO, "garden@chat.shakespeare.lit/tybalt", "chat"))
        .await;
    assert_eq!(
        t.received()[0].error_condition().as_deref(),
        Some("item-not-found")
    );

    t.send(message(
        ROMEO,
        "garden@chat.shakespeare.lit/juliet",
        "groupchat",
    ))
    .await;
    assert_eq!(
        t.received()[0].error_condition().as_deref(),
        Some("bad-request")
    );

    t.send(message(BENVOLIO, "garden@chat.shakespeare.lit/juliet", "chat"))
        .await;
    assert_eq!(
        t.received()[0].error_condition().as_deref(),
        Some("not-acceptable")
    );

    Ok(())
}

#[tokio::test]
async fn test_invitation_and_decline() -> Result<()> {
    let t = TestService::new();
    t.create_instant_room(JULIET, "garden@chat.shakespeare.lit/juliet")
        .await;

    t.send(format!(
        r#"<message xmlns="jabber:client" from="{JULIET}" to="{ROOM}" id="invite">
            <x xmlns="http://jabber.org/protocol/muc#user">
                <invite to="romeo@montague.lit"><reason>Meet me in the garden.</reason></invite>
            </x>
        </message>"#
    ))
    .await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    let invite = received[0]
        .get_child("x", MUC_USER)
        .and_then(|x| x.get_child("invite", MUC_USER))
        .expect("Invite");
    assert_eq!(received[0].id_attr(), Some("invite"));
    assert_eq!(invite.attr("from"), Some(JULIET));
    assert_eq!(
        invite.get_child("reason", MUC_USER).map(|r| r.text()),
        Some("Meet me in the garden.".to_string())
    );

    t.send(format!(
        r#"<message xmlns="jabber:client" from="{ROMEO}" to="{ROOM}" id="decline">
            <x xmlns="http://jabber.org/protocol/muc#user">
                <decline to="juliet@capulet.lit"><reason>Too many Capulets.</reason></decline>
            </x>
        </message>"#
    ))
    .await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].to_attr(), "juliet@capulet.lit");
    assert_eq!(received[0].from_attr(), ROOM);
    assert_eq!(received[0].id_attr(), Some("decline"));
    let decline = received[0]
        .get_child("x", MUC_USER)
        .and_then(|x| x.get_child("decline", MUC_USER))
        .expect("Decline");
    assert_eq!(decline.attr("from"), Some("romeo@montague.lit"));

    let room = t.service.room(&room_id!(ROOM)).await.expect("Room exists");
    assert!(!room.is_invited(&bare!("romeo@montague.lit")));

    Ok(())
}

#[tokio::test]
async fn test_relayed_invitations_without_id_get_a_new_one() -> Result<()> {
    let t = TestService::new();
    t.create_instant_room(JULIET, "garden@chat.shakespeare.lit/juliet")
        .await;

    t.send(format!(
        r#"<message xmlns="jabber:client" from="{JULIET}" to="{ROOM}">
            <x xmlns="http://jabber.org/protocol/muc#user">
                <invite to="romeo@montague.lit"/>
                <invite to="benvolio@montague.lit"/>
            </x>
        </message>"#
    ))
    .await;

    let received = t.received();
    assert_eq!(received.len(), 2);
    let ids = received
        .iter()
        .map(|stanza| stanza.id_attr().map(ToString::to_string))
        .collect::<Vec<_>>();
    assert!(ids.iter().all(|id| id
        .as_deref()
        .map(|id| id.starts_with("id-"))
        .unwrap_or(false)));
    assert_ne!(ids[0], ids[1]);

    t.send(format!(
        r#"<message xmlns="jabber:client" from="{BENVOLIO}" to="{ROOM}">
            <x xmlns="http://jabber.org/protocol/muc#user">
                <decline to="juliet@capulet.lit"/>
            </x>
        </message>"#
    ))
    .await;

    let received = t.received();
    assert_eq!(received.len(), 1);
    let decline_id = received[0].id_attr().map(ToString::to_string);
    assert!(decline_id
        .as_deref()
        .map(|id| id.starts_with("id-"))
        .unwrap_or(false));
    assert!(!ids.contains(&decline_id));

    Ok(())
}

#[tokio::test]
async fn test_invitations_need_an_occupant_and_a_recipient() -> Result<()> {
    let t = TestService::new();
    t.create_instant_room(JULIET, "garden@chat.shakespeare.lit/juliet")
        .await;

    let invite = |from: &str, invite: &str| {
        format!(
            r#"<message xmlns="jabber:client" from="{from}" to="{ROOM}">
                <x xmlns="http://jabber.org/protocol/muc#user">{invite}</x>
            </message>"#
        )
    };

    t.send(invite(ROMEO, r#"<invite to="benvolio@montague.lit"/>"#))
        .await;
    assert_eq!(
        t.received()[0].error_condition().as_deref(),
        Some("not-acceptable")
    );

    t.send(invite(JULIET, "<invite><reason>Anyone?</reason></invite>"))
        .await;
    assert_eq!(
        t.received()[0].error_condition().as_deref(),
        Some("bad-request")
    );

    Ok(())
}

#[tokio::test]
async fn test_ignored_messages() -> Result<()> {
    let t = room_with_romeo().await;

    t.send(format!(
        r#"<message xmlns="jabber:client" from="{ROMEO}" to="{ROOM}" type="chat">
            <body>Anybody there?</body>
        </message>"#
    ))
    .await;
    t.send(format!(
        r#"<message xmlns="jabber:client" from="{ROMEO}" to="{ROOM}" type="error"/>"#
    ))
    .await;

    assert!(t.received().is_empty());

    Ok(())
}
