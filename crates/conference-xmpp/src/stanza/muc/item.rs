// prose-conference/conference-xmpp
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use jid::Jid;
use minidom::{Element, NSChoice};
use strum_macros::{Display, EnumString};

use crate::ns;
use crate::util::{ElementBuilderExt, ElementExt, ParseError};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Affiliation {
    Owner,
    Admin,
    Member,
    Outcast,
    #[default]
    None,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Moderator,
    Participant,
    Visitor,
    #[default]
    None,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Actor {
    pub jid: Option<Jid>,
    pub nick: Option<String>,
}

/// An `<item/>` as used in the muc#user and muc#admin namespaces.
///
/// Requests may omit either `affiliation` or `role`. When serialized both attributes are always
/// written and default to `none`.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Item {
    pub affiliation: Option<Affiliation>,
    pub role: Option<Role>,
    pub jid: Option<Jid>,
    pub nick: Option<String>,
    pub actor: Option<Actor>,
    pub reason: Option<String>,
}

impl Item {
    pub fn new(affiliation: Affiliation, role: Role) -> Self {
        Item {
            affiliation: Some(affiliation),
            role: Some(role),
            ..Default::default()
        }
    }

    pub fn with_jid(mut self, jid: impl Into<Jid>) -> Self {
        self.jid = Some(jid.into());
        self
    }

    pub fn with_nick(mut self, nick: impl Into<String>) -> Self {
        self.nick = Some(nick.into());
        self
    }

    pub fn with_actor_nick(mut self, nick: impl Into<String>) -> Self {
        self.actor = Some(Actor {
            jid: None,
            nick: Some(nick.into()),
        });
        self
    }

    pub fn with_reason(mut self, reason: Option<impl Into<String>>) -> Self {
        self.reason = reason.map(Into::into);
        self
    }

    /// Serializes the item into the namespace `ns` (muc#user or muc#admin).
    pub fn into_element(self, ns: &str) -> Element {
        Element::builder("item", ns)
            .attr(
                "affiliation",
                self.affiliation.unwrap_or_default().to_string(),
            )
            .attr("role", self.role.unwrap_or_default().to_string())
            .attr("jid", self.jid.map(|jid| jid.to_string()))
            .attr("nick", self.nick)
            .append_all(self.actor.map(|actor| {
                Element::builder("actor", ns)
                    .attr("jid", actor.jid.map(|jid| jid.to_string()))
                    .attr("nick", actor.nick)
                    .build()
            }))
            .append_text_child("reason", ns, self.reason)
            .build()
    }
}

impl From<Item> for Element {
    fn from(value: Item) -> Self {
        value.into_element(ns::MUC_USER)
    }
}

impl TryFrom<Element> for Item {
    type Error = ParseError;

    fn try_from(root: Element) -> Result<Self, Self::Error> {
        let namespaces = NSChoice::AnyOf(&[ns::MUC_USER, ns::MUC_ADMIN]);
        root.expect_is("item", namespaces)?;

        let actor = root
            .children()
            .find(|child| child.is("actor", namespaces))
            .map(|actor| -> Result<Actor, ParseError> {
                Ok(Actor {
                    jid: actor.attr_parsed::<Jid>("jid")?,
                    nick: actor.attr("nick").map(ToString::to_string),
                })
            })
            .transpose()?;

        Ok(Item {
            affiliation: root.attr_parsed::<Affiliation>("affiliation")?,
            role: root.attr_parsed::<Role>("role")?,
            jid: root.attr_parsed::<Jid>("jid")?,
            nick: root.attr("nick").map(ToString::to_string),
            actor,
            reason: root.child_text("reason", namespaces),
        })
    }
}

impl Affiliation {
    /// Ordering used for permission checks: owner > admin > member > none > outcast.
    pub fn rank(&self) -> u8 {
        match self {
            Affiliation::Owner => 4,
            Affiliation::Admin => 3,
            Affiliation::Member => 2,
            Affiliation::None => 1,
            Affiliation::Outcast => 0,
        }
    }
}

impl Role {
    pub fn rank(&self) -> u8 {
        match self {
            Role::Moderator => 3,
            Role::Participant => 2,
            Role::Visitor => 1,
            Role::None => 0,
        }
    }
}
