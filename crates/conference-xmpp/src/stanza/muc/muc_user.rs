// prose-conference/conference-xmpp
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::str::FromStr;

use jid::BareJid;
use minidom::{Element, NSChoice};
use xmpp_parsers::message::MessagePayload;
use xmpp_parsers::presence::PresencePayload;

use crate::ns;
use crate::stanza::muc::{Item, Status};
use crate::util::{ElementBuilderExt, ElementExt, ParseError};

/// The `<x xmlns='http://jabber.org/protocol/muc#user'/>` payload the service attaches to
/// presences and messages it emits on behalf of a room.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct MucUser {
    pub items: Vec<Item>,
    pub status: Vec<Status>,
    pub destroy: Option<Destroy>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Destroy {
    pub jid: Option<BareJid>,
    pub reason: Option<String>,
}

impl MucUser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: impl IntoIterator<Item = Status>) -> Self {
        self.status.extend(status);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = Item>) -> Self {
        self.items = items.into_iter().collect();
        self
    }

    pub fn with_destroy(mut self, destroy: Destroy) -> Self {
        self.destroy = Some(destroy);
        self
    }

    pub fn has_status(&self, status: Status) -> bool {
        self.status.contains(&status)
    }
}

impl MessagePayload for MucUser {}
impl PresencePayload for MucUser {}

impl TryFrom<Element> for MucUser {
    type Error = ParseError;

    fn try_from(root: Element) -> Result<Self, Self::Error> {
        root.expect_is("x", ns::MUC_USER)?;

        let mut user = MucUser::default();

        for child in root.children() {
            match child {
                _ if child.is("item", ns::MUC_USER) => {
                    user.items.push(Item::try_from(child.clone())?);
                }
                _ if child.is("status", ns::MUC_USER) => {
                    user.status.push(Status::try_from(child.clone())?);
                }
                _ if child.is("destroy", ns::MUC_USER) => {
                    user.destroy = Some(Destroy::try_from(child.clone())?);
                }
                _ => {
                    return Err(ParseError::Generic {
                        msg: format!(
                            "Encountered unexpected payload {} in muc#user element.",
                            child.name()
                        ),
                    })
                }
            }
        }

        Ok(user)
    }
}

impl From<MucUser> for Element {
    fn from(value: MucUser) -> Self {
        Element::builder("x", ns::MUC_USER)
            .append_all(value.items.into_iter().map(Element::from))
            .append_all(value.status.into_iter().map(Element::from))
            .append_all(value.destroy.map(Element::from))
            .build()
    }
}

impl Destroy {
    /// Serializes the element into the namespace `ns` (muc#user or muc#owner).
    pub fn into_element(self, ns: &str) -> Element {
        Element::builder("destroy", ns)
            .attr("jid", self.jid.map(|jid| jid.to_string()))
            .append_text_child("reason", ns, self.reason)
            .build()
    }
}

impl TryFrom<Element> for Destroy {
    type Error = ParseError;

    fn try_from(root: Element) -> Result<Self, Self::Error> {
        let namespaces = NSChoice::AnyOf(&[ns::MUC_USER, ns::MUC_OWNER]);
        root.expect_is("destroy", namespaces)?;

        Ok(Destroy {
            jid: root.attr("jid").map(BareJid::from_str).transpose()?,
            reason: root.child_text("reason", namespaces),
        })
    }
}

impl From<Destroy> for Element {
    fn from(value: Destroy) -> Self {
        value.into_element(ns::MUC_USER)
    }
}
