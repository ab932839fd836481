// prose-conference/conference-xmpp
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use jid::Jid;
use minidom::Element;
use xmpp_parsers::message::MessagePayload;

use crate::ns;
use crate::util::{ElementBuilderExt, ElementExt, ParseError};

/// XEP-0045 mediated invitation (and decline), relayed through the room.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct MediatedInvite {
    pub invites: Vec<Invite>,
    pub decline: Option<Decline>,
    pub password: Option<String>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Invite {
    pub from: Option<Jid>,
    pub to: Option<Jid>,
    pub reason: Option<String>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Decline {
    pub from: Option<Jid>,
    pub to: Option<Jid>,
    pub reason: Option<String>,
}

impl MediatedInvite {
    pub fn is_empty(&self) -> bool {
        self.invites.is_empty() && self.decline.is_none()
    }
}

impl MessagePayload for MediatedInvite {}

impl From<MediatedInvite> for Element {
    fn from(value: MediatedInvite) -> Self {
        Element::builder("x", ns::MUC_USER)
            .append_all(value.invites.into_iter().map(Element::from))
            .append_all(value.decline.map(Element::from))
            .append_text_child("password", ns::MUC_USER, value.password)
            .build()
    }
}

impl TryFrom<Element> for MediatedInvite {
    type Error = ParseError;

    fn try_from(value: Element) -> Result<Self, Self::Error> {
        value.expect_is("x", ns::MUC_USER)?;

        let mut invite = MediatedInvite::default();

        for child in value.children() {
            match child {
                _ if child.is("invite", ns::MUC_USER) => {
                    invite.invites.push(Invite::try_from(child.clone())?)
                }
                _ if child.is("decline", ns::MUC_USER) => {
                    invite.decline = Some(Decline::try_from(child.clone())?)
                }
                _ if child.is("password", ns::MUC_USER) => invite.password = Some(child.text()),
                _ => (),
            }
        }

        Ok(invite)
    }
}

impl From<Invite> for Element {
    fn from(value: Invite) -> Self {
        Element::builder("invite", ns::MUC_USER)
            .attr("from", value.from.map(|jid| jid.to_string()))
            .attr("to", value.to.map(|jid| jid.to_string()))
            .append_text_child("reason", ns::MUC_USER, value.reason)
            .build()
    }
}

impl TryFrom<Element> for Invite {
    type Error = ParseError;

    fn try_from(value: Element) -> Result<Self, Self::Error> {
        value.expect_is("invite", ns::MUC_USER)?;

        Ok(Invite {
            from: value.attr_parsed::<Jid>("from")?,
            to: value.attr_parsed::<Jid>("to")?,
            reason: value.child_text("reason", ns::MUC_USER),
        })
    }
}

impl From<Decline> for Element {
    fn from(value: Decline) -> Self {
        Element::builder("decline", ns::MUC_USER)
            .attr("from", value.from.map(|jid| jid.to_string()))
            .attr("to", value.to.map(|jid| jid.to_string()))
            .append_text_child("reason", ns::MUC_USER, value.reason)
            .build()
    }
}

impl TryFrom<Element> for Decline {
    type Error = ParseError;

    fn try_from(value: Element) -> Result<Self, Self::Error> {
        value.expect_is("decline", ns::MUC_USER)?;

        Ok(Decline {
            from: value.attr_parsed::<Jid>("from")?,
            to: value.attr_parsed::<Jid>("to")?,
            reason: value.child_text("reason", ns::MUC_USER),
        })
    }
}
