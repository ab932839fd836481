// prose-conference/conference-xmpp
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use minidom::Element;
use xmpp_parsers::presence::PresencePayload;

use crate::ns;
use crate::util::{ElementBuilderExt, ElementExt, ParseError};

/// The `<x xmlns='http://jabber.org/protocol/muc'/>` payload a client attaches to its join
/// presence. Its absence marks a legacy groupchat 1.0 join.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct MucJoin {
    pub password: Option<String>,
}

impl MucJoin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl PresencePayload for MucJoin {}

impl TryFrom<Element> for MucJoin {
    type Error = ParseError;

    fn try_from(root: Element) -> Result<Self, Self::Error> {
        root.expect_is("x", ns::MUC)?;

        Ok(MucJoin {
            password: root.child_text("password", ns::MUC),
        })
    }
}

impl From<MucJoin> for Element {
    fn from(value: MucJoin) -> Self {
        Element::builder("x", ns::MUC)
            .append_text_child("password", ns::MUC, value.password)
            .build()
    }
}
