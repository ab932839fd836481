// prose-conference/conference-xmpp
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::str::FromStr;

use minidom::{Element, NSChoice};
use strum_macros::{Display, EnumString};
use xmpp_parsers::iq::{IqGetPayload, IqResultPayload, IqSetPayload};

use crate::ns;
use crate::stanza::muc::{Destroy, Item};
use crate::stanza::DataForm;
use crate::util::{ElementExt, ParseError};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Display, EnumString)]
pub enum QueryKind {
    #[strum(serialize = "http://jabber.org/protocol/muc#owner")]
    Owner,
    #[strum(serialize = "http://jabber.org/protocol/muc#admin")]
    Admin,
}

/// A `<query/>` in either the muc#owner or the muc#admin namespace.
#[derive(Debug, PartialEq, Clone)]
pub struct MucQuery {
    pub kind: QueryKind,
    pub items: Vec<Item>,
    pub form: Option<DataForm>,
    pub destroy: Option<Destroy>,
}

impl MucQuery {
    pub fn new(kind: QueryKind) -> Self {
        MucQuery {
            kind,
            items: Default::default(),
            form: None,
            destroy: None,
        }
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = Item>) -> Self {
        self.items = items.into_iter().collect();
        self
    }

    pub fn with_form(mut self, form: DataForm) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_destroy(mut self, destroy: Destroy) -> Self {
        self.destroy = Some(destroy);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.form.is_none() && self.destroy.is_none()
    }
}

impl From<MucQuery> for Element {
    fn from(value: MucQuery) -> Self {
        let ns = value.kind.to_string();

        Element::builder("query", ns.clone())
            .append_all(value.items.into_iter().map(|item| item.into_element(&ns)))
            .append_all(value.form.map(Element::from))
            .append_all(value.destroy.map(|destroy| destroy.into_element(&ns)))
            .build()
    }
}

impl TryFrom<Element> for MucQuery {
    type Error = ParseError;

    fn try_from(root: Element) -> Result<Self, Self::Error> {
        root.expect_is("query", NSChoice::AnyOf(&[ns::MUC_OWNER, ns::MUC_ADMIN]))?;

        let mut query = MucQuery::new(QueryKind::from_str(&root.ns())?);

        for child in root.children() {
            match child {
                _ if child.is("item", ns::MUC_ADMIN) => {
                    query.items.push(Item::try_from(child.clone())?)
                }
                _ if child.is("x", ns::DATA_FORMS) => {
                    query.form = Some(DataForm::try_from(child.clone())?)
                }
                _ if child.is("destroy", ns::MUC_OWNER) => {
                    query.destroy = Some(Destroy::try_from(child.clone())?)
                }
                _ => {
                    return Err(ParseError::Generic {
                        msg: format!(
                            "Encountered unexpected payload {} in muc query.",
                            child.name()
                        ),
                    })
                }
            }
        }

        Ok(query)
    }
}

impl IqGetPayload for MucQuery {}
impl IqSetPayload for MucQuery {}
impl IqResultPayload for MucQuery {}
