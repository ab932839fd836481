// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use minidom::Element;
use xmpp_parsers::iq::{Iq, IqType};
use xmpp_parsers::stanza_error::StanzaError;

use conference_xmpp::stanza::muc::{Item, MucQuery, QueryKind};
use conference_xmpp::stanza::DataForm;

/// A successful reply to `request`, echoing its id.
pub fn iq_result(request: &Iq, payload: Option<Element>) -> Iq {
    reply(request, IqType::Result(payload))
}

pub fn iq_error(request: &Iq, error: StanzaError) -> Iq {
    reply(request, IqType::Error(error))
}

/// Replies to an owner's form request with `form`.
pub fn config_form_result(request: &Iq, form: DataForm) -> Iq {
    iq_result(
        request,
        Some(MucQuery::new(QueryKind::Owner).with_form(form).into()),
    )
}

/// Replies to a role or affiliation list request.
pub fn occupant_list_result(request: &Iq, items: impl IntoIterator<Item = Item>) -> Iq {
    iq_result(
        request,
        Some(MucQuery::new(QueryKind::Admin).with_items(items).into()),
    )
}

fn reply(request: &Iq, payload: IqType) -> Iq {
    Iq {
        from: request.to.clone(),
        to: request.from.clone(),
        id: request.id.clone(),
        payload,
    }
}
