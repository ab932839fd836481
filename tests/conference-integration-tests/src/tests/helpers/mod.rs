// prose-conference
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use stanza_ext::{affiliation_and_role, StanzaExt};
pub use test_service::{TestService, MUC_HOST};
