// prose-conference/conference-xmpp
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use deps::{IDProvider, UUIDProvider};
pub use stanza::ns;
pub use util::{parse_bool, ElementBuilderExt, ElementExt, ParseError};

mod deps;
pub mod stanza;
mod util;
