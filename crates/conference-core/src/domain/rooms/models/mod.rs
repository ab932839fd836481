// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use conference_xmpp::stanza::muc::{Affiliation, Role};

pub use muc_error::MucError;
pub use occupant::Occupant;
pub use room::Room;
pub use room_config::RoomConfig;

mod muc_error;
mod occupant;
mod room;
mod room_config;
