// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use occupant_id::OccupantId;
pub use room_id::RoomId;

mod occupant_id;
mod room_id;
