// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use in_memory_room_repository::InMemoryRoomRepository;
pub use room_registry::{RoomGuard, RoomRegistry};

mod in_memory_room_repository;
mod room_registry;
