// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use room_repository::RoomRepository;

mod room_repository;

#[cfg(any(test, feature = "test"))]
pub mod mocks {
    pub use super::room_repository::MockRoomRepository;
}
