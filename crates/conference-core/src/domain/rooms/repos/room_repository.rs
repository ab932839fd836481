// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::rooms::models::{Occupant, Room};
use crate::domain::shared::models::{OccupantId, RoomId};

/// Durable storage of rooms and occupants. The repository is the source of truth, any room
/// held in memory is a cache of what has been persisted here.
#[async_trait]
#[cfg_attr(any(test, feature = "test"), mockall::automock)]
pub trait RoomRepository: Send + Sync {
    async fn room_exists(&self, room_id: &RoomId) -> Result<bool>;
    async fn fetch_room(&self, room_id: &RoomId) -> Result<Option<Room>>;
    async fn upsert_room(&self, room: &Room) -> Result<()>;
    async fn delete_room(&self, room_id: &RoomId) -> Result<()>;

    async fn fetch_occupant(&self, occupant_id: &OccupantId) -> Result<Option<Occupant>>;
    async fn upsert_occupant(&self, occupant: &Occupant) -> Result<()>;
    async fn delete_occupant(&self, occupant_id: &OccupantId) -> Result<()>;
}

#[async_trait]
impl<T: RoomRepository + ?Sized> RoomRepository for Arc<T> {
    async fn room_exists(&self, room_id: &RoomId) -> Result<bool> {
        (**self).room_exists(room_id).await
    }

    async fn fetch_room(&self, room_id: &RoomId) -> Result<Option<Room>> {
        (**self).fetch_room(room_id).await
    }

    async fn upsert_room(&self, room: &Room) -> Result<()> {
        (**self).upsert_room(room).await
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<()> {
        (**self).delete_room(room_id).await
    }

    async fn fetch_occupant(&self, occupant_id: &OccupantId) -> Result<Option<Occupant>> {
        (**self).fetch_occupant(occupant_id).await
    }

    async fn upsert_occupant(&self, occupant: &Occupant) -> Result<()> {
        (**self).upsert_occupant(occupant).await
    }

    async fn delete_occupant(&self, occupant_id: &OccupantId) -> Result<()> {
        (**self).delete_occupant(occupant_id).await
    }
}
