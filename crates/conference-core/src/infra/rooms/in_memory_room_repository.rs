// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::domain::rooms::codec::BinaryCodec;
use crate::domain::rooms::models::{Occupant, Room};
use crate::domain::rooms::repos::RoomRepository;
use crate::domain::shared::models::{OccupantId, RoomId};

/// Keeps rooms and occupants in their encoded form, so that every read and write passes
/// through the binary codec like it would with a persistent store.
#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<RoomId, Bytes>>,
    occupants: RwLock<HashMap<OccupantId, Bytes>>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.read().len()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn room_exists(&self, room_id: &RoomId) -> Result<bool> {
        Ok(self.rooms.read().contains_key(room_id))
    }

    async fn fetch_room(&self, room_id: &RoomId) -> Result<Option<Room>> {
        let Some(bytes) = self.rooms.read().get(room_id).cloned() else {
            return Ok(None);
        };
        Ok(Some(Room::from_bytes(&bytes)?))
    }

    async fn upsert_room(&self, room: &Room) -> Result<()> {
        self.rooms.write().insert(room.id.clone(), room.to_bytes());
        Ok(())
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<()> {
        self.rooms.write().remove(room_id);
        Ok(())
    }

    async fn fetch_occupant(&self, occupant_id: &OccupantId) -> Result<Option<Occupant>> {
        let Some(bytes) = self.occupants.read().get(occupant_id).cloned() else {
            return Ok(None);
        };
        Ok(Some(Occupant::from_bytes(&bytes)?))
    }

    async fn upsert_occupant(&self, occupant: &Occupant) -> Result<()> {
        self.occupants
            .write()
            .insert(occupant.id.clone(), occupant.to_bytes());
        Ok(())
    }

    async fn delete_occupant(&self, occupant_id: &OccupantId) -> Result<()> {
        self.occupants.write().remove(occupant_id);
        Ok(())
    }
}
