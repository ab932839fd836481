// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::rooms::models::Room;
use crate::domain::shared::models::RoomId;

type RoomSlot = Arc<Mutex<Option<Room>>>;

/// Exclusive access to the cached state of a single room. `None` means that the room is either
/// not loaded yet or does not exist.
pub type RoomGuard = OwnedMutexGuard<Option<Room>>;

/// The process-wide index of rooms. Each room address owns a slot guarded by its own mutex, so
/// operations on the same room are serialized while unrelated rooms proceed independently. The
/// registry lock itself is only held while looking up or releasing a slot.
#[derive(Default)]
pub struct RoomRegistry {
    slots: RwLock<HashMap<RoomId, RoomSlot>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to the room `room_id`, creating its slot if needed.
    pub async fn lock(&self, room_id: &RoomId) -> RoomGuard {
        self.slot(room_id).lock_owned().await
    }

    /// Removes the slot of `room_id` if it holds no room and nobody else is waiting for it.
    pub fn release(&self, room_id: &RoomId) {
        let mut slots = self.slots.write();
        let Some(slot) = slots.get(room_id) else {
            return;
        };
        if Arc::strong_count(slot) > 1 {
            return;
        }
        let is_vacant = slot
            .try_lock()
            .map(|guard| guard.is_none())
            .unwrap_or(false);
        if is_vacant {
            slots.remove(room_id);
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.read().len()
    }

    fn slot(&self, room_id: &RoomId) -> RoomSlot {
        if let Some(slot) = self.slots.read().get(room_id) {
            return slot.clone();
        }
        self.slots
            .write()
            .entry(room_id.clone())
            .or_default()
            .clone()
    }
}
