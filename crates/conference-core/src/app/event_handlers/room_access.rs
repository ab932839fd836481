// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use anyhow::Result;
use tracing::{debug, error, info};

use crate::app::deps::{AppDependencies, DynRoomRegistry, DynRoomRepository, RequestContext};
use crate::domain::rooms::models::{MucError, Room};
use crate::domain::shared::models::RoomId;
use crate::infra::rooms::RoomGuard;

/// Loads rooms into the registry and writes mutations through to the repository.
#[derive(Clone)]
pub(crate) struct RoomAccess {
    registry: DynRoomRegistry,
    room_repo: DynRoomRepository,
}

/// A room held under its per-room lock. The cached state is only replaced by
/// [`RoomAccess::commit`] once the repository accepted the new state.
pub(crate) struct LockedRoom {
    room_id: RoomId,
    guard: RoomGuard,
}

impl From<&AppDependencies> for RoomAccess {
    fn from(deps: &AppDependencies) -> Self {
        RoomAccess {
            registry: deps.room_registry.clone(),
            room_repo: deps.room_repo.clone(),
        }
    }
}

impl LockedRoom {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// The current state of the room or `None` if it does not exist.
    pub fn room(&self) -> Option<&Room> {
        self.guard.as_ref()
    }

    pub fn require_room(&self) -> Result<&Room, MucError> {
        self.room()
            .ok_or_else(|| MucError::NotFound(format!("Room {} does not exist", self.room_id)))
    }
}

impl RoomAccess {
    /// Waits for exclusive access to `room_id` and loads the room from the repository if it
    /// is not cached yet.
    pub async fn open(&self, room_id: &RoomId) -> Result<LockedRoom, MucError> {
        let mut guard = self.registry.lock(room_id).await;

        if guard.is_none() {
            if let Some(room) = self.room_repo.fetch_room(room_id).await? {
                debug!("Loaded room {} from repository", room_id);
                *guard = Some(room);
            }
        }

        Ok(LockedRoom {
            room_id: room_id.clone(),
            guard,
        })
    }

    /// Persists `next` and makes it the cached state of the room. `None` deletes the room.
    pub async fn commit(
        &self,
        ctx: &RequestContext,
        locked: &mut LockedRoom,
        next: Option<Room>,
    ) -> Result<(), MucError> {
        ctx.ensure_not_cancelled()?;
        self.persist(locked.guard.as_ref(), next.as_ref()).await?;

        if next.is_none() && locked.guard.is_some() {
            info!("Deleted room {}", locked.room_id);
        }
        *locked.guard = next;
        Ok(())
    }

    /// Releases the lock and frees the registry slot if the room no longer exists.
    pub fn close(&self, locked: LockedRoom) {
        let room_id = locked.room_id;
        drop(locked.guard);
        self.registry.release(&room_id);
    }

    /// Writes the room record first and the occupant records after it. A failed occupant write
    /// restores the repository to `previous`.
    async fn persist(&self, previous: Option<&Room>, next: Option<&Room>) -> Result<()> {
        match (previous, next) {
            (_, Some(next)) => self.room_repo.upsert_room(next).await?,
            (Some(previous), None) => self.room_repo.delete_room(&previous.id).await?,
            (None, None) => return Ok(()),
        }

        if let Err(err) = self.persist_occupants(previous, next).await {
            self.restore(previous, next).await;
            return Err(err);
        }
        Ok(())
    }

    async fn persist_occupants(
        &self,
        previous: Option<&Room>,
        next: Option<&Room>,
    ) -> Result<()> {
        for occupant in previous.into_iter().flat_map(|room| room.occupants()) {
            let is_kept = next
                .map(|next| next.contains_occupant(&occupant.id))
                .unwrap_or(false);
            if !is_kept {
                self.room_repo.delete_occupant(&occupant.id).await?;
            }
        }

        for occupant in next.into_iter().flat_map(|room| room.occupants()) {
            let unchanged = previous
                .and_then(|previous| previous.occupant(occupant.nickname()))
                .map(|previous| previous == occupant)
                .unwrap_or(false);
            if !unchanged {
                self.room_repo.upsert_occupant(occupant).await?;
            }
        }
        Ok(())
    }

    async fn restore(&self, previous: Option<&Room>, next: Option<&Room>) {
        let room_id = previous.or(next).map(|room| room.id.clone());
        let result = match (previous, next) {
            (Some(previous), _) => self.room_repo.upsert_room(previous).await,
            (None, Some(next)) => self.room_repo.delete_room(&next.id).await,
            (None, None) => Ok(()),
        };
        if let Err(err) = result {
            error!("Failed to restore room {:?}. {:?}", room_id, err);
        }

        for occupant in next.into_iter().flat_map(|room| room.occupants()) {
            let existed = previous
                .map(|previous| previous.contains_occupant(&occupant.id))
                .unwrap_or(false);
            if existed {
                continue;
            }
            if let Err(err) = self.room_repo.delete_occupant(&occupant.id).await {
                error!("Failed to remove occupant {}. {:?}", occupant.id, err);
            }
        }

        for occupant in previous.into_iter().flat_map(|room| room.occupants()) {
            if let Err(err) = self.room_repo.upsert_occupant(occupant).await {
                error!("Failed to restore occupant {}. {:?}", occupant.id, err);
            }
        }
    }
}
