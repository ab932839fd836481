// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::Arc;

use conference_xmpp::{IDProvider, UUIDProvider};

use crate::app::deps::{
    AppDependencies, ConfigError, DynIDProvider, DynRoomRepository, DynRouter, MucConfig,
};
use crate::app::services::MucService;
use crate::domain::general::services::Router;
use crate::domain::rooms::repos::RoomRepository;
use crate::infra::rooms::RoomRegistry;

pub struct UndefinedRepository;
pub struct UndefinedRouter;

pub struct MucServiceBuilder<R, T> {
    config: MucConfig,
    id_provider: DynIDProvider,
    room_repo: R,
    router: T,
}

impl MucServiceBuilder<UndefinedRepository, UndefinedRouter> {
    pub(crate) fn new() -> Self {
        MucServiceBuilder {
            config: Default::default(),
            id_provider: Arc::new(UUIDProvider::default()),
            room_repo: UndefinedRepository,
            router: UndefinedRouter,
        }
    }
}

impl<T> MucServiceBuilder<UndefinedRepository, T> {
    pub fn set_repository<R: RoomRepository + 'static>(
        self,
        room_repo: R,
    ) -> MucServiceBuilder<DynRoomRepository, T> {
        MucServiceBuilder {
            config: self.config,
            id_provider: self.id_provider,
            room_repo: Arc::new(room_repo),
            router: self.router,
        }
    }
}

impl<R> MucServiceBuilder<R, UndefinedRouter> {
    pub fn set_router<T: Router + 'static>(self, router: T) -> MucServiceBuilder<R, DynRouter> {
        MucServiceBuilder {
            config: self.config,
            id_provider: self.id_provider,
            room_repo: self.room_repo,
            router: Arc::new(router),
        }
    }
}

impl<R, T> MucServiceBuilder<R, T> {
    pub fn set_config(mut self, config: MucConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_id_provider<P: IDProvider + 'static>(mut self, id_provider: P) -> Self {
        self.id_provider = Arc::new(id_provider);
        self
    }
}

impl MucServiceBuilder<DynRoomRepository, DynRouter> {
    pub fn build(self) -> Result<MucService, ConfigError> {
        self.config.validate()?;

        Ok(MucService::new(AppDependencies {
            config: Arc::new(self.config),
            id_provider: self.id_provider,
            room_registry: Arc::new(RoomRegistry::new()),
            room_repo: self.room_repo,
            router: self.router,
        }))
    }
}
