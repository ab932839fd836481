// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::sync::Arc;

use conference_xmpp::IDProvider;

use crate::app::deps::MucConfig;
use crate::domain::general::services::Router;
use crate::domain::rooms::repos::RoomRepository;
use crate::infra::rooms::RoomRegistry;

pub type DynIDProvider = Arc<dyn IDProvider>;
pub type DynMucConfig = Arc<MucConfig>;
pub type DynRoomRegistry = Arc<RoomRegistry>;
pub type DynRoomRepository = Arc<dyn RoomRepository>;
pub type DynRouter = Arc<dyn Router>;

#[derive(Clone)]
pub struct AppDependencies {
    pub config: DynMucConfig,
    pub id_provider: DynIDProvider,
    pub room_registry: DynRoomRegistry,
    pub room_repo: DynRoomRepository,
    pub router: DynRouter,
}
