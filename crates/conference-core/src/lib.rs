// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use app::deps::{AffiliationRetention, ConfigError, MucConfig, RequestContext};
pub use app::services::MucService;
pub use muc_service_builder::{MucServiceBuilder, UndefinedRepository, UndefinedRouter};


pub mod app;
pub mod domain;
pub mod infra;
mod muc_service_builder;
