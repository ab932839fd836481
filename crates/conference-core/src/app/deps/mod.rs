// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use app_dependencies::*;
pub use muc_config::{AffiliationRetention, ConfigError, MucConfig};
pub use request_context::RequestContext;

mod app_dependencies;
mod muc_config;
mod request_context;
