// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use permissions::{authorize_affiliation_change, authorize_role_change};

mod permissions;
