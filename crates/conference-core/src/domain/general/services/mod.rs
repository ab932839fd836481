// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use router::Router;

mod router;

#[cfg(any(test, feature = "test"))]
pub mod mocks {
    pub use super::router::MockRouter;
}
