// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use anyhow::Result;
use async_trait::async_trait;
use minidom::Element;

/// Delivers an outbound stanza to its recipient, local or remote.
#[async_trait]
#[cfg_attr(any(test, feature = "test"), mockall::automock)]
pub trait Router: Send + Sync {
    async fn route(&self, stanza: Element) -> Result<()>;
}
