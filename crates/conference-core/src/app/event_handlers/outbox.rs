// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use minidom::Element;
use tracing::{error, warn};

use crate::app::deps::DynRouter;

/// Stanzas produced while a room is locked. They are delivered after the lock was released.
#[derive(Debug, Default)]
pub(crate) struct Outbox {
    stanzas: Vec<Element>,
}

impl Outbox {
    pub fn push(&mut self, stanza: impl Into<Element>) {
        self.stanzas.push(stanza.into())
    }

    /// Pushes a stanza that could not necessarily be built. A missing stanza is logged and
    /// skipped.
    pub fn push_opt(&mut self, stanza: Option<impl Into<Element>>, description: &str) {
        match stanza {
            Some(stanza) => self.push(stanza),
            None => warn!("Could not build {}. Skipping notification.", description),
        }
    }

    pub fn len(&self) -> usize {
        self.stanzas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stanzas.is_empty()
    }

    /// Hands every stanza to `router`. Routing failures are logged and do not stop the
    /// delivery of the remaining stanzas.
    pub async fn deliver(self, router: &DynRouter) {
        for stanza in self.stanzas {
            let name = stanza.name().to_string();
            let to = stanza.attr("to").unwrap_or_default().to_string();

            if let Err(err) = router.route(stanza).await {
                error!("Failed to route {} to {}. {}", name, to, err);
            }
        }
    }
}
