// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use tokio_util::sync::CancellationToken;

use crate::domain::rooms::models::MucError;

/// Carries the cancellation state of the request that triggered an operation.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancellation_token: CancellationToken,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation_token(cancellation_token: CancellationToken) -> Self {
        RequestContext { cancellation_token }
    }

    pub fn cancel(&self) {
        self.cancellation_token.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    pub fn ensure_not_cancelled(&self) -> Result<(), MucError> {
        if self.is_cancelled() {
            return Err(MucError::Cancelled);
        }
        Ok(())
    }
}
