// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use xmpp_parsers::stanza_error::{DefinedCondition, ErrorType, StanzaError};

use conference_xmpp::ParseError;

/// Failures of a MUC operation. Each of them is answered with a protocol error to the sender
/// of the triggering stanza.
#[derive(Debug, thiserror::Error)]
pub enum MucError {
    #[error("Forbidden: {0}")]
    PermissionDenied(String),
    #[error("Bad request: {0}")]
    MalformedRequest(String),
    #[error("Not authorized: {0}")]
    AuthenticationFailed(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not acceptable: {0}")]
    NotAcceptable(String),
    #[error("Registration required: {0}")]
    RegistrationRequired(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("The request was cancelled")]
    Cancelled,
    #[error(transparent)]
    PersistenceFailure(#[from] anyhow::Error),
}

impl MucError {
    pub fn defined_condition(&self) -> DefinedCondition {
        match self {
            MucError::PermissionDenied(_) => DefinedCondition::Forbidden,
            MucError::MalformedRequest(_) => DefinedCondition::BadRequest,
            MucError::AuthenticationFailed(_) => DefinedCondition::NotAuthorized,
            MucError::NotFound(_) => DefinedCondition::ItemNotFound,
            MucError::Conflict(_) => DefinedCondition::Conflict,
            MucError::NotAcceptable(_) => DefinedCondition::NotAcceptable,
            MucError::RegistrationRequired(_) => DefinedCondition::RegistrationRequired,
            MucError::ServiceUnavailable(_) => DefinedCondition::ServiceUnavailable,
            MucError::Cancelled | MucError::PersistenceFailure(_) => {
                DefinedCondition::InternalServerError
            }
        }
    }

    pub fn error_type(&self) -> ErrorType {
        match self {
            MucError::PermissionDenied(_)
            | MucError::AuthenticationFailed(_)
            | MucError::RegistrationRequired(_) => ErrorType::Auth,
            MucError::MalformedRequest(_) | MucError::NotAcceptable(_) => ErrorType::Modify,
            MucError::ServiceUnavailable(_) | MucError::PersistenceFailure(_) => ErrorType::Wait,
            MucError::NotFound(_) | MucError::Conflict(_) | MucError::Cancelled => {
                ErrorType::Cancel
            }
        }
    }

    /// Converts the error into the payload of an error reply. Internal details of persistence
    /// failures are not disclosed to the requester.
    pub fn to_stanza_error(&self, lang: &str) -> StanzaError {
        let text = match self {
            MucError::PersistenceFailure(_) | MucError::Cancelled => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };
        StanzaError::new(self.error_type(), self.defined_condition(), lang, text)
    }
}

impl From<ParseError> for MucError {
    fn from(value: ParseError) -> Self {
        MucError::MalformedRequest(value.to_string())
    }
}

impl From<jid::Error> for MucError {
    fn from(value: jid::Error) -> Self {
        MucError::MalformedRequest(value.to_string())
    }
}
