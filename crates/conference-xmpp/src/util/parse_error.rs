// prose-conference/conference-xmpp
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Parse error: {msg}")]
    Generic { msg: String },
    #[error(transparent)]
    XMPPParseError(#[from] xmpp_parsers::Error),
    #[error(transparent)]
    JidError(#[from] jid::Error),
    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),
}

impl From<strum::ParseError> for ParseError {
    fn from(value: strum::ParseError) -> Self {
        Self::Generic {
            msg: value.to_string(),
        }
    }
}
