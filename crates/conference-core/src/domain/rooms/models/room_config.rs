// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use serde::{Deserialize, Serialize};

use crate::domain::rooms::codec::{BinaryCodec, DecodeError, Decoder, Encoder};

/// The policy snapshot of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub public: bool,
    /// The room survives its last occupant leaving.
    pub persistent: bool,
    pub password_protected: bool,
    /// Only meaningful when `password_protected` is set.
    pub password: String,
    /// Anyone may join without being a member or holding an invitation.
    pub open: bool,
    /// Only occupants with voice may send groupchat messages.
    pub moderated: bool,
    /// Real JIDs are visible to every occupant.
    pub non_anonymous: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        RoomConfig {
            public: true,
            persistent: false,
            password_protected: false,
            password: String::new(),
            open: true,
            moderated: false,
            non_anonymous: false,
        }
    }
}

impl RoomConfig {
    /// Decodes the fields in order into `self`. On error the fields consumed so far have
    /// already been overwritten and the value must be discarded.
    pub fn decode_into(&mut self, decoder: &mut Decoder<'_>) -> Result<(), DecodeError> {
        self.public = decoder.bool()?;
        self.persistent = decoder.bool()?;
        self.password_protected = decoder.bool()?;
        self.password = if self.password_protected {
            decoder.string()?
        } else {
            String::new()
        };
        self.open = decoder.bool()?;
        self.moderated = decoder.bool()?;
        self.non_anonymous = decoder.bool()?;
        Ok(())
    }

    /// Returns the password a joining user needs to present, if any.
    pub fn required_password(&self) -> Option<&str> {
        self.password_protected.then_some(self.password.as_str())
    }
}

impl BinaryCodec for RoomConfig {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.put_bool(self.public);
        encoder.put_bool(self.persistent);
        encoder.put_bool(self.password_protected);
        if self.password_protected {
            encoder.put_str(&self.password);
        }
        encoder.put_bool(self.open);
        encoder.put_bool(self.moderated);
        encoder.put_bool(self.non_anonymous);
    }

    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError> {
        let mut config = RoomConfig::default();
        config.decode_into(decoder)?;
        Ok(config)
    }
}
