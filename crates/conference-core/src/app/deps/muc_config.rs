// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use serde::{Deserialize, Serialize};

use crate::domain::rooms::models::{Affiliation, RoomConfig};

/// Which durable affiliations survive when their holder leaves a room. Owners and outcasts are
/// always kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffiliationRetention {
    Always,
    /// Keep member and admin affiliations only in rooms which are not open.
    #[default]
    MembersOnly,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MucConfig {
    /// The conference domain, e.g. `conference.example.org`.
    pub muc_host: String,
    /// The user domain the conference host belongs to.
    pub server_host: Option<String>,
    pub default_room_config: RoomConfig,
    pub default_room_description: String,
    /// Joins beyond this number of occupants are rejected.
    pub max_occupants_per_room: Option<u32>,
    pub affiliation_retention: AffiliationRetention,
    /// Language of error texts and the configuration form.
    pub language: String,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("The MUC host must not be empty")]
    MissingMucHost,
    #[error("The MUC host {0} must differ from the server host")]
    MucHostIsServerHost(String),
}

impl Default for MucConfig {
    fn default() -> Self {
        MucConfig {
            muc_host: String::new(),
            server_host: None,
            default_room_config: RoomConfig::default(),
            default_room_description: "Chatroom".to_string(),
            max_occupants_per_room: None,
            affiliation_retention: AffiliationRetention::default(),
            language: "en".to_string(),
        }
    }
}

impl MucConfig {
    pub fn new(muc_host: impl Into<String>) -> Self {
        MucConfig {
            muc_host: muc_host.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.muc_host.is_empty() {
            return Err(ConfigError::MissingMucHost);
        }
        if self.server_host.as_deref() == Some(self.muc_host.as_str()) {
            return Err(ConfigError::MucHostIsServerHost(self.muc_host.clone()));
        }
        Ok(())
    }

    /// Whether `affiliation` is kept after its holder left a room configured with `config`.
    pub fn retains_affiliation(&self, affiliation: Affiliation, config: &RoomConfig) -> bool {
        match affiliation {
            Affiliation::Owner | Affiliation::Outcast => true,
            Affiliation::None => false,
            Affiliation::Admin | Affiliation::Member => match self.affiliation_retention {
                AffiliationRetention::Always => true,
                AffiliationRetention::MembersOnly => !config.open,
                AffiliationRetention::Never => false,
            },
        }
    }
}
