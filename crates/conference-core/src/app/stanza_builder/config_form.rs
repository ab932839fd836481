// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use conference_xmpp::ns;
use conference_xmpp::stanza::muc::ns::{roomconfig, whois};
use conference_xmpp::stanza::muc::Affiliation;
use conference_xmpp::stanza::{DataForm, DataFormType, Field, FieldType};

use crate::app::deps::MucConfig;
use crate::domain::rooms::models::{MucError, Room};

/// The owner's configuration form for `room`, prefilled with its current settings.
pub fn room_config_form(room: &Room, config: &MucConfig) -> DataForm {
    let jids_with_affiliation = |affiliation: Affiliation| {
        let mut jids = room
            .affiliations()
            .filter(|(_, a)| **a == affiliation)
            .map(|(user, _)| user.to_string())
            .collect::<Vec<_>>();
        jids.sort();
        jids
    };

    let max_users = config
        .max_occupants_per_room
        .map(|max| max.to_string())
        .unwrap_or_else(|| "none".to_string());

    DataForm::new(DataFormType::Form)
        .with_title(format!("Configuration for {}", room.id))
        .with_instructions("Complete this form to modify the configuration of your room.")
        .with_fields([
            Field::hidden("FORM_TYPE", ns::MUC_ROOMCONFIG),
            Field::fixed("Room information"),
            Field::new(roomconfig::ROOM_NAME, FieldType::TextSingle)
                .with_label("Title")
                .with_value(room.name.clone()),
            Field::new(roomconfig::ROOM_DESC, FieldType::TextSingle)
                .with_label("Description")
                .with_value(room.description.clone()),
            Field::new(roomconfig::LANG, FieldType::TextSingle)
                .with_label("Natural Language for Room Discussions")
                .with_value(config.language.clone()),
            Field::fixed("Access"),
            Field::boolean(
                roomconfig::PUBLIC_ROOM,
                "Make room publicly searchable",
                room.config.public,
            ),
            Field::boolean(
                roomconfig::PERSISTENT_ROOM,
                "Make room persistent",
                room.config.persistent,
            ),
            Field::boolean(
                roomconfig::MEMBERS_ONLY,
                "Make room members-only",
                !room.config.open,
            ),
            Field::boolean(
                roomconfig::PASSWORD_PROTECTED_ROOM,
                "Password required for entry",
                room.config.password_protected,
            ),
            Field::new(roomconfig::ROOM_SECRET, FieldType::TextPrivate)
                .with_label("Password")
                .with_value(room.config.password.clone()),
            Field::new(roomconfig::MAX_USERS, FieldType::ListSingle)
                .with_label("Maximum Number of Occupants")
                .with_value(max_users.clone())
                .with_option(max_users.clone(), max_users),
            Field::fixed("Permissions"),
            Field::boolean(
                roomconfig::MODERATED_ROOM,
                "Make room moderated",
                room.config.moderated,
            ),
            Field::boolean(
                roomconfig::CHANGE_SUBJECT,
                "Allow participants to change the subject",
                !room.config.moderated,
            ),
            Field::boolean(
                roomconfig::ALLOW_INVITES,
                "Allow occupants to invite others",
                true,
            ),
            Field::new(roomconfig::ALLOW_PM, FieldType::ListSingle)
                .with_label("Roles that May Send Private Messages")
                .with_value("anyone")
                .with_option("Anyone", "anyone"),
            Field::new(roomconfig::WHOIS, FieldType::ListSingle)
                .with_label("Who May Discover Real JIDs?")
                .with_value(if room.config.non_anonymous {
                    whois::ANYONE
                } else {
                    whois::MODERATORS
                })
                .with_option("Moderators Only", whois::MODERATORS)
                .with_option("Anyone", whois::ANYONE),
            Field::new(roomconfig::PRESENCE_BROADCAST, FieldType::ListMulti)
                .with_label("Roles for which Presence is Broadcasted")
                .with_values(["moderator", "participant", "visitor"].map(String::from))
                .with_option("Moderator", "moderator")
                .with_option("Participant", "participant")
                .with_option("Visitor", "visitor"),
            Field::new(roomconfig::GET_MEMBER_LIST, FieldType::ListMulti)
                .with_label("Roles and Affiliations that May Retrieve Member List")
                .with_values(["moderator"].map(String::from))
                .with_option("Moderator", "moderator"),
            Field::new(roomconfig::ROOM_ADMINS, FieldType::JidMulti)
                .with_label("Full List of Room Admins")
                .with_values(jids_with_affiliation(Affiliation::Admin)),
            Field::new(roomconfig::ROOM_OWNERS, FieldType::JidMulti)
                .with_label("Full List of Room Owners")
                .with_values(jids_with_affiliation(Affiliation::Owner)),
            Field::boolean(
                roomconfig::ENABLE_LOGGING,
                "Enable public logging of room conversations",
                false,
            ),
        ])
}

/// Applies a submitted configuration form to `room`. Fields which are missing keep their
/// current value. Returns whether the anonymity of the room changed.
///
/// Nothing is applied when the submission is invalid.
pub fn apply_config_submission(form: &DataForm, room: &mut Room) -> Result<bool, MucError> {
    let bool_field = |var: &str, current: bool| -> Result<bool, MucError> {
        match form.field(var) {
            Some(field) if !field.values.is_empty() => field.bool_value().map_err(|_| {
                MucError::MalformedRequest(format!("Field {} must be a boolean", var))
            }),
            _ => Ok(current),
        }
    };
    let text_field = |var: &str| form.field(var).map(|field| field.values.join("\n"));

    let mut config = room.config.clone();
    config.public = bool_field(roomconfig::PUBLIC_ROOM, config.public)?;
    config.persistent = bool_field(roomconfig::PERSISTENT_ROOM, config.persistent)?;
    config.open = !bool_field(roomconfig::MEMBERS_ONLY, !config.open)?;
    config.moderated = bool_field(roomconfig::MODERATED_ROOM, config.moderated)?;
    config.password_protected =
        bool_field(roomconfig::PASSWORD_PROTECTED_ROOM, config.password_protected)?;
    if let Some(secret) = text_field(roomconfig::ROOM_SECRET) {
        config.password = secret;
    }
    if let Some(whois_value) = form.field(roomconfig::WHOIS).and_then(Field::first_value) {
        config.non_anonymous = match whois_value {
            whois::ANYONE => true,
            whois::MODERATORS => false,
            _ => {
                return Err(MucError::MalformedRequest(format!(
                    "Unsupported whois value {}",
                    whois_value
                )))
            }
        };
    }

    if config.password_protected && config.password.is_empty() {
        return Err(MucError::MalformedRequest(
            "A password protected room needs a password".to_string(),
        ));
    }
    if !config.password_protected {
        config.password.clear();
    }

    let anonymity_changed = config.non_anonymous != room.config.non_anonymous;

    if let Some(name) = text_field(roomconfig::ROOM_NAME) {
        room.name = name;
    }
    if let Some(description) = text_field(roomconfig::ROOM_DESC) {
        room.description = description;
    }
    room.config = config;

    Ok(anonymity_changed)
}
