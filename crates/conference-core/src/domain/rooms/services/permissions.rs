// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use conference_xmpp::stanza::muc::{Affiliation, Role};

use crate::domain::rooms::models::{MucError, Occupant};

/// Checks whether `requester` may change the role of `target` to `role`.
///
/// Granting or revoking moderator privileges requires an admin or owner. Kicking and voice
/// changes require the moderator role and never apply to admins, owners or occupants with a
/// higher affiliation than the requester.
pub fn authorize_role_change(
    requester: &Occupant,
    target: &Occupant,
    role: Role,
) -> Result<(), MucError> {
    if target.is_privileged() {
        return Err(MucError::PermissionDenied(format!(
            "The role of {} cannot be changed",
            target.nickname()
        )));
    }

    if role == Role::Moderator || target.role == Role::Moderator {
        if !requester.is_privileged() {
            return Err(MucError::PermissionDenied(
                "Only admins and owners may grant or revoke moderator privileges".to_string(),
            ));
        }
        return Ok(());
    }

    if !requester.is_moderator() {
        return Err(MucError::PermissionDenied(
            "Only moderators may change roles".to_string(),
        ));
    }
    if target.affiliation.rank() > requester.affiliation.rank() {
        return Err(MucError::PermissionDenied(format!(
            "{} has a higher affiliation than {}",
            target.nickname(),
            requester.nickname()
        )));
    }
    Ok(())
}

/// Checks whether `requester` may change an affiliation from `current` to `affiliation`.
///
/// Changes involving owners or admins require an owner, every other change an admin or owner.
pub fn authorize_affiliation_change(
    requester: &Occupant,
    current: Affiliation,
    affiliation: Affiliation,
) -> Result<(), MucError> {
    let involves_privileged = [current, affiliation]
        .iter()
        .any(|a| matches!(a, Affiliation::Owner | Affiliation::Admin));

    if involves_privileged {
        if !requester.is_owner() {
            return Err(MucError::PermissionDenied(
                "Only owners may grant or revoke admin and owner affiliations".to_string(),
            ));
        }
        return Ok(());
    }

    if !requester.is_privileged() {
        return Err(MucError::PermissionDenied(
            "Only admins and owners may change affiliations".to_string(),
        ));
    }
    Ok(())
}
