// prose-conference/conference-xmpp
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use item::{Actor, Affiliation, Item, Role};
pub use mediated_invite::{Decline, Invite, MediatedInvite};
pub use muc_join::MucJoin;
pub use muc_user::{Destroy, MucUser};
pub use query::{MucQuery, QueryKind};
pub use status::Status;

mod item;
mod mediated_invite;
mod muc_join;
mod muc_user;
pub mod ns;
mod query;
mod status;
