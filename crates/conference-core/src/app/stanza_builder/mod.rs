// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

//! Pure functions assembling the outbound stanzas of the MUC engine.

pub mod config_form;
pub mod iq;
pub mod message;
pub mod presence;
