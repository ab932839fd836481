// prose-conference/conference-xmpp
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use data_form::{DataForm, DataFormType, Field, FieldOption, FieldType};

pub mod data_form;
pub mod muc;
pub mod ns;
