// prose-conference/conference-xmpp
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use minidom::Element;
use strum_macros::{Display, EnumString};

use crate::ns;
use crate::util::{parse_bool, ElementBuilderExt, ElementExt, ParseError};

/// XEP-0004 form types.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DataFormType {
    Cancel,
    #[default]
    Form,
    Result,
    Submit,
}

/// XEP-0004 field types.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum FieldType {
    Boolean,
    Fixed,
    Hidden,
    JidMulti,
    JidSingle,
    ListMulti,
    ListSingle,
    TextMulti,
    TextPrivate,
    #[default]
    TextSingle,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FieldOption {
    pub label: Option<String>,
    pub value: String,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Field {
    pub var: Option<String>,
    pub type_: FieldType,
    pub label: Option<String>,
    pub required: bool,
    pub options: Vec<FieldOption>,
    pub values: Vec<String>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct DataForm {
    pub type_: DataFormType,
    pub title: Option<String>,
    pub instructions: Option<String>,
    pub fields: Vec<Field>,
}

impl DataForm {
    pub fn new(type_: DataFormType) -> Self {
        DataForm {
            type_,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields = fields.into_iter().collect();
        self
    }

    /// Returns the field with the given `var`.
    pub fn field(&self, var: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.var.as_deref() == Some(var))
    }

    /// The value of the hidden `FORM_TYPE` field, if any.
    pub fn form_type(&self) -> Option<&str> {
        self.field("FORM_TYPE")
            .and_then(|field| field.values.first())
            .map(String::as_str)
    }
}

impl Field {
    pub fn new(var: impl Into<String>, type_: FieldType) -> Self {
        Field {
            var: Some(var.into()),
            type_,
            ..Default::default()
        }
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        Field {
            type_: FieldType::Fixed,
            values: vec![text.into()],
            ..Default::default()
        }
    }

    pub fn hidden(var: impl Into<String>, value: impl Into<String>) -> Self {
        Field::new(var, FieldType::Hidden).with_value(value)
    }

    pub fn boolean(var: impl Into<String>, label: impl Into<String>, value: bool) -> Self {
        Field::new(var, FieldType::Boolean)
            .with_label(label)
            .with_value(if value { "1" } else { "0" })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn with_values(mut self, values: impl IntoIterator<Item = String>) -> Self {
        self.values.extend(values);
        self
    }

    pub fn with_option(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(FieldOption {
            label: Some(label.into()),
            value: value.into(),
        });
        self
    }

    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Interprets the first value as an XML Schema boolean. A field without value is `false`.
    pub fn bool_value(&self) -> Result<bool, ParseError> {
        self.first_value().map(parse_bool).unwrap_or(Ok(false))
    }
}

impl From<DataForm> for Element {
    fn from(value: DataForm) -> Self {
        Element::builder("x", ns::DATA_FORMS)
            .attr("type", value.type_.to_string())
            .append_text_child("title", ns::DATA_FORMS, value.title)
            .append_text_child("instructions", ns::DATA_FORMS, value.instructions)
            .append_all(value.fields.into_iter().map(Element::from))
            .build()
    }
}

impl TryFrom<Element> for DataForm {
    type Error = ParseError;

    fn try_from(root: Element) -> Result<Self, Self::Error> {
        root.expect_is("x", ns::DATA_FORMS)?;

        let mut form = DataForm::new(root.attr_req("type")?.parse()?);

        for child in root.children() {
            match child {
                _ if child.is("title", ns::DATA_FORMS) => form.title = Some(child.text()),
                _ if child.is("instructions", ns::DATA_FORMS) => {
                    form.instructions = Some(child.text())
                }
                _ if child.is("field", ns::DATA_FORMS) => {
                    form.fields.push(Field::try_from(child.clone())?)
                }
                _ => (),
            }
        }

        Ok(form)
    }
}

impl From<Field> for Element {
    fn from(value: Field) -> Self {
        let mut builder = Element::builder("field", ns::DATA_FORMS)
            .attr("var", value.var)
            .attr("type", value.type_.to_string())
            .attr("label", value.label);

        if value.required {
            builder = builder.append(Element::builder("required", ns::DATA_FORMS).build());
        }

        builder
            .append_all(value.options.into_iter().map(|option| {
                Element::builder("option", ns::DATA_FORMS)
                    .attr("label", option.label)
                    .append(
                        Element::builder("value", ns::DATA_FORMS)
                            .append(option.value)
                            .build(),
                    )
                    .build()
            }))
            .append_all(value.values.into_iter().map(|value| {
                Element::builder("value", ns::DATA_FORMS)
                    .append(value)
                    .build()
            }))
            .build()
    }
}

impl TryFrom<Element> for Field {
    type Error = ParseError;

    fn try_from(root: Element) -> Result<Self, Self::Error> {
        root.expect_is("field", ns::DATA_FORMS)?;

        let mut field = Field {
            var: root.attr("var").map(ToString::to_string),
            type_: root.attr_parsed::<FieldType>("type")?.unwrap_or_default(),
            label: root.attr("label").map(ToString::to_string),
            ..Default::default()
        };

        for child in root.children() {
            match child {
                _ if child.is("required", ns::DATA_FORMS) => field.required = true,
                _ if child.is("value", ns::DATA_FORMS) => field.values.push(child.text()),
                _ if child.is("option", ns::DATA_FORMS) => field.options.push(FieldOption {
                    label: child.attr("label").map(ToString::to_string),
                    value: child.child_text("value", ns::DATA_FORMS).unwrap_or_default(),
                }),
                _ => (),
            }
        }

        Ok(field)
    }
}
