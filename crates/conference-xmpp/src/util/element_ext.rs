// prose-conference/conference-xmpp
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::str::FromStr;

use minidom::{Element, ElementBuilder, NSChoice};

use crate::util::ParseError;

pub trait ElementExt {
    fn expect_is<'a>(
        &self,
        name: impl AsRef<str>,
        ns: impl Into<NSChoice<'a>>,
    ) -> Result<(), ParseError>;

    fn attr_req(&self, name: impl AsRef<str>) -> Result<&str, ParseError>;

    /// Parses the attribute `name` with `FromStr` if it is present.
    fn attr_parsed<T>(&self, name: impl AsRef<str>) -> Result<Option<T>, ParseError>
    where
        T: FromStr,
        ParseError: From<T::Err>;

    fn non_empty_text(&self) -> Option<String>;

    /// Returns the text of the child `name` in namespace `ns`, if that child exists.
    fn child_text<'a>(&self, name: impl AsRef<str>, ns: impl Into<NSChoice<'a>>)
        -> Option<String>;
}

pub trait ElementBuilderExt {
    fn append_text_child(self, name: &str, ns: &str, text: Option<String>) -> ElementBuilder;
}

impl ElementExt for Element {
    fn expect_is<'a>(
        &self,
        name: impl AsRef<str>,
        ns: impl Into<NSChoice<'a>>,
    ) -> Result<(), ParseError> {
        let ns = ns.into();
        if !self.is(name.as_ref(), ns) {
            return Err(ParseError::Generic {
                msg: format!(
                    "Expected element with name {} and namespace {}. Got {} and {} instead.",
                    name.as_ref(),
                    ns_choice_to_string(ns),
                    self.name(),
                    self.ns()
                ),
            });
        }
        Ok(())
    }

    fn attr_req(&self, name: impl AsRef<str>) -> Result<&str, ParseError> {
        self.attr(name.as_ref()).ok_or(ParseError::Generic {
            msg: format!(
                "Missing required attribute {} in element {}.",
                name.as_ref(),
                self.name()
            ),
        })
    }

    fn attr_parsed<T>(&self, name: impl AsRef<str>) -> Result<Option<T>, ParseError>
    where
        T: FromStr,
        ParseError: From<T::Err>,
    {
        Ok(self
            .attr(name.as_ref())
            .map(T::from_str)
            .transpose()?)
    }

    fn non_empty_text(&self) -> Option<String> {
        let text = self.text();
        (!text.is_empty()).then_some(text)
    }

    fn child_text<'a>(
        &self,
        name: impl AsRef<str>,
        ns: impl Into<NSChoice<'a>>,
    ) -> Option<String> {
        let ns = ns.into();
        self.children()
            .find(|child| child.is(name.as_ref(), ns))
            .map(|child| child.text())
    }
}

impl ElementBuilderExt for ElementBuilder {
    fn append_text_child(self, name: &str, ns: &str, text: Option<String>) -> ElementBuilder {
        let Some(text) = text else { return self };
        self.append(Element::builder(name, ns).append(text).build())
    }
}

pub fn parse_bool(value: impl AsRef<str>) -> Result<bool, ParseError> {
    Ok(match value.as_ref() {
        "true" | "1" => true,
        "false" | "0" => false,
        _ => {
            return Err(ParseError::Generic {
                msg: format!("Unknown boolean value '{}'", value.as_ref()),
            })
        }
    })
}

fn ns_choice_to_string<'a>(ns: impl Into<NSChoice<'a>>) -> String {
    match ns.into() {
        NSChoice::None => "<none>".to_string(),
        NSChoice::OneOf(ns) => ns.to_string(),
        NSChoice::AnyOf(ns_list) => ns_list.join(" or "),
        NSChoice::Any => "<any>".to_string(),
    }
}
