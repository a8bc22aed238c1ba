//! Operation and interface model.
//!
//! Output of endpoint extraction and interface collection:
//! - OperationSpec: one HTTP operation with classified parameters
//! - UrlTemplate: route text with interpolation placeholders
//! - InterfaceSpec: call/event interface methods

use serde::Serialize;

use super::revive::Revive;
use super::types::TypeSpec;
pub use crate::describe::document::{HttpMethod, InterfaceRole};

/// Where an operation parameter travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLocation {
    Body,
    Path,
    Query,
}

/// A classified operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub ty: TypeSpec,
    pub location: ParamLocation,
    pub optional: bool,
    pub revival: Option<Revive>,
}

/// Part of a URL template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum UrlPart {
    /// Static text (e.g., "items/")
    Static(String),
    /// Path parameter placeholder
    Param(String),
}

/// URL template; renders placeholders as `${name}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UrlTemplate {
    pub parts: Vec<UrlPart>,
}

impl UrlTemplate {
    /// Parse `items/{id}/lines` into static and placeholder parts.
    pub fn parse(route: &str) -> Self {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut placeholder = String::new();
        let mut in_param = false;

        for c in route.chars() {
            match c {
                '{' if !in_param => {
                    if !current.is_empty() {
                        parts.push(UrlPart::Static(std::mem::take(&mut current)));
                    }
                    in_param = true;
                    placeholder.clear();
                }
                '}' if in_param => {
                    parts.push(UrlPart::Param(std::mem::take(&mut placeholder)));
                    in_param = false;
                }
                _ if in_param => placeholder.push(c),
                _ => current.push(c),
            }
        }
        if in_param {
            // Unterminated placeholder stays literal.
            current.push('{');
            current.push_str(&placeholder);
            if let Some(UrlPart::Static(previous)) = parts.last_mut() {
                previous.push_str(&current);
                current.clear();
            }
        }
        if !current.is_empty() {
            parts.push(UrlPart::Static(current));
        }
        Self { parts }
    }

    /// Placeholder names in order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            UrlPart::Param(name) => Some(name.as_str()),
            UrlPart::Static(_) => None,
        })
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params().any(|p| p == name)
    }
}

/// A compiled HTTP operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSpec {
    /// Unique `{controller}_{action}` name.
    pub name: String,
    pub controller: String,
    pub method: HttpMethod,
    /// Declared route, kept for documentation.
    pub route: String,
    pub description: Option<String>,
    pub url: UrlTemplate,
    pub body_params: Vec<ParamSpec>,
    /// Path and query parameters, including flattened wrapper fields.
    pub uri_params: Vec<ParamSpec>,
    /// Composite-bound parameter exposed as a single structured input.
    pub wrapper: Option<ParamSpec>,
    pub response: TypeSpec,
    pub response_revival: Option<Revive>,
}

impl OperationSpec {
    /// Inputs in call order: the wrapper alone, or required uri params, body
    /// params, then optional uri params.
    pub fn inputs(&self) -> Vec<&ParamSpec> {
        if let Some(wrapper) = &self.wrapper {
            return vec![wrapper];
        }
        self.uri_params
            .iter()
            .filter(|p| !p.optional)
            .chain(self.body_params.iter())
            .chain(self.uri_params.iter().filter(|p| p.optional))
            .collect()
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.uri_params
            .iter()
            .chain(self.body_params.iter())
            .find(|p| p.name == name)
    }
}

/// A compiled call or event interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceSpec {
    pub name: String,
    pub role: InterfaceRole,
    pub methods: Vec<MethodSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodSpec {
    pub name: String,
    pub params: Vec<MethodParamSpec>,
    pub returns: TypeSpec,
    pub return_revival: Option<Revive>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodParamSpec {
    pub name: String,
    pub ty: TypeSpec,
    pub revival: Option<Revive>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_template() {
        let url = UrlTemplate::parse("items/{id}/lines/{lineId}");
        assert_eq!(
            url.parts,
            vec![
                UrlPart::Static("items/".into()),
                UrlPart::Param("id".into()),
                UrlPart::Static("/lines/".into()),
                UrlPart::Param("lineId".into()),
            ]
        );
        assert_eq!(url.params().collect::<Vec<_>>(), vec!["id", "lineId"]);
        assert!(url.has_param("id"));
        assert!(!url.has_param("page"));
    }

    #[test]
    fn test_parse_unterminated_placeholder() {
        let url = UrlTemplate::parse("items/{id");
        assert_eq!(url.parts, vec![UrlPart::Static("items/{id".into())]);
    }

    #[test]
    fn test_inputs_order() {
        let param = |name: &str, location, optional| ParamSpec {
            name: name.into(),
            ty: TypeSpec::any(),
            location,
            optional,
            revival: None,
        };
        let mut op = OperationSpec {
            name: "Items_Save".into(),
            controller: "Items".into(),
            method: HttpMethod::Post,
            route: "items/{id}".into(),
            description: None,
            url: UrlTemplate::parse("items/{id}"),
            body_params: vec![param("item", ParamLocation::Body, false)],
            uri_params: vec![
                param("force", ParamLocation::Query, true),
                param("id", ParamLocation::Path, false),
            ],
            wrapper: None,
            response: TypeSpec::void(),
            response_revival: None,
        };
        let names: Vec<_> = op.inputs().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "item", "force"]);

        op.wrapper = Some(param("query", ParamLocation::Query, false));
        let names: Vec<_> = op.inputs().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["query"]);
        assert!(op.param("force").is_some());
    }
}
