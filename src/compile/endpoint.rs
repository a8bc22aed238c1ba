//! Endpoint extraction.
//!
//! Runs in two phases around discovery: [`EndpointExtractor::collect_roots`]
//! seeds the graph builder with every parameter and response type, then
//! [`EndpointExtractor::extract`] builds the operation specs against the
//! compiled names.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::api::{OperationSpec, ParamLocation, ParamSpec, UrlTemplate};
use super::graph::{AddReason, TypeGraphBuilder};
use super::naming::CompiledTypes;
use super::resolve::TypeResolver;
use super::utils::make_unique_name;
use crate::config::CompilerConfig;
use crate::describe::document::{OperationDecl, ParamDecl, ParamSource};
use crate::describe::{RawType, TypeCatalog};

/// Turns declared operations into operation specs.
pub struct EndpointExtractor<'a, C: TypeCatalog + ?Sized> {
    catalog: &'a C,
    config: &'a CompilerConfig,
}

impl<C: TypeCatalog + ?Sized> std::fmt::Debug for EndpointExtractor<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointExtractor")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

impl<'a, C: TypeCatalog + ?Sized> EndpointExtractor<'a, C> {
    pub fn new(catalog: &'a C, config: &'a CompilerConfig) -> Self {
        Self { catalog, config }
    }

    /// Add every parameter and response type of the included operations as roots.
    pub fn collect_roots(
        &self,
        operations: &[OperationDecl],
        builder: &mut TypeGraphBuilder<'_, C>,
    ) {
        let included = self.included(operations);
        for (op, name) in included.iter().zip(self.operation_names(&included)) {
            let reason = AddReason::FromOperation { operation: name };
            for param in &op.params {
                builder.add_root(&param.ty, reason.clone());
            }
            builder.add_root(&op.response, reason);
        }
    }

    /// Build operation specs in declaration order.
    pub fn extract(&self, operations: &[OperationDecl], types: &CompiledTypes) -> Vec<OperationSpec> {
        let included = self.included(operations);
        let resolver = types.resolver();
        included
            .iter()
            .zip(self.operation_names(&included))
            .map(|(op, name)| self.build_operation(op, name, types, resolver))
            .collect()
    }

    fn included<'o>(&self, operations: &'o [OperationDecl]) -> Vec<&'o OperationDecl> {
        operations
            .iter()
            .filter(|op| {
                let excluded = self.config.is_excluded_controller(&op.controller);
                if excluded {
                    debug!(controller = %op.controller, route = %op.route, "Skipped excluded operation.");
                }
                !excluded
            })
            .collect()
    }

    /// Unique `{controller}_{action}` names, disambiguated in declaration order.
    fn operation_names(&self, operations: &[&OperationDecl]) -> Vec<String> {
        let mut taken = HashSet::new();
        operations
            .iter()
            .map(|op| {
                let base = format!("{}_{}", op.controller, self.action_name(op));
                let name = make_unique_name(&base, &taken);
                taken.insert(name.clone());
                name
            })
            .collect()
    }

    fn action_name(&self, op: &OperationDecl) -> String {
        let route_part = self.route_name_part(op);
        match op.action.as_deref().filter(|a| !a.is_empty()) {
            Some(action) if !self.config.prefers_route_name(action) => action.to_string(),
            _ => route_part.unwrap_or_else(|| op.method.as_str().to_string()),
        }
    }

    /// Name segment derived from the route text after the controller prefix.
    ///
    /// `api/Items/{id}/archive` for controller `Items` -> `archive`. Matching is
    /// case-sensitive; a route that names neither the prefix nor the controller
    /// yields `None`.
    fn route_name_part(&self, op: &OperationDecl) -> Option<String> {
        let (route, _) = normalize_placeholders(&self.strip_route(&op.route));
        let anchor = match op.route_prefix.as_deref().map(|p| self.strip_route(p)) {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => op.controller.clone(),
        };
        if anchor.is_empty() {
            return None;
        }
        let pos = route.find(&anchor)?;
        let rest = &route[pos + anchor.len()..];

        let segments: Vec<String> = rest
            .split('/')
            .filter(|s| !s.is_empty() && !s.contains('{'))
            .map(|s| {
                s.chars()
                    .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                    .collect()
            })
            .collect();
        if segments.is_empty() {
            None
        } else {
            Some(segments.join("_"))
        }
    }

    /// Remove configured prefixes, leading slashes and the query string.
    fn strip_route(&self, route: &str) -> String {
        let mut route = route.trim_start_matches('/');
        for prefix in &self.config.strip_route_prefixes {
            if route.len() >= prefix.len()
                && route.is_char_boundary(prefix.len())
                && route[..prefix.len()].eq_ignore_ascii_case(prefix)
            {
                route = &route[prefix.len()..];
            }
        }
        let route = match query_start(route) {
            Some(pos) => &route[..pos],
            None => route,
        };
        route.to_string()
    }

    fn build_operation(
        &self,
        op: &OperationDecl,
        name: String,
        types: &CompiledTypes,
        resolver: TypeResolver<'_>,
    ) -> OperationSpec {
        let (mut url_text, route_optional) = normalize_placeholders(&self.strip_route(&op.route));
        let uri: Vec<&ParamDecl> = op
            .params
            .iter()
            .filter(|p| p.source == ParamSource::Uri)
            .collect();
        let body: Vec<&ParamDecl> = op
            .params
            .iter()
            .filter(|p| p.source == ParamSource::Body)
            .collect();
        if body.len() > 1 {
            warn!(operation = %name, count = body.len(), "Operation declares more than one body parameter.");
        }

        let mut wrapper = None;
        let mut uri_params = Vec::new();
        match uri.as_slice() {
            [only] if only.binder => {
                uri_params = self.flatten_wrapper(only, resolver);
                if types.name_of(&only.ty.to_string()).is_some() {
                    wrapper = Some(ParamSpec {
                        name: only.name.clone(),
                        ty: resolver.resolve(&only.ty, None),
                        location: ParamLocation::Query,
                        optional: only.optional,
                        revival: None,
                    });
                }
                debug!(
                    operation = %name,
                    param = %only.name,
                    fields = uri_params.len(),
                    "Flattened composite-bound parameter."
                );
            }
            _ => {
                for param in &uri {
                    let ty = resolver.resolve(&param.ty, None);
                    uri_params.push(ParamSpec {
                        name: param.name.clone(),
                        optional: param.optional || ty.optional || route_optional.contains(&param.name),
                        ty,
                        location: ParamLocation::Query,
                        revival: None,
                    });
                }
            }
        }

        for param in uri_params.iter().filter(|p| p.optional) {
            url_text = strip_placeholder(&url_text, &param.name);
        }
        let url = UrlTemplate::parse(&url_text);
        for param in &mut uri_params {
            if url.has_param(&param.name) {
                param.location = ParamLocation::Path;
            }
        }

        let body_params = body
            .iter()
            .map(|param| ParamSpec {
                name: param.name.clone(),
                ty: resolver.resolve(&param.ty, None),
                location: ParamLocation::Body,
                optional: param.optional,
                revival: None,
            })
            .collect();

        OperationSpec {
            name,
            controller: op.controller.clone(),
            method: op.method,
            route: op.route.clone(),
            description: op.description.clone(),
            url,
            body_params,
            uri_params,
            wrapper,
            response: resolver.resolve(&op.response, None),
            response_revival: None,
        }
    }

    /// Sub-fields of a composite-bound parameter, each an optional query parameter.
    fn flatten_wrapper(&self, param: &ParamDecl, resolver: TypeResolver<'_>) -> Vec<ParamSpec> {
        let RawType::Named { name, args } = &param.ty else {
            return Vec::new();
        };
        let Some(descriptor) = self.catalog.describe(name, args) else {
            warn!(param = %param.name, ty = %param.ty, "Composite-bound parameter type is not described.");
            return Vec::new();
        };
        descriptor
            .as_object()
            .map(|object| {
                object
                    .properties
                    .iter()
                    .map(|property| ParamSpec {
                        name: property.wire_name().to_string(),
                        ty: resolver.resolve(&property.ty, property.type_override.as_deref()),
                        location: ParamLocation::Query,
                        optional: true,
                        revival: None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Position of the query string, ignoring `?` inside placeholders.
fn query_start(route: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in route.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '?' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Reduce `{id?}`, `{id:int}` and `{*path}` to `{id}` / `{path}`.
///
/// Returns the rewritten route and the names marked optional with `?`.
fn normalize_placeholders(route: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(route.len());
    let mut optional = Vec::new();
    let mut rest = route;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            out.push_str(&rest[open..]);
            return (out, optional);
        };
        let inner = &rest[open + 1..open + close];
        let mut name = inner.split(':').next().unwrap_or(inner).trim_start_matches('*');
        if let Some(stripped) = name.strip_suffix('?') {
            name = stripped;
            optional.push(name.to_string());
        } else if inner.ends_with('?') {
            optional.push(name.to_string());
        }
        out.push('{');
        out.push_str(name);
        out.push('}');
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    (out, optional)
}

/// Remove `{name}` together with an adjacent slash when there is one.
fn strip_placeholder(url: &str, name: &str) -> String {
    let token = format!("{{{name}}}");
    let leading = format!("/{token}");
    let trailing = format!("{token}/");
    if url.contains(&leading) {
        url.replace(&leading, "")
    } else if url.contains(&trailing) {
        url.replace(&trailing, "")
    } else {
        url.replace(&token, "")
    }
}
