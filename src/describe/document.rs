//! JSON service document.
//!
//! A precomputed description of a backend's surface: its types, its HTTP
//! operations and its call/event interfaces. This is the format the CLI reads.
//!
//! ```json
//! {
//!   "types": {
//!     "Shop.Item": {
//!       "kind": "object",
//!       "properties": [{ "name": "Id", "type": "int", "json_name": "id" }]
//!     },
//!     "Shop.Status": {
//!       "kind": "enum",
//!       "members": [{ "name": "Active", "value": 0 }]
//!     }
//!   },
//!   "operations": [
//!     {
//!       "controller": "Items",
//!       "action": "Get",
//!       "method": "GET",
//!       "route": "api/items/{id}",
//!       "params": [{ "name": "id", "type": "int", "source": "uri" }],
//!       "response": "Shop.Item"
//!     }
//!   ]
//! }
//! ```

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::raw::RawType;
use super::{
    DescriptorKind, EnumMember, ObjectDescriptor, PropertyDescriptor, TypeCatalog, TypeDescriptor,
};
use crate::error::CompileError;

/// Root of a service document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDocument {
    /// Type declarations keyed by fully-qualified name (generic types without arguments).
    pub types: IndexMap<String, TypeDecl>,
    pub operations: Vec<OperationDecl>,
    pub interfaces: Vec<InterfaceDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDecl {
    Object(ObjectDecl),
    Enum(EnumDecl),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectDecl {
    pub name_override: Option<String>,
    /// Generic parameter names, e.g. `["T"]` for `Shop.Page<T>`.
    pub generic_params: Vec<String>,
    pub base: Option<RawType>,
    pub interfaces: Vec<RawType>,
    pub known_inheritors: Vec<RawType>,
    pub properties: Vec<PropertyDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: RawType,
    #[serde(default)]
    pub json_name: Option<String>,
    /// Excluded from serialization.
    #[serde(default)]
    pub json_ignore: bool,
    #[serde(default)]
    pub type_override: Option<String>,
    #[serde(default)]
    pub reviver: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumDecl {
    pub name_override: Option<String>,
    pub members: Vec<EnumMember>,
}

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an operation parameter is bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
    /// Request body.
    Body,
    /// Route segment or query string, depending on whether the route names it.
    Uri,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDecl {
    pub controller: String,
    #[serde(default)]
    pub action: Option<String>,
    pub method: HttpMethod,
    pub route: String,
    /// Route prefix declared for the controller, e.g. `api/shop/items`.
    #[serde(default)]
    pub route_prefix: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub response: RawType,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: RawType,
    pub source: ParamSource,
    #[serde(default)]
    pub optional: bool,
    /// Bound through the framework's composite model binder.
    #[serde(default)]
    pub binder: bool,
}

/// Role of a declared interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceRole {
    /// Methods the client calls on the server.
    #[default]
    Calls,
    /// Events the server pushes; every method carries exactly one payload.
    Events,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default)]
    pub role: InterfaceRole,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<MethodParamDecl>,
    #[serde(default)]
    pub returns: RawType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: RawType,
}

impl ServiceDocument {
    /// Parse a service document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, CompileError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a service document from disk.
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let text = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    fn describe_with(
        &self,
        name: &str,
        args: &[RawType],
        visiting: &mut Vec<String>,
    ) -> Option<TypeDescriptor> {
        let decl = self.types.get(name)?;
        let identity = RawType::generic(name, args.to_vec()).to_string();
        let simple_name = simple_name(name);

        match decl {
            TypeDecl::Enum(decl) => {
                if !args.is_empty() {
                    debug!(identity = %identity, "Enum declared with generic arguments.");
                    return None;
                }
                Some(TypeDescriptor {
                    identity,
                    simple_name,
                    name_override: decl.name_override.clone(),
                    generic_args: Vec::new(),
                    kind: DescriptorKind::Enum {
                        members: decl.members.clone(),
                    },
                })
            }
            TypeDecl::Object(decl) => {
                if decl.generic_params.len() != args.len() {
                    debug!(
                        identity = %identity,
                        expected = decl.generic_params.len(),
                        "Generic argument count mismatch."
                    );
                    return None;
                }
                let subst = |ty: &RawType| ty.substitute(&decl.generic_params, args);

                let mut properties: Vec<PropertyDescriptor> = decl
                    .properties
                    .iter()
                    .filter(|p| !p.json_ignore)
                    .map(|p| PropertyDescriptor {
                        name: p.name.clone(),
                        ty: subst(&p.ty),
                        json_name: p.json_name.clone(),
                        type_override: p.type_override.clone(),
                        custom_reviver: p.reviver.clone(),
                    })
                    .collect();

                let base = decl.base.as_ref().map(subst);
                if let Some(RawType::Named {
                    name: base_name,
                    args: base_args,
                }) = &base
                {
                    // Walk the base chain for inherited properties; a cyclic chain stops here.
                    if !visiting.contains(&identity) {
                        visiting.push(identity.clone());
                        let parent = self.describe_with(base_name, base_args, visiting);
                        visiting.pop();
                        if let Some(parent) = parent.as_ref().and_then(TypeDescriptor::as_object) {
                            for inherited in &parent.properties {
                                if !properties.iter().any(|p| p.name == inherited.name) {
                                    properties.push(inherited.clone());
                                }
                            }
                        }
                    }
                }

                Some(TypeDescriptor {
                    identity,
                    simple_name,
                    name_override: decl.name_override.clone(),
                    generic_args: args.to_vec(),
                    kind: DescriptorKind::Object(ObjectDescriptor {
                        properties,
                        base,
                        interfaces: decl.interfaces.iter().map(subst).collect(),
                        known_inheritors: decl.known_inheritors.iter().map(subst).collect(),
                    }),
                })
            }
        }
    }
}

impl TypeCatalog for ServiceDocument {
    fn describe(&self, name: &str, args: &[RawType]) -> Option<TypeDescriptor> {
        self.describe_with(name, args, &mut Vec::new())
    }
}

/// `Shop.Orders.Page`1` -> `Page`
fn simple_name(name: &str) -> String {
    let last = name.rsplit('.').next().unwrap_or(name);
    last.split('`').next().unwrap_or(last).to_string()
}
