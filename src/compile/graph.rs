//! Type graph discovery.
//!
//! [`TypeGraphBuilder`] collects root types and grows the set of reachable
//! user-defined types to a fixed point by following serializable properties.
//! [`TypeGraphBuilder::compile`] consumes the builder and returns the frozen
//! [`DiscoveryTable`].

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::resolve::{Structure, classify};
use crate::config::CompilerConfig;
use crate::describe::{PropertyDescriptor, RawType, TypeCatalog, TypeDescriptor};

/// Why a type entered the discovery table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AddReason {
    /// Parameter or response type of an HTTP operation.
    FromOperation { operation: String },
    /// Type of a property of an already discovered type.
    PropertyOf { owner: String, property: String },
    /// Declared as a known inheritor of a discovered type.
    KnownInheritorOf { owner: String },
    FromInterfaceParam { method: String, param: String },
    FromInterfaceReturn { method: String },
    /// Added directly by the caller.
    Manual,
}

impl fmt::Display for AddReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddReason::FromOperation { operation } => write!(f, "from operation {operation}"),
            AddReason::PropertyOf { owner, property } => {
                write!(f, "property {property} of {owner}")
            }
            AddReason::KnownInheritorOf { owner } => write!(f, "known inheritor of {owner}"),
            AddReason::FromInterfaceParam { method, param } => {
                write!(f, "parameter {param} of {method}")
            }
            AddReason::FromInterfaceReturn { method } => write!(f, "return type of {method}"),
            AddReason::Manual => f.write_str("manually added"),
        }
    }
}

/// A discovered type and how it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredType {
    pub descriptor: TypeDescriptor,
    pub reason: AddReason,
}

/// One provenance record, as exposed in the compiled model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub identity: String,
    #[serde(flatten)]
    pub reason: AddReason,
}

/// Frozen set of reachable user-defined types, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryTable {
    entries: IndexMap<String, DiscoveredType>,
    passes: usize,
}

impl DiscoveryTable {
    pub fn get(&self, identity: &str) -> Option<&DiscoveredType> {
        self.entries.get(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DiscoveredType)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of property passes run before the table froze.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn provenance(&self) -> Vec<Provenance> {
        self.entries
            .iter()
            .map(|(identity, entry)| Provenance {
                identity: identity.clone(),
                reason: entry.reason.clone(),
            })
            .collect()
    }
}

/// Builder growing the discovery table from root types.
pub struct TypeGraphBuilder<'a, C: TypeCatalog + ?Sized> {
    catalog: &'a C,
    config: &'a CompilerConfig,
    entries: IndexMap<String, DiscoveredType>,
}

impl<C: TypeCatalog + ?Sized> fmt::Debug for TypeGraphBuilder<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeGraphBuilder")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl<'a, C: TypeCatalog + ?Sized> TypeGraphBuilder<'a, C> {
    pub fn new(catalog: &'a C, config: &'a CompilerConfig) -> Self {
        Self {
            catalog,
            config,
            entries: IndexMap::new(),
        }
    }

    /// Seed discovery with `raw` and everything it wraps.
    pub fn add_root(&mut self, raw: &RawType, reason: AddReason) {
        self.add_type(raw, &reason);
    }

    /// Number of types discovered so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn add_type(&mut self, raw: &RawType, reason: &AddReason) {
        match classify(raw) {
            Structure::Void | Structure::Scalar { .. } => {}
            Structure::Nullable(inner) | Structure::Sequence(inner) => self.add_type(inner, reason),
            Structure::Map { key, value } => {
                self.add_type(key, reason);
                self.add_type(value, reason);
            }
            Structure::Declared => self.add_declared(raw, reason),
        }
    }

    fn add_declared(&mut self, raw: &RawType, reason: &AddReason) {
        let RawType::Named { name, args } = raw else {
            return;
        };
        let identity = raw.to_string();
        if self.entries.contains_key(&identity) || self.config.is_ignored(name, &identity) {
            return;
        }
        let Some(descriptor) = self.catalog.describe(name, args) else {
            debug!(identity = %identity, "Type not described by catalog; it resolves to any.");
            return;
        };

        debug!(identity = %identity, reason = %reason, "Discovered type.");
        let inheritors = descriptor
            .as_object()
            .map(|o| o.known_inheritors.clone())
            .unwrap_or_default();
        self.entries.insert(
            identity.clone(),
            DiscoveredType {
                descriptor,
                reason: reason.clone(),
            },
        );

        let inheritor_reason = AddReason::KnownInheritorOf { owner: identity };
        for inheritor in &inheritors {
            self.add_type(inheritor, &inheritor_reason);
        }
    }

    /// Run property passes until nothing new is found, then freeze.
    pub fn compile(mut self) -> DiscoveryTable {
        let mut passes = 0;
        while passes < self.config.max_passes {
            passes += 1;
            let before = self.entries.len();

            let pending: Vec<(String, Vec<PropertyDescriptor>)> = self
                .entries
                .iter()
                .filter_map(|(identity, entry)| {
                    entry
                        .descriptor
                        .as_object()
                        .map(|o| (identity.clone(), o.properties.clone()))
                })
                .collect();
            for (owner, properties) in pending {
                for property in properties {
                    let reason = AddReason::PropertyOf {
                        owner: owner.clone(),
                        property: property.name.clone(),
                    };
                    self.add_type(&property.ty, &reason);
                }
            }

            let added = self.entries.len() - before;
            debug!(pass = passes, added, total = self.entries.len(), "Discovery pass finished.");
            if added == 0 {
                break;
            }
        }

        DiscoveryTable {
            entries: self.entries,
            passes,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::describe::ServiceDocument;

    const DOCUMENT: &str = r#"{
        "types": {
            "Shop.Order": {
                "kind": "object",
                "properties": [
                    { "name": "Lines", "type": "List<Shop.Line>" },
                    { "name": "Tags", "type": "Dictionary<Shop.Status, Shop.Tag[]>" },
                    { "name": "Audit", "type": "Shop.Audit" },
                    { "name": "Secret", "type": "Shop.Secret", "json_ignore": true }
                ]
            },
            "Shop.Line": {
                "kind": "object",
                "properties": [
                    { "name": "Product", "type": "Shop.Product?" },
                    { "name": "Order", "type": "Shop.Order" }
                ]
            },
            "Shop.Product": { "kind": "object", "properties": [{ "name": "Name", "type": "string" }] },
            "Shop.Tag": { "kind": "object" },
            "Shop.Status": { "kind": "enum", "members": [{ "name": "Open", "value": 1 }] },
            "Shop.Audit": { "kind": "object" },
            "Shop.Secret": { "kind": "object" },
            "Shop.Shape": {
                "kind": "object",
                "known_inheritors": ["Shop.Circle", "Shop.Square"]
            },
            "Shop.Circle": { "kind": "object", "base": "Shop.Shape" },
            "Shop.Square": { "kind": "object", "base": "Shop.Shape" }
        }
    }"#;

    fn document() -> ServiceDocument {
        ServiceDocument::from_json(DOCUMENT).unwrap()
    }

    fn root(s: &str) -> RawType {
        s.parse().unwrap()
    }

    #[test]
    fn test_fixed_point_discovery() {
        let doc = document();
        let config = CompilerConfig::default();
        let mut builder = TypeGraphBuilder::new(&doc, &config);
        builder.add_root(&root("Shop.Order[]"), AddReason::Manual);
        let table = builder.compile();

        let identities: Vec<_> = table.iter().map(|(id, _)| id).collect();
        assert_eq!(
            identities,
            vec![
                "Shop.Order",
                "Shop.Line",
                "Shop.Status",
                "Shop.Tag",
                "Shop.Audit",
                "Shop.Product",
            ]
        );
        assert!(!table.contains("Shop.Secret"));
        assert_eq!(
            table.get("Shop.Product").unwrap().reason,
            AddReason::PropertyOf {
                owner: "Shop.Line".into(),
                property: "Product".into()
            }
        );
        // Pass 1 finds Line/Status/Tag/Audit, pass 2 finds Product, pass 3 finds nothing.
        assert_eq!(table.passes(), 3);
    }

    #[test]
    fn test_builtins_and_containers_are_never_added() {
        let doc = document();
        let config = CompilerConfig::default();
        let mut builder = TypeGraphBuilder::new(&doc, &config);
        builder.add_root(&root("List<int>"), AddReason::Manual);
        builder.add_root(&root("Dictionary<string, DateTime>"), AddReason::Manual);
        builder.add_root(&root("byte[]"), AddReason::Manual);
        builder.add_root(&root("Shop.Unknown"), AddReason::Manual);
        assert!(builder.is_empty());
        assert!(builder.compile().is_empty());
    }

    #[test]
    fn test_known_inheritors_are_added() {
        let doc = document();
        let config = CompilerConfig::default();
        let mut builder = TypeGraphBuilder::new(&doc, &config);
        builder.add_root(&root("Shop.Shape"), AddReason::Manual);
        assert_eq!(builder.len(), 3);
        let table = builder.compile();
        assert_eq!(
            table.get("Shop.Square").unwrap().reason,
            AddReason::KnownInheritorOf {
                owner: "Shop.Shape".into()
            }
        );
    }

    #[test]
    fn test_ignored_types_are_skipped() {
        let doc = document();
        let config = CompilerConfig {
            ignore_types: vec!["Shop.Audit".into()],
            ..CompilerConfig::default()
        };
        let mut builder = TypeGraphBuilder::new(&doc, &config);
        builder.add_root(&root("Shop.Order"), AddReason::Manual);
        let table = builder.compile();
        assert!(!table.contains("Shop.Audit"));
        assert!(table.contains("Shop.Line"));
    }

    #[test]
    fn test_pass_ceiling_stops_discovery() {
        let doc = document();
        let config = CompilerConfig {
            max_passes: 1,
            ..CompilerConfig::default()
        };
        let mut builder = TypeGraphBuilder::new(&doc, &config);
        builder.add_root(&root("Shop.Order"), AddReason::Manual);
        let table = builder.compile();
        assert_eq!(table.passes(), 1);
        assert!(table.contains("Shop.Line"));
        assert!(!table.contains("Shop.Product"));
    }

    #[test]
    fn test_provenance_lists_every_entry() {
        let doc = document();
        let config = CompilerConfig::default();
        let mut builder = TypeGraphBuilder::new(&doc, &config);
        builder.add_root(
            &root("Shop.Tag"),
            AddReason::FromOperation {
                operation: "Tags_Get".into(),
            },
        );
        let provenance = builder.compile().provenance();
        assert_eq!(provenance.len(), 1);
        assert_eq!(provenance[0].identity, "Shop.Tag");
        assert_eq!(
            provenance[0].reason.to_string(),
            "from operation Tags_Get"
        );
    }
}
