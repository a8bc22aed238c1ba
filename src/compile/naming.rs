//! Canonical naming and declaration ordering.
//!
//! Every discovered type gets a short, collision-free name. Enums are sorted
//! by name; classes are sorted by name and then reordered so that each class
//! follows its superclass.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use super::graph::DiscoveryTable;
use super::resolve::{NamedKind, NamedType, TypeResolver, builtin_name};
use super::types::{CompiledClass, CompiledEnum, CompiledEnumMember, PropertySpec};
use super::utils::{is_valid_identifier, make_unique_name};
use crate::describe::{DescriptorKind, RawType, TypeDescriptor};

/// Named and ordered declarations derived from a frozen discovery table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledTypes {
    pub enums: Vec<CompiledEnum>,
    pub classes: Vec<CompiledClass>,
    #[serde(skip)]
    names: IndexMap<String, NamedType>,
}

impl CompiledTypes {
    /// Resolver answering use-site shapes against these names.
    pub fn resolver(&self) -> TypeResolver<'_> {
        TypeResolver::new(&self.names)
    }

    /// Canonical name of a discovered identity.
    pub fn name_of(&self, identity: &str) -> Option<&str> {
        self.names.get(identity).map(|n| n.name.as_str())
    }

    pub fn class(&self, name: &str) -> Option<&CompiledClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&CompiledEnum> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn class_position(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|c| c.name == name)
    }

    /// Properties of a class including inherited ones, base class first.
    pub fn all_properties(&self, name: &str) -> Vec<&PropertySpec> {
        let mut chain = Vec::new();
        let mut current = self.class(name);
        while let Some(class) = current {
            if chain.len() > self.classes.len() {
                break;
            }
            chain.push(class);
            current = class.superclass.as_deref().and_then(|s| self.class(s));
        }
        chain
            .iter()
            .rev()
            .flat_map(|c| c.properties.iter())
            .collect()
    }
}

/// Assign canonical names and build ordered declarations.
pub fn assign_names(table: &DiscoveryTable) -> CompiledTypes {
    let mut taken = HashSet::new();
    let mut names = IndexMap::new();
    for (identity, entry) in table.iter() {
        let friendly = friendly_name(&entry.descriptor);
        let name = make_unique_name(&friendly, &taken);
        if name != friendly {
            debug!(identity = %identity, name = %name, "Renamed colliding type.");
        }
        taken.insert(name.clone());
        let kind = if entry.descriptor.is_enum() {
            NamedKind::Enum
        } else {
            NamedKind::Object
        };
        names.insert(identity.to_string(), NamedType { name, kind });
    }

    let resolver = TypeResolver::new(&names);
    let mut enums = Vec::new();
    let mut classes = Vec::new();

    for (identity, entry) in table.iter() {
        let Some(name) = names.get(identity).map(|n| n.name.clone()) else {
            continue;
        };
        match &entry.descriptor.kind {
            DescriptorKind::Enum { members } => {
                let mut compiled: Vec<CompiledEnumMember> = members
                    .iter()
                    .filter(|m| {
                        let valid = is_valid_identifier(&m.name);
                        if !valid {
                            debug!(enumeration = %identity, member = %m.name, "Dropped enum member.");
                        }
                        valid
                    })
                    .map(|m| CompiledEnumMember {
                        name: m.name.clone(),
                        value: m.value,
                    })
                    .collect();
                compiled.sort_by_key(|m| m.value);
                enums.push(CompiledEnum {
                    name,
                    members: compiled,
                    original_identity: identity.to_string(),
                });
            }
            DescriptorKind::Object(object) => {
                let parent_identity = object
                    .base
                    .as_ref()
                    .or_else(|| object.interfaces.first())
                    .map(RawType::to_string);
                let parent = parent_identity.as_deref().and_then(|id| {
                    names
                        .get(id)
                        .filter(|n| n.kind == NamedKind::Object)
                        .map(|n| (id, n.name.clone()))
                });
                let parent_object = parent
                    .as_ref()
                    .and_then(|(id, _)| table.get(id))
                    .and_then(|e| e.descriptor.as_object());

                let mut seen = HashSet::new();
                let mut properties = Vec::new();
                for property in &object.properties {
                    if parent_object.is_some_and(|p| p.has_property(&property.name)) {
                        continue;
                    }
                    let wire = property.wire_name();
                    if !seen.insert(wire.to_string()) {
                        debug!(class = %identity, property = %wire, "Skipped duplicate property.");
                        continue;
                    }
                    properties.push(PropertySpec {
                        name: wire.to_string(),
                        ty: resolver.resolve(&property.ty, property.type_override.as_deref()),
                        custom_reviver: property.custom_reviver.clone(),
                        revival: None,
                    });
                }

                classes.push(CompiledClass {
                    name,
                    superclass: parent.map(|(_, name)| name),
                    properties,
                    original_identity: identity.to_string(),
                });
            }
        }
    }

    break_inheritance_cycles(&mut classes);
    enums.sort_by(|a, b| a.name.cmp(&b.name));
    classes.sort_by(|a, b| a.name.cmp(&b.name));
    order_by_dependency(&mut classes);

    CompiledTypes {
        enums,
        classes,
        names,
    }
}

/// Friendly name of a discovered type: `Page`, `Page_of_Item`, `Pair_of_int_and_Item`.
fn friendly_name(descriptor: &TypeDescriptor) -> String {
    if let Some(name) = &descriptor.name_override {
        return name.clone();
    }
    if descriptor.generic_args.is_empty() {
        return descriptor.simple_name.clone();
    }
    let args: Vec<String> = descriptor.generic_args.iter().map(argument_name).collect();
    format!("{}_of_{}", descriptor.simple_name, args.join("_and_"))
}

fn argument_name(raw: &RawType) -> String {
    match raw {
        RawType::Void => "void".to_string(),
        RawType::Array(inner) => argument_name(inner),
        RawType::Named { name, args } => {
            let simple = builtin_name(name)
                .or_else(|| name.rsplit('.').next())
                .unwrap_or(name);
            let simple = simple.split('`').next().unwrap_or(simple);
            if args.is_empty() {
                simple.to_string()
            } else {
                let args: Vec<String> = args.iter().map(argument_name).collect();
                format!("{simple}_of_{}", args.join("_and_"))
            }
        }
    }
}

/// Drop the superclass link of any class whose chain leads back to itself.
fn break_inheritance_cycles(classes: &mut [CompiledClass]) {
    let mut parents: HashMap<String, Option<String>> = classes
        .iter()
        .map(|c| (c.name.clone(), c.superclass.clone()))
        .collect();

    for class in classes.iter_mut() {
        let mut current = class.superclass.clone();
        let mut steps = 0;
        while let Some(name) = current {
            if name == class.name {
                warn!(class = %class.name, "Inheritance cycle detected; superclass dropped.");
                class.superclass = None;
                parents.insert(class.name.clone(), None);
                break;
            }
            steps += 1;
            if steps > parents.len() {
                break;
            }
            current = parents.get(&name).cloned().flatten();
        }
    }
}

/// Move every class that precedes its superclass to just after it.
///
/// The entry at `i` is re-checked after each move, so cascading chains settle.
fn order_by_dependency(classes: &mut Vec<CompiledClass>) {
    let mut i = 0;
    while i < classes.len() {
        let parent_position = classes[i].superclass.as_ref().and_then(|parent| {
            classes[i + 1..]
                .iter()
                .position(|c| &c.name == parent)
                .map(|p| p + i + 1)
        });
        match parent_position {
            Some(j) => {
                let class = classes.remove(i);
                classes.insert(j, class);
            }
            None => i += 1,
        }
    }
}
