//! Type description capability consumed by the compiler.
//!
//! The compiler never inspects a backend directly. It asks a [`TypeCatalog`]
//! to describe named types and works from the returned [`TypeDescriptor`]s, so
//! any source of type metadata (a reflection bridge, a schema dump, a test
//! fixture) can drive compilation.

pub mod document;
pub mod raw;

use serde::{Deserialize, Serialize};

pub use document::ServiceDocument;
pub use raw::RawType;

/// Source of type metadata.
pub trait TypeCatalog {
    /// Describe the named type instantiated with `args`.
    ///
    /// Returns `None` for types the catalog does not know. Implementations
    /// substitute generic arguments into property, base and interface types.
    fn describe(&self, name: &str, args: &[RawType]) -> Option<TypeDescriptor>;
}

/// Metadata for one user-defined type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDescriptor {
    /// Fully-qualified identity, e.g. `Shop.Page<Shop.Item>`.
    pub identity: String,
    /// Unqualified name without generic arguments, e.g. `Page`.
    pub simple_name: String,
    /// Explicit model name that replaces the computed canonical name.
    pub name_override: Option<String>,
    /// Concrete generic arguments, empty for non-generic types.
    pub generic_args: Vec<RawType>,
    pub kind: DescriptorKind,
}

impl TypeDescriptor {
    pub fn as_object(&self) -> Option<&ObjectDescriptor> {
        match &self.kind {
            DescriptorKind::Object(object) => Some(object),
            DescriptorKind::Enum { .. } => None,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, DescriptorKind::Enum { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DescriptorKind {
    Object(ObjectDescriptor),
    Enum { members: Vec<EnumMember> },
}

/// Structure of an object type.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ObjectDescriptor {
    /// Serializable properties, own first, then inherited ones.
    /// Properties marked as ignored for serialization are not listed.
    pub properties: Vec<PropertyDescriptor>,
    pub base: Option<RawType>,
    pub interfaces: Vec<RawType>,
    /// Manually registered polymorphic variants.
    pub known_inheritors: Vec<RawType>,
}

impl ObjectDescriptor {
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: RawType,
    /// Serialized name when it differs from `name`.
    pub json_name: Option<String>,
    /// Model type name that replaces the resolved one.
    pub type_override: Option<String>,
    /// Custom revival script; `$x` stands for the value being revived.
    pub custom_reviver: Option<String>,
}

impl PropertyDescriptor {
    /// Name of the property on the wire.
    pub fn wire_name(&self) -> &str {
        self.json_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}
