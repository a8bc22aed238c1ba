//! Compiled type model.
//!
//! These are the artifacts downstream emitters consume: use-site [`TypeSpec`]s,
//! the ordered class and enum declarations, and their property revivals.

use serde::Serialize;

use super::revive::Revive;

/// Built-in scalar vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Void,
    String,
    Number,
    Boolean,
    Date,
    Any,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Void => "void",
            ScalarKind::String => "string",
            ScalarKind::Number => "number",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Date => "date",
            ScalarKind::Any => "any",
        }
    }
}

/// How dictionary keys are represented on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRepr {
    Numeric,
    String,
}

/// Structural shape of a use-site type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Scalar { scalar: ScalarKind },
    Object,
    Enum,
    ArrayOf { element: Box<TypeSpec> },
    Dictionary { key: KeyRepr, value: Box<TypeSpec> },
    /// Dictionary whose values are arrays of `element`.
    DictionaryOfArrays { key: KeyRepr, element: Box<TypeSpec> },
}

/// Canonical description of one referenced type at a use-site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSpec {
    /// Canonical name of the innermost element.
    pub name: String,
    pub shape: Shape,
    /// Declared as nullable.
    pub optional: bool,
    /// Object or enum present in the frozen discovery table.
    pub user_defined: bool,
}

impl TypeSpec {
    pub fn scalar(kind: ScalarKind) -> Self {
        Self {
            name: kind.as_str().to_string(),
            shape: Shape::Scalar { scalar: kind },
            optional: false,
            user_defined: false,
        }
    }

    pub fn void() -> Self {
        Self::scalar(ScalarKind::Void)
    }

    pub fn any() -> Self {
        Self::scalar(ScalarKind::Any)
    }

    pub fn is_void(&self) -> bool {
        matches!(
            self.shape,
            Shape::Scalar {
                scalar: ScalarKind::Void
            }
        )
    }

    pub fn is_date(&self) -> bool {
        matches!(
            self.shape,
            Shape::Scalar {
                scalar: ScalarKind::Date
            }
        )
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.shape, Shape::Enum)
    }

    pub fn is_object(&self) -> bool {
        matches!(self.shape, Shape::Object)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.shape, Shape::ArrayOf { .. })
    }

    /// Key representation for dictionary shapes.
    pub fn key_repr(&self) -> Option<KeyRepr> {
        match &self.shape {
            Shape::Dictionary { key, .. } | Shape::DictionaryOfArrays { key, .. } => Some(*key),
            _ => None,
        }
    }

    /// Rename this spec and the innermost element it wraps.
    pub(crate) fn rename(&mut self, name: &str) {
        self.name = name.to_string();
        match &mut self.shape {
            Shape::ArrayOf { element } | Shape::DictionaryOfArrays { element, .. } => {
                element.rename(name);
            }
            Shape::Dictionary { value, .. } => value.rename(name),
            Shape::Scalar { .. } | Shape::Object | Shape::Enum => {}
        }
    }
}

/// A compiled enum declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledEnum {
    pub name: String,
    /// Members sorted by value; names that are not identifiers are dropped.
    pub members: Vec<CompiledEnumMember>,
    pub original_identity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledEnumMember {
    pub name: String,
    pub value: i64,
}

/// A compiled class declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledClass {
    pub name: String,
    /// Another compiled class, always declared earlier.
    pub superclass: Option<String>,
    /// Own properties; those declared on the superclass are not repeated.
    pub properties: Vec<PropertySpec>,
    pub original_identity: String,
}

impl CompiledClass {
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySpec {
    /// Wire name.
    pub name: String,
    pub ty: TypeSpec,
    /// Script replacing the atomic revival step; `$x` is the value.
    pub custom_reviver: Option<String>,
    /// Revival of `data.<name>` inside the class constructor.
    pub revival: Option<Revive>,
}
