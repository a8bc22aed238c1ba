//! Type shape resolution.
//!
//! [`classify`] recognizes built-in scalars and containers and is shared with
//! the graph builder. [`TypeResolver`] turns a raw type into a [`TypeSpec`]; it
//! can only be built from compiled names, so whether a type is user-defined
//! is never answered before the discovery table is frozen.

use indexmap::IndexMap;

use super::types::{KeyRepr, ScalarKind, Shape, TypeSpec};
use crate::describe::RawType;

/// Structural category of a raw type before any catalog lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Structure<'a> {
    Void,
    Scalar { kind: ScalarKind, numeric: bool },
    Nullable(&'a RawType),
    Sequence(&'a RawType),
    Map { key: &'a RawType, value: &'a RawType },
    /// Not built in; the catalog decides what it is.
    Declared,
}

const SEQUENCES: &[&str] = &[
    "IEnumerable",
    "ICollection",
    "IList",
    "ISet",
    "List",
    "HashSet",
    "IReadOnlyList",
    "IReadOnlyCollection",
];

const MAPS: &[&str] = &["IDictionary", "Dictionary", "IReadOnlyDictionary"];

const NUMERIC: &[&str] = &[
    "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "float", "double",
    "decimal", "Byte", "SByte", "Int16", "UInt16", "Int32", "UInt32", "Int64", "UInt64",
    "Single", "Double", "Decimal",
];

/// Built-in name of `name`, if it lives in the root or `System` namespace.
///
/// `System.Collections.Generic.List` -> `List`; `Shop.List` -> `None`.
pub(crate) fn builtin_name(name: &str) -> Option<&str> {
    if !name.contains('.') {
        Some(name)
    } else if name.starts_with("System.") {
        name.rsplit('.').next()
    } else {
        None
    }
}

pub(crate) fn classify(raw: &RawType) -> Structure<'_> {
    let (name, args) = match raw {
        RawType::Void => return Structure::Void,
        RawType::Array(inner) => {
            if let RawType::Named { name, args } = inner.as_ref()
                && args.is_empty()
                && matches!(builtin_name(name), Some("byte" | "Byte"))
            {
                return Structure::Scalar {
                    kind: ScalarKind::String,
                    numeric: false,
                };
            }
            return Structure::Sequence(inner);
        }
        RawType::Named { name, args } => (name, args),
    };

    let Some(base) = builtin_name(name) else {
        return Structure::Declared;
    };

    match (base, args.as_slice()) {
        ("Nullable", [inner]) => Structure::Nullable(inner),
        (seq, [inner]) if SEQUENCES.contains(&seq) => Structure::Sequence(inner),
        (map, [key, value]) if MAPS.contains(&map) => Structure::Map { key, value },
        (scalar, []) => match scalar_kind(scalar) {
            Some(kind) => Structure::Scalar {
                kind,
                numeric: NUMERIC.contains(&scalar),
            },
            None => Structure::Declared,
        },
        _ => Structure::Declared,
    }
}

fn scalar_kind(name: &str) -> Option<ScalarKind> {
    let kind = match name {
        "void" | "Void" => ScalarKind::Void,
        "string" | "String" | "char" | "Char" | "Guid" | "TimeSpan" | "Uri" => ScalarKind::String,
        "bool" | "Boolean" => ScalarKind::Boolean,
        "DateTime" | "DateTimeOffset" | "DateOnly" => ScalarKind::Date,
        "object" | "Object" | "dynamic" => ScalarKind::Any,
        n if NUMERIC.contains(&n) => ScalarKind::Number,
        _ => return None,
    };
    Some(kind)
}

/// Kind of a named, discovered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedKind {
    Object,
    Enum,
}

/// Canonical name assigned to a discovered type.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NamedType {
    pub name: String,
    pub kind: NamedKind,
}

/// Resolves raw types against the compiled name assignment.
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    names: &'a IndexMap<String, NamedType>,
}

impl<'a> TypeResolver<'a> {
    pub(crate) fn new(names: &'a IndexMap<String, NamedType>) -> Self {
        Self { names }
    }

    /// Resolve `raw` to a use-site spec; `name_override` replaces the computed name.
    pub fn resolve(&self, raw: &RawType, name_override: Option<&str>) -> TypeSpec {
        let mut spec = self.resolve_shape(raw);
        if let Some(name) = name_override {
            spec.rename(name);
        }
        spec
    }

    fn resolve_shape(&self, raw: &RawType) -> TypeSpec {
        match classify(raw) {
            Structure::Void => TypeSpec::void(),
            Structure::Scalar { kind, .. } => TypeSpec::scalar(kind),
            Structure::Nullable(inner) => {
                let mut spec = self.resolve_shape(inner);
                spec.optional = true;
                spec
            }
            Structure::Sequence(inner) => {
                let element = self.resolve_shape(inner);
                TypeSpec {
                    name: element.name.clone(),
                    user_defined: element.user_defined,
                    optional: false,
                    shape: Shape::ArrayOf {
                        element: Box::new(element),
                    },
                }
            }
            Structure::Map { key, value } => {
                let key = key_repr(key);
                let value = self.resolve_shape(value);
                let name = value.name.clone();
                let user_defined = value.user_defined;
                let value_optional = value.optional;
                let shape = match value.shape {
                    // Only non-nullable array values flatten; a nullable array keeps
                    // its own spec so the flag survives.
                    Shape::ArrayOf { element } if !value_optional => {
                        Shape::DictionaryOfArrays { key, element }
                    }
                    _ => Shape::Dictionary {
                        key,
                        value: Box::new(value),
                    },
                };
                TypeSpec {
                    name,
                    shape,
                    optional: false,
                    user_defined,
                }
            }
            Structure::Declared => self.resolve_declared(raw),
        }
    }

    fn resolve_declared(&self, raw: &RawType) -> TypeSpec {
        match self.names.get(&raw.to_string()) {
            Some(named) => TypeSpec {
                name: named.name.clone(),
                shape: match named.kind {
                    NamedKind::Object => Shape::Object,
                    NamedKind::Enum => Shape::Enum,
                },
                optional: false,
                user_defined: true,
            },
            None => TypeSpec::any(),
        }
    }
}

fn key_repr(key: &RawType) -> KeyRepr {
    let key = match classify(key) {
        Structure::Nullable(inner) => classify(inner),
        other => other,
    };
    match key {
        Structure::Scalar { numeric: true, .. } => KeyRepr::Numeric,
        _ => KeyRepr::String,
    }
}
