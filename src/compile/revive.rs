//! Revival expression synthesis.
//!
//! A revival expression rebuilds a richly typed value (dates, enum members,
//! class instances) from a generically decoded JSON value. Compound shapes map
//! their elements through the atomic reviver of the innermost type.
//!
//! In [`ObjectRevival::Inline`] mode objects are expanded property by property.
//! A [`CycleGuard`] scoped to one top-level call tracks the classes being
//! expanded; meeting one of them again yields [`Revive::RecursionDetected`].

use serde::Serialize;

use super::naming::CompiledTypes;
use super::types::{PropertySpec, ScalarKind, Shape, TypeSpec};
use super::utils::lambda_param;
use crate::config::ObjectRevival;

/// Revival expression tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Revive {
    /// A bound value: the source expression or a lambda parameter.
    Value { name: String },
    /// Property access on a value.
    Member { object: Box<Revive>, property: String },
    /// Map each element of an array; null sources pass through.
    MapArray {
        source: Box<Revive>,
        param: String,
        body: Box<Revive>,
    },
    /// Map each value of a dictionary; null sources pass through.
    MapValues {
        source: Box<Revive>,
        param: String,
        body: Box<Revive>,
    },
    /// Construct a class instance; null passes through.
    Construct { class: String, value: Box<Revive> },
    /// Look up an enum member by name unless the value is already numeric.
    EnumLookup { enumeration: String, value: Box<Revive> },
    /// Build a date, or null for falsy values.
    Date { value: Box<Revive> },
    /// User-supplied script where `$x` stands for `value`.
    Custom { script: String, value: Box<Revive> },
    /// Copy of an object with revived fields.
    InlineObject {
        class: String,
        value: Box<Revive>,
        fields: Vec<InlineField>,
    },
    /// A class met again while it was being expanded.
    RecursionDetected { class: String },
}

impl Revive {
    pub fn value(name: impl Into<String>) -> Self {
        Self::Value { name: name.into() }
    }

    pub fn member(object: Revive, property: impl Into<String>) -> Self {
        Self::Member {
            object: Box::new(object),
            property: property.into(),
        }
    }

    /// Whether the tree contains a recursion marker anywhere.
    pub fn contains_recursion(&self) -> bool {
        match self {
            Revive::RecursionDetected { .. } => true,
            Revive::Value { .. } => false,
            Revive::Member { object, .. } => object.contains_recursion(),
            Revive::MapArray { source, body, .. } | Revive::MapValues { source, body, .. } => {
                source.contains_recursion() || body.contains_recursion()
            }
            Revive::Construct { value, .. }
            | Revive::EnumLookup { value, .. }
            | Revive::Date { value }
            | Revive::Custom { value, .. } => value.contains_recursion(),
            Revive::InlineObject { value, fields, .. } => {
                value.contains_recursion()
                    || fields
                        .iter()
                        .filter_map(|f| f.revive.as_ref())
                        .any(Revive::contains_recursion)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineField {
    pub name: String,
    /// `None` when the field is copied unchanged.
    pub revive: Option<Revive>,
}

/// Stack of classes currently being expanded inline.
#[derive(Debug, Default)]
pub struct CycleGuard {
    stack: Vec<String>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `class`, or return false if it is already being expanded.
    fn enter(&mut self, class: &str) -> bool {
        if self.stack.iter().any(|c| c == class) {
            return false;
        }
        self.stack.push(class.to_string());
        true
    }

    fn exit(&mut self) {
        self.stack.pop();
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Builds revival expressions against a compiled type model.
#[derive(Debug, Clone, Copy)]
pub struct ReviverSynthesizer<'a> {
    types: &'a CompiledTypes,
    mode: ObjectRevival,
}

impl<'a> ReviverSynthesizer<'a> {
    pub fn new(types: &'a CompiledTypes, mode: ObjectRevival) -> Self {
        Self { types, mode }
    }

    /// Revival of `source` typed as `spec`, or `None` if it needs no transformation.
    pub fn synthesize(
        &self,
        spec: &TypeSpec,
        source: Revive,
        guard: &mut CycleGuard,
    ) -> Option<Revive> {
        self.synthesize_at(spec, source, None, guard, 0)
    }

    /// Revival of a property value, honoring its custom atomic reviver.
    pub fn synthesize_property(
        &self,
        property: &PropertySpec,
        source: Revive,
        guard: &mut CycleGuard,
    ) -> Option<Revive> {
        self.synthesize_at(
            &property.ty,
            source,
            property.custom_reviver.as_deref(),
            guard,
            0,
        )
    }

    fn synthesize_at(
        &self,
        spec: &TypeSpec,
        source: Revive,
        custom: Option<&str>,
        guard: &mut CycleGuard,
        depth: usize,
    ) -> Option<Revive> {
        match &spec.shape {
            Shape::ArrayOf { element } => {
                let param = lambda_param(depth);
                let body =
                    self.synthesize_at(element, Revive::value(&param), custom, guard, depth + 1)?;
                Some(Revive::MapArray {
                    source: Box::new(source),
                    param,
                    body: Box::new(body),
                })
            }
            Shape::Dictionary { value, .. } => {
                let param = lambda_param(depth);
                let body =
                    self.synthesize_at(value, Revive::value(&param), custom, guard, depth + 1)?;
                Some(Revive::MapValues {
                    source: Box::new(source),
                    param,
                    body: Box::new(body),
                })
            }
            Shape::DictionaryOfArrays { element, .. } => {
                let outer = lambda_param(depth);
                let inner = lambda_param(depth + 1);
                let body =
                    self.synthesize_at(element, Revive::value(&inner), custom, guard, depth + 2)?;
                Some(Revive::MapValues {
                    source: Box::new(source),
                    param: outer.clone(),
                    body: Box::new(Revive::MapArray {
                        source: Box::new(Revive::value(outer)),
                        param: inner,
                        body: Box::new(body),
                    }),
                })
            }
            Shape::Scalar { .. } | Shape::Object | Shape::Enum => {
                self.atomic(spec, source, custom, guard, depth)
            }
        }
    }

    fn atomic(
        &self,
        spec: &TypeSpec,
        value: Revive,
        custom: Option<&str>,
        guard: &mut CycleGuard,
        depth: usize,
    ) -> Option<Revive> {
        if let Some(script) = custom {
            return Some(Revive::Custom {
                script: script.to_string(),
                value: Box::new(value),
            });
        }
        match &spec.shape {
            Shape::Scalar {
                scalar: ScalarKind::Date,
            } => Some(Revive::Date {
                value: Box::new(value),
            }),
            Shape::Enum if spec.user_defined => Some(Revive::EnumLookup {
                enumeration: spec.name.clone(),
                value: Box::new(value),
            }),
            Shape::Object if spec.user_defined => match self.mode {
                ObjectRevival::Construct => Some(Revive::Construct {
                    class: spec.name.clone(),
                    value: Box::new(value),
                }),
                ObjectRevival::Inline => Some(self.inline_object(&spec.name, value, guard, depth)),
            },
            _ => None,
        }
    }

    fn inline_object(
        &self,
        class: &str,
        value: Revive,
        guard: &mut CycleGuard,
        depth: usize,
    ) -> Revive {
        if !guard.enter(class) {
            return Revive::RecursionDetected {
                class: class.to_string(),
            };
        }
        let fields = self
            .types
            .all_properties(class)
            .into_iter()
            .map(|property| InlineField {
                name: property.name.clone(),
                revive: self.synthesize_at(
                    &property.ty,
                    Revive::member(value.clone(), &property.name),
                    property.custom_reviver.as_deref(),
                    guard,
                    depth,
                ),
            })
            .collect();
        guard.exit();
        Revive::InlineObject {
            class: class.to_string(),
            value: Box::new(value),
            fields,
        }
    }
}
