//! Reference evaluator for revival expressions.
//!
//! Applies a [`Revive`] tree to decoded JSON the way the emitted client code
//! would, producing a [`Revived`] value. Constructed instances run their own
//! property revivals, mirroring generated class constructors.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use super::naming::CompiledTypes;
use super::revive::Revive;

/// Result of reviving a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Revived {
    /// Passed through unchanged.
    Raw(Value),
    /// Property or lookup that produced nothing.
    Undefined,
    Date(String),
    EnumMember {
        enumeration: String,
        name: String,
        value: i64,
    },
    Array(Vec<Revived>),
    Map(IndexMap<String, Revived>),
    Instance {
        class: String,
        fields: IndexMap<String, Revived>,
    },
    /// Output of a custom script, which is not interpreted.
    Opaque { script: String, input: Value },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("Unbound value '{0}'")]
    Unbound(String),
    #[error("Expected {expected} but found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Unknown class '{0}'")]
    UnknownClass(String),
    #[error("Expression cannot be used as an input value")]
    NotAnInput,
}

/// Evaluates revival expressions against a compiled model.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    types: &'a CompiledTypes,
}

type Scope = HashMap<String, Value>;

impl<'a> Evaluator<'a> {
    pub fn new(types: &'a CompiledTypes) -> Self {
        Self { types }
    }

    /// Evaluate `revive` with `bindings` as its free values.
    pub fn evaluate(
        &self,
        revive: &Revive,
        bindings: &[(&str, Value)],
    ) -> Result<Revived, EvalError> {
        let scope: Scope = bindings
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect();
        self.apply(revive, &scope)
    }

    /// Revive `value` as an instance of `class`.
    pub fn construct(&self, class: &str, value: &Value) -> Result<Revived, EvalError> {
        if value.is_null() {
            return Ok(Revived::Raw(Value::Null));
        }
        let Value::Object(object) = value else {
            return Err(mismatch("object", value));
        };
        if self.types.class(class).is_none() {
            return Err(EvalError::UnknownClass(class.to_string()));
        }
        let scope: Scope = [("data".to_string(), value.clone())].into_iter().collect();
        let mut fields = IndexMap::new();
        for property in self.types.all_properties(class) {
            let Some(raw) = object.get(&property.name) else {
                continue;
            };
            let revived = match &property.revival {
                Some(revival) => self.apply(revival, &scope)?,
                None => Revived::Raw(raw.clone()),
            };
            fields.insert(property.name.clone(), revived);
        }
        Ok(Revived::Instance {
            class: class.to_string(),
            fields,
        })
    }

    fn input(&self, revive: &Revive, scope: &Scope) -> Result<Option<Value>, EvalError> {
        match revive {
            Revive::Value { name } => scope
                .get(name)
                .cloned()
                .map(Some)
                .ok_or_else(|| EvalError::Unbound(name.clone())),
            Revive::Member { object, property } => {
                Ok(self.input(object, scope)?.and_then(|o| o.get(property).cloned()))
            }
            _ => Err(EvalError::NotAnInput),
        }
    }

    fn apply(&self, revive: &Revive, scope: &Scope) -> Result<Revived, EvalError> {
        match revive {
            Revive::Value { .. } | Revive::Member { .. } => {
                Ok(self.input(revive, scope)?.map_or(Revived::Undefined, Revived::Raw))
            }
            Revive::MapArray {
                source,
                param,
                body,
            } => match self.input(source, scope)? {
                None => Ok(Revived::Undefined),
                Some(Value::Null) => Ok(Revived::Raw(Value::Null)),
                Some(Value::Array(items)) => items
                    .into_iter()
                    .map(|item| self.apply(body, &bind(scope, param, item)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Revived::Array),
                Some(other) => Err(mismatch("array", &other)),
            },
            Revive::MapValues {
                source,
                param,
                body,
            } => match self.input(source, scope)? {
                None => Ok(Revived::Undefined),
                Some(Value::Null) => Ok(Revived::Raw(Value::Null)),
                Some(Value::Object(entries)) => entries
                    .into_iter()
                    .map(|(key, item)| Ok((key, self.apply(body, &bind(scope, param, item))?)))
                    .collect::<Result<IndexMap<_, _>, EvalError>>()
                    .map(Revived::Map),
                Some(other) => Err(mismatch("object", &other)),
            },
            Revive::Construct { class, value } => match self.input(value, scope)? {
                None => Ok(Revived::Undefined),
                Some(value) => self.construct(class, &value),
            },
            Revive::EnumLookup { enumeration, value } => {
                let Some(value) = self.input(value, scope)? else {
                    return Ok(Revived::Undefined);
                };
                match &value {
                    Value::Number(_) => Ok(Revived::Raw(value)),
                    Value::String(name) => Ok(self
                        .types
                        .enumeration(enumeration)
                        .and_then(|e| e.members.iter().find(|m| &m.name == name))
                        .map_or(Revived::Undefined, |m| Revived::EnumMember {
                            enumeration: enumeration.clone(),
                            name: m.name.clone(),
                            value: m.value,
                        })),
                    _ => Ok(Revived::Undefined),
                }
            }
            Revive::Date { value } => match self.input(value, scope)? {
                Some(Value::String(s)) if !s.is_empty() => Ok(Revived::Date(s)),
                Some(Value::Number(n)) if n.as_f64() != Some(0.0) => {
                    Ok(Revived::Date(n.to_string()))
                }
                _ => Ok(Revived::Raw(Value::Null)),
            },
            Revive::Custom { script, value } => Ok(Revived::Opaque {
                script: script.clone(),
                input: self.input(value, scope)?.unwrap_or(Value::Null),
            }),
            Revive::InlineObject {
                class,
                value,
                fields,
            } => match self.input(value, scope)? {
                None => Ok(Revived::Undefined),
                Some(Value::Null) => Ok(Revived::Raw(Value::Null)),
                Some(Value::Object(object)) => {
                    let mut revived = IndexMap::new();
                    for field in fields {
                        if !object.contains_key(&field.name) {
                            continue;
                        }
                        let value = match &field.revive {
                            Some(revive) => self.apply(revive, scope)?,
                            None => Revived::Raw(object[&field.name].clone()),
                        };
                        revived.insert(field.name.clone(), value);
                    }
                    Ok(Revived::Instance {
                        class: class.clone(),
                        fields: revived,
                    })
                }
                Some(other) => Err(mismatch("object", &other)),
            },
            Revive::RecursionDetected { .. } => Ok(Revived::Raw(Value::Null)),
        }
    }
}

fn bind(scope: &Scope, name: &str, value: Value) -> Scope {
    let mut scope = scope.clone();
    scope.insert(name.to_string(), value);
    scope
}

fn mismatch(expected: &'static str, found: &Value) -> EvalError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    EvalError::TypeMismatch { expected, found }
}
