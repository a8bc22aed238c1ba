//! TypeScript emission via the Emit trait.
//!
//! Renders compiled artifacts as TypeScript text: revival expressions, use-site
//! type annotations and URL templates. Emission is a pure function of the
//! compiled model.

use super::api::{UrlPart, UrlTemplate};
use super::revive::Revive;
use super::types::{KeyRepr, ScalarKind, Shape, TypeSpec};
use super::utils::{escape_js_string, is_valid_identifier};

/// Trait for emitting TypeScript code from compiled artifacts.
pub trait Emit {
    /// Convert the artifact to its TypeScript string representation.
    fn emit(&self) -> String;
}

// =============================================================================
// Revival expressions
// =============================================================================

impl Emit for Revive {
    fn emit(&self) -> String {
        match self {
            Revive::Value { name } => name.clone(),
            Revive::Member { object, property } => {
                let object = object.emit();
                if is_valid_identifier(property) {
                    format!("{object}.{property}")
                } else {
                    format!("{object}[\"{}\"]", escape_js_string(property))
                }
            }
            Revive::MapArray {
                source,
                param,
                body,
            } => {
                let source = source.emit();
                format!(
                    "({source} == null ? {source} : {source}.map(({param}) => {}))",
                    body.emit()
                )
            }
            Revive::MapValues {
                source,
                param,
                body,
            } => {
                let source = source.emit();
                format!(
                    "({source} == null ? {source} : Object.fromEntries(Object.entries({source}).map(([k, {param}]) => [k, {}])))",
                    body.emit()
                )
            }
            Revive::Construct { class, value } => {
                let value = value.emit();
                format!("({value} == null ? {value} : new {class}({value}))")
            }
            Revive::EnumLookup { enumeration, value } => {
                let value = value.emit();
                format!(
                    "(typeof {value} === \"number\" ? {value} : {enumeration}[{value} as keyof typeof {enumeration}])"
                )
            }
            Revive::Date { value } => {
                let value = value.emit();
                format!("({value} ? new Date({value}) : null)")
            }
            Revive::Custom { script, value } => emit_custom(script, &value.emit()),
            Revive::InlineObject {
                value,
                fields,
                ..
            } => {
                let value = value.emit();
                let mut entries = vec![format!("...{value}")];
                for field in fields {
                    if let Some(revive) = &field.revive {
                        entries.push(format!("{}: {}", property_key(&field.name), revive.emit()));
                    }
                }
                format!("({value} == null ? {value} : {{ {} }})", entries.join(", "))
            }
            Revive::RecursionDetected { class } => {
                format!("null /* recursion detected: {class} */")
            }
        }
    }
}

/// Single-line scripts are inlined; multi-line scripts become an invoked lambda.
fn emit_custom(script: &str, value: &str) -> String {
    if script.contains('\n') {
        let body = script.replace("$x", "x");
        format!("((x) => {{\n{}\n}})({value})", body.trim_end())
    } else if is_valid_identifier(value) {
        script.replace("$x", value)
    } else {
        script.replace("$x", &format!("({value})"))
    }
}

fn property_key(name: &str) -> String {
    if is_valid_identifier(name) {
        name.to_string()
    } else {
        format!("\"{}\"", escape_js_string(name))
    }
}

// =============================================================================
// Types
// =============================================================================

impl Emit for TypeSpec {
    fn emit(&self) -> String {
        match &self.shape {
            Shape::Scalar { scalar } => match scalar {
                ScalarKind::Date => "Date".to_string(),
                other => other.as_str().to_string(),
            },
            Shape::Object | Shape::Enum => self.name.clone(),
            Shape::ArrayOf { element } => array_of(element),
            Shape::Dictionary { key, value } => {
                format!("{{ [key: {}]: {} }}", key.emit(), value.emit())
            }
            Shape::DictionaryOfArrays { key, element } => {
                format!("{{ [key: {}]: {} }}", key.emit(), array_of(element))
            }
        }
    }
}

fn array_of(element: &TypeSpec) -> String {
    let inner = element.emit();
    if matches!(
        element.shape,
        Shape::Dictionary { .. } | Shape::DictionaryOfArrays { .. }
    ) {
        format!("Array<{inner}>")
    } else {
        format!("{inner}[]")
    }
}

impl Emit for KeyRepr {
    fn emit(&self) -> String {
        match self {
            KeyRepr::Numeric => "number".to_string(),
            KeyRepr::String => "string".to_string(),
        }
    }
}

// =============================================================================
// URLs
// =============================================================================

impl Emit for UrlTemplate {
    fn emit(&self) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                UrlPart::Static(text) => text.replace('`', "\\`"),
                UrlPart::Param(name) => format!("${{{name}}}"),
            })
            .collect()
    }
}
