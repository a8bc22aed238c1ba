//! Call and event interfaces.
//!
//! Interface methods contribute parameter and return types as discovery roots.
//! Event interfaces push a single payload per method, so any other arity is
//! rejected before discovery starts.

use tracing::debug;

use super::api::{InterfaceRole, InterfaceSpec, MethodParamSpec, MethodSpec};
use super::graph::{AddReason, TypeGraphBuilder};
use super::naming::CompiledTypes;
use crate::config::CompilerConfig;
use crate::describe::TypeCatalog;
use crate::describe::document::InterfaceDecl;
use crate::error::CompileError;

/// Reject event methods that do not take exactly one parameter.
pub fn validate_interfaces(interfaces: &[InterfaceDecl]) -> Result<(), CompileError> {
    for interface in interfaces
        .iter()
        .filter(|i| i.role == InterfaceRole::Events)
    {
        if let Some(method) = interface.methods.iter().find(|m| m.params.len() != 1) {
            return Err(CompileError::EventArity {
                interface: interface.name.clone(),
                method: method.name.clone(),
                count: method.params.len(),
            });
        }
    }
    Ok(())
}

/// Add method parameter and return types as discovery roots.
pub fn collect_interface_roots<C: TypeCatalog + ?Sized>(
    interfaces: &[InterfaceDecl],
    builder: &mut TypeGraphBuilder<'_, C>,
) {
    for interface in interfaces {
        for method in &interface.methods {
            let qualified = format!("{}.{}", interface.name, method.name);
            for param in &method.params {
                builder.add_root(
                    &param.ty,
                    AddReason::FromInterfaceParam {
                        method: qualified.clone(),
                        param: param.name.clone(),
                    },
                );
            }
            builder.add_root(
                &method.returns,
                AddReason::FromInterfaceReturn { method: qualified },
            );
        }
    }
}

pub fn build_interfaces(
    interfaces: &[InterfaceDecl],
    types: &CompiledTypes,
    config: &CompilerConfig,
) -> Vec<InterfaceSpec> {
    let resolver = types.resolver();
    interfaces
        .iter()
        .map(|interface| {
            let mut methods: Vec<MethodSpec> = interface
                .methods
                .iter()
                .map(|method| MethodSpec {
                    name: method.name.clone(),
                    params: method
                        .params
                        .iter()
                        .map(|p| MethodParamSpec {
                            name: p.name.clone(),
                            ty: resolver.resolve(&p.ty, None),
                            revival: None,
                        })
                        .collect(),
                    returns: resolver.resolve(&method.returns, None),
                    return_revival: None,
                })
                .collect();
            if config.sort_methods {
                methods.sort_by(|a, b| a.name.cmp(&b.name));
            }
            debug!(interface = %interface.name, methods = methods.len(), "Built interface.");
            InterfaceSpec {
                name: interface.name.clone(),
                role: interface.role,
                methods,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::compile::naming::assign_names;
    use crate::describe::ServiceDocument;

    const DOCUMENT: &str = r#"{
        "types": {
            "Chat.Message": { "kind": "object", "properties": [{ "name": "text", "type": "string" }] },
            "Chat.Room": { "kind": "object" }
        },
        "interfaces": [
            {
                "name": "IChatServer",
                "methods": [
                    { "name": "Send", "params": [{ "name": "room", "type": "string" }, { "name": "message", "type": "Chat.Message" }] },
                    { "name": "Join", "params": [{ "name": "room", "type": "string" }], "returns": "Chat.Room" }
                ]
            },
            {
                "name": "IChatEvents",
                "role": "events",
                "methods": [{ "name": "Received", "params": [{ "name": "message", "type": "Chat.Message" }] }]
            }
        ]
    }"#;

    #[test]
    fn test_interfaces_seed_discovery_and_sort_methods() {
        let doc = ServiceDocument::from_json(DOCUMENT).unwrap();
        validate_interfaces(&doc.interfaces).unwrap();
        let config = CompilerConfig::default();
        let mut builder = TypeGraphBuilder::new(&doc, &config);
        collect_interface_roots(&doc.interfaces, &mut builder);
        let table = builder.compile();
        assert_eq!(
            table.get("Chat.Room").unwrap().reason,
            AddReason::FromInterfaceReturn {
                method: "IChatServer.Join".into()
            }
        );
        assert_eq!(
            table.get("Chat.Message").unwrap().reason,
            AddReason::FromInterfaceParam {
                method: "IChatServer.Send".into(),
                param: "message".into()
            }
        );

        let types = assign_names(&table);
        let interfaces = build_interfaces(&doc.interfaces, &types, &config);
        let server = &interfaces[0];
        let names: Vec<_> = server.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Join", "Send"]);
        assert_eq!(server.methods[0].returns.name, "Room");
        assert_eq!(interfaces[1].role, InterfaceRole::Events);
    }

    #[test]
    fn test_event_methods_require_one_parameter() {
        let doc = ServiceDocument::from_json(
            r#"{ "interfaces": [{
                "name": "IFeed",
                "role": "events",
                "methods": [
                    { "name": "Tick", "params": [{ "name": "at", "type": "DateTime" }] },
                    { "name": "Moved", "params": [{ "name": "x", "type": "int" }, { "name": "y", "type": "int" }] }
                ]
            }] }"#,
        )
        .unwrap();
        let err = validate_interfaces(&doc.interfaces).unwrap_err();
        match err {
            CompileError::EventArity {
                interface,
                method,
                count,
            } => {
                assert_eq!(interface, "IFeed");
                assert_eq!(method, "Moved");
                assert_eq!(count, 2);
            }
            other => unreachable!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_call_interfaces_allow_any_arity() {
        let doc = ServiceDocument::from_json(
            r#"{ "interfaces": [{ "name": "IOps", "methods": [{ "name": "Ping" }] }] }"#,
        )
        .unwrap();
        assert!(validate_interfaces(&doc.interfaces).is_ok());
    }
}
