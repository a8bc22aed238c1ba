//! End-to-end compilation of service documents.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;
use std::fs;

use contractgen::compile::api::ParamLocation;
use contractgen::compile::eval::Revived;
use contractgen::compile::types::{KeyRepr, Shape};
use contractgen::{CompileError, CompilerConfig, Emit, ObjectRevival, ServiceDocument, compile};
use serde_json::json;
use tempfile::TempDir;

const HELPDESK: &str = r#"{
    "types": {
        "Desk.Ticket": {
            "kind": "object",
            "properties": [
                { "name": "Title", "type": "string", "json_name": "title" },
                { "name": "Statuses", "type": "List<Desk.Status>?", "json_name": "statuses" },
                { "name": "Due", "type": "DateTime?", "json_name": "due" }
            ]
        },
        "Desk.Status": {
            "kind": "enum",
            "members": [
                { "name": "Closed", "value": 2 },
                { "name": "Active", "value": 0 },
                { "name": "not valid", "value": 1 }
            ]
        },
        "Desk.TicketQuery": {
            "kind": "object",
            "properties": [
                { "name": "id", "type": "string" },
                { "name": "page", "type": "int" }
            ]
        },
        "Geo.Shape": {
            "kind": "object",
            "known_inheritors": ["Geo.Square", "Geo.Circle"],
            "properties": [{ "name": "area", "type": "double" }]
        },
        "Geo.Circle": {
            "kind": "object",
            "base": "Geo.Shape",
            "properties": [{ "name": "radius", "type": "double" }]
        },
        "Geo.Square": {
            "kind": "object",
            "base": "Geo.Shape",
            "properties": [{ "name": "side", "type": "double" }]
        },
        "Bundle": {
            "kind": "object",
            "properties": [
                { "name": "a", "type": "A.Item" },
                { "name": "b", "type": "B.Item" },
                { "name": "c", "type": "C.Item" }
            ]
        },
        "A.Item": { "kind": "object" },
        "B.Item": { "kind": "object" },
        "C.Item": { "kind": "object" }
    },
    "operations": [
        {
            "controller": "Tickets",
            "action": "ByOwner",
            "method": "GET",
            "route": "api/tickets/by-owner",
            "response": "Dictionary<int, List<Desk.Ticket>>"
        },
        {
            "controller": "Tickets",
            "action": "Search",
            "method": "GET",
            "route": "api/tickets/search/{id}/{page}",
            "params": [
                { "name": "query", "type": "Desk.TicketQuery", "source": "uri", "binder": true }
            ],
            "response": "List<Desk.Ticket>"
        },
        {
            "controller": "Shapes",
            "action": "Get",
            "method": "GET",
            "route": "api/shapes",
            "response": "Geo.Shape"
        },
        {
            "controller": "Bundles",
            "action": "Get",
            "method": "GET",
            "route": "api/bundles",
            "response": "Bundle"
        },
        {
            "controller": "Health",
            "action": "Ping",
            "method": "GET",
            "route": "api/health",
            "response": "string"
        }
    ]
}"#;

fn helpdesk(config: &CompilerConfig) -> contractgen::ContractModel {
    let document = ServiceDocument::from_json(HELPDESK).unwrap();
    compile(&document, config).unwrap()
}

#[test]
fn test_names_are_unique_and_suffixed_in_discovery_order() {
    let model = helpdesk(&CompilerConfig::default());
    let names: Vec<&str> = model
        .types
        .enums
        .iter()
        .map(|e| e.name.as_str())
        .chain(model.types.classes.iter().map(|c| c.name.as_str()))
        .collect();
    let unique: HashSet<&str> = names.iter().copied().collect();
    assert_eq!(unique.len(), names.len());

    let items: Vec<(&str, &str)> = model
        .types
        .classes
        .iter()
        .filter(|c| c.name.starts_with("Item"))
        .map(|c| (c.name.as_str(), c.original_identity.as_str()))
        .collect();
    assert_eq!(
        items,
        vec![("Item", "A.Item"), ("Item_2", "B.Item"), ("Item_3", "C.Item")]
    );
}

#[test]
fn test_superclasses_precede_subclasses() {
    let model = helpdesk(&CompilerConfig::default());
    for (position, class) in model.types.classes.iter().enumerate() {
        if let Some(parent) = &class.superclass {
            let parent_position = model
                .types
                .class_position(parent)
                .expect("superclass is declared");
            assert!(parent_position < position, "{parent} must precede {}", class.name);
        }
    }

    let geo: Vec<&str> = model
        .types
        .classes
        .iter()
        .filter(|c| c.original_identity.starts_with("Geo."))
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(geo, vec!["Shape", "Circle", "Square"]);

    let circle = model.class("Circle").unwrap();
    assert!(circle.property("area").is_none());
    assert!(circle.property("radius").is_some());
}

#[test]
fn test_enum_members_are_filtered_and_sorted() {
    let model = helpdesk(&CompilerConfig::default());
    let status = &model.types.enums[0];
    assert_eq!(status.name, "Status");
    let members: Vec<(&str, i64)> = status
        .members
        .iter()
        .map(|m| (m.name.as_str(), m.value))
        .collect();
    assert_eq!(members, vec![("Active", 0), ("Closed", 2)]);
}

#[test]
fn test_dictionary_of_arrays_response() {
    let model = helpdesk(&CompilerConfig::default());
    let by_owner = model.operation("Tickets_ByOwner").unwrap();
    match &by_owner.response.shape {
        Shape::DictionaryOfArrays { key, element } => {
            assert_eq!(*key, KeyRepr::Numeric);
            assert_eq!(element.name, "Ticket");
        }
        other => unreachable!("unexpected shape: {other:?}"),
    }
    assert_eq!(by_owner.response.emit(), "{ [key: number]: Ticket[] }");

    let revival = by_owner.response_revival.as_ref().unwrap();
    let revived = model
        .evaluator()
        .evaluate(
            revival,
            &[(
                "response",
                json!({ "7": [{ "title": "Printer", "statuses": ["Closed"] }], "8": null }),
            )],
        )
        .unwrap();
    let Revived::Map(owners) = revived else {
        unreachable!("expected a map")
    };
    assert_eq!(owners["8"], Revived::Raw(serde_json::Value::Null));
    let Revived::Array(tickets) = &owners["7"] else {
        unreachable!("expected an array")
    };
    let Revived::Instance { class, fields } = &tickets[0] else {
        unreachable!("expected an instance")
    };
    assert_eq!(class, "Ticket");
    assert_eq!(fields["title"], Revived::Raw(json!("Printer")));
}

#[test]
fn test_optional_enum_array_revival() {
    let model = helpdesk(&CompilerConfig::default());
    let ticket = model.class("Ticket").unwrap();
    let statuses = ticket.property("statuses").unwrap();
    assert!(statuses.ty.optional);
    assert!(statuses.ty.is_array());

    let evaluator = model.evaluator();
    let revived = evaluator
        .construct("Ticket", &json!({ "statuses": null, "due": "" }))
        .unwrap();
    let Revived::Instance { fields, .. } = revived else {
        unreachable!("expected an instance")
    };
    assert_eq!(fields["statuses"], Revived::Raw(serde_json::Value::Null));
    assert_eq!(fields["due"], Revived::Raw(serde_json::Value::Null));

    let revived = evaluator
        .construct(
            "Ticket",
            &json!({ "statuses": ["Active", 2, "Missing"], "due": "2024-05-01T10:00:00Z" }),
        )
        .unwrap();
    let Revived::Instance { fields, .. } = revived else {
        unreachable!("expected an instance")
    };
    assert_eq!(
        fields["statuses"],
        Revived::Array(vec![
            Revived::EnumMember {
                enumeration: "Status".into(),
                name: "Active".into(),
                value: 0,
            },
            Revived::Raw(json!(2)),
            Revived::Undefined,
        ])
    );
    assert_eq!(fields["due"], Revived::Date("2024-05-01T10:00:00Z".into()));
}

#[test]
fn test_wrapper_parameter_is_flattened() {
    let model = helpdesk(&CompilerConfig::default());
    let search = model.operation("Tickets_Search").unwrap();

    let names: Vec<&str> = search.uri_params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["id", "page"]);
    assert!(search.uri_params.iter().all(|p| p.optional));
    assert!(
        search
            .uri_params
            .iter()
            .all(|p| p.location == ParamLocation::Query)
    );
    assert_eq!(search.url.emit(), "tickets/search");
    assert!(!search.url.has_param("id"));
    assert!(!search.url.has_param("page"));

    let wrapper = search.wrapper.as_ref().unwrap();
    assert_eq!(wrapper.name, "query");
    assert_eq!(wrapper.ty.name, "TicketQuery");
    assert_eq!(search.inputs().len(), 1);
}

#[test]
fn test_inline_revival_marks_mutual_recursion() {
    let document = ServiceDocument::from_json(
        r#"{
            "types": {
                "Graph.A": { "kind": "object", "properties": [{ "name": "b", "type": "Graph.B" }] },
                "Graph.B": { "kind": "object", "properties": [{ "name": "a", "type": "Graph.A" }] }
            },
            "operations": [{
                "controller": "Graph",
                "action": "Root",
                "method": "GET",
                "route": "api/graph/root",
                "response": "Graph.A"
            }]
        }"#,
    )
    .unwrap();
    let config = CompilerConfig {
        object_revival: ObjectRevival::Inline,
        ..CompilerConfig::default()
    };
    let model = compile(&document, &config).unwrap();
    let revival = model
        .operation("Graph_Root")
        .unwrap()
        .response_revival
        .as_ref()
        .unwrap();
    assert!(revival.contains_recursion());
    assert!(revival.emit().contains("null /* recursion detected: A */"));
}

#[test]
fn test_event_interface_arity_is_rejected() {
    let document = ServiceDocument::from_json(
        r#"{ "interfaces": [{
            "name": "ITicketEvents",
            "role": "events",
            "methods": [{ "name": "Closed" }]
        }] }"#,
    )
    .unwrap();
    let err = compile(&document, &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err, CompileError::EventArity { count: 0, .. }));
}

#[test]
fn test_compile_from_files() {
    let dir = TempDir::new().unwrap();
    let document_path = dir.path().join("service.json");
    let config_path = dir.path().join("contractgen.toml");
    fs::write(&document_path, HELPDESK).unwrap();
    fs::write(
        &config_path,
        "exclude_controllers = [\"health\"]\nignore_types = [\"Bundle\"]\n",
    )
    .unwrap();

    let document = ServiceDocument::load(&document_path).unwrap();
    let config = CompilerConfig::load(&config_path).unwrap();
    let model = compile(&document, &config).unwrap();

    assert!(model.operation("Health_Ping").is_none());
    assert!(model.class("Bundle").is_none());
    assert!(model.class("Item").is_none());
    let bundles = model.operation("Bundles_GET").unwrap();
    assert_eq!(bundles.response.emit(), "any");

    let missing = ServiceDocument::load(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(missing, CompileError::Io { .. }));
}

#[test]
fn test_operation_names_fall_back_to_http_method() {
    let document = ServiceDocument::from_json(
        r#"{
            "operations": [
                { "controller": "Orders", "action": "Get", "method": "GET", "route": "api/shop/list" },
                { "controller": "Orders", "action": "Post", "method": "POST", "route": "api/orders" },
                { "controller": "Orders", "action": "Get", "method": "GET", "route": "api/Orders/recent" },
                { "controller": "Orders", "action": "Post", "method": "POST", "route": "api/Orders" }
            ]
        }"#,
    )
    .unwrap();
    let model = compile(&document, &CompilerConfig::default()).unwrap();
    let names: Vec<&str> = model.operations.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Orders_GET", "Orders_POST", "Orders_recent", "Orders_POST_2"]
    );
    assert_eq!(model.operations[0].url.emit(), "shop/list");
}

#[test]
fn test_recompiling_is_stable() {
    let config = CompilerConfig::default();
    let first = helpdesk(&config).to_json(true).unwrap();
    let second = helpdesk(&config).to_json(true).unwrap();
    assert_eq!(first, second);
}
