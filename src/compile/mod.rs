//! Data contract compilation pipeline.
//!
//! Pipeline stages:
//! 1. Root collection: operation and interface types seed the graph builder
//! 2. Discovery: fixed-point closure over object properties
//! 3. Naming and ordering: collision-free names, base classes first
//! 4. Extraction: operation and interface specs against the compiled names
//! 5. Revival synthesis: per property, per parameter and per response

pub mod api;
pub mod emit;
pub mod endpoint;
pub mod eval;
pub mod graph;
pub mod methods;
pub mod naming;
pub mod resolve;
pub mod revive;
pub mod types;
pub mod utils;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::CompilerConfig;
use crate::describe::ServiceDocument;
use crate::error::CompileError;
use api::{InterfaceSpec, OperationSpec};
use endpoint::EndpointExtractor;
use eval::Evaluator;
use graph::{Provenance, TypeGraphBuilder};
use naming::{CompiledTypes, assign_names};
use revive::{CycleGuard, Revive, ReviverSynthesizer};
use types::CompiledClass;

/// Everything downstream emitters need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractModel {
    /// Named enums and dependency-ordered classes.
    #[serde(flatten)]
    pub types: CompiledTypes,
    pub operations: Vec<OperationSpec>,
    pub interfaces: Vec<InterfaceSpec>,
    /// Why each discovered type was included.
    pub provenance: Vec<Provenance>,
    /// Discovery passes run before the table froze.
    pub passes: usize,
}

impl ContractModel {
    pub fn to_json(&self, pretty: bool) -> Result<String, CompileError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    pub fn operation(&self, name: &str) -> Option<&OperationSpec> {
        self.operations.iter().find(|o| o.name == name)
    }

    pub fn class(&self, name: &str) -> Option<&CompiledClass> {
        self.types.class(name)
    }

    /// Evaluator for applying this model's revivals to decoded JSON.
    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.types)
    }
}

/// Compile a service document into a contract model.
pub fn compile(
    document: &ServiceDocument,
    config: &CompilerConfig,
) -> Result<ContractModel, CompileError> {
    methods::validate_interfaces(&document.interfaces)?;

    let extractor = EndpointExtractor::new(document, config);
    let mut builder = TypeGraphBuilder::new(document, config);
    extractor.collect_roots(&document.operations, &mut builder);
    methods::collect_interface_roots(&document.interfaces, &mut builder);
    let table = builder.compile();

    let mut types = assign_names(&table);
    attach_property_revivals(&mut types, config);

    let synth = ReviverSynthesizer::new(&types, config.object_revival);
    let mut operations = extractor.extract(&document.operations, &types);
    operations
        .par_iter_mut()
        .for_each(|op| attach_operation_revivals(op, &synth));

    let mut interfaces = methods::build_interfaces(&document.interfaces, &types, config);
    interfaces.par_iter_mut().for_each(|interface| {
        for method in &mut interface.methods {
            method.return_revival = synth.synthesize(
                &method.returns,
                Revive::value("result"),
                &mut CycleGuard::new(),
            );
            for param in &mut method.params {
                param.revival =
                    synth.synthesize(&param.ty, Revive::value(&param.name), &mut CycleGuard::new());
            }
        }
    });

    info!(
        enums = types.enums.len(),
        classes = types.classes.len(),
        operations = operations.len(),
        interfaces = interfaces.len(),
        passes = table.passes(),
        "Compiled contract model."
    );

    Ok(ContractModel {
        types,
        operations,
        interfaces,
        provenance: table.provenance(),
        passes: table.passes(),
    })
}

/// Revival of `data.<property>` for every class property, computed in parallel.
fn attach_property_revivals(types: &mut CompiledTypes, config: &CompilerConfig) {
    let revivals: Vec<Vec<Option<Revive>>> = {
        let synth = ReviverSynthesizer::new(types, config.object_revival);
        types
            .classes
            .par_iter()
            .map(|class| {
                class
                    .properties
                    .iter()
                    .map(|property| {
                        synth.synthesize_property(
                            property,
                            Revive::member(Revive::value("data"), &property.name),
                            &mut CycleGuard::new(),
                        )
                    })
                    .collect()
            })
            .collect()
    };
    for (class, revivals) in types.classes.iter_mut().zip(revivals) {
        for (property, revival) in class.properties.iter_mut().zip(revivals) {
            property.revival = revival;
        }
    }
}

fn attach_operation_revivals(op: &mut OperationSpec, synth: &ReviverSynthesizer<'_>) {
    op.response_revival = synth.synthesize(
        &op.response,
        Revive::value("response"),
        &mut CycleGuard::new(),
    );
    for param in op
        .uri_params
        .iter_mut()
        .chain(op.body_params.iter_mut())
        .chain(op.wrapper.iter_mut())
    {
        param.revival =
            synth.synthesize(&param.ty, Revive::value(&param.name), &mut CycleGuard::new());
    }
}
