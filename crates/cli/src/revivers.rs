use std::fmt::Write as _;

use clap::Args;
use contractgen::{ContractModel, Emit};

use crate::common::InputArgs;

#[derive(Args, Debug, Clone)]
pub struct Revivers {
    #[command(flatten)]
    pub input: InputArgs,
}

pub fn run(args: Revivers) -> i32 {
    match args.input.compile() {
        Ok(model) => {
            print!("{}", render(&model));
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

/// One line per revived value, grouped by class, operation and interface.
pub fn render(model: &ContractModel) -> String {
    let mut out = String::new();
    for class in &model.types.classes {
        let revived: Vec<_> = class
            .properties
            .iter()
            .filter_map(|p| p.revival.as_ref().map(|r| (&p.name, r)))
            .collect();
        if revived.is_empty() {
            continue;
        }
        let _ = writeln!(out, "class {}", class.name);
        for (name, revival) in revived {
            let _ = writeln!(out, "  {name}: {}", revival.emit());
        }
    }
    for op in &model.operations {
        let _ = writeln!(out, "{} {} `{}`", op.method, op.name, op.url.emit());
        for param in op.inputs() {
            if let Some(revival) = &param.revival {
                let _ = writeln!(out, "  {}: {}", param.name, revival.emit());
            }
        }
        if let Some(revival) = &op.response_revival {
            let _ = writeln!(out, "  -> {}", revival.emit());
        }
    }
    for interface in &model.interfaces {
        for method in &interface.methods {
            let _ = writeln!(out, "{}.{}", interface.name, method.name);
            for param in &method.params {
                if let Some(revival) = &param.revival {
                    let _ = writeln!(out, "  {}: {}", param.name, revival.emit());
                }
            }
            if let Some(revival) = &method.return_revival {
                let _ = writeln!(out, "  -> {}", revival.emit());
            }
        }
    }
    out
}
