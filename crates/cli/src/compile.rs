use std::path::PathBuf;

use clap::Args;
use contractgen::CompileError;

use crate::common::InputArgs;

#[derive(Args, Debug, Clone)]
pub struct CompileArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Write the model here instead of stdout
    #[arg(long, short, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub fn run(args: CompileArgs) -> i32 {
    match run_inner(&args) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn run_inner(args: &CompileArgs) -> Result<(), CompileError> {
    let model = args.input.compile()?;
    let json = model.to_json(args.pretty)?;
    match &args.out {
        Some(path) => std::fs::write(path, json + "\n").map_err(|source| CompileError::Io {
            path: path.clone(),
            source,
        })?,
        None => println!("{json}"),
    }
    Ok(())
}
