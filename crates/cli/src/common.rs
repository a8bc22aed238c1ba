use std::path::{Path, PathBuf};

use clap::Args;
use contractgen::{CompileError, CompilerConfig, ContractModel, ServiceDocument};
use tracing::debug;

/// Inputs shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Service document (JSON)
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Compiler configuration (TOML); defaults apply when omitted
    #[arg(long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}

impl InputArgs {
    pub fn compile(&self) -> Result<ContractModel, CompileError> {
        let config = load_config(self.config.as_deref())?;
        let document = ServiceDocument::load(&self.document)?;
        debug!(
            document = %self.document.display(),
            types = document.types.len(),
            operations = document.operations.len(),
            "Loaded service document."
        );
        contractgen::compile(&document, &config)
    }
}

fn load_config(path: Option<&Path>) -> Result<CompilerConfig, CompileError> {
    match path {
        Some(path) => CompilerConfig::load(path),
        None => Ok(CompilerConfig::default()),
    }
}
