#![forbid(unsafe_code)]
#![deny(unused_must_use, missing_debug_implementations)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! Data contract graph compiler.
//!
//! Reads a service document (declared types, HTTP operations, call and event
//! interfaces), discovers the transitive closure of data types it exposes,
//! assigns each a unique client-facing name, orders classes so bases come
//! first, and synthesizes revival expressions that rebuild typed values from
//! parsed JSON.
//!
//! ```no_run
//! use contractgen::{CompilerConfig, ServiceDocument, compile};
//!
//! # fn main() -> Result<(), contractgen::CompileError> {
//! let document = ServiceDocument::load(std::path::Path::new("service.json"))?;
//! let model = compile(&document, &CompilerConfig::default())?;
//! println!("{}", model.to_json(true)?);
//! # Ok(())
//! # }
//! ```

pub mod compile;
pub mod config;
pub mod describe;
pub mod error;

pub use compile::emit::Emit;
pub use compile::{ContractModel, compile};
pub use config::{CompilerConfig, ObjectRevival};
pub use describe::{RawType, ServiceDocument, TypeCatalog};
pub use error::CompileError;
