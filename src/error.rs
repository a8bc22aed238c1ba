//! Error types for the contract compiler.

use std::path::PathBuf;

/// Errors raised while loading inputs or compiling a contract model.
///
/// Most malformed input degrades instead of failing (unknown types become `any`,
/// bad enum members are dropped). Only conditions with no meaningful fallback
/// surface here.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The service document is not valid JSON or does not match the document shape.
    #[error("Failed to parse service document: {0}")]
    Document(#[from] serde_json::Error),

    /// A type expression such as `List<Shop.Item>` could not be parsed.
    #[error("Invalid type expression '{input}': {reason}")]
    TypeSyntax { input: String, reason: String },

    /// The compiler configuration file is not valid TOML for [`crate::CompilerConfig`].
    #[error("Failed to parse compiler config: {0}")]
    Config(#[from] toml::de::Error),

    /// An event-style interface method does not take exactly one parameter.
    #[error(
        "Event interface '{interface}' method '{method}' must take exactly one parameter, found {count}"
    )]
    EventArity {
        interface: String,
        method: String,
        count: usize,
    },

    /// Reading an input file failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    pub(crate) fn type_syntax(input: &str, reason: impl Into<String>) -> Self {
        Self::TypeSyntax {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
