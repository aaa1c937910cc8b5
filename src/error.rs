use std::path::PathBuf;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_UNSUPPORTED_STATEMENT: &str = "LIB-ERR-STMT-001";
pub const ERR_IMPURE_INITIALIZER: &str = "LIB-ERR-PURE-001";
pub const ERR_UNDEFINED_EXPORT: &str = "LIB-ERR-EXPORT-001";
pub const ERR_NAME_COLLISION: &str = "LIB-ERR-NAME-001";
pub const ERR_INVALID_NAMESPACE: &str = "LIB-ERR-CONFIG-001";
pub const ERR_CONFIG: &str = "LIB-ERR-CONFIG-002";
pub const ERR_SYNTAX: &str = "LIB-ERR-SYNTAX-001";
pub const ERR_INTERNAL: &str = "LIB-ERR-INTERNAL";
pub const ERR_IO: &str = "LIB-ERR-IO-001";

/// Broad classification of a [`LibraryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The input program has a shape the descriptor format cannot express.
    Structural,
    /// The options handed to the pass are unusable.
    Configuration,
    /// A pipeline invariant did not hold. Always a bug in this crate.
    Internal,
    /// Reading the bundled module or persisting the output failed.
    Io,
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIBRARY ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum LibraryError {
    /// A top-level statement that is not a function, variable or named export.
    #[error("Unsupported top-level statement ({reason}):\n{node}")]
    UnsupportedStatement { node: String, reason: String },

    /// A variable initializer outside the pure-value grammar.
    #[error("Impure initializer in top-level declaration:\n{declarator}")]
    ImpureInitializer { declarator: String },

    /// `export { name }` where `name` is not declared at top level.
    #[error("Export '{name}' does not refer to a top-level declaration")]
    UndefinedExport { name: String },

    /// A name that cannot denote exactly one module-level symbol after renaming.
    #[error("Name collision on '{key}': {reason}")]
    NameCollision { key: String, reason: String },

    #[error("Invalid namespace prefix '{namespace}': private symbol names built from it must be identifiers")]
    InvalidNamespace { namespace: String },

    #[error("Invalid library options: {0}")]
    Config(String),

    #[error("Failed to parse bundled module:\n{}", .messages.join("\n"))]
    Syntax { messages: Vec<String> },

    /// InternalConsistency: the pipeline reached a state earlier stages rule out.
    #[error("Internal consistency failure: {0}")]
    Internal(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LibraryError {
    pub fn unsupported(node: &str, reason: &str) -> Self {
        LibraryError::UnsupportedStatement {
            node: node.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn collision(key: &str, reason: impl Into<String>) -> Self {
        LibraryError::NameCollision {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        LibraryError::Internal(detail.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            LibraryError::UnsupportedStatement { .. } => ERR_UNSUPPORTED_STATEMENT,
            LibraryError::ImpureInitializer { .. } => ERR_IMPURE_INITIALIZER,
            LibraryError::UndefinedExport { .. } => ERR_UNDEFINED_EXPORT,
            LibraryError::NameCollision { .. } => ERR_NAME_COLLISION,
            LibraryError::InvalidNamespace { .. } => ERR_INVALID_NAMESPACE,
            LibraryError::Config(_) => ERR_CONFIG,
            LibraryError::Syntax { .. } => ERR_SYNTAX,
            LibraryError::Internal(_) => ERR_INTERNAL,
            LibraryError::Io { .. } => ERR_IO,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LibraryError::UnsupportedStatement { .. }
            | LibraryError::ImpureInitializer { .. }
            | LibraryError::UndefinedExport { .. }
            | LibraryError::NameCollision { .. }
            | LibraryError::Syntax { .. } => ErrorCategory::Structural,
            LibraryError::InvalidNamespace { .. } | LibraryError::Config(_) => {
                ErrorCategory::Configuration
            }
            LibraryError::Internal(_) => ErrorCategory::Internal,
            LibraryError::Io { .. } => ErrorCategory::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
