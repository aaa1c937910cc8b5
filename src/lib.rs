//! # Emscripten Library Compiler
//!
//! Turns one flattened ES module into an Emscripten library descriptor:
//!
//! ```js
//! Object.assign(LibraryManager.library, {
//!     _mylib_helper: function() { ... },
//!     api: function() { return _mylib_helper(); },
//!     api__deps: ["_mylib_helper"],
//! });
//! ```
//!
//! ## Pipeline
//!
//! 1. **Validate**: only function declarations, variable declarations and named exports
//!    may appear at top level; variable initializers must be pure values.
//! 2. **Resolve exports**: `export` wrappers are stripped into an internal → public name map.
//! 3. **Rename**: every module-level symbol gets its descriptor key (public name, or
//!    namespaced private name) and every occurrence in the module is rewritten.
//! 4. **Collect dependencies**: the module-level symbols each body or initializer reads.
//! 5. **Serialize**: one entry per symbol, then one `<key>__deps` entry per symbol with
//!    dependencies, wrapped in the `LibraryManager.library` merge call.
//!
//! Any failure aborts the whole pass. No partial descriptor is ever produced.

mod bundle;
mod dependencies;
mod descriptor;
mod error;
mod exports;
#[cfg(feature = "napi")]
mod native;
mod options;
mod renamer;
mod scope;
mod transform;
mod validate;


pub use bundle::{build_library, Bundler, InlineModule, PrebundledFile};
pub use dependencies::DependencyGraph;
pub use descriptor::{LibraryManifest, SymbolManifest, LIBRARY_TEMPLATE};
pub use error::{ErrorCategory, LibraryError, Result};
pub use exports::ExportMap;
#[cfg(feature = "napi")]
pub use native::{transform_library_native, NativeLibraryOptions, NativeLibraryOutput};
pub use options::{InitializerPolicy, LibraryOptions, NamingConvention, DEFAULT_NAMESPACE};
pub use renamer::{Symbol, SymbolTable, Visibility};
pub use scope::SymbolKind;
pub use transform::{transform_library, LibraryOutput};
pub use validate::is_pure_value;
