//! Source acquisition. Module resolution happens before this crate sees the code; a
//! [`Bundler`] only has to hand over one flattened ES module.

use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{LibraryError, Result};
use crate::options::LibraryOptions;
use crate::transform::{transform_library, LibraryOutput};

pub trait Bundler {
    /// Text of the flattened module, free of imports.
    fn bundle(&self) -> Result<String>;
}

/// A module already held in memory.
#[derive(Debug, Clone)]
pub struct InlineModule {
    source: String,
}

impl InlineModule {
    pub fn new(source: impl Into<String>) -> Self {
        InlineModule {
            source: source.into(),
        }
    }
}

impl Bundler for InlineModule {
    fn bundle(&self) -> Result<String> {
        Ok(self.source.clone())
    }
}

/// An entry file some external bundler has already flattened.
#[derive(Debug, Clone)]
pub struct PrebundledFile {
    path: PathBuf,
}

impl PrebundledFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PrebundledFile { path: path.into() }
    }
}

impl Bundler for PrebundledFile {
    fn bundle(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|source| LibraryError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Acquires the bundled text once and compiles it.
pub fn build_library(bundler: &dyn Bundler, options: &LibraryOptions) -> Result<LibraryOutput> {
    let source = bundler.bundle()?;
    debug!(bytes = source.len(), "acquired bundled module");
    transform_library(&source, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("emlib-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_inline_module() {
        let output = build_library(
            &InlineModule::new("export function y() { return 1; }"),
            &LibraryOptions::default(),
        )
        .unwrap();
        assert_eq!(output.manifest.entry_keys(), ["y"]);
    }

    #[test]
    fn test_prebundled_file_round_trip_to_disk() {
        let dir = scratch_dir("prebundled");
        let entry = dir.join("bundle.js");
        fs::write(&entry, "var n = 1; export function get() { return n; }").unwrap();

        let output = build_library(&PrebundledFile::new(&entry), &LibraryOptions::with_namespace("fs"))
            .unwrap();
        let target = dir.join("out").join("library_fs.js");
        output.write(&target).unwrap();

        let written = fs::read_to_string(&target).unwrap();
        assert!(written.contains("_fs_n: 1"), "{}", written);
        assert!(written.contains("get__deps"), "{}", written);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_entry_file_is_io_error() {
        let dir = scratch_dir("missing");
        let err = build_library(&PrebundledFile::new(dir.join("absent.js")), &LibraryOptions::default())
            .unwrap_err();
        assert!(matches!(err, LibraryError::Io { .. }));
        let _ = fs::remove_dir_all(&dir);
    }
}
