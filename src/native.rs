//! Node binding, built with the `napi` feature.

use napi_derive::napi;

use crate::error::LibraryError;
use crate::options::LibraryOptions;
use crate::transform::transform_library;

#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct NativeLibraryOptions {
    pub namespace: Option<String>,
    pub naming: Option<String>,
    pub initializers: Option<String>,
}

#[napi(object)]
pub struct NativeLibraryOutput {
    pub code: String,
    /// Manifest as JSON text.
    pub manifest: String,
}

impl TryFrom<NativeLibraryOptions> for LibraryOptions {
    type Error = LibraryError;

    fn try_from(native: NativeLibraryOptions) -> Result<Self, Self::Error> {
        let mut options = LibraryOptions::default();
        if let Some(namespace) = native.namespace {
            options.namespace = namespace;
        }
        if let Some(naming) = native.naming {
            options.naming = naming.parse()?;
        }
        if let Some(initializers) = native.initializers {
            options.initializers = initializers.parse()?;
        }
        Ok(options)
    }
}

fn to_napi(err: LibraryError) -> napi::Error {
    napi::Error::from_reason(format!("[{}] {}", err.code(), err))
}

#[napi(js_name = "transformLibrary")]
pub fn transform_library_native(
    code: String,
    options: Option<NativeLibraryOptions>,
) -> napi::Result<NativeLibraryOutput> {
    let options = LibraryOptions::try_from(options.unwrap_or_default()).map_err(to_napi)?;
    let output = transform_library(&code, &options).map_err(to_napi)?;
    let manifest = output.manifest.to_json().map_err(to_napi)?;
    Ok(NativeLibraryOutput {
        code: output.code,
        manifest,
    })
}
