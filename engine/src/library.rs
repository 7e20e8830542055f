//! Engine library loading and static engine queries.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Arc;

use libloading::{Library, Symbol};

use crate::error::{EngineError, Result, Status};
use crate::ffi::FunctionTable;

/// Size of the buffers used to read identifier strings from the engine.
pub(crate) const STRING_BUFFER_SIZE: usize = 2048;

/// A loaded engine: the resolved function table plus the library backing it.
pub struct Engine {
    table: FunctionTable,
    _library: Option<Library>, // Keeps every pointer in `table` valid
}

impl Engine {
    /// Load the engine from a shared library and resolve every symbol.
    ///
    /// # Example
    /// ```no_run
    /// use fxn_engine::Engine;
    ///
    /// let engine = Engine::load("libFunction.so")?;
    /// println!("engine {}", engine.version()?);
    /// # Ok::<(), fxn_engine::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(library_path: P) -> Result<Arc<Self>> {
        let path = library_path.as_ref();

        // SAFETY: Library::new runs the library's initializers. The engine
        // library is a trusted dependency and is only accessed through the
        // typed function table resolved below.
        let library = unsafe {
            Library::new(path).map_err(|e| EngineError::LibraryLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        let table = Self::load_functions(&library)?;
        let engine = Engine { table, _library: Some(library) };
        log::info!("Loaded Function engine {} from {}", engine.version()?, path.display());
        Ok(Arc::new(engine))
    }

    /// Wrap a function table that is already linked into the process.
    pub fn from_table(table: FunctionTable) -> Arc<Self> {
        Arc::new(Engine { table, _library: None })
    }

    pub(crate) fn table(&self) -> &FunctionTable {
        &self.table
    }

    /// Engine version string.
    pub fn version(&self) -> Result<String> {
        // SAFETY: FXNGetVersion returns a pointer to a static NUL-terminated
        // string owned by the engine.
        let ptr = unsafe { (self.table.get_version)() };
        if ptr.is_null() {
            return Err(EngineError::NullHandle { operation: "FXNGetVersion" });
        }
        // SAFETY: non-null and NUL-terminated per the engine contract.
        Ok(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }

    /// Identifier of this engine build, sent when fetching predictor manifests.
    pub fn configuration_id(&self) -> Result<String> {
        read_string("FXNConfigurationGetUniqueID", STRING_BUFFER_SIZE, |buf, size| {
            // SAFETY: `buf` is writable for `size` bytes.
            unsafe { (self.table.configuration_get_unique_id)(buf, size) }
        })
    }

    /// Identifier of the host platform, sent when fetching predictor manifests.
    pub fn client_id(&self) -> Result<String> {
        read_string("FXNConfigurationGetClientID", STRING_BUFFER_SIZE, |buf, size| {
            // SAFETY: `buf` is writable for `size` bytes.
            unsafe { (self.table.configuration_get_client_id)(buf, size) }
        })
    }

    /// Load all required function symbols from the library
    fn load_functions(library: &Library) -> Result<FunctionTable> {
        // SAFETY: every symbol is looked up by its exported C name and cast
        // to the signature declared by the engine header. `library` outlives
        // the table because both are stored in the same `Engine`.
        unsafe {
            Ok(FunctionTable {
                value_release: symbol(library, "FXNValueRelease")?,
                value_get_data: symbol(library, "FXNValueGetData")?,
                value_get_type: symbol(library, "FXNValueGetType")?,
                value_get_dimensions: symbol(library, "FXNValueGetDimensions")?,
                value_get_shape: symbol(library, "FXNValueGetShape")?,
                value_create_array: symbol(library, "FXNValueCreateArray")?,
                value_create_string: symbol(library, "FXNValueCreateString")?,
                value_create_list: symbol(library, "FXNValueCreateList")?,
                value_create_dict: symbol(library, "FXNValueCreateDict")?,
                value_create_image: symbol(library, "FXNValueCreateImage")?,
                value_create_binary: symbol(library, "FXNValueCreateBinary")?,
                value_create_null: symbol(library, "FXNValueCreateNull")?,

                value_map_create: symbol(library, "FXNValueMapCreate")?,
                value_map_release: symbol(library, "FXNValueMapRelease")?,
                value_map_get_size: symbol(library, "FXNValueMapGetSize")?,
                value_map_get_key: symbol(library, "FXNValueMapGetKey")?,
                value_map_get_value: symbol(library, "FXNValueMapGetValue")?,
                value_map_set_value: symbol(library, "FXNValueMapSetValue")?,

                configuration_get_unique_id: symbol(library, "FXNConfigurationGetUniqueID")?,
                configuration_get_client_id: symbol(library, "FXNConfigurationGetClientID")?,
                configuration_create: symbol(library, "FXNConfigurationCreate")?,
                configuration_release: symbol(library, "FXNConfigurationRelease")?,
                configuration_get_tag: symbol(library, "FXNConfigurationGetTag")?,
                configuration_set_tag: symbol(library, "FXNConfigurationSetTag")?,
                configuration_get_token: symbol(library, "FXNConfigurationGetToken")?,
                configuration_set_token: symbol(library, "FXNConfigurationSetToken")?,
                configuration_get_acceleration: symbol(library, "FXNConfigurationGetAcceleration")?,
                configuration_set_acceleration: symbol(library, "FXNConfigurationSetAcceleration")?,
                configuration_get_device: symbol(library, "FXNConfigurationGetDevice")?,
                configuration_set_device: symbol(library, "FXNConfigurationSetDevice")?,
                configuration_add_resource: symbol(library, "FXNConfigurationAddResource")?,

                prediction_release: symbol(library, "FXNPredictionRelease")?,
                prediction_get_id: symbol(library, "FXNPredictionGetID")?,
                prediction_get_latency: symbol(library, "FXNPredictionGetLatency")?,
                prediction_get_results: symbol(library, "FXNPredictionGetResults")?,
                prediction_get_error: symbol(library, "FXNPredictionGetError")?,
                prediction_get_logs: symbol(library, "FXNPredictionGetLogs")?,
                prediction_get_log_length: symbol(library, "FXNPredictionGetLogLength")?,

                prediction_stream_release: symbol(library, "FXNPredictionStreamRelease")?,
                prediction_stream_read_next: symbol(library, "FXNPredictionStreamReadNext")?,

                predictor_create: symbol(library, "FXNPredictorCreate")?,
                predictor_release: symbol(library, "FXNPredictorRelease")?,
                predictor_create_prediction: symbol(library, "FXNPredictorCreatePrediction")?,
                predictor_stream_prediction: symbol(library, "FXNPredictorStreamPrediction")?,

                get_version: symbol(library, "FXNGetVersion")?,
            })
        }
    }
}

/// Resolve one symbol, naming it in the error when it is missing.
///
/// # Safety
/// `T` must be the exact function pointer type of the exported symbol.
unsafe fn symbol<T: Copy>(library: &Library, name: &str) -> Result<T> {
    let symbol: Symbol<T> = library
        .get(name.as_bytes())
        .map_err(|e| EngineError::Ffi(format!("Missing {}: {}", name, e)))?;
    Ok(*symbol)
}

/// Read a NUL-terminated string the engine writes into a caller buffer.
pub(crate) fn read_string<F>(operation: &'static str, size: usize, fill: F) -> Result<String>
where
    F: FnOnce(*mut c_char, i32) -> crate::ffi::FXNStatus,
{
    let mut buffer = vec![0u8; size.max(1)];
    let capacity = i32::try_from(buffer.len()).unwrap_or(i32::MAX);
    Status::check(fill(buffer.as_mut_ptr() as *mut c_char, capacity), operation)?;
    Ok(buffer_to_string(&buffer))
}

/// Text up to the first NUL, or the whole buffer if there is none.
pub(crate) fn buffer_to_string(buffer: &[u8]) -> String {
    CStr::from_bytes_until_nul(buffer)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(buffer).into_owned())
}
