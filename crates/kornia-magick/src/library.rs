//! Runtime loading of the MagickCore shared library.
//!
//! MagickCore is opened with `libloading` on first use, so the crate builds and
//! links on systems without ImageMagick. The library is initialized with
//! `MagickCoreGenesis` once per process and stays loaded until exit; kernels
//! borrow it for `'static`, which is why `MagickCoreTerminus` is never called.

use std::ffi::{CStr, CString, OsString};
use std::path::Path;
use std::sync::OnceLock;

use crate::config::MagickConfig;
use crate::error::MagickError;
use crate::ffi;
use crate::geometry::{GeometryFlags, GeometryInfo};
use crate::kernel_type::KernelType;

#[cfg(target_os = "linux")]
const DEFAULT_LIBRARY_NAMES: &[&str] = &[
    "libMagickCore-6.Q16.so.7",
    "libMagickCore-6.Q16.so.6",
    "libMagickCore-6.Q16.so.5",
    "libMagickCore-6.Q16.so.2",
    "libMagickCore-6.Q16HDRI.so.7",
    "libMagickCore-6.Q16HDRI.so.6",
    "libMagickCore-6.Q8.so.7",
    "libMagickCore-6.Q16.so",
];

#[cfg(target_os = "macos")]
const DEFAULT_LIBRARY_NAMES: &[&str] = &[
    "libMagickCore-6.Q16.7.dylib",
    "libMagickCore-6.Q16.6.dylib",
    "libMagickCore-6.Q16.dylib",
];

#[cfg(target_os = "windows")]
const DEFAULT_LIBRARY_NAMES: &[&str] = &["CORE_RL_MagickCore_.dll", "CORE_RL_magick_.dll"];

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const DEFAULT_LIBRARY_NAMES: &[&str] = &[];

/// Fallback used if the library reports no quantum range.
const DEFAULT_QUANTUM_RANGE: f64 = 65535.0;

static MAGICK: OnceLock<Result<MagickLibrary, MagickError>> = OnceLock::new();

struct MagickApi {
    genesis: ffi::FnMagickCoreGenesis,
    get_quantum_range: ffi::FnGetMagickQuantumRange,
    parse_geometry: ffi::FnParseGeometry,
    acquire_kernel_builtin: ffi::FnAcquireKernelBuiltIn,
    acquire_kernel_info: ffi::FnAcquireKernelInfo,
    clone_kernel_info: ffi::FnCloneKernelInfo,
    destroy_kernel_info: ffi::FnDestroyKernelInfo,
    scale_kernel_info: ffi::FnScaleKernelInfo,
    scale_geometry_kernel_info: ffi::FnScaleGeometryKernelInfo,
    unity_add_kernel_info: ffi::FnUnityAddKernelInfo,
}

/// A loaded and initialized MagickCore library.
///
/// Obtained through [`MagickLibrary::get`] or [`MagickLibrary::init`]; there is
/// a single instance per process.
pub struct MagickLibrary {
    api: MagickApi,
    config: MagickConfig,
    loaded_from: OsString,
    quantum_range: f64,
    // keeps the function pointers in `api` valid
    _library: libloading::Library,
}

impl std::fmt::Debug for MagickLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagickLibrary")
            .field("loaded_from", &self.loaded_from)
            .field("quantum_range", &self.quantum_range)
            .field("config", &self.config)
            .finish()
    }
}

impl MagickLibrary {
    /// Returns the process wide library, loading it with [`MagickConfig::from_env`]
    /// on first use.
    pub fn get() -> Result<&'static MagickLibrary, MagickError> {
        match MAGICK.get() {
            Some(loaded) => loaded.as_ref().map_err(Clone::clone),
            None => Self::init(MagickConfig::from_env()),
        }
    }

    /// Loads and initializes the library with an explicit configuration.
    ///
    /// Only the first call in a process loads the library. Later calls return
    /// the existing instance, or the error of the first attempt.
    pub fn init(config: MagickConfig) -> Result<&'static MagickLibrary, MagickError> {
        let mut loaded_now = false;
        let loaded = MAGICK.get_or_init(|| {
            loaded_now = true;
            Self::load(&config)
        });

        let library = loaded.as_ref().map_err(Clone::clone)?;
        if !loaded_now && library.config != config {
            log::warn!(
                "MagickCore already initialized from {:?}, ignoring new configuration",
                library.loaded_from
            );
        }
        Ok(library)
    }

    /// The maximum pixel value of the loaded library, e.g. `65535` for Q16 builds.
    pub fn quantum_range(&self) -> f64 {
        self.quantum_range
    }

    /// The name or path the library was opened from.
    pub fn loaded_from(&self) -> &Path {
        Path::new(&self.loaded_from)
    }

    /// The configuration used to load the library.
    pub fn config(&self) -> &MagickConfig {
        &self.config
    }

    fn load(config: &MagickConfig) -> Result<Self, MagickError> {
        let candidates: Vec<OsString> = match &config.library_path {
            Some(path) => vec![path.clone().into_os_string()],
            None => DEFAULT_LIBRARY_NAMES.iter().map(OsString::from).collect(),
        };

        let mut failures = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            log::debug!("Attempting to load MagickCore from: {:?}", candidate);

            // Safety: loading MagickCore runs its library constructors only.
            match unsafe { libloading::Library::new(&candidate) } {
                Ok(library) => return Self::from_library(library, candidate, config),
                Err(e) => failures.push(format!("{}: {e}", candidate.to_string_lossy())),
            }
        }

        if failures.is_empty() {
            failures.push("no candidate library names for this platform".to_string());
        }
        Err(MagickError::LibraryUnavailable(failures.join("; ")))
    }

    fn from_library(
        library: libloading::Library,
        loaded_from: OsString,
        config: &MagickConfig,
    ) -> Result<Self, MagickError> {
        // Safety: the signatures in `ffi` match the ImageMagick 6 headers.
        let api = unsafe {
            MagickApi {
                genesis: symbol(&library, b"MagickCoreGenesis\0")?,
                get_quantum_range: symbol(&library, b"GetMagickQuantumRange\0")?,
                parse_geometry: symbol(&library, b"ParseGeometry\0")?,
                acquire_kernel_builtin: symbol(&library, b"AcquireKernelBuiltIn\0")?,
                acquire_kernel_info: symbol(&library, b"AcquireKernelInfo\0")?,
                clone_kernel_info: symbol(&library, b"CloneKernelInfo\0")?,
                destroy_kernel_info: symbol(&library, b"DestroyKernelInfo\0")?,
                scale_kernel_info: symbol(&library, b"ScaleKernelInfo\0")?,
                scale_geometry_kernel_info: symbol(&library, b"ScaleGeometryKernelInfo\0")?,
                unity_add_kernel_info: symbol(&library, b"UnityAddKernelInfo\0")?,
            }
        };

        let client_name = client_name(config);
        let signal_handlers = if config.establish_signal_handlers {
            ffi::MAGICK_TRUE
        } else {
            ffi::MAGICK_FALSE
        };

        let mut range: usize = 0;
        // Safety: genesis copies the client name; the range is written to a local.
        unsafe {
            (api.genesis)(client_name.as_ptr(), signal_handlers);
            (api.get_quantum_range)(&mut range);
        }

        let quantum_range = if range == 0 {
            log::warn!("MagickCore reported no quantum range, assuming {DEFAULT_QUANTUM_RANGE}");
            DEFAULT_QUANTUM_RANGE
        } else {
            range as f64
        };

        log::info!(
            "Successfully loaded MagickCore from {:?} (quantum range {quantum_range})",
            loaded_from
        );

        Ok(Self {
            api,
            config: config.clone(),
            loaded_from,
            quantum_range,
            _library: library,
        })
    }

    pub(crate) fn parse_geometry(&self, geometry: &CStr) -> (GeometryInfo, GeometryFlags) {
        let mut info = GeometryInfo::default();
        // Safety: both pointers are valid for the duration of the call.
        let flags = unsafe { (self.api.parse_geometry)(geometry.as_ptr(), &mut info) };
        (info, GeometryFlags::from_bits(flags))
    }

    pub(crate) fn acquire_kernel_builtin(
        &self,
        kernel_type: KernelType,
        args: &GeometryInfo,
    ) -> *mut ffi::KernelInfo {
        // Safety: the geometry is only read during the call.
        unsafe { (self.api.acquire_kernel_builtin)(kernel_type.as_raw(), args) }
    }

    pub(crate) fn acquire_kernel_info(&self, kernel_string: &CStr) -> *mut ffi::KernelInfo {
        // Safety: the string is only read during the call.
        unsafe { (self.api.acquire_kernel_info)(kernel_string.as_ptr()) }
    }

    /// # Safety
    ///
    /// `kernel` must point to a live kernel list allocated by this library.
    pub(crate) unsafe fn clone_kernel_info(
        &self,
        kernel: *const ffi::KernelInfo,
    ) -> *mut ffi::KernelInfo {
        (self.api.clone_kernel_info)(kernel)
    }

    /// # Safety
    ///
    /// `kernel` must point to a live kernel list allocated by this library and
    /// must not be used afterwards.
    pub(crate) unsafe fn destroy_kernel_info(&self, kernel: *mut ffi::KernelInfo) {
        (self.api.destroy_kernel_info)(kernel);
    }

    /// # Safety
    ///
    /// `kernel` must point to a live kernel list allocated by this library, with
    /// no other reference to it.
    pub(crate) unsafe fn scale_kernel_info(
        &self,
        kernel: *mut ffi::KernelInfo,
        factor: f64,
        flags: GeometryFlags,
    ) {
        (self.api.scale_kernel_info)(kernel, factor, flags.bits() as ffi::GeometryFlagsRaw);
    }

    /// # Safety
    ///
    /// Same requirements as [`MagickLibrary::scale_kernel_info`].
    pub(crate) unsafe fn scale_geometry_kernel_info(
        &self,
        kernel: *mut ffi::KernelInfo,
        geometry: &CStr,
    ) {
        (self.api.scale_geometry_kernel_info)(kernel, geometry.as_ptr());
    }

    /// # Safety
    ///
    /// Same requirements as [`MagickLibrary::scale_kernel_info`].
    pub(crate) unsafe fn unity_add_kernel_info(&self, kernel: *mut ffi::KernelInfo, scale: f64) {
        (self.api.unity_add_kernel_info)(kernel, scale);
    }
}

/// Resolves `name` to a function pointer of type `T`.
///
/// # Safety
///
/// `T` must be the exact signature of the exported symbol.
unsafe fn symbol<T: Copy>(library: &libloading::Library, name: &[u8]) -> Result<T, MagickError> {
    library.get::<T>(name).map(|symbol| *symbol).map_err(|e| {
        let name = String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name));
        MagickError::LibraryUnavailable(format!("missing symbol {name}: {e}"))
    })
}

fn client_name(config: &MagickConfig) -> CString {
    let name = config.client_name.clone().or_else(|| {
        std::env::current_exe()
            .ok()
            .map(|path| path.to_string_lossy().into_owned())
    });

    name.and_then(|name| CString::new(name).ok())
        .unwrap_or_else(|| CString::new("kornia-magick").unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_library_path() {
        let config = MagickConfig::default().with_library_path("/nonexistent/libMagickCore.so");
        let result = MagickLibrary::load(&config);
        match result {
            Err(MagickError::LibraryUnavailable(msg)) => {
                assert!(msg.contains("/nonexistent/libMagickCore.so"), "{msg}");
            }
            other => panic!("expected LibraryUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_client_name_from_config() {
        let config = MagickConfig::default().with_client_name("demo");
        assert_eq!(client_name(&config).as_bytes(), b"demo");

        let config = MagickConfig::default().with_client_name("bad\0name");
        assert!(!client_name(&config).as_bytes().is_empty());
    }
}
