use crate::kernel_type::KernelType;

/// An error type for the magick module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MagickError {
    /// Error when the MagickCore shared library cannot be opened or is missing a symbol.
    #[error("MagickCore library is not available. {0}")]
    LibraryUnavailable(String),

    /// Error when the kernel type cannot be built from a geometry string.
    #[error("Kernel type {0} cannot be built from a geometry")]
    UnsupportedKernelType(KernelType),

    /// Error when the geometry string cannot be parsed.
    #[error("Invalid geometry string: {0:?}")]
    InvalidGeometry(String),

    /// Error when the kernel description cannot be parsed.
    #[error("Invalid kernel string: {0:?}")]
    InvalidKernelString(String),

    /// Error when MagickCore fails to build the requested kernel.
    #[error("Failed to acquire {kernel_type} kernel from geometry {geometry:?}")]
    AcquireKernelFailed {
        /// The requested kernel type.
        kernel_type: KernelType,
        /// The geometry string given by the caller.
        geometry: String,
    },

    /// Error when MagickCore fails to copy a kernel.
    #[error("Failed to clone the kernel")]
    CloneFailed,

    /// Error when the scale factor is not a finite number.
    #[error("Scale factor must be finite, got {0}")]
    InvalidScaleFactor(f64),

    /// Error when a kernel name is not recognised.
    #[error("Unknown kernel type: {0}")]
    UnknownKernelType(String),

    /// Error when a normalization mode name is not recognised.
    #[error("Unknown normalize mode: {0}")]
    UnknownNormalizeMode(String),
}
