#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Configuration used to load MagickCore.
pub mod config;

/// Error types for the magick module.
pub mod error;

/// Geometry flags, arguments and kernel defaults.
///
/// See [`geometry::normalize_kernel_geometry`] for the per-kernel defaults.
pub mod geometry;

/// Kernel handles owned by MagickCore.
pub mod kernel;

/// Kernel and normalization enumerations matching MagickCore.
pub mod kernel_type;

/// Loading and initialization of the MagickCore shared library.
pub mod library;

mod ffi;

pub use crate::config::MagickConfig;
pub use crate::error::MagickError;
pub use crate::geometry::{normalize_kernel_geometry, parse_geometry, GeometryFlags, GeometryInfo};
pub use crate::kernel::{Kernel, KernelIter, KernelView};
pub use crate::kernel_type::{KernelType, NormalizeMode};
pub use crate::library::MagickLibrary;
