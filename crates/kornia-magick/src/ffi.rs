//! Raw MagickCore types and entry point signatures.
//!
//! Layouts follow the ImageMagick 6 headers `magick/morphology.h` and
//! `magick/geometry.h`.

use std::ffi::{c_char, c_double, c_int, c_uint};

use crate::geometry::GeometryInfo;

/// `MagickBooleanType`, a C enum.
pub(crate) type MagickBoolean = c_int;
pub(crate) const MAGICK_FALSE: MagickBoolean = 0;
pub(crate) const MAGICK_TRUE: MagickBoolean = 1;

/// `MagickStatusType`, the flags returned by `ParseGeometry`.
pub(crate) type MagickStatus = c_uint;

/// `GeometryFlags`, a C enum.
pub(crate) type GeometryFlagsRaw = c_int;

/// `KernelInfoType`, a C enum.
pub(crate) type KernelInfoType = c_int;

/// `KernelInfo` from `magick/morphology.h`.
///
/// Kernels returned by MagickCore form a singly linked list through `next`.
#[repr(C)]
#[derive(Debug)]
#[allow(dead_code)]
pub(crate) struct KernelInfo {
    pub type_: KernelInfoType,
    pub width: usize,
    pub height: usize,
    pub x: isize,
    pub y: isize,
    pub values: *mut c_double,
    pub minimum: c_double,
    pub maximum: c_double,
    pub negative_range: c_double,
    pub positive_range: c_double,
    pub angle: c_double,
    pub next: *mut KernelInfo,
    pub signature: usize,
}

pub(crate) type FnMagickCoreGenesis =
    unsafe extern "C" fn(path: *const c_char, establish_signal_handlers: MagickBoolean);
pub(crate) type FnGetMagickQuantumRange = unsafe extern "C" fn(range: *mut usize) -> *const c_char;
pub(crate) type FnParseGeometry =
    unsafe extern "C" fn(geometry: *const c_char, geometry_info: *mut GeometryInfo) -> MagickStatus;
pub(crate) type FnAcquireKernelBuiltIn =
    unsafe extern "C" fn(kernel_type: KernelInfoType, args: *const GeometryInfo) -> *mut KernelInfo;
pub(crate) type FnAcquireKernelInfo =
    unsafe extern "C" fn(kernel_string: *const c_char) -> *mut KernelInfo;
pub(crate) type FnCloneKernelInfo =
    unsafe extern "C" fn(kernel: *const KernelInfo) -> *mut KernelInfo;
pub(crate) type FnDestroyKernelInfo =
    unsafe extern "C" fn(kernel: *mut KernelInfo) -> *mut KernelInfo;
pub(crate) type FnScaleKernelInfo = unsafe extern "C" fn(
    kernel: *mut KernelInfo,
    scaling_factor: c_double,
    normalize_flags: GeometryFlagsRaw,
);
pub(crate) type FnScaleGeometryKernelInfo =
    unsafe extern "C" fn(kernel: *mut KernelInfo, geometry: *const c_char);
pub(crate) type FnUnityAddKernelInfo =
    unsafe extern "C" fn(kernel: *mut KernelInfo, scale: c_double);
