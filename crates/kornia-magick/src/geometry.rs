use std::ffi::CString;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use crate::error::MagickError;
use crate::kernel_type::KernelType;
use crate::library::MagickLibrary;

/// Bitmask of the fields present in a parsed geometry string.
///
/// Mirrors the `GeometryFlags` enumeration of MagickCore. Several names share
/// the same bit, e.g. [`GeometryFlags::X`] and [`GeometryFlags::XI`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GeometryFlags(u32);

impl GeometryFlags {
    /// No field present.
    pub const NO_VALUE: Self = Self(0x0000);
    /// The x offset is present.
    pub const X: Self = Self(0x0001);
    /// Alias of [`GeometryFlags::X`] for `xi`.
    pub const XI: Self = Self(0x0001);
    /// The y offset is present.
    pub const Y: Self = Self(0x0002);
    /// Alias of [`GeometryFlags::Y`] for `psi`.
    pub const PSI: Self = Self(0x0002);
    /// The width is present.
    pub const WIDTH: Self = Self(0x0004);
    /// Alias of [`GeometryFlags::WIDTH`] for `rho`.
    pub const RHO: Self = Self(0x0004);
    /// The height is present.
    pub const HEIGHT: Self = Self(0x0008);
    /// Alias of [`GeometryFlags::HEIGHT`] for `sigma`.
    pub const SIGMA: Self = Self(0x0008);
    /// The fifth value is present.
    pub const CHI: Self = Self(0x0010);
    /// The x offset was negative.
    pub const X_NEGATIVE: Self = Self(0x0020);
    /// The y offset was negative.
    pub const Y_NEGATIVE: Self = Self(0x0040);
    /// The fifth value was negative.
    pub const CHI_NEGATIVE: Self = Self(0x0080);
    /// The `%` flag.
    pub const PERCENT: Self = Self(0x1000);
    /// The `!` flag.
    pub const ASPECT: Self = Self(0x2000);
    /// Normalize a kernel so its values sum to the scale. Shares the `!` bit.
    pub const NORMALIZE: Self = Self(0x2000);
    /// The `<` flag.
    pub const LESS: Self = Self(0x4000);
    /// The `>` flag.
    pub const GREATER: Self = Self(0x8000);
    /// The `^` flag.
    pub const MINIMUM: Self = Self(0x10000);
    /// Normalize a correlation kernel. Shares the `^` bit.
    pub const CORRELATE_NORMALIZE: Self = Self(0x10000);
    /// The `@` flag.
    pub const AREA: Self = Self(0x20000);
    /// A value was written with a decimal point.
    pub const DECIMAL: Self = Self(0x40000);
    /// A separator was present.
    pub const SEPARATOR: Self = Self(0x80000);

    /// Build the mask from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The union of both masks.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for GeometryFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for GeometryFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for GeometryFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Numeric arguments parsed from a geometry string.
///
/// Same memory layout as the MagickCore `GeometryInfo` struct. For kernels,
/// `rho` and `sigma` are the primary and secondary scales (or width and height),
/// `xi` and `psi` the offsets, and `chi` an auxiliary value.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeometryInfo {
    /// First value, or width.
    pub rho: f64,
    /// Second value, or height.
    pub sigma: f64,
    /// Third value, or x offset.
    pub xi: f64,
    /// Fourth value, or y offset.
    pub psi: f64,
    /// Fifth value.
    pub chi: f64,
}

/// Fills in the kernel specific defaults MagickCore expects for missing fields.
///
/// `AcquireKernelBuiltIn` takes the geometry as-is, so omitted values would stay
/// zero. Only fields absent from `flags` are touched, except for the rectangle
/// size clamping and the distance scale flags.
///
/// # Arguments
///
/// * `kernel_type` - The kernel to be built.
/// * `flags` - The fields present in the parsed geometry string.
/// * `geometry` - The parsed geometry, updated in place.
/// * `quantum_range` - The maximum pixel value of the loaded library.
///
/// # Example
///
/// ```rust
/// use kornia_magick::{normalize_kernel_geometry, GeometryFlags, GeometryInfo, KernelType};
///
/// let mut geometry = GeometryInfo { rho: 5.0, sigma: 3.0, ..Default::default() };
/// let flags = GeometryFlags::WIDTH | GeometryFlags::HEIGHT;
/// normalize_kernel_geometry(KernelType::Rectangle, flags, &mut geometry, 65535.0);
/// assert_eq!((geometry.xi, geometry.psi), (2.0, 1.0));
/// ```
pub fn normalize_kernel_geometry(
    kernel_type: KernelType,
    flags: GeometryFlags,
    geometry: &mut GeometryInfo,
    quantum_range: f64,
) {
    match kernel_type {
        KernelType::Unity | KernelType::Undefined => {
            if !flags.contains(GeometryFlags::WIDTH) {
                geometry.rho = 1.0;
            }
        }
        kind if kind.is_shape() => {
            if !flags.contains(GeometryFlags::HEIGHT) {
                geometry.sigma = 1.0;
            }
        }
        KernelType::Ring => {
            if !flags.contains(GeometryFlags::X) {
                geometry.xi = 1.0;
            }
        }
        KernelType::Rectangle => {
            if !flags.contains(GeometryFlags::WIDTH) {
                geometry.rho = geometry.sigma;
            }
            if geometry.rho < 1.0 {
                geometry.rho = 3.0;
            }
            if geometry.sigma < 1.0 {
                geometry.sigma = geometry.rho;
            }
            // integer division of the truncated size
            if !flags.contains(GeometryFlags::X) {
                geometry.xi = ((geometry.rho as i64 - 1) / 2) as f64;
            }
            if !flags.contains(GeometryFlags::Y) {
                geometry.psi = ((geometry.sigma as i64 - 1) / 2) as f64;
            }
        }
        kind if kind.is_distance() => {
            if !flags.contains(GeometryFlags::HEIGHT) {
                geometry.sigma = 100.0;
            } else if flags.contains(GeometryFlags::ASPECT) {
                geometry.sigma = quantum_range / (geometry.sigma + 1.0);
            } else if flags.contains(GeometryFlags::PERCENT) {
                geometry.sigma *= quantum_range / 100.0;
            }
        }
        _ => {}
    }
}

/// Parses a geometry string with the MagickCore parser.
///
/// # Arguments
///
/// * `geometry` - The geometry string, e.g. `"5x3+1+1"` or `"2,1"`.
///
/// # Returns
///
/// The parsed values and the flags of the fields that were present.
///
/// # Errors
///
/// Returns [`MagickError::InvalidGeometry`] if the string holds a NUL byte or if
/// no field could be recognised in a non-blank string.
pub fn parse_geometry(geometry: &str) -> Result<(GeometryInfo, GeometryFlags), MagickError> {
    let c_geometry = geometry_cstring(geometry)?;
    let library = MagickLibrary::get()?;
    parse_geometry_with(library, geometry, &c_geometry)
}

pub(crate) fn geometry_cstring(geometry: &str) -> Result<CString, MagickError> {
    CString::new(geometry).map_err(|_| MagickError::InvalidGeometry(geometry.to_string()))
}

pub(crate) fn parse_geometry_with(
    library: &MagickLibrary,
    geometry: &str,
    c_geometry: &CString,
) -> Result<(GeometryInfo, GeometryFlags), MagickError> {
    let (info, flags) = library.parse_geometry(c_geometry);
    log::debug!("parsed geometry {geometry:?} -> {info:?} flags={:#x}", flags.bits());

    if flags.is_empty() && !geometry.trim().is_empty() {
        return Err(MagickError::InvalidGeometry(geometry.to_string()));
    }

    Ok((info, flags))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUANTUM: f64 = 65535.0;

    const SIZE: GeometryFlags = GeometryFlags::WIDTH.union(GeometryFlags::HEIGHT);

    fn normalized(
        kernel_type: KernelType,
        flags: GeometryFlags,
        geometry: GeometryInfo,
    ) -> GeometryInfo {
        let mut geometry = geometry;
        normalize_kernel_geometry(kernel_type, flags, &mut geometry, QUANTUM);
        geometry
    }

    #[test]
    fn test_unity_default_scale() {
        let out = normalized(KernelType::Unity, GeometryFlags::NO_VALUE, GeometryInfo::default());
        assert_eq!(out.rho, 1.0);

        // zero is a valid explicit scale
        let out = normalized(KernelType::Unity, GeometryFlags::RHO, GeometryInfo::default());
        assert_eq!(out.rho, 0.0);
    }

    #[test]
    fn test_undefined_defaults_like_unity() {
        let input = GeometryInfo::default();
        let out = normalized(KernelType::Undefined, GeometryFlags::NO_VALUE, input);
        assert_eq!(out.rho, 1.0);

        let input = GeometryInfo { rho: 0.5, ..Default::default() };
        let out = normalized(KernelType::Undefined, GeometryFlags::RHO, input);
        assert_eq!(out.rho, 0.5);
    }

    #[test]
    fn test_shape_default_scale() {
        for kind in [
            KernelType::Square,
            KernelType::Diamond,
            KernelType::Octagon,
            KernelType::Disk,
            KernelType::Plus,
            KernelType::Cross,
        ] {
            let input = GeometryInfo { rho: 2.0, ..Default::default() };
            let out = normalized(kind, GeometryFlags::RHO, input);
            assert_eq!(out.rho, 2.0, "{kind}");
            assert_eq!(out.sigma, 1.0, "{kind}");

            let input = GeometryInfo { rho: 2.0, sigma: 4.0, ..Default::default() };
            let out = normalized(kind, GeometryFlags::RHO | GeometryFlags::SIGMA, input);
            assert_eq!(out.sigma, 4.0, "{kind}");
        }
    }

    #[test]
    fn test_ring_default_scale() {
        let input = GeometryInfo { rho: 2.0, sigma: 1.0, ..Default::default() };
        let out = normalized(KernelType::Ring, GeometryFlags::RHO | GeometryFlags::SIGMA, input);
        assert_eq!(out.xi, 1.0);
        assert_eq!(out.sigma, 1.0);

        let input = GeometryInfo { rho: 2.0, sigma: 1.0, xi: 0.5, ..Default::default() };
        let flags = GeometryFlags::RHO | GeometryFlags::SIGMA | GeometryFlags::XI;
        let out = normalized(KernelType::Ring, flags, input);
        assert_eq!(out.xi, 0.5);
    }

    #[test]
    fn test_rectangle_centered() {
        let input = GeometryInfo { rho: 5.0, sigma: 3.0, ..Default::default() };
        let out = normalized(KernelType::Rectangle, SIZE, input);
        assert_eq!(out, GeometryInfo { rho: 5.0, sigma: 3.0, xi: 2.0, psi: 1.0, chi: 0.0 });
    }

    #[test]
    fn test_rectangle_missing_width_copies_height() {
        let input = GeometryInfo { sigma: 5.0, ..Default::default() };
        let out = normalized(KernelType::Rectangle, GeometryFlags::HEIGHT, input);
        assert_eq!(out.rho, 5.0);
        assert_eq!(out.sigma, 5.0);
        assert_eq!((out.xi, out.psi), (2.0, 2.0));
    }

    #[test]
    fn test_rectangle_small_width_forced_to_three() {
        let input = GeometryInfo { rho: 0.0, sigma: 0.0, ..Default::default() };
        let out = normalized(KernelType::Rectangle, GeometryFlags::WIDTH, input);
        assert_eq!(out.rho, 3.0);
        assert_eq!(out.sigma, 3.0);
        assert_eq!((out.xi, out.psi), (1.0, 1.0));

        let input = GeometryInfo { rho: 0.0, sigma: 4.0, ..Default::default() };
        let out = normalized(KernelType::Rectangle, SIZE, input);
        assert_eq!(out.rho, 3.0);
        assert_eq!(out.sigma, 4.0);
        assert_eq!((out.xi, out.psi), (1.0, 1.0));
    }

    #[test]
    fn test_rectangle_explicit_offsets_kept() {
        let input = GeometryInfo { rho: 5.0, sigma: 3.0, xi: 0.0, psi: 2.0, chi: 0.0 };
        let flags = SIZE | GeometryFlags::X | GeometryFlags::Y;
        let out = normalized(KernelType::Rectangle, flags, input);
        assert_eq!((out.xi, out.psi), (0.0, 2.0));
    }

    #[test]
    fn test_rectangle_even_size_truncates() {
        let input = GeometryInfo { rho: 4.5, sigma: 2.0, ..Default::default() };
        let out = normalized(KernelType::Rectangle, SIZE, input);
        assert_eq!((out.xi, out.psi), (1.0, 0.0));
    }

    #[test]
    fn test_distance_default_scale() {
        for kind in [
            KernelType::Chebyshev,
            KernelType::Manhattan,
            KernelType::Octagonal,
            KernelType::Euclidean,
        ] {
            let input = GeometryInfo { rho: 3.0, ..Default::default() };
            let out = normalized(kind, GeometryFlags::RHO, input);
            assert_eq!(out.sigma, 100.0, "{kind}");
        }
    }

    #[test]
    fn test_distance_aspect_and_percent() {
        let input = GeometryInfo { rho: 3.0, sigma: 4.0, ..Default::default() };
        let flags = GeometryFlags::RHO | GeometryFlags::SIGMA | GeometryFlags::ASPECT;
        let out = normalized(KernelType::Euclidean, flags, input);
        approx::assert_relative_eq!(out.sigma, QUANTUM / 5.0);

        let input = GeometryInfo { rho: 3.0, sigma: 50.0, ..Default::default() };
        let flags = GeometryFlags::RHO | GeometryFlags::SIGMA | GeometryFlags::PERCENT;
        let out = normalized(KernelType::Manhattan, flags, input);
        approx::assert_relative_eq!(out.sigma, QUANTUM / 2.0);

        // aspect wins over percent
        let input = GeometryInfo { rho: 3.0, sigma: 4.0, ..Default::default() };
        let flags = GeometryFlags::SIGMA | GeometryFlags::ASPECT | GeometryFlags::PERCENT;
        let out = normalized(KernelType::Chebyshev, flags, input);
        approx::assert_relative_eq!(out.sigma, QUANTUM / 5.0);

        // flags are ignored without an explicit scale
        let input = GeometryInfo::default();
        let out = normalized(KernelType::Chebyshev, GeometryFlags::PERCENT, input);
        assert_eq!(out.sigma, 100.0);
    }

    #[test]
    fn test_other_kernels_untouched() {
        let input = GeometryInfo { rho: 0.0, sigma: 0.0, xi: 0.0, psi: 0.0, chi: 0.0 };
        for kind in [
            KernelType::Gaussian,
            KernelType::Edges,
            KernelType::Sobel,
            KernelType::Skeleton,
        ] {
            assert_eq!(normalized(kind, GeometryFlags::NO_VALUE, input), input, "{kind}");
        }
    }

    #[test]
    fn test_geometry_with_nul_rejected() {
        assert_eq!(
            parse_geometry("5x3\0"),
            Err(MagickError::InvalidGeometry("5x3\0".to_string()))
        );
    }

    #[test]
    fn test_flags_ops() {
        let flags = GeometryFlags::WIDTH | GeometryFlags::PERCENT;
        assert!(flags.contains(GeometryFlags::RHO));
        assert!(!flags.contains(GeometryFlags::HEIGHT));
        assert_eq!((flags & GeometryFlags::PERCENT).bits(), 0x1000);
        assert!(GeometryFlags::NO_VALUE.is_empty());
        assert_eq!(GeometryFlags::NORMALIZE, GeometryFlags::ASPECT);
    }
}
