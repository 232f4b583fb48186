use std::fmt;
use std::str::FromStr;

use crate::error::MagickError;
use crate::geometry::GeometryFlags;

/// Built-in kernel types known by MagickCore.
///
/// The discriminants follow the `KernelInfoType` enumeration of ImageMagick 6.9
/// and are passed to the native library as-is.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelType {
    /// Equivalent to [`KernelType::Unity`].
    Undefined = 0,
    /// The no-op kernel, a single centered value.
    Unity = 1,
    /// Gaussian convolution kernel.
    Gaussian = 2,
    /// Difference of Gaussians.
    DoG = 3,
    /// Laplacian of Gaussian.
    LoG = 4,
    /// One dimensional Gaussian blur.
    Blur = 5,
    /// One sided Gaussian blur.
    Comet = 6,
    /// Binomial coefficients kernel.
    Binomial = 7,
    /// Named Laplacian kernels.
    Laplacian = 8,
    /// Sobel edge kernel.
    Sobel = 9,
    /// Frei-Chen edge kernels.
    FreiChen = 10,
    /// Roberts edge kernel.
    Roberts = 11,
    /// Prewitt edge kernel.
    Prewitt = 12,
    /// Compass edge kernel.
    Compass = 13,
    /// Kirsch edge kernel.
    Kirsch = 14,
    /// Diamond shape.
    Diamond = 15,
    /// Square shape.
    Square = 16,
    /// Rectangle shape with an arbitrary origin.
    Rectangle = 17,
    /// Octagon shape.
    Octagon = 18,
    /// Disk shape.
    Disk = 19,
    /// Plus shape.
    Plus = 20,
    /// Diagonal cross shape.
    Cross = 21,
    /// Ring shape between two radii.
    Ring = 22,
    /// Hit-and-miss peaks kernel.
    Peaks = 23,
    /// Hit-and-miss edges kernel.
    Edges = 24,
    /// Hit-and-miss corners kernel.
    Corners = 25,
    /// Hit-and-miss diagonals kernel.
    Diagonals = 26,
    /// Hit-and-miss line ends kernel.
    LineEnds = 27,
    /// Hit-and-miss line junctions kernel.
    LineJunctions = 28,
    /// Hit-and-miss ridges kernel.
    Ridges = 29,
    /// Hit-and-miss convex hull kernel.
    ConvexHull = 30,
    /// Thinning structuring elements.
    ThinSE = 31,
    /// Skeleton kernel.
    Skeleton = 32,
    /// Chebyshev distance kernel.
    Chebyshev = 33,
    /// Manhattan distance kernel.
    Manhattan = 34,
    /// Octagonal distance kernel.
    Octagonal = 35,
    /// Euclidean distance kernel.
    Euclidean = 36,
    /// Kernel given as an explicit array of values.
    UserDefined = 37,
}

const KERNEL_NAMES: [(KernelType, &str); 38] = [
    (KernelType::Undefined, "Undefined"),
    (KernelType::Unity, "Unity"),
    (KernelType::Gaussian, "Gaussian"),
    (KernelType::DoG, "DoG"),
    (KernelType::LoG, "LoG"),
    (KernelType::Blur, "Blur"),
    (KernelType::Comet, "Comet"),
    (KernelType::Binomial, "Binomial"),
    (KernelType::Laplacian, "Laplacian"),
    (KernelType::Sobel, "Sobel"),
    (KernelType::FreiChen, "FreiChen"),
    (KernelType::Roberts, "Roberts"),
    (KernelType::Prewitt, "Prewitt"),
    (KernelType::Compass, "Compass"),
    (KernelType::Kirsch, "Kirsch"),
    (KernelType::Diamond, "Diamond"),
    (KernelType::Square, "Square"),
    (KernelType::Rectangle, "Rectangle"),
    (KernelType::Octagon, "Octagon"),
    (KernelType::Disk, "Disk"),
    (KernelType::Plus, "Plus"),
    (KernelType::Cross, "Cross"),
    (KernelType::Ring, "Ring"),
    (KernelType::Peaks, "Peaks"),
    (KernelType::Edges, "Edges"),
    (KernelType::Corners, "Corners"),
    (KernelType::Diagonals, "Diagonals"),
    (KernelType::LineEnds, "LineEnds"),
    (KernelType::LineJunctions, "LineJunctions"),
    (KernelType::Ridges, "Ridges"),
    (KernelType::ConvexHull, "ConvexHull"),
    (KernelType::ThinSE, "ThinSE"),
    (KernelType::Skeleton, "Skeleton"),
    (KernelType::Chebyshev, "Chebyshev"),
    (KernelType::Manhattan, "Manhattan"),
    (KernelType::Octagonal, "Octagonal"),
    (KernelType::Euclidean, "Euclidean"),
    (KernelType::UserDefined, "UserDefined"),
];

impl KernelType {
    /// The raw `KernelInfoType` value understood by MagickCore.
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// The ImageMagick name of the kernel type.
    pub fn name(self) -> &'static str {
        KERNEL_NAMES[self as usize].1
    }

    /// Returns an iterator over every kernel type, in native order.
    pub fn all() -> impl Iterator<Item = KernelType> {
        KERNEL_NAMES.iter().map(|(kind, _)| *kind)
    }

    /// Whether the kernel is a shape whose second argument is a scale.
    pub fn is_shape(self) -> bool {
        matches!(
            self,
            KernelType::Square
                | KernelType::Diamond
                | KernelType::Octagon
                | KernelType::Disk
                | KernelType::Plus
                | KernelType::Cross
        )
    }

    /// Whether the kernel measures distances from its origin.
    pub fn is_distance(self) -> bool {
        matches!(
            self,
            KernelType::Chebyshev
                | KernelType::Manhattan
                | KernelType::Octagonal
                | KernelType::Euclidean
        )
    }
}

impl TryFrom<i32> for KernelType {
    type Error = MagickError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        usize::try_from(raw)
            .ok()
            .and_then(|idx| KERNEL_NAMES.get(idx))
            .map(|(kind, _)| *kind)
            .ok_or_else(|| MagickError::UnknownKernelType(raw.to_string()))
    }
}

impl FromStr for KernelType {
    type Err = MagickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ImageMagick ignores case and the space in "User Defined"
        let wanted: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        KERNEL_NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(&wanted))
            .map(|(kind, _)| *kind)
            .ok_or_else(|| MagickError::UnknownKernelType(s.to_string()))
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How [`crate::Kernel::scale`] normalizes the kernel values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NormalizeMode {
    /// Multiply the values by the scale factor only.
    #[default]
    None,
    /// Normalize so the values sum to the scale factor.
    Value,
    /// Normalize positive and negative values separately, for correlation kernels.
    Correlate,
    /// Treat the scale factor as a percentage.
    Percent,
}

impl NormalizeMode {
    /// The `GeometryFlags` bits MagickCore expects for this mode.
    pub fn flags(self) -> GeometryFlags {
        match self {
            NormalizeMode::None => GeometryFlags::NO_VALUE,
            NormalizeMode::Value => GeometryFlags::NORMALIZE,
            NormalizeMode::Correlate => GeometryFlags::CORRELATE_NORMALIZE,
            NormalizeMode::Percent => GeometryFlags::PERCENT,
        }
    }
}

impl FromStr for NormalizeMode {
    type Err = MagickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(NormalizeMode::None),
            "value" => Ok(NormalizeMode::Value),
            "correlate" => Ok(NormalizeMode::Correlate),
            "percent" => Ok(NormalizeMode::Percent),
            _ => Err(MagickError::UnknownNormalizeMode(s.to_string())),
        }
    }
}

impl fmt::Display for NormalizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NormalizeMode::None => "none",
            NormalizeMode::Value => "value",
            NormalizeMode::Correlate => "correlate",
            NormalizeMode::Percent => "percent",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_follow_native_order() {
        for (idx, kind) in KernelType::all().enumerate() {
            assert_eq!(kind.as_raw(), idx as i32);
            assert_eq!(KernelType::try_from(idx as i32), Ok(kind));
        }
        assert_eq!(KernelType::Rectangle.as_raw(), 17);
        assert_eq!(KernelType::Ring.as_raw(), 22);
        assert_eq!(KernelType::Euclidean.as_raw(), 36);
    }

    #[test]
    fn test_try_from_out_of_range() {
        assert!(KernelType::try_from(-1).is_err());
        assert!(KernelType::try_from(38).is_err());
    }

    #[test]
    fn test_from_str() -> Result<(), MagickError> {
        assert_eq!("disk".parse::<KernelType>()?, KernelType::Disk);
        assert_eq!("LineEnds".parse::<KernelType>()?, KernelType::LineEnds);
        assert_eq!("User Defined".parse::<KernelType>()?, KernelType::UserDefined);
        assert_eq!(
            "blob".parse::<KernelType>(),
            Err(MagickError::UnknownKernelType("blob".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_categories() {
        assert!(KernelType::Cross.is_shape());
        assert!(!KernelType::Ring.is_shape());
        assert!(KernelType::Octagonal.is_distance());
        assert!(!KernelType::Octagon.is_distance());
    }

    #[test]
    fn test_normalize_mode_flags() -> Result<(), MagickError> {
        assert_eq!(NormalizeMode::None.flags().bits(), 0x0);
        assert_eq!(NormalizeMode::Value.flags().bits(), 0x2000);
        assert_eq!(NormalizeMode::Correlate.flags().bits(), 0x10000);
        assert_eq!(NormalizeMode::Percent.flags().bits(), 0x1000);
        assert_eq!("Percent".parse::<NormalizeMode>()?, NormalizeMode::Percent);
        assert!("sum".parse::<NormalizeMode>().is_err());
        Ok(())
    }
}
