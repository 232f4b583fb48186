use std::ffi::CString;
use std::fmt;
use std::ptr::NonNull;

use crate::error::MagickError;
use crate::ffi;
use crate::geometry::{geometry_cstring, normalize_kernel_geometry, parse_geometry_with};
use crate::kernel_type::{KernelType, NormalizeMode};
use crate::library::MagickLibrary;

/// A morphology kernel owned by MagickCore.
///
/// The kernel defines the neighbourhood weights used by convolution and
/// morphological operations. Cells that are not part of the kernel shape hold
/// `NaN`. MagickCore may return several kernels chained in a list (e.g. the
/// rotations of a hit-and-miss kernel); the accessors on `Kernel` read the first
/// one and [`Kernel::iter`] walks the whole list.
///
/// The native memory is released when the `Kernel` is dropped.
///
/// # Example
///
/// ```no_run
/// use kornia_magick::{Kernel, KernelType, NormalizeMode};
///
/// let mut kernel = Kernel::acquire_builtin(KernelType::Rectangle, "5x3")?;
/// assert_eq!(kernel.width(), 5);
/// assert_eq!(kernel.height(), 3);
/// assert_eq!(kernel.origin(), (2, 1));
///
/// kernel.scale(1.0, NormalizeMode::Value)?;
/// let rows = kernel.to_array();
/// assert_eq!(rows.len(), 3);
/// # Ok::<(), kornia_magick::MagickError>(())
/// ```
pub struct Kernel {
    raw: NonNull<ffi::KernelInfo>,
    library: &'static MagickLibrary,
}

// Safety: the kernel list is plain heap memory owned exclusively by this value.
unsafe impl Send for Kernel {}

impl Kernel {
    /// Create a kernel from one of the MagickCore built-in kernels.
    ///
    /// The geometry is parsed by MagickCore and the fields it leaves out are
    /// filled with the defaults of the kernel type, see
    /// [`crate::normalize_kernel_geometry`].
    ///
    /// # Arguments
    ///
    /// * `kernel_type` - The built-in kernel to create.
    /// * `geometry` - The kernel arguments, e.g. `"5x3+1+1"` for a rectangle or
    ///   `"2,1"` for a ring.
    ///
    /// # Returns
    ///
    /// The new kernel.
    ///
    /// # Errors
    ///
    /// Fails if the kernel type cannot be built from a geometry, if the geometry
    /// is malformed, if the library cannot be loaded or if MagickCore rejects the
    /// arguments.
    pub fn acquire_builtin(kernel_type: KernelType, geometry: &str) -> Result<Self, MagickError> {
        if kernel_type == KernelType::UserDefined {
            return Err(MagickError::UnsupportedKernelType(kernel_type));
        }

        let c_geometry = geometry_cstring(geometry)?;
        let library = MagickLibrary::get()?;

        let (mut args, flags) = parse_geometry_with(library, geometry, &c_geometry)?;
        normalize_kernel_geometry(kernel_type, flags, &mut args, library.quantum_range());

        let raw = NonNull::new(library.acquire_kernel_builtin(kernel_type, &args)).ok_or_else(
            || MagickError::AcquireKernelFailed {
                kernel_type,
                geometry: geometry.to_string(),
            },
        )?;

        log::debug!("acquired {kernel_type} kernel from {geometry:?} with {args:?}");

        Ok(Self { raw, library })
    }

    /// Create a kernel list from a full kernel description.
    ///
    /// Accepts everything the `-morphology` option of ImageMagick accepts, e.g.
    /// `"Disk:2"`, `"Edges"`, `"Ring:3,1;Diamond"` or an explicit array such as
    /// `"3: 0,1,0 1,1,1 0,1,0"`.
    ///
    /// # Arguments
    ///
    /// * `kernel_string` - The kernel description.
    pub fn parse(kernel_string: &str) -> Result<Self, MagickError> {
        if kernel_string.trim().is_empty() {
            return Err(MagickError::InvalidKernelString(kernel_string.to_string()));
        }
        let c_kernel = CString::new(kernel_string)
            .map_err(|_| MagickError::InvalidKernelString(kernel_string.to_string()))?;
        let library = MagickLibrary::get()?;

        let raw = NonNull::new(library.acquire_kernel_info(&c_kernel))
            .ok_or_else(|| MagickError::InvalidKernelString(kernel_string.to_string()))?;

        log::debug!("acquired kernel list from {kernel_string:?}");

        Ok(Self { raw, library })
    }

    /// Deep copy of the whole kernel list.
    pub fn try_clone(&self) -> Result<Self, MagickError> {
        // Safety: `raw` is a live kernel list owned by `self`.
        let raw = unsafe { self.library.clone_kernel_info(self.raw.as_ptr()) };
        let raw = NonNull::new(raw).ok_or(MagickError::CloneFailed)?;
        Ok(Self {
            raw,
            library: self.library,
        })
    }

    /// View of the first kernel of the list.
    pub fn view(&self) -> KernelView<'_> {
        // Safety: `raw` is a live kernel allocated by MagickCore for as long as `self`.
        unsafe { KernelView::new(self.raw.as_ref()) }
    }

    /// Iterate over every kernel of the list.
    pub fn iter(&self) -> KernelIter<'_> {
        KernelIter {
            current: Some(self.view()),
        }
    }

    /// Number of kernels in the list, at least one.
    pub fn num_kernels(&self) -> usize {
        self.iter().count()
    }

    /// The type of the first kernel, if known.
    pub fn kernel_type(&self) -> Option<KernelType> {
        self.view().kernel_type()
    }

    /// Get the width of the kernel.
    pub fn width(&self) -> usize {
        self.view().width()
    }

    /// Get the height of the kernel.
    pub fn height(&self) -> usize {
        self.view().height()
    }

    /// Get the origin of the kernel as `(x, y)`.
    pub fn origin(&self) -> (isize, isize) {
        self.view().origin()
    }

    /// Get a reference to the kernel values in row-major order.
    pub fn values(&self) -> &[f64] {
        self.view().values()
    }

    /// Get the value at column `x` and row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        self.view().get(x, y)
    }

    /// Convert the first kernel to rows of values, `NaN` marking unused cells.
    pub fn to_array(&self) -> Vec<Vec<f64>> {
        self.view().to_array()
    }

    /// Scale every kernel of the list, optionally normalizing it first.
    ///
    /// # Arguments
    ///
    /// * `factor` - The scale factor.
    /// * `mode` - How to normalize the kernel values before scaling.
    ///
    /// # Errors
    ///
    /// Returns [`MagickError::InvalidScaleFactor`] if `factor` is not finite.
    pub fn scale(&mut self, factor: f64, mode: NormalizeMode) -> Result<(), MagickError> {
        if !factor.is_finite() {
            return Err(MagickError::InvalidScaleFactor(factor));
        }
        // Safety: `&mut self` guarantees exclusive access to the kernel list.
        unsafe {
            self.library
                .scale_kernel_info(self.raw.as_ptr(), factor, mode.flags())
        };
        Ok(())
    }

    /// Scale the kernel list with a geometry string, e.g. `"50%!"`.
    ///
    /// The `!` and `^` flags select value and correlation normalization, `%`
    /// makes the factor a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`MagickError::InvalidGeometry`] if the geometry cannot be parsed,
    /// leaving the kernel untouched.
    pub fn scale_geometry(&mut self, geometry: &str) -> Result<(), MagickError> {
        let c_geometry = geometry_cstring(geometry)?;
        parse_geometry_with(self.library, geometry, &c_geometry)?;
        // Safety: `&mut self` guarantees exclusive access to the kernel list.
        unsafe {
            self.library
                .scale_geometry_kernel_info(self.raw.as_ptr(), &c_geometry)
        };
        Ok(())
    }

    /// Add a unity kernel scaled by `scale` to every kernel of the list.
    pub fn unity_add(&mut self, scale: f64) -> Result<(), MagickError> {
        if !scale.is_finite() {
            return Err(MagickError::InvalidScaleFactor(scale));
        }
        // Safety: `&mut self` guarantees exclusive access to the kernel list.
        unsafe { self.library.unity_add_kernel_info(self.raw.as_ptr(), scale) };
        Ok(())
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        log::debug!("destroying kernel list of {} kernel(s)", self.num_kernels());
        // Safety: `raw` is owned by `self` and never used again.
        unsafe { self.library.destroy_kernel_info(self.raw.as_ptr()) };
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Kernel {
    type Item = KernelView<'a>;
    type IntoIter = KernelIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read-only view of a single kernel of a list.
#[derive(Clone, Copy)]
pub struct KernelView<'a> {
    info: &'a ffi::KernelInfo,
}

impl<'a> KernelView<'a> {
    /// # Safety
    ///
    /// `info.values` must be null or point to `info.width * info.height`
    /// initialized values that live as long as `'a`.
    pub(crate) unsafe fn new(info: &'a ffi::KernelInfo) -> Self {
        Self { info }
    }

    /// The type of the kernel, `None` if MagickCore reports an unknown value.
    pub fn kernel_type(&self) -> Option<KernelType> {
        KernelType::try_from(self.info.type_).ok()
    }

    /// Get the width of the kernel.
    pub fn width(&self) -> usize {
        self.info.width
    }

    /// Get the height of the kernel.
    pub fn height(&self) -> usize {
        self.info.height
    }

    /// Get the origin of the kernel as `(x, y)`.
    pub fn origin(&self) -> (isize, isize) {
        (self.info.x, self.info.y)
    }

    /// Smallest used value.
    pub fn minimum(&self) -> f64 {
        self.info.minimum
    }

    /// Largest used value.
    pub fn maximum(&self) -> f64 {
        self.info.maximum
    }

    /// Sum of the positive values.
    pub fn positive_range(&self) -> f64 {
        self.info.positive_range
    }

    /// Sum of the negative values.
    pub fn negative_range(&self) -> f64 {
        self.info.negative_range
    }

    /// Rotation angle of the kernel in degrees.
    pub fn angle(&self) -> f64 {
        self.info.angle
    }

    /// Get a reference to the kernel values in row-major order.
    ///
    /// The slice holds exactly `width * height` values, or none if MagickCore
    /// did not allocate a buffer.
    pub fn values(&self) -> &'a [f64] {
        let len = self.info.width.checked_mul(self.info.height).unwrap_or(0);
        if self.info.values.is_null() || len == 0 {
            return &[];
        }
        // Safety: guaranteed by the constructor.
        unsafe { std::slice::from_raw_parts(self.info.values, len) }
    }

    /// Get the value at column `x` and row `y`, `None` if out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        self.values().get(y * self.width() + x).copied()
    }

    /// Whether the cell at column `x` and row `y` is part of the kernel.
    pub fn is_used(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_some_and(|value| !value.is_nan())
    }

    /// Convert the kernel to `height` rows of `width` values.
    ///
    /// Unused cells are `NaN`, so a zero weight stays distinguishable from a
    /// cell outside the kernel shape. A kernel without a value buffer has every
    /// cell unused.
    pub fn to_array(&self) -> Vec<Vec<f64>> {
        let width = self.width();
        let values = self.values();
        if width == 0 || values.is_empty() {
            return vec![vec![f64::NAN; width]; self.height()];
        }
        values
            .chunks_exact(width)
            .map(|row| row.to_vec())
            .collect()
    }
}

impl fmt::Debug for KernelView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelView")
            .field("kernel_type", &self.kernel_type())
            .field("width", &self.width())
            .field("height", &self.height())
            .field("origin", &self.origin())
            .field("values", &self.values())
            .finish()
    }
}

/// Iterator over the kernels of a [`Kernel`] list.
pub struct KernelIter<'a> {
    current: Option<KernelView<'a>>,
}

impl<'a> Iterator for KernelIter<'a> {
    type Item = KernelView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let view = self.current.take()?;
        // Safety: every kernel of a MagickCore list upholds the view invariant.
        self.current = unsafe { view.info.next.as_ref().map(|info| KernelView::new(info)) };
        Some(view)
    }
}
