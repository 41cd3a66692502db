//! Exact proportional scaling arithmetic.
//!
//! [`Scaler`] keeps a width/height pair as exact rationals so that repeated
//! rescaling cannot drift: the aspect ratio fixed at construction is the
//! single source of truth, and every `set_width`/`set_height` call derives
//! the opposite axis through it. Rounding happens only at the accessors.
//!
//! # Example
//!
//! ```
//! use variations::Scaler;
//!
//! let mut s = Scaler::new(300, 600, false).unwrap();
//! s.set_width(200);
//! assert_eq!((s.width(), s.height()), (200, 400));
//!
//! // Upscaling is off: requests beyond the original clamp back.
//! s.set_width(400);
//! assert_eq!((s.width(), s.height()), (300, 600));
//! ```

use core::fmt;

use num_rational::Ratio;
use num_traits::FromPrimitive;

/// Exact rational used for all dimension arithmetic.
pub(crate) type Rational = Ratio<i64>;

/// Resolution-time error: the geometry itself is degenerate.
///
/// Distinct from [`ConfigError`](crate::variation::ConfigError), which is
/// raised at construction time before any image is touched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// Source image has zero width or height — the aspect ratio is undefined.
    #[error("source image has zero width or height")]
    ZeroSourceDimension,
    /// A sizing step was given an explicit zero target dimension.
    #[error("target width or height is zero")]
    ZeroTargetDimension,
    /// A real-valued dimension was not finite and positive, or does not fit
    /// the exact rational representation.
    #[error("dimension has no exact rational representation")]
    NonRepresentableDimension,
}

/// A width/height pair with a fixed aspect ratio and an upscale policy.
///
/// Constructed once per size-resolution call, mutated in place through
/// [`set_width`](Self::set_width)/[`set_height`](Self::set_height), read
/// through the rounding accessors, and discarded.
///
/// Each `set_*` call is a pure function of the current state and the new
/// value — there is no hidden history, so re-asserting the current width is
/// a no-op and call order only matters through the value it leaves behind.
#[derive(Clone, Debug)]
pub struct Scaler {
    width: Rational,
    height: Rational,
    width_orig: Rational,
    height_orig: Rational,
    ratio: Rational,
    upscale: bool,
}

impl Scaler {
    /// Create a scaler from integer source dimensions.
    ///
    /// `upscale` controls whether later `set_*` calls may exceed the
    /// original dimensions.
    pub fn new(width: u32, height: u32, upscale: bool) -> Result<Self, LayoutError> {
        if width == 0 || height == 0 {
            return Err(LayoutError::ZeroSourceDimension);
        }
        let w = Rational::from_integer(i64::from(width));
        let h = Rational::from_integer(i64::from(height));
        Ok(Self {
            width: w,
            height: h,
            width_orig: w,
            height_orig: h,
            ratio: w / h,
            upscale,
        })
    }

    /// Create a scaler from real-valued source dimensions.
    ///
    /// Each float converts to its exact binary-fraction rational (`20.5`
    /// becomes `41/2`), never a decimal approximation, so the same inputs
    /// always reproduce the same ratio.
    pub fn from_f64(width: f64, height: f64, upscale: bool) -> Result<Self, LayoutError> {
        if width == 0.0 || height == 0.0 {
            return Err(LayoutError::ZeroSourceDimension);
        }
        let w = Rational::from_f64(width).ok_or(LayoutError::NonRepresentableDimension)?;
        let h = Rational::from_f64(height).ok_or(LayoutError::NonRepresentableDimension)?;
        if w <= Rational::from_integer(0) || h <= Rational::from_integer(0) {
            return Err(LayoutError::NonRepresentableDimension);
        }
        Ok(Self {
            width: w,
            height: h,
            width_orig: w,
            height_orig: h,
            ratio: w / h,
            upscale,
        })
    }

    /// Current width, rounded half-up to the nearest integer.
    pub fn width(&self) -> u32 {
        round_nonneg(self.width)
    }

    /// Current height, rounded half-up to the nearest integer.
    pub fn height(&self) -> u32 {
        round_nonneg(self.height)
    }

    /// The exact aspect ratio fixed at construction. Unrounded, so chained
    /// `set_*` calls cannot accumulate rounding error.
    pub fn ratio(&self) -> Rational {
        self.ratio
    }

    /// Set the width and derive the height through the ratio.
    ///
    /// Requests beyond the original width clamp back unless upscaling was
    /// enabled at construction.
    pub fn set_width(&mut self, value: u32) -> &mut Self {
        let mut w = Rational::from_integer(i64::from(value));
        if w <= self.width_orig || !self.upscale {
            w = w.min(self.width_orig);
        }
        self.width = w;
        self.height = w / self.ratio;
        self
    }

    /// Set the height and derive the width through the ratio.
    pub fn set_height(&mut self, value: u32) -> &mut Self {
        let mut h = Rational::from_integer(i64::from(value));
        if h <= self.height_orig || !self.upscale {
            h = h.min(self.height_orig);
        }
        self.height = h;
        self.width = h * self.ratio;
        self
    }
}

impl fmt::Display for Scaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width(), self.height())
    }
}

/// Round a non-negative rational half-up to `u32`.
///
/// `Ratio::round` rounds half-way cases away from zero, which for the
/// non-negative dimensions used here is exactly "round half up".
pub(crate) fn round_nonneg(v: Rational) -> u32 {
    let r = v.round().to_integer();
    if r < 0 { 0 } else { r as u32 }
}
