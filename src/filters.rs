//! Filter step descriptors.
//!
//! The crate never touches pixels; filters are typed descriptors the host's
//! imaging layer executes. They ride along a [`Pipeline`](crate::Pipeline)
//! as pre- and post-processing steps around the sizing step.

use crate::color::Rgba;

/// A pixel filter to be executed by the external imaging layer.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Filter {
    /// Convert to grayscale, keeping alpha.
    Grayscale,
    /// Gaussian blur. Not applicable to 1-bit images.
    GaussianBlur { radius: f32 },
    /// Box blur. Not applicable to 1-bit images.
    BoxBlur { radius: f32 },
    /// Stack blur (a fast Gaussian approximation).
    StackBlur { radius: u32 },
    /// Reduce each channel to the given number of bits.
    Posterize { bits: u8 },
    /// Invert pixel values above the threshold.
    Solarize { threshold: u8 },
    Sharpen,
    EdgeEnhance,
    /// Composite a translucent color layer over the image.
    ColorOverlay { color: Rgba, opacity: f32 },
    /// Replace the RGB of fully transparent pixels and flatten to opaque.
    MakeOpaque { color: Rgba },
}

impl Filter {
    /// Overlay with the conventional half-strength opacity.
    ///
    /// An explicit alpha on `color` takes precedence over `opacity` when the
    /// host composites, matching how a 4-component color bypasses it.
    pub fn color_overlay(color: impl Into<Rgba>) -> Self {
        Filter::ColorOverlay {
            color: color.into(),
            opacity: 0.5,
        }
    }

    /// Flatten transparency onto white.
    pub fn make_opaque() -> Self {
        Filter::MakeOpaque { color: Rgba::WHITE }
    }
}
