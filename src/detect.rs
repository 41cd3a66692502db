//! Subject detection capability and the geometry derived from it.
//!
//! Detection itself is external: the host resolves a [`SubjectDetector`]
//! once (or uses [`NoDetection`]) and injects it at planning time. This
//! module turns whatever the detector reports into crop anchors and
//! windows. Detectors typically find the salient feature only (for faces:
//! eyes, nose, mouth), so boxes are expanded toward the surrounding context
//! before use.

use alloc::vec::Vec;

use num_traits::ToPrimitive;

use crate::pipeline::Anchor;
use crate::scaler::{Rational, round_nonneg};

/// Borrowed 8-bit RGB pixel data, row-major, handed to detectors.
#[derive(Copy, Clone, Debug)]
pub struct PixelView<'a> {
    pub width: u32,
    pub height: u32,
    pub rgb: &'a [u8],
}

impl<'a> PixelView<'a> {
    pub fn new(width: u32, height: u32, rgb: &'a [u8]) -> Self {
        Self { width, height, rgb }
    }
}

/// A detected subject's bounding box, in source pixels, CSS edge order.
///
/// Edges may leave the image bounds after [expansion](SubjectBox::expanded);
/// downstream window math clamps, the box itself does not.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SubjectBox {
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
    pub left: i64,
}

/// How far beyond the detected feature the region of interest extends,
/// as a fraction of the box size per direction. Headroom above a face
/// matters more than the sides.
const EXPAND_TOP: f64 = 0.7;
const EXPAND_SIDES: f64 = 0.5;
const EXPAND_BOTTOM: f64 = 0.5;

impl SubjectBox {
    pub const fn new(top: i64, right: i64, bottom: i64, left: i64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    fn width(&self) -> i64 {
        self.right - self.left
    }

    fn height(&self) -> i64 {
        self.bottom - self.top
    }

    /// Grow the box by the per-direction context factors.
    fn expanded(self) -> Self {
        let round = |v: f64| num_traits::Float::round(v) as i64;
        let w = self.width() as f64;
        let h = self.height() as f64;
        Self {
            top: self.top - round(EXPAND_TOP * h),
            right: self.right + round(EXPAND_SIDES * w),
            bottom: self.bottom + round(EXPAND_BOTTOM * h),
            left: self.left - round(EXPAND_SIDES * w),
        }
    }

    /// Smallest box containing both.
    fn union(self, other: Self) -> Self {
        Self {
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
            left: self.left.min(other.left),
        }
    }
}

/// Outcome of a detection call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Detection {
    /// The capability is not installed or cannot run. Callers degrade to
    /// their anchor-based default.
    Unavailable,
    /// Detection ran but found nothing.
    NoSubject,
    /// One or more subjects, in source pixel coordinates.
    Subjects(Vec<SubjectBox>),
}

/// Subject detection capability, injected by the host.
pub trait SubjectDetector {
    fn detect(&self, image: &PixelView<'_>) -> Detection;
}

/// The null capability: always [`Detection::Unavailable`].
#[derive(Copy, Clone, Debug, Default)]
pub struct NoDetection;

impl SubjectDetector for NoDetection {
    fn detect(&self, _image: &PixelView<'_>) -> Detection {
        Detection::Unavailable
    }
}

/// Expand every box and merge them into one region of interest.
/// Returns `None` for an empty list.
pub(crate) fn region_of_interest(boxes: &[SubjectBox]) -> Option<SubjectBox> {
    let mut boxes = boxes.iter().map(|b| b.expanded());
    let first = boxes.next()?;
    Some(boxes.fold(first, SubjectBox::union))
}

fn center(region: &SubjectBox) -> (Rational, Rational) {
    (
        Rational::new(region.left + region.right, 2),
        Rational::new(region.top + region.bottom, 2),
    )
}

/// Anchor that centers a covering fill's crop window on the region.
///
/// The source is scaled by the minimum covering ratio for the target box;
/// the anchor positions the `target`-sized window within the scaled image
/// so the region center sits as close to the window center as the slack
/// allows, each axis clamped to `[0, 1]` independently.
pub(crate) fn covering_anchor(
    source: (u32, u32),
    target: (u32, u32),
    region: &SubjectBox,
) -> Anchor {
    let (sw, sh) = (i64::from(source.0), i64::from(source.1));
    let (tw, th) = (i64::from(target.0), i64::from(target.1));

    let ratio = Rational::new(tw, sw).max(Rational::new(th, sh));
    let new_w = i64::from(round_nonneg(Rational::from_integer(sw) * ratio));
    let new_h = i64::from(round_nonneg(Rational::from_integer(sh) * ratio));

    let (cx, cy) = center(region);
    let axis = |c: Rational, src: i64, scaled: i64, tgt: i64| -> f64 {
        let slack = scaled - tgt;
        if slack == 0 {
            return 0.0;
        }
        let offset = c / src * scaled - Rational::new(tgt, 2);
        let frac = offset.max(Rational::from_integer(0)) / slack;
        frac.min(Rational::from_integer(1)).to_f64().unwrap_or(0.5)
    };

    Anchor::new(axis(cx, sw, new_w, tw), axis(cy, sh, new_h, th))
}

/// Top-left corner of a `crop`-sized window centered on the region,
/// shifted back inside the image bounds, each axis independently.
pub(crate) fn centered_window(
    source: (u32, u32),
    crop: (u32, u32),
    region: &SubjectBox,
) -> (u32, u32) {
    let (cx, cy) = center(region);

    let axis = |c: Rational, crop_dim: u32, source_dim: u32| -> u32 {
        let half = Rational::new(i64::from(crop_dim), 2);
        let near = (c - half).trunc().to_integer();
        let far = (c + half).trunc().to_integer();
        let overshoot = (far - i64::from(source_dim)).max(0);
        (near - overshoot).max(0) as u32
    };

    (axis(cx, crop.0, source.0), axis(cy, crop.1, source.1))
}
