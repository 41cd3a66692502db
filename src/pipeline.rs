//! Processing steps and layout planning.
//!
//! A [`Pipeline`] is an ordered list of opaque [`Step`] descriptors: filter
//! steps and at most one sizing step, produced by
//! [`Variation::pipeline`](crate::Variation::pipeline). Nothing here touches
//! pixels. [`Pipeline::plan`] resolves every sizing step into a concrete
//! [`Layout`] — which source region to read, what to resize it to, and where
//! it sits on the output canvas — for the host's imaging layer to execute.
//!
//! All proportional arithmetic is exact rational; rounding to integer pixels
//! happens once per derived value, half-up.

use alloc::vec::Vec;

use crate::color::Rgba;
use crate::detect::{self, Detection, PixelView, SubjectDetector};
use crate::filters::Filter;
use crate::scaler::{LayoutError, Rational, round_nonneg};

/// Width × height dimensions in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether this rect covers the full source (no actual crop).
    pub fn is_full(&self, source: Size) -> bool {
        self.x == 0 && self.y == 0 && self.width == source.width && self.height == source.height
    }
}

/// Where the visible region sits within available slack: `(0, 0)` pins it
/// top/left, `(1, 1)` bottom/right.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Anchor {
    pub const TOP_LEFT: Self = Self::new(0.0, 0.0);
    pub const TOP: Self = Self::new(0.5, 0.0);
    pub const TOP_RIGHT: Self = Self::new(1.0, 0.0);
    pub const LEFT: Self = Self::new(0.0, 0.5);
    pub const CENTER: Self = Self::new(0.5, 0.5);
    pub const RIGHT: Self = Self::new(1.0, 0.5);
    pub const BOTTOM_LEFT: Self = Self::new(0.0, 1.0);
    pub const BOTTOM: Self = Self::new(0.5, 1.0);
    pub const BOTTOM_RIGHT: Self = Self::new(1.0, 1.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Parse a corner/edge/center shorthand: `tl t tr l c r bl b br`.
    pub fn parse(s: &str) -> Option<Self> {
        let a = match s.to_ascii_lowercase().as_str() {
            "tl" => Self::TOP_LEFT,
            "t" => Self::TOP,
            "tr" => Self::TOP_RIGHT,
            "l" => Self::LEFT,
            "c" => Self::CENTER,
            "r" => Self::RIGHT,
            "bl" => Self::BOTTOM_LEFT,
            "b" => Self::BOTTOM,
            "br" => Self::BOTTOM_RIGHT,
            _ => return None,
        };
        Some(a)
    }

    /// Both fractions lie in `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::CENTER
    }
}

/// A single processing step. Sizing steps are resolved into [`Layout`]s by
/// [`Pipeline::plan`]; filter steps pass through for the host to execute.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// An external pixel filter.
    Filter(Filter),
    /// Scale to fully cover `width`×`height`, cropping overflow at the anchor.
    ResizeToFill {
        width: u32,
        height: u32,
        anchor: Anchor,
        upscale: bool,
    },
    /// Scale to fit entirely within the given bounds. A missing bound is
    /// derived from the aspect ratio. With a `background`, the canvas is
    /// padded to the exact bounds and the image placed at the anchor.
    ResizeToFit {
        width: Option<u32>,
        height: Option<u32>,
        anchor: Anchor,
        background: Option<Rgba>,
        upscale: bool,
    },
    /// Extract a window of at most the given bounds, positioned at the
    /// anchor within the slack. Never scales.
    Crop {
        width: Option<u32>,
        height: Option<u32>,
        anchor: Anchor,
    },
    /// [`ResizeToFill`](Self::ResizeToFill) with the crop window driven by
    /// subject detection; degrades to a centered fill.
    SmartFill {
        width: u32,
        height: u32,
        upscale: bool,
    },
    /// [`Crop`](Self::Crop) with the window centered on the detected
    /// subject; degrades to a centered crop.
    SmartCrop {
        width: Option<u32>,
        height: Option<u32>,
    },
}

/// Resolved geometry for one sizing step.
///
/// Everything the imaging layer needs: which region of the source to read,
/// the dimensions to resize it to, and the canvas it lands on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    /// Dimensions of the image entering the step.
    pub source: Size,
    /// Region of the source to use. `None` = full source.
    pub source_crop: Option<Rect>,
    /// Dimensions to resize the (cropped) source to.
    pub resize_to: Size,
    /// Final canvas dimensions (≥ `resize_to`).
    pub canvas: Size,
    /// Top-left offset of the resized image on the canvas.
    pub placement: (u32, u32),
    /// Canvas background for padded area, when padding applies.
    pub background: Option<Rgba>,
}

impl Layout {
    /// Whether resampling is needed (dimensions change).
    pub fn needs_resize(&self) -> bool {
        self.resize_to != self.effective_source()
    }

    /// Whether padding is needed (canvas larger than the resized image).
    pub fn needs_padding(&self) -> bool {
        self.canvas != self.resize_to
    }

    /// Whether a source crop is applied.
    pub fn needs_crop(&self) -> bool {
        self.source_crop.is_some()
    }

    /// Source dimensions after the crop.
    pub fn effective_source(&self) -> Size {
        match &self.source_crop {
            Some(r) => Size::new(r.width, r.height),
            None => self.source,
        }
    }

    fn identity(source: Size) -> Self {
        Self {
            source,
            source_crop: None,
            resize_to: source,
            canvas: source,
            placement: (0, 0),
            background: None,
        }
    }

    /// Clear `source_crop` when it covers the full source.
    fn normalize(mut self) -> Self {
        if let Some(r) = &self.source_crop
            && r.is_full(self.source)
        {
            self.source_crop = None;
        }
        self
    }
}

/// Ordered list of processing steps for one variation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Resolve every sizing step into a concrete [`Layout`].
    ///
    /// `detector` is the subject-detection capability (use
    /// [`NoDetection`](crate::detect::NoDetection) when absent); `pixels` is
    /// the data it runs on, if the host has it decoded. Detection that is
    /// unavailable or finds nothing degrades to the centered default and is
    /// reported through [`Plan::warnings`], never as an error.
    pub fn plan(
        &self,
        source: Size,
        detector: &dyn SubjectDetector,
        pixels: Option<&PixelView<'_>>,
    ) -> Result<Plan, LayoutError> {
        if source.width == 0 || source.height == 0 {
            return Err(LayoutError::ZeroSourceDimension);
        }

        let mut ops = Vec::with_capacity(self.steps.len());
        let mut warnings = Vec::new();
        let mut cur = source;

        for step in &self.steps {
            match step {
                Step::Filter(f) => ops.push(PlannedOp::Filter(*f)),

                Step::ResizeToFill {
                    width,
                    height,
                    anchor,
                    upscale,
                } => {
                    let layout = fill_layout(cur, *width, *height, *anchor, *upscale)?;
                    cur = layout.canvas;
                    ops.push(PlannedOp::Layout(layout));
                }

                Step::ResizeToFit {
                    width,
                    height,
                    anchor,
                    background,
                    upscale,
                } => {
                    let layout = fit_layout(cur, *width, *height, *anchor, *background, *upscale)?;
                    cur = layout.canvas;
                    ops.push(PlannedOp::Layout(layout));
                }

                Step::Crop {
                    width,
                    height,
                    anchor,
                } => {
                    let layout = crop_layout(cur, *width, *height, *anchor)?;
                    cur = layout.canvas;
                    ops.push(PlannedOp::Layout(layout));
                }

                Step::SmartFill {
                    width,
                    height,
                    upscale,
                } => {
                    let region = detect_region(detector, pixels, &mut warnings);
                    let anchor = match &region {
                        Some(r) => detect::covering_anchor(
                            (cur.width, cur.height),
                            (*width, *height),
                            r,
                        ),
                        None => Anchor::CENTER,
                    };
                    let layout = fill_layout(cur, *width, *height, anchor, *upscale)?;
                    cur = layout.canvas;
                    ops.push(PlannedOp::Layout(layout));
                }

                Step::SmartCrop { width, height } => {
                    let layout = match detect_region(detector, pixels, &mut warnings) {
                        Some(region) => {
                            let cw = bounded(cur.width, *width)?;
                            let ch = bounded(cur.height, *height)?;
                            let (x, y) = detect::centered_window(
                                (cur.width, cur.height),
                                (cw, ch),
                                &region,
                            );
                            let x = x.min(cur.width - cw);
                            let y = y.min(cur.height - ch);
                            Layout {
                                source: cur,
                                source_crop: Some(Rect::new(x, y, cw, ch)),
                                resize_to: Size::new(cw, ch),
                                canvas: Size::new(cw, ch),
                                placement: (0, 0),
                                background: None,
                            }
                            .normalize()
                        }
                        None => crop_layout(cur, *width, *height, Anchor::CENTER)?,
                    };
                    cur = layout.canvas;
                    ops.push(PlannedOp::Layout(layout));
                }
            }
        }

        Ok(Plan { ops, warnings })
    }
}

impl IntoIterator for Pipeline {
    type Item = Step;
    type IntoIter = alloc::vec::IntoIter<Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

impl FromIterator<Step> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

/// A planned pipeline: filters to run and layouts to execute, in order.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    pub ops: Vec<PlannedOp>,
    /// Soft-degradation notices (detector absent, no subject found).
    pub warnings: Vec<PlanWarning>,
}

impl Plan {
    /// Dimensions of the image after all planned operations.
    pub fn output_size(&self, source: Size) -> Size {
        self.ops
            .iter()
            .rev()
            .find_map(|op| match op {
                PlannedOp::Layout(l) => Some(l.canvas),
                PlannedOp::Filter(_) => None,
            })
            .unwrap_or(source)
    }
}

/// One resolved operation.
#[derive(Clone, Debug, PartialEq)]
pub enum PlannedOp {
    Filter(Filter),
    Layout(Layout),
}

/// Soft-degradation notice from planning. These are diagnostics for the
/// host to log or ignore; the plan itself is complete.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlanWarning {
    /// No detector capability (or no pixel data to run it on); fell back to
    /// the centered default.
    DetectorUnavailable,
    /// Detection ran but found no subject; fell back to the centered default.
    NoSubjectDetected,
}

fn detect_region(
    detector: &dyn SubjectDetector,
    pixels: Option<&PixelView<'_>>,
    warnings: &mut Vec<PlanWarning>,
) -> Option<detect::SubjectBox> {
    let Some(view) = pixels else {
        warnings.push(PlanWarning::DetectorUnavailable);
        return None;
    };
    match detector.detect(view) {
        Detection::Unavailable => {
            warnings.push(PlanWarning::DetectorUnavailable);
            None
        }
        Detection::NoSubject => {
            warnings.push(PlanWarning::NoSubjectDetected);
            None
        }
        Detection::Subjects(boxes) => {
            let region = detect::region_of_interest(&boxes);
            if region.is_none() {
                warnings.push(PlanWarning::NoSubjectDetected);
            }
            region
        }
    }
}

// ============================================================================
// Sizing geometry
// ============================================================================

/// Offset within `space` for an anchor fraction along one axis.
fn anchor_offset(space: u32, frac: f64) -> u32 {
    if space == 0 {
        return 0;
    }
    let clamped = frac.clamp(0.0, 1.0);
    // Explicit trait call: f64::round lives in std, libm covers no_std.
    num_traits::Float::round(f64::from(space) * clamped) as u32
}

/// Explicit bound clamped to the source dimension; `None`/unbounded keeps
/// the source dimension. Crop windows never enlarge.
fn bounded(source_dim: u32, bound: Option<u32>) -> Result<u32, LayoutError> {
    match bound {
        Some(0) => Err(LayoutError::ZeroTargetDimension),
        Some(b) => Ok(b.min(source_dim)),
        None => Ok(source_dim),
    }
}

/// Crop the source to the target's aspect ratio, positioned at the anchor.
fn crop_to_aspect(source: Size, tw: u32, th: u32, anchor: Anchor) -> Rect {
    let (sw, sh) = (source.width, source.height);
    // Exact comparison by cross-multiplication.
    let cross_s = u64::from(sw) * u64::from(th);
    let cross_t = u64::from(sh) * u64::from(tw);

    if cross_s > cross_t {
        // Source is wider: crop width, keep full height. new_w = sh·tw/th.
        let new_w = round_nonneg(Rational::new(
            i64::from(sh) * i64::from(tw),
            i64::from(th),
        ))
        .min(sw);
        let x = anchor_offset(sw - new_w, anchor.x);
        Rect::new(x, 0, new_w, sh)
    } else if cross_s < cross_t {
        // Source is taller: crop height, keep full width. new_h = sw·th/tw.
        let new_h = round_nonneg(Rational::new(
            i64::from(sw) * i64::from(th),
            i64::from(tw),
        ))
        .min(sh);
        let y = anchor_offset(sh - new_h, anchor.y);
        Rect::new(0, y, sw, new_h)
    } else {
        Rect::new(0, 0, sw, sh)
    }
}

/// Covering resize: crop to the target aspect at the anchor, then scale the
/// window to exactly `width`×`height` (the minimum covering scale).
fn fill_layout(
    source: Size,
    width: u32,
    height: u32,
    anchor: Anchor,
    upscale: bool,
) -> Result<Layout, LayoutError> {
    if width == 0 || height == 0 {
        return Err(LayoutError::ZeroTargetDimension);
    }
    let crop = crop_to_aspect(source, width, height, anchor);
    let resize_to = if !upscale && (width > crop.width || height > crop.height) {
        Size::new(crop.width, crop.height)
    } else {
        Size::new(width, height)
    };
    Ok(Layout {
        source,
        source_crop: Some(crop),
        resize_to,
        canvas: resize_to,
        placement: (0, 0),
        background: None,
    }
    .normalize())
}

/// Contained resize: scale by the maximum ratio that keeps the source
/// entirely within the bounds; with a background, pad to the exact bounds.
fn fit_layout(
    source: Size,
    width: Option<u32>,
    height: Option<u32>,
    anchor: Anchor,
    background: Option<Rgba>,
    upscale: bool,
) -> Result<Layout, LayoutError> {
    let (sw, sh) = (source.width, source.height);
    if matches!(width, Some(0)) || matches!(height, Some(0)) {
        return Err(LayoutError::ZeroTargetDimension);
    }

    let scale = match (width, height) {
        (Some(w), Some(h)) => Rational::new(i64::from(w), i64::from(sw))
            .min(Rational::new(i64::from(h), i64::from(sh))),
        (Some(w), None) => Rational::new(i64::from(w), i64::from(sw)),
        (None, Some(h)) => Rational::new(i64::from(h), i64::from(sh)),
        (None, None) => return Ok(Layout::identity(source)),
    };

    let new_w = round_nonneg(Rational::from_integer(i64::from(sw)) * scale);
    let new_h = round_nonneg(Rational::from_integer(i64::from(sh)) * scale);
    let one = Rational::from_integer(1);
    let (rw, rh) = if !upscale && scale > one {
        (sw, sh)
    } else {
        (new_w, new_h)
    };

    let (canvas, placement) = match background {
        Some(_) => {
            let cw = width.unwrap_or(if upscale { new_w } else { sw.min(new_w) });
            let ch = height.unwrap_or(if upscale { new_h } else { sh.min(new_h) });
            let px = anchor_offset(cw.saturating_sub(rw), anchor.x);
            let py = anchor_offset(ch.saturating_sub(rh), anchor.y);
            (Size::new(cw, ch), (px, py))
        }
        None => (Size::new(rw, rh), (0, 0)),
    };

    Ok(Layout {
        source,
        source_crop: None,
        resize_to: Size::new(rw, rh),
        canvas,
        placement,
        background,
    })
}

/// Windowed crop: at most the given bounds per axis, positioned at the
/// anchor within the slack. Never scales, never enlarges.
fn crop_layout(
    source: Size,
    width: Option<u32>,
    height: Option<u32>,
    anchor: Anchor,
) -> Result<Layout, LayoutError> {
    let cw = bounded(source.width, width)?;
    let ch = bounded(source.height, height)?;
    let x = anchor_offset(source.width - cw, anchor.x);
    let y = anchor_offset(source.height - ch, anchor.y);
    Ok(Layout {
        source,
        source_crop: Some(Rect::new(x, y, cw, ch)),
        resize_to: Size::new(cw, ch),
        canvas: Size::new(cw, ch),
        placement: (0, 0),
        background: None,
    }
    .normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{NoDetection, SubjectBox};
    use alloc::vec;

    fn plan_one(step: Step, source: Size) -> Layout {
        let mut p = Pipeline::new();
        p.push(step);
        let plan = p.plan(source, &NoDetection, None).unwrap();
        match &plan.ops[..] {
            [PlannedOp::Layout(l)] => l.clone(),
            other => panic!("expected one layout, got {other:?}"),
        }
    }

    // ── crop_to_aspect ──────────────────────────────────────────────────

    #[test]
    fn aspect_crop_wider_source() {
        // 1000×500 (2:1) to 4:3 → crop width to 500·4/3 = 667.
        let r = crop_to_aspect(Size::new(1000, 500), 400, 300, Anchor::CENTER);
        assert_eq!((r.width, r.height), (667, 500));
        // Centered: round(0.5 · 333) = 167.
        assert_eq!((r.x, r.y), (167, 0));
    }

    #[test]
    fn aspect_crop_taller_source() {
        // 500×1000 (1:2) to 4:3 → crop height to 500·3/4 = 375.
        let r = crop_to_aspect(Size::new(500, 1000), 400, 300, Anchor::CENTER);
        assert_eq!((r.width, r.height), (500, 375));
    }

    #[test]
    fn aspect_crop_same_ratio_is_full() {
        let r = crop_to_aspect(Size::new(800, 600), 400, 300, Anchor::CENTER);
        assert_eq!(r, Rect::new(0, 0, 800, 600));
    }

    #[test]
    fn aspect_crop_anchor_edges() {
        let r = crop_to_aspect(Size::new(1000, 500), 400, 300, Anchor::TOP_LEFT);
        assert_eq!((r.x, r.y), (0, 0));
        let r = crop_to_aspect(Size::new(1000, 500), 400, 300, Anchor::BOTTOM_RIGHT);
        assert_eq!(r.x, 1000 - r.width);
    }

    // ── ResizeToFill ────────────────────────────────────────────────────

    #[test]
    fn fill_exact_dimensions() {
        let l = plan_one(
            Step::ResizeToFill {
                width: 400,
                height: 300,
                anchor: Anchor::CENTER,
                upscale: false,
            },
            Size::new(1000, 500),
        );
        assert_eq!(l.resize_to, Size::new(400, 300));
        assert_eq!(l.canvas, Size::new(400, 300));
        let crop = l.source_crop.unwrap();
        assert_eq!((crop.width, crop.height), (667, 500));
    }

    #[test]
    fn fill_same_aspect_has_no_crop() {
        let l = plan_one(
            Step::ResizeToFill {
                width: 400,
                height: 200,
                anchor: Anchor::CENTER,
                upscale: false,
            },
            Size::new(1000, 500),
        );
        assert_eq!(l.resize_to, Size::new(400, 200));
        assert!(!l.needs_crop());
    }

    #[test]
    fn fill_never_enlarges_without_upscale() {
        let l = plan_one(
            Step::ResizeToFill {
                width: 600,
                height: 600,
                anchor: Anchor::CENTER,
                upscale: false,
            },
            Size::new(300, 300),
        );
        assert_eq!(l.resize_to, Size::new(300, 300));
        assert!(!l.needs_resize());
    }

    #[test]
    fn fill_upscales_when_permitted() {
        let l = plan_one(
            Step::ResizeToFill {
                width: 600,
                height: 600,
                anchor: Anchor::CENTER,
                upscale: true,
            },
            Size::new(300, 300),
        );
        assert_eq!(l.resize_to, Size::new(600, 600));
    }

    // ── ResizeToFit ─────────────────────────────────────────────────────

    #[test]
    fn fit_downscales_to_bounds() {
        let l = plan_one(
            Step::ResizeToFit {
                width: Some(400),
                height: Some(300),
                anchor: Anchor::CENTER,
                background: None,
                upscale: false,
            },
            Size::new(1000, 500),
        );
        assert_eq!(l.resize_to, Size::new(400, 200));
        assert_eq!(l.canvas, Size::new(400, 200));
        assert!(!l.needs_padding());
    }

    #[test]
    fn fit_with_background_pads_to_bounds() {
        let l = plan_one(
            Step::ResizeToFit {
                width: Some(400),
                height: Some(300),
                anchor: Anchor::CENTER,
                background: Some(Rgba::WHITE),
                upscale: false,
            },
            Size::new(1000, 500),
        );
        assert_eq!(l.resize_to, Size::new(400, 200));
        assert_eq!(l.canvas, Size::new(400, 300));
        assert_eq!(l.placement, (0, 50));
        assert_eq!(l.background, Some(Rgba::WHITE));
    }

    #[test]
    fn fit_single_bound_derives_other_axis() {
        let l = plan_one(
            Step::ResizeToFit {
                width: Some(200),
                height: None,
                anchor: Anchor::CENTER,
                background: None,
                upscale: false,
            },
            Size::new(300, 600),
        );
        assert_eq!(l.resize_to, Size::new(200, 400));
    }

    #[test]
    fn fit_does_not_upscale_by_default() {
        let l = plan_one(
            Step::ResizeToFit {
                width: Some(400),
                height: None,
                anchor: Anchor::CENTER,
                background: None,
                upscale: false,
            },
            Size::new(300, 600),
        );
        assert_eq!(l.resize_to, Size::new(300, 600));
        assert!(!l.needs_resize());
    }

    #[test]
    fn fit_single_bound_with_background_keeps_source_free_axis() {
        // The padded canvas only extends along the bounded axis; the free
        // axis keeps the (unscaled) source dimension.
        let l = plan_one(
            Step::ResizeToFit {
                width: Some(400),
                height: None,
                anchor: Anchor::CENTER,
                background: Some(Rgba::TRANSPARENT_WHITE),
                upscale: false,
            },
            Size::new(300, 600),
        );
        assert_eq!(l.resize_to, Size::new(300, 600));
        assert_eq!(l.canvas, Size::new(400, 600));
        assert_eq!(l.placement, (50, 0));
    }

    #[test]
    fn fit_upscale_with_background() {
        let l = plan_one(
            Step::ResizeToFit {
                width: Some(400),
                height: Some(1000),
                anchor: Anchor::CENTER,
                background: Some(Rgba::TRANSPARENT_WHITE),
                upscale: true,
            },
            Size::new(300, 600),
        );
        // Scale = min(4/3, 5/3) = 4/3 → 400×800 on a 400×1000 canvas.
        assert_eq!(l.resize_to, Size::new(400, 800));
        assert_eq!(l.canvas, Size::new(400, 1000));
        assert_eq!(l.placement, (0, 100));
    }

    #[test]
    fn fit_unbounded_is_identity() {
        let l = plan_one(
            Step::ResizeToFit {
                width: None,
                height: None,
                anchor: Anchor::CENTER,
                background: None,
                upscale: true,
            },
            Size::new(300, 600),
        );
        assert!(!l.needs_resize());
        assert!(!l.needs_padding());
    }

    // ── Crop ────────────────────────────────────────────────────────────

    #[test]
    fn crop_is_bounded_by_source() {
        let l = plan_one(
            Step::Crop {
                width: Some(200),
                height: Some(800),
                anchor: Anchor::CENTER,
            },
            Size::new(300, 600),
        );
        assert_eq!(l.resize_to, Size::new(200, 600));
        assert_eq!(l.source_crop, Some(Rect::new(50, 0, 200, 600)));
        assert!(!l.needs_resize());
    }

    #[test]
    fn crop_anchor_positions_window() {
        let l = plan_one(
            Step::Crop {
                width: Some(100),
                height: Some(100),
                anchor: Anchor::BOTTOM_RIGHT,
            },
            Size::new(300, 600),
        );
        assert_eq!(l.source_crop, Some(Rect::new(200, 500, 100, 100)));
    }

    #[test]
    fn crop_full_size_is_identity() {
        let l = plan_one(
            Step::Crop {
                width: None,
                height: Some(900),
                anchor: Anchor::CENTER,
            },
            Size::new(300, 600),
        );
        assert!(!l.needs_crop());
        assert_eq!(l.canvas, Size::new(300, 600));
    }

    // ── Smart steps ─────────────────────────────────────────────────────

    struct FixedBoxes(Vec<SubjectBox>);

    impl SubjectDetector for FixedBoxes {
        fn detect(&self, _image: &PixelView<'_>) -> Detection {
            if self.0.is_empty() {
                Detection::NoSubject
            } else {
                Detection::Subjects(self.0.clone())
            }
        }
    }

    #[test]
    fn smart_fill_without_detector_warns_and_centers() {
        let mut p = Pipeline::new();
        p.push(Step::SmartFill {
            width: 200,
            height: 200,
            upscale: false,
        });
        let plan = p.plan(Size::new(1000, 500), &NoDetection, None).unwrap();
        assert_eq!(plan.warnings, vec![PlanWarning::DetectorUnavailable]);
        let PlannedOp::Layout(l) = &plan.ops[0] else {
            panic!("expected layout");
        };
        // Same geometry as a center-anchored fill.
        let centered = fill_layout(Size::new(1000, 500), 200, 200, Anchor::CENTER, false).unwrap();
        assert_eq!(*l, centered);
    }

    #[test]
    fn smart_fill_tracks_subject() {
        // Subject on the right side of a wide image pulls the window right.
        let detector = FixedBoxes(vec![SubjectBox::new(200, 950, 300, 850)]);
        let pixels_data = [0u8; 3];
        let view = PixelView::new(1000, 500, &pixels_data);

        let mut p = Pipeline::new();
        p.push(Step::SmartFill {
            width: 200,
            height: 200,
            upscale: false,
        });
        let plan = p.plan(Size::new(1000, 500), &detector, Some(&view)).unwrap();
        assert!(plan.warnings.is_empty());
        let PlannedOp::Layout(l) = &plan.ops[0] else {
            panic!("expected layout");
        };
        let crop = l.source_crop.unwrap();
        // Centered fill would put the 500-wide window at x=250; the subject
        // drags it toward the right edge.
        assert!(crop.x > 250, "crop.x = {}", crop.x);
        assert_eq!((crop.width, crop.height), (500, 500));
    }

    #[test]
    fn smart_crop_no_subject_warns_and_centers() {
        let detector = FixedBoxes(Vec::new());
        let pixels_data = [0u8; 3];
        let view = PixelView::new(300, 600, &pixels_data);

        let mut p = Pipeline::new();
        p.push(Step::SmartCrop {
            width: Some(200),
            height: Some(200),
        });
        let plan = p.plan(Size::new(300, 600), &detector, Some(&view)).unwrap();
        assert_eq!(plan.warnings, vec![PlanWarning::NoSubjectDetected]);
        let PlannedOp::Layout(l) = &plan.ops[0] else {
            panic!("expected layout");
        };
        assert_eq!(l.source_crop, Some(Rect::new(50, 200, 200, 200)));
    }

    #[test]
    fn smart_crop_window_follows_subject() {
        let detector = FixedBoxes(vec![SubjectBox::new(400, 160, 500, 60)]);
        let pixels_data = [0u8; 3];
        let view = PixelView::new(300, 600, &pixels_data);

        let mut p = Pipeline::new();
        p.push(Step::SmartCrop {
            width: Some(200),
            height: Some(200),
        });
        let plan = p.plan(Size::new(300, 600), &detector, Some(&view)).unwrap();
        assert!(plan.warnings.is_empty());
        let PlannedOp::Layout(l) = &plan.ops[0] else {
            panic!("expected layout");
        };
        let crop = l.source_crop.unwrap();
        assert_eq!((crop.width, crop.height), (200, 200));
        // Subject center ≈ (110, 450): window pinned near the bottom-left.
        assert_eq!(crop.x, 10);
        assert!(crop.y > 300);
    }

    // ── Plan plumbing ───────────────────────────────────────────────────

    #[test]
    fn filters_pass_through_in_order() {
        let mut p = Pipeline::new();
        p.push(Step::Filter(Filter::Grayscale));
        p.push(Step::Crop {
            width: Some(100),
            height: None,
            anchor: Anchor::CENTER,
        });
        p.push(Step::Filter(Filter::Sharpen));
        let plan = p.plan(Size::new(300, 600), &NoDetection, None).unwrap();
        assert_eq!(plan.ops.len(), 3);
        assert!(matches!(plan.ops[0], PlannedOp::Filter(Filter::Grayscale)));
        assert!(matches!(plan.ops[2], PlannedOp::Filter(Filter::Sharpen)));
        assert_eq!(plan.output_size(Size::new(300, 600)), Size::new(100, 600));
    }

    #[test]
    fn zero_source_is_an_error() {
        let p = Pipeline::new();
        assert_eq!(
            p.plan(Size::new(0, 100), &NoDetection, None).unwrap_err(),
            LayoutError::ZeroSourceDimension
        );
    }

    #[test]
    fn zero_target_is_an_error() {
        let mut p = Pipeline::new();
        p.push(Step::ResizeToFill {
            width: 0,
            height: 100,
            anchor: Anchor::CENTER,
            upscale: false,
        });
        assert_eq!(
            p.plan(Size::new(300, 600), &NoDetection, None).unwrap_err(),
            LayoutError::ZeroTargetDimension
        );
    }

    #[test]
    fn anchor_parse_shorthands() {
        assert_eq!(Anchor::parse("tl"), Some(Anchor::TOP_LEFT));
        assert_eq!(Anchor::parse("BR"), Some(Anchor::BOTTOM_RIGHT));
        assert_eq!(Anchor::parse("c"), Some(Anchor::CENTER));
        assert_eq!(Anchor::parse("brc"), None);
        assert_eq!(Anchor::parse(""), None);
    }
}
