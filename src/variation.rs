//! Variation configuration and output-size resolution.
//!
//! A [`Variation`] is a validated, immutable description of how to size one
//! image rendition: target size, sizing policy, output format, filters, and
//! per-format save options. Configuration errors surface at
//! [`build`](VariationBuilder::build) time, before any image is touched.
//!
//! Two sizing families exist and are mutually exclusive. The legacy family
//! (`clip`, `max_width`/`max_height`, `anchor`, `face_detection`) predates
//! the mode-based one (`mode`, `gravity`, `background`); both resolve
//! through the same exact-rational core, and the documented equivalences
//! (`clip = true` ≈ [`Mode::Fill`], `clip = false` ≈ [`Mode::Fit`]) hold
//! bit-for-bit.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::color::Rgba;
use crate::detect::{PixelView, SubjectDetector};
use crate::filters::Filter;
use crate::format::{FALLBACK_FORMAT, Format, SaveOptions};
use crate::pipeline::{Anchor, Pipeline, Plan, Size, Step};
use crate::scaler::{LayoutError, Rational, Scaler};

/// Sizing policy of the mode-based configuration family.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Scale to fully cover the target box, cropping overflow.
    #[default]
    Fill,
    /// Scale to fit entirely within the target box, optionally padding
    /// with [`background`](VariationBuilder::background).
    Fit,
    /// Extract a sub-rectangle without scaling.
    Crop,
    /// Pass through unchanged (filters still run).
    None,
}

impl Mode {
    /// Parse a mode name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fill" => Some(Mode::Fill),
            "fit" => Some(Mode::Fit),
            "crop" => Some(Mode::Crop),
            "none" => Some(Mode::None),
            _ => None,
        }
    }
}

impl core::str::FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        Self::parse(s).ok_or_else(|| ConfigError::UnknownMode(String::from(s)))
    }
}

/// Where the visible region sits, or the request to derive it from subject
/// detection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Gravity {
    Anchor(Anchor),
    /// Subject-aware positioning. Degrades to center when detection is
    /// unavailable or finds nothing. Rejected with [`Mode::Fit`].
    Auto,
}

impl Gravity {
    /// Parse an anchor shorthand (`tl` … `br`) or `auto`.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("auto") {
            return Some(Gravity::Auto);
        }
        Anchor::parse(s).map(Gravity::Anchor)
    }

    fn anchor_or_center(&self) -> Anchor {
        match self {
            Gravity::Anchor(a) => *a,
            Gravity::Auto => Anchor::CENTER,
        }
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Gravity::Anchor(Anchor::CENTER)
    }
}

impl core::str::FromStr for Gravity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        Self::parse(s).ok_or_else(|| ConfigError::UnknownGravity(String::from(s)))
    }
}

/// Construction-time configuration error. Fatal to the configuration;
/// nothing is partially built.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Legacy (`clip`/`max_*`/`anchor`/`face_detection`) and mode-based
    /// (`mode`/`gravity`/`background`) options were both supplied.
    #[error("legacy and mode-based sizing options cannot be combined")]
    MixedSizingFamilies,
    /// Cropping never enlarges, so upscaling cannot be enabled with it.
    #[error("upscaling cannot be enabled in crop mode")]
    UpscaleWithCrop,
    /// Fit mode has no crop window for a subject to position.
    #[error("auto gravity cannot be used in fit mode")]
    AutoGravityWithFit,
    #[error("unknown sizing mode `{0}`")]
    UnknownMode(String),
    #[error("unknown gravity `{0}`")]
    UnknownGravity(String),
    #[error("gravity fractions must lie within 0..=1")]
    GravityOutOfRange,
    #[error("anchor fractions must lie within 0..=1")]
    AnchorOutOfRange,
    #[error("unrecognized color `{0}`")]
    UnknownColor(String),
    #[error("unsupported image format `{0}`")]
    UnsupportedFormat(String),
}

/// Non-fatal construction diagnostic. The host decides whether to log,
/// collect, or ignore these; they are never raised.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigWarning {
    /// `max_width` only takes effect when `clip` is false.
    MaxWidthWithClip,
    /// `max_height` only takes effect when `clip` is false.
    MaxHeightWithClip,
    /// `max_width` only takes effect when the target width is 0.
    MaxWidthWithTargetWidth,
    /// `max_height` only takes effect when the target height is 0.
    MaxHeightWithTargetHeight,
    /// `background` only takes effect in fit mode.
    BackgroundIgnored,
}

/// Resolved sizing configuration: exactly one family.
#[derive(Clone, Debug, PartialEq)]
pub enum Sizing {
    Legacy {
        clip: bool,
        max_width: u32,
        max_height: u32,
        anchor: Anchor,
        face_detection: bool,
    },
    Modern {
        mode: Mode,
        gravity: Gravity,
        background: Option<Rgba>,
    },
}

/// A validated image variation. Construct through [`Variation::builder`];
/// immutable afterwards. `Clone` deep-copies the filter lists and the save
/// options map, so copies can be extended independently.
#[derive(Clone, Debug, PartialEq)]
pub struct Variation {
    size: (u32, u32),
    upscale: bool,
    sizing: Sizing,
    format: Option<Format>,
    preprocessors: Vec<Filter>,
    postprocessors: Vec<Filter>,
    options: BTreeMap<Format, SaveOptions>,
    warnings: Vec<ConfigWarning>,
}

impl Variation {
    /// Start building a variation targeting `width`×`height`.
    /// A dimension of 0 means unconstrained.
    pub fn builder(width: u32, height: u32) -> VariationBuilder {
        VariationBuilder {
            size: (width, height),
            upscale: false,
            format: None,
            preprocessors: Vec::new(),
            postprocessors: Vec::new(),
            options: BTreeMap::new(),
            clip: None,
            max_width: None,
            max_height: None,
            anchor: None,
            face_detection: None,
            mode: None,
            gravity: None,
            background: None,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.0
    }

    pub fn height(&self) -> u32 {
        self.size.1
    }

    pub fn upscale(&self) -> bool {
        self.upscale
    }

    pub fn sizing(&self) -> &Sizing {
        &self.sizing
    }

    /// Explicit output format; `None` means auto-detect from the
    /// destination path.
    pub fn format(&self) -> Option<Format> {
        self.format
    }

    pub fn preprocessors(&self) -> &[Filter] {
        &self.preprocessors
    }

    pub fn postprocessors(&self) -> &[Filter] {
        &self.postprocessors
    }

    /// Diagnostics collected at build time.
    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    /// Final canvas dimensions for a source image of the given size.
    ///
    /// Pure arithmetic over the exact rational scaler; no I/O.
    pub fn output_size(&self, source: (u32, u32)) -> Result<(u32, u32), LayoutError> {
        match &self.sizing {
            Sizing::Legacy {
                clip,
                max_width,
                max_height,
                ..
            } => legacy_output_size(source, self.size, *clip, *max_width, *max_height, self.upscale),
            Sizing::Modern { mode, .. } => match mode {
                Mode::None => Ok(source),
                Mode::Fill => {
                    // With both targets set, fill sizes like legacy clip;
                    // with one axis free it degenerates to a proportional fit.
                    let clip = self.size.0 > 0 && self.size.1 > 0;
                    legacy_output_size(source, self.size, clip, 0, 0, self.upscale)
                }
                Mode::Fit => legacy_output_size(source, self.size, false, 0, 0, self.upscale),
                Mode::Crop => {
                    if source.0 == 0 || source.1 == 0 {
                        return Err(LayoutError::ZeroSourceDimension);
                    }
                    let w = if self.size.0 > 0 {
                        self.size.0.min(source.0)
                    } else {
                        source.0
                    };
                    let h = if self.size.1 > 0 {
                        self.size.1.min(source.1)
                    } else {
                        source.1
                    };
                    Ok((w, h))
                }
            },
        }
    }

    /// Build the ordered step list for a source image of the given size:
    /// pre-filters, at most one sizing step, post-filters.
    pub fn pipeline(&self, source: (u32, u32)) -> Result<Pipeline, LayoutError> {
        let mut steps: Vec<Step> = self
            .preprocessors
            .iter()
            .copied()
            .map(Step::Filter)
            .collect();
        if let Some(step) = self.sizing_step(source)? {
            steps.push(step);
        }
        steps.extend(self.postprocessors.iter().copied().map(Step::Filter));
        Ok(steps.into_iter().collect())
    }

    /// Build the pipeline and resolve it into concrete layouts.
    ///
    /// `detector` is the host's subject-detection capability
    /// ([`NoDetection`](crate::detect::NoDetection) when absent) and
    /// `pixels` the decoded data it runs on.
    pub fn plan(
        &self,
        source: (u32, u32),
        detector: &dyn SubjectDetector,
        pixels: Option<&PixelView<'_>>,
    ) -> Result<Plan, LayoutError> {
        self.pipeline(source)?
            .plan(Size::new(source.0, source.1), detector, pixels)
    }

    fn sizing_step(&self, source: (u32, u32)) -> Result<Option<Step>, LayoutError> {
        let (tw, th) = self.size;
        match &self.sizing {
            Sizing::Legacy {
                clip,
                anchor,
                face_detection,
                ..
            } => {
                let (cw, ch) = self.output_size(source)?;
                if *clip {
                    if *face_detection {
                        Ok(Some(Step::SmartFill {
                            width: cw,
                            height: ch,
                            upscale: self.upscale,
                        }))
                    } else {
                        Ok(Some(Step::ResizeToFill {
                            width: cw,
                            height: ch,
                            anchor: *anchor,
                            upscale: self.upscale,
                        }))
                    }
                } else {
                    Ok(Some(Step::ResizeToFit {
                        width: Some(cw),
                        height: Some(ch),
                        anchor: *anchor,
                        background: Some(Rgba::TRANSPARENT_WHITE),
                        upscale: self.upscale,
                    }))
                }
            }
            Sizing::Modern {
                mode,
                gravity,
                background,
            } => {
                if tw == 0 && th == 0 {
                    return Ok(None);
                }
                match mode {
                    Mode::None => Ok(None),
                    Mode::Fill => {
                        if tw == 0 || th == 0 {
                            // One free axis: cover degenerates to a
                            // proportional resize, no mat.
                            Ok(Some(Step::ResizeToFit {
                                width: nonzero(tw),
                                height: nonzero(th),
                                anchor: gravity.anchor_or_center(),
                                background: None,
                                upscale: self.upscale,
                            }))
                        } else {
                            let (cw, ch) = self.output_size(source)?;
                            match gravity {
                                Gravity::Auto => Ok(Some(Step::SmartFill {
                                    width: cw,
                                    height: ch,
                                    upscale: self.upscale,
                                })),
                                Gravity::Anchor(a) => Ok(Some(Step::ResizeToFill {
                                    width: cw,
                                    height: ch,
                                    anchor: *a,
                                    upscale: self.upscale,
                                })),
                            }
                        }
                    }
                    Mode::Fit => {
                        let (cw, ch) = self.output_size(source)?;
                        Ok(Some(Step::ResizeToFit {
                            width: Some(cw),
                            height: Some(ch),
                            anchor: gravity.anchor_or_center(),
                            background: *background,
                            upscale: self.upscale,
                        }))
                    }
                    Mode::Crop => match gravity {
                        Gravity::Auto => Ok(Some(Step::SmartCrop {
                            width: nonzero(tw),
                            height: nonzero(th),
                        })),
                        Gravity::Anchor(a) => Ok(Some(Step::Crop {
                            width: nonzero(tw),
                            height: nonzero(th),
                            anchor: *a,
                        })),
                    },
                }
            }
        }
    }

    /// Output format for the given destination path: the explicit format if
    /// set, else the path extension, else JPEG.
    pub fn output_format(&self, path: &str) -> Format {
        self.format
            .or_else(|| Format::from_path(path))
            .unwrap_or(FALLBACK_FORMAT)
    }

    /// Replace the extension of `path` with the one matching
    /// [`output_format`](Self::output_format).
    pub fn replace_extension(&self, path: &str) -> String {
        crate::format::replace_extension(path, self.output_format(path))
    }

    /// Save options for a format: explicitly configured options merged over
    /// the built-in per-format defaults.
    pub fn save_options(&self, format: Format) -> SaveOptions {
        let defaults = SaveOptions::defaults_for(format);
        match self.options.get(&format) {
            Some(user) => user.merged_over(defaults),
            None => defaults,
        }
    }
}

/// The legacy clip/no-clip canvas resolution. Kept as one function so both
/// configuration families resolve identically.
fn legacy_output_size(
    source: (u32, u32),
    target: (u32, u32),
    clip: bool,
    max_width: u32,
    max_height: u32,
    upscale: bool,
) -> Result<(u32, u32), LayoutError> {
    let mut size = Scaler::new(source.0, source.1, upscale)?;
    let (tw, th) = target;

    if clip {
        if upscale {
            if tw > 0 && tw > size.width() {
                size.set_width(tw);
            }
            if th > 0 && th > size.height() {
                size.set_height(th);
            }
        }
        let width = if tw > 0 { tw.min(size.width()) } else { size.width() };
        let height = if th > 0 { th.min(size.height()) } else { size.height() };
        Ok((width, height))
    } else {
        // Whichever of the cap and the exact target is set takes effect;
        // the smaller wins when both are. Preserved as observed — do not
        // simplify without a fixture regression.
        let pick = |cap: u32, tgt: u32| -> u32 {
            let a = if cap > 0 { cap } else { tgt };
            let b = if tgt > 0 { tgt } else { cap };
            a.min(b)
        };
        let max_w = pick(max_width, tw);
        let max_h = pick(max_height, th);

        if upscale {
            if max_w > 0 {
                if max_h > 0 {
                    let max_aspect = Rational::new(i64::from(max_w), i64::from(max_h));
                    if size.ratio() > max_aspect {
                        size.set_width(max_w);
                    } else {
                        size.set_height(max_h);
                    }
                } else {
                    size.set_width(max_w);
                }
            } else if max_h > 0 {
                size.set_height(max_h);
            }
        } else {
            if max_w > 0 && max_w < size.width() {
                size.set_width(max_w);
            }
            if max_h > 0 && max_h < size.height() {
                size.set_height(max_h);
            }
        }

        let width = if tw > 0 { tw } else { size.width() };
        let height = if th > 0 { th } else { size.height() };
        Ok((width, height))
    }
}

fn nonzero(v: u32) -> Option<u32> {
    (v != 0).then_some(v)
}

/// Builder for [`Variation`]. Legacy and mode-based setters are tracked
/// separately; [`build`](Self::build) rejects configurations touching both.
#[derive(Clone, Debug)]
pub struct VariationBuilder {
    size: (u32, u32),
    upscale: bool,
    format: Option<Format>,
    preprocessors: Vec<Filter>,
    postprocessors: Vec<Filter>,
    options: BTreeMap<Format, SaveOptions>,
    clip: Option<bool>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    anchor: Option<Anchor>,
    face_detection: Option<bool>,
    mode: Option<Mode>,
    gravity: Option<Gravity>,
    background: Option<Rgba>,
}

impl VariationBuilder {
    /// Permit enlarging beyond the source's native resolution.
    pub fn upscale(mut self, upscale: bool) -> Self {
        self.upscale = upscale;
        self
    }

    /// Fix the output format instead of auto-detecting from the path.
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Append a filter to run before the sizing step.
    pub fn preprocess(mut self, filter: Filter) -> Self {
        self.preprocessors.push(filter);
        self
    }

    /// Append a filter to run after the sizing step.
    pub fn postprocess(mut self, filter: Filter) -> Self {
        self.postprocessors.push(filter);
        self
    }

    /// Set save options for one format (merged over built-in defaults).
    pub fn save_options(mut self, format: Format, options: SaveOptions) -> Self {
        self.options.insert(format, options);
        self
    }

    /// Legacy: `true` fills the target box cropping overflow, `false` fits
    /// within it on a mat.
    pub fn clip(mut self, clip: bool) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Legacy: cap the derived width when the target width is 0.
    pub fn max_width(mut self, max_width: u32) -> Self {
        self.max_width = Some(max_width);
        self
    }

    /// Legacy: cap the derived height when the target height is 0.
    pub fn max_height(mut self, max_height: u32) -> Self {
        self.max_height = Some(max_height);
        self
    }

    /// Legacy: where the visible region sits within available slack.
    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Legacy: position the fill crop on detected faces.
    pub fn face_detection(mut self, enabled: bool) -> Self {
        self.face_detection = Some(enabled);
        self
    }

    /// Mode-based sizing policy.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Mode-based positioning, including subject-aware [`Gravity::Auto`].
    pub fn gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = Some(gravity);
        self
    }

    /// Mat color for fit mode.
    pub fn background(mut self, color: impl Into<Rgba>) -> Self {
        self.background = Some(color.into());
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<Variation, ConfigError> {
        let legacy_touched = self.clip.is_some()
            || self.max_width.is_some()
            || self.max_height.is_some()
            || self.anchor.is_some()
            || self.face_detection.is_some();
        let modern_touched =
            self.mode.is_some() || self.gravity.is_some() || self.background.is_some();
        if legacy_touched && modern_touched {
            return Err(ConfigError::MixedSizingFamilies);
        }

        let mut warnings = Vec::new();
        let sizing = if legacy_touched {
            let clip = self.clip.unwrap_or(true);
            let max_width = self.max_width.unwrap_or(0);
            let max_height = self.max_height.unwrap_or(0);
            let anchor = self.anchor.unwrap_or_default();
            if !anchor.is_valid() {
                return Err(ConfigError::AnchorOutOfRange);
            }
            if max_width > 0 {
                if clip {
                    warnings.push(ConfigWarning::MaxWidthWithClip);
                }
                if self.size.0 > 0 {
                    warnings.push(ConfigWarning::MaxWidthWithTargetWidth);
                }
            }
            if max_height > 0 {
                if clip {
                    warnings.push(ConfigWarning::MaxHeightWithClip);
                }
                if self.size.1 > 0 {
                    warnings.push(ConfigWarning::MaxHeightWithTargetHeight);
                }
            }
            Sizing::Legacy {
                clip,
                max_width,
                max_height,
                anchor,
                face_detection: self.face_detection.unwrap_or(false),
            }
        } else {
            let mode = self.mode.unwrap_or_default();
            let gravity = self.gravity.unwrap_or_default();
            if self.upscale && mode == Mode::Crop {
                return Err(ConfigError::UpscaleWithCrop);
            }
            if gravity == Gravity::Auto && mode == Mode::Fit {
                return Err(ConfigError::AutoGravityWithFit);
            }
            if let Gravity::Anchor(a) = &gravity
                && !a.is_valid()
            {
                return Err(ConfigError::GravityOutOfRange);
            }
            if self.background.is_some() && mode != Mode::Fit {
                warnings.push(ConfigWarning::BackgroundIgnored);
            }
            Sizing::Modern {
                mode,
                gravity,
                background: self.background,
            }
        };

        Ok(Variation {
            size: self.size,
            upscale: self.upscale,
            sizing,
            format: self.format,
            preprocessors: self.preprocessors,
            postprocessors: self.postprocessors,
            options: self.options,
            warnings,
        })
    }
}
