//! Image variation sizing and pipeline planning.
//!
//! Pure geometry — no pixel operations, no I/O, `no_std` compatible. The
//! host's imaging layer decodes, resamples, and encodes; this crate decides
//! exactly what it should do: final canvas dimensions, crop windows, resize
//! targets, and placement, computed with exact rational arithmetic so
//! repeated rescaling never drifts by a pixel.
//!
//! # Modules
//!
//! - [`scaler`] — exact proportional scaling under an upscale policy
//! - [`variation`] — validated configuration and output-size resolution
//! - [`pipeline`] — step descriptors and layout planning
//! - [`detect`] — subject-detection capability and derived geometry
//! - [`filters`] — filter step descriptors for the external imaging layer
//! - [`color`], [`format`] — color parsing, output formats and save options
//!
//! # Example
//!
//! ```
//! use variations::{Mode, Variation};
//!
//! let variation = Variation::builder(400, 300)
//!     .mode(Mode::Fill)
//!     .upscale(true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(variation.output_size((1000, 500)).unwrap(), (400, 300));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod color;
pub mod format;
pub mod scaler;

#[cfg(feature = "alloc")]
pub mod detect;
#[cfg(feature = "alloc")]
pub mod filters;
#[cfg(feature = "alloc")]
pub mod pipeline;
#[cfg(feature = "alloc")]
pub mod variation;

pub use color::Rgba;
pub use format::{Compression, Format, SaveOptions};
pub use scaler::{LayoutError, Scaler};

#[cfg(feature = "alloc")]
pub use detect::{Detection, NoDetection, PixelView, SubjectBox, SubjectDetector};
#[cfg(feature = "alloc")]
pub use filters::Filter;
#[cfg(feature = "alloc")]
pub use pipeline::{Anchor, Layout, Pipeline, Plan, PlanWarning, PlannedOp, Rect, Size, Step};
#[cfg(feature = "alloc")]
pub use variation::{ConfigError, ConfigWarning, Gravity, Mode, Sizing, Variation, VariationBuilder};
