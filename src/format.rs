//! Output format resolution and per-format save options.
//!
//! The configuration's `format` is either an explicit [`Format`] or "auto":
//! guess from the destination extension, falling back to JPEG. Save options
//! are an explicit typed record per format, merged over built-in defaults —
//! there is no stringly-typed option bag.

use core::fmt;

/// Supported output image formats.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    Jpeg,
    Png,
    Gif,
    WebP,
    Tiff,
    /// 1-bit / paletted bitmap.
    Bmp,
}

/// Format to fall back to when nothing better can be determined.
pub const FALLBACK_FORMAT: Format = Format::Jpeg;

impl Format {
    /// Parse a format name. Accepts both format names and common extensions
    /// (`"jpg"`, `"jpeg"`, `"tif"`, …), case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches('.');
        FORMAT_NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|&(_, f)| f)
    }

    /// Determine the format from a path's extension, if recognized.
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, ext) = path.rsplit_once('.')?;
        if ext.contains('/') {
            return None;
        }
        Self::parse(ext)
    }

    /// The preferred file extension for this format, with the leading dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Format::Jpeg => ".jpg",
            Format::Png => ".png",
            Format::Gif => ".gif",
            Format::WebP => ".webp",
            Format::Tiff => ".tiff",
            Format::Bmp => ".bmp",
        }
    }

    /// Whether color-mode autoconversion defaults on when saving.
    /// On for every format except WebP.
    pub const fn autoconvert_default(self) -> bool {
        !matches!(self, Format::WebP)
    }
}

#[cfg(feature = "alloc")]
impl core::str::FromStr for Format {
    type Err = crate::variation::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            crate::variation::ConfigError::UnsupportedFormat(alloc::string::String::from(s))
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Jpeg => "JPEG",
            Format::Png => "PNG",
            Format::Gif => "GIF",
            Format::WebP => "WEBP",
            Format::Tiff => "TIFF",
            Format::Bmp => "BMP",
        };
        f.write_str(name)
    }
}

const FORMAT_NAMES: &[(&str, Format)] = &[
    ("jpeg", Format::Jpeg),
    ("jpg", Format::Jpeg),
    ("jpe", Format::Jpeg),
    ("png", Format::Png),
    ("gif", Format::Gif),
    ("webp", Format::WebP),
    ("tiff", Format::Tiff),
    ("tif", Format::Tiff),
    ("bmp", Format::Bmp),
];

/// Replace the extension of `path` with the preferred one for `format`.
#[cfg(feature = "alloc")]
pub fn replace_extension(path: &str, format: Format) -> alloc::string::String {
    use alloc::string::String;

    let stem = match path.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') && !stem.is_empty() => stem,
        _ => path,
    };
    let mut out = String::from(stem);
    out.push_str(format.extension());
    out
}

/// TIFF compression schemes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Compression {
    Jpeg,
    Lzw,
    Deflate,
    Packbits,
}

/// Encoder options for one output format.
///
/// `None` fields defer to the encoder's own defaults. Options set on a
/// variation merge over the per-format defaults from [`SaveOptions::defaults_for`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Lossy quality, 1–100.
    pub quality: Option<u8>,
    /// Progressive/interlaced encoding.
    pub progressive: Option<bool>,
    /// Convert the color mode to one the encoder supports.
    pub autoconvert: Option<bool>,
    /// Compression scheme (TIFF).
    pub compression: Option<Compression>,
}

impl SaveOptions {
    /// Built-in defaults for a format.
    pub fn defaults_for(format: Format) -> Self {
        match format {
            Format::Jpeg => Self {
                quality: Some(85),
                progressive: Some(true),
                ..Self::default()
            },
            Format::WebP => Self {
                quality: Some(85),
                autoconvert: Some(false),
                ..Self::default()
            },
            Format::Tiff => Self {
                compression: Some(Compression::Jpeg),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    /// Merge `self` over `base`: fields set here win, unset fields fall back.
    pub fn merged_over(self, base: Self) -> Self {
        Self {
            quality: self.quality.or(base.quality),
            progressive: self.progressive.or(base.progressive),
            autoconvert: self.autoconvert.or(base.autoconvert),
            compression: self.compression.or(base.compression),
        }
    }
}
