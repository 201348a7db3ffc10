//! Pixel format descriptors.
//!
//! A [`Format`] pins down both axes of a pixel layout: channel count
//! (RGB or RGBA) and numeric domain (8-bit fixed, 16-bit fixed, 32-bit
//! float). The sibling lookups ([`to_ldr`](Format::to_ldr),
//! [`to_rgba`](Format::to_rgba), ...) move along one axis while keeping
//! the other fixed.

/// Pixel layout: channel count × numeric domain.
///
/// `None` is the sentinel for an unconfigured buffer; all derived
/// properties of `None` are zero and factories reject it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Format {
    /// Sentinel: no format assigned.
    #[default]
    None = 0,
    /// 8-bit fixed-point RGB (LDR).
    Rgb8,
    /// 8-bit fixed-point RGBA (LDR).
    Rgba8,
    /// 16-bit fixed-point RGB (HDR).
    Rgb16,
    /// 16-bit fixed-point RGBA (HDR).
    Rgba16,
    /// 32-bit float RGB, unclamped linear.
    Rgb32F,
    /// 32-bit float RGBA, unclamped linear.
    Rgba32F,
}

/// Channel value domain. The set is closed: buffers store exactly one of
/// these three numeric interpretations per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    /// 8-bit fixed point, range `[0, 255]`.
    Ldr,
    /// 16-bit fixed point, range `[0, 65535]`.
    Hdr,
    /// 32-bit float, linear and unclamped.
    Float,
}

/// A color channel within a pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    Red = 0,
    Green = 1,
    Blue = 2,
    Alpha = 3,
}

impl Channel {
    /// Zero-based position of this channel within a pixel.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl Format {
    /// Number of channels (3 or 4; 0 for `None`).
    #[inline]
    pub const fn channel_count(self) -> usize {
        match self {
            Format::None => 0,
            Format::Rgb8 | Format::Rgb16 | Format::Rgb32F => 3,
            Format::Rgba8 | Format::Rgba16 | Format::Rgba32F => 4,
        }
    }

    /// Byte size of a single channel value (1, 2, or 4; 0 for `None`).
    #[inline]
    pub const fn channel_size(self) -> usize {
        match self {
            Format::None => 0,
            Format::Rgb8 | Format::Rgba8 => 1,
            Format::Rgb16 | Format::Rgba16 => 2,
            Format::Rgb32F | Format::Rgba32F => 4,
        }
    }

    /// Byte size of a whole pixel.
    #[inline]
    pub const fn pixel_size(self) -> usize {
        self.channel_count() * self.channel_size()
    }

    /// Whether the layout includes an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Format::Rgba8 | Format::Rgba16 | Format::Rgba32F)
    }

    /// Whether channel values are 8-bit fixed point.
    #[inline]
    pub const fn is_ldr(self) -> bool {
        matches!(self, Format::Rgb8 | Format::Rgba8)
    }

    /// Whether channel values are 16-bit fixed point.
    #[inline]
    pub const fn is_hdr(self) -> bool {
        matches!(self, Format::Rgb16 | Format::Rgba16)
    }

    /// Whether channel values are 32-bit float.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Format::Rgb32F | Format::Rgba32F)
    }

    /// Numeric domain of this format, or `None` for the sentinel.
    #[inline]
    pub const fn domain(self) -> Option<Domain> {
        match self {
            Format::None => None,
            Format::Rgb8 | Format::Rgba8 => Some(Domain::Ldr),
            Format::Rgb16 | Format::Rgba16 => Some(Domain::Hdr),
            Format::Rgb32F | Format::Rgba32F => Some(Domain::Float),
        }
    }

    /// Sibling format with the same channel count in the LDR domain.
    #[inline]
    pub const fn to_ldr(self) -> Format {
        match self {
            Format::None => Format::None,
            Format::Rgb8 | Format::Rgb16 | Format::Rgb32F => Format::Rgb8,
            Format::Rgba8 | Format::Rgba16 | Format::Rgba32F => Format::Rgba8,
        }
    }

    /// Sibling format with the same channel count in the HDR domain.
    #[inline]
    pub const fn to_hdr(self) -> Format {
        match self {
            Format::None => Format::None,
            Format::Rgb8 | Format::Rgb16 | Format::Rgb32F => Format::Rgb16,
            Format::Rgba8 | Format::Rgba16 | Format::Rgba32F => Format::Rgba16,
        }
    }

    /// Sibling format with the same channel count in the float domain.
    #[inline]
    pub const fn to_float(self) -> Format {
        match self {
            Format::None => Format::None,
            Format::Rgb8 | Format::Rgb16 | Format::Rgb32F => Format::Rgb32F,
            Format::Rgba8 | Format::Rgba16 | Format::Rgba32F => Format::Rgba32F,
        }
    }

    /// Sibling format with the same domain and no alpha channel.
    #[inline]
    pub const fn to_rgb(self) -> Format {
        match self {
            Format::None => Format::None,
            Format::Rgb8 | Format::Rgba8 => Format::Rgb8,
            Format::Rgb16 | Format::Rgba16 => Format::Rgb16,
            Format::Rgb32F | Format::Rgba32F => Format::Rgb32F,
        }
    }

    /// Sibling format with the same domain and an alpha channel.
    #[inline]
    pub const fn to_rgba(self) -> Format {
        match self {
            Format::None => Format::None,
            Format::Rgb8 | Format::Rgba8 => Format::Rgba8,
            Format::Rgb16 | Format::Rgba16 => Format::Rgba16,
            Format::Rgb32F | Format::Rgba32F => Format::Rgba32F,
        }
    }
}

impl core::fmt::Display for Format {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Format::None => "None",
            Format::Rgb8 => "RGB8",
            Format::Rgba8 => "RGBA8",
            Format::Rgb16 => "RGB16",
            Format::Rgba16 => "RGBA16",
            Format::Rgb32F => "RGB32F",
            Format::Rgba32F => "RGBA32F",
        })
    }
}
